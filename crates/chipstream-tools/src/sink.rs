//! Console stand-in for the YM2151 bus.
use chipstream::ChipSink;
use log::{debug, info};

/// Counts register writes and optionally echoes them to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    echo: bool,
    writes: u64,
    clock: u32,
}

impl ConsoleSink {
    pub fn new(echo: bool) -> Self {
        ConsoleSink {
            echo,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn clock(&self) -> u32 {
        self.clock
    }
}

impl ChipSink for ConsoleSink {
    fn write(&mut self, address: u8, data: u8) {
        self.writes += 1;
        if self.echo {
            println!("YM2151 0x{address:02X} <- 0x{data:02X}");
        }
    }

    fn reset(&mut self) {
        debug!("chip reset");
    }

    fn set_clock(&mut self, hz: u32) {
        if hz != self.clock {
            info!("chip clock {hz} Hz");
        }
        self.clock = hz;
    }
}
