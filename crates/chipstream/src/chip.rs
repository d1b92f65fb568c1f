//! Chip-write sink.
//!
//! The electrical protocol used to latch a byte onto the sound chip is not
//! modelled. The interpreter only hands `(address, data)` pairs to a
//! `ChipSink`, which must complete each write within one tick period.

/// Destination of the interpreter's register writes.
pub trait ChipSink {
    /// Latch `data` into register `address`.
    fn write(&mut self, address: u8, data: u8);

    /// Pulse the chip's reset line. Called after every successful track load.
    fn reset(&mut self) {}

    /// Program the chip's master clock (Hz) from the container header.
    fn set_clock(&mut self, _hz: u32) {}
}

impl<T: ChipSink + ?Sized> ChipSink for &mut T {
    fn write(&mut self, address: u8, data: u8) {
        (**self).write(address, data);
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn set_clock(&mut self, hz: u32) {
        (**self).set_clock(hz);
    }
}

/// One recorded register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipWrite {
    pub address: u8,
    pub data: u8,
}

/// Recording sink, handy for dry runs and tests.
impl ChipSink for Vec<ChipWrite> {
    fn write(&mut self, address: u8, data: u8) {
        self.push(ChipWrite { address, data });
    }
}
