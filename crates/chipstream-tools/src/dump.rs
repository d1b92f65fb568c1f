//! `dump` subcommand: run the interpreter without a clock and log every
//! register write against its sample time.
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chipstream::stream::{DEFAULT_BUFFER_CAPACITY, DEFAULT_LOOP_CACHE_LEN};
use chipstream::{ChipSink, MemorySource, TickState, TrackSession};

struct Printer {
    sample: u64,
    writes: u64,
}

impl ChipSink for Printer {
    fn write(&mut self, address: u8, data: u8) {
        self.writes += 1;
        println!("{:<12} YM2151 0x{address:02X} <- 0x{data:02X}", self.sample);
    }
}

pub fn dump(path: &Path, bytes: Vec<u8>, loops: u32) -> Result<()> {
    let mut session = TrackSession::open(
        MemorySource::from_bytes(bytes),
        DEFAULT_BUFFER_CAPACITY,
        DEFAULT_LOOP_CACHE_LEN,
        Arc::new(TickState::new()),
    )
    .with_context(|| format!("failed to parse VGM file: {}", path.display()))?;
    if !session.verify() {
        anyhow::bail!("not a VGM file: {}", path.display());
    }

    println!("{:<12} Register Write", "Sample");
    println!("{}", "-".repeat(40));

    let mut printer = Printer {
        sample: 0,
        writes: 0,
    };
    let loops = loops.max(1);
    while session.loop_count() < loops {
        session.refill()?;
        let wait = session
            .step(&mut printer)
            .with_context(|| format!("stream ended at sample {}", printer.sample))?;
        printer.sample += u64::from(wait);
        if let Some(err) = session.take_command_error() {
            println!("{:<12} {err}", printer.sample);
        }
    }

    println!("{}", "-".repeat(40));
    println!(
        "{} writes, {} samples, {} unknown opcodes",
        printer.writes,
        printer.sample,
        session.command_error_count()
    );
    Ok(())
}
