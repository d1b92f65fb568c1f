//! Track session and opcode interpreter.
//!
//! A `TrackSession` owns everything that belongs to one loaded track: the
//! byte source, the parsed header and metadata, the command buffer, the loop
//! cache and the loop counter. A fresh session is built on every track load
//! and nothing carries over between tracks.
//!
//! [`TrackSession::step`] decodes exactly one command and returns the number
//! of samples to wait before the next one. It never sleeps; the timing
//! engine enforces the waits.
use log::{debug, trace};
use std::sync::Arc;
use thiserror::Error;

use crate::binutil::ParseError;
use crate::chip::ChipSink;
use crate::meta::{Gd3, read_gd3};
use crate::source::ByteSource;
use crate::stream::{CommandBuffer, LoopCache};
use crate::timing::TickState;
use crate::vgm::command::Opcode;
use crate::vgm::header::{VgmHeader, WAIT_NTSC_FRAME, WAIT_PAL_FRAME};

/// Unknown opcode met in the command stream. Soft: playback goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown opcode 0x{opcode:02X} at command position {position}")]
pub struct CommandError {
    /// The offending byte.
    pub opcode: u8,
    /// `cmd_pos` at which it was read.
    pub position: u32,
}

/// Playback state of one loaded track.
pub struct TrackSession<S> {
    source: S,
    header: VgmHeader,
    gd3: Gd3,
    buffer: CommandBuffer,
    loop_cache: LoopCache,
    loop_count: u32,
    tick: Arc<TickState>,
    last_error: Option<CommandError>,
    error_count: u32,
}

impl<S: ByteSource> TrackSession<S> {
    /// Parse the header, prime the command buffer at the data start and
    /// snapshot the loop point.
    ///
    /// `loop_cache_len` is clamped to `buffer_capacity`. The header is not
    /// verified here; call [`verify`](Self::verify) before playing.
    pub fn open(
        mut source: S,
        buffer_capacity: usize,
        loop_cache_len: usize,
        tick: Arc<TickState>,
    ) -> Result<Self, ParseError> {
        let header = VgmHeader::parse(&mut source)?;
        trace!("header: {header:#X?}");

        let mut buffer = CommandBuffer::new(buffer_capacity);
        source.seek(u64::from(header.data_offset))?;
        buffer.fill(&mut source)?;

        let mut loop_cache = LoopCache::new(loop_cache_len.min(buffer.capacity()));
        loop_cache.snapshot(&mut source, u64::from(header.loop_offset))?;
        trace!(
            "loop cache: {} bytes at 0x{:X}",
            loop_cache.len(),
            loop_cache.loop_offset()
        );

        let session = TrackSession {
            source,
            header,
            gd3: Gd3::default(),
            buffer,
            loop_cache,
            loop_count: 0,
            tick,
            last_error: None,
            error_count: 0,
        };
        session.publish();
        Ok(session)
    }

    /// True when the container carries the expected magic identifier.
    pub fn verify(&self) -> bool {
        self.header.verify()
    }

    /// Read the Gd3 block into the session. A bad tag leaves it empty.
    pub fn load_metadata(&mut self) -> Result<&Gd3, ParseError> {
        self.gd3 = read_gd3(&mut self.source, &self.header)?;
        Ok(&self.gd3)
    }

    pub fn header(&self) -> &VgmHeader {
        &self.header
    }

    pub fn metadata(&self) -> &Gd3 {
        &self.gd3
    }

    pub fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }

    pub fn loop_cache(&self) -> &LoopCache {
        &self.loop_cache
    }

    /// Loops completed since the track was loaded.
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    /// Number of unknown opcodes met so far.
    pub fn command_error_count(&self) -> u32 {
        self.error_count
    }

    /// The most recent unknown opcode, cleared by the call.
    pub fn take_command_error(&mut self) -> Option<CommandError> {
        self.last_error.take()
    }

    /// True when nothing is buffered and the source has no bytes left, so the
    /// next `step` can only fail with `UnexpectedEof`.
    pub fn is_exhausted(&self) -> bool {
        self.buffer.is_empty() && self.source.remaining() == 0
    }

    /// Top up the command buffer by at most one byte.
    pub fn refill(&mut self) -> Result<bool, ParseError> {
        let done = self.buffer.refill(&mut self.source)?;
        self.publish();
        Ok(done)
    }

    /// Decode and execute one command, returning the samples to wait.
    ///
    /// Unknown opcodes are recorded (see
    /// [`take_command_error`](Self::take_command_error)) and yield a zero
    /// wait. The only hard failures are an exhausted stream and source I/O
    /// errors.
    pub fn step<K: ChipSink + ?Sized>(&mut self, sink: &mut K) -> Result<u16, ParseError> {
        let position = self.buffer.cmd_pos();
        let opcode = Opcode::from(self.consume()?);
        let wait = match opcode {
            Opcode::Ym2151Write => {
                let address = self.consume()?;
                let data = self.consume()?;
                sink.write(address, data);
                0
            }
            Opcode::WaitSamples => self.buffer.consume_u16(&mut self.source)?,
            Opcode::Wait735 => WAIT_NTSC_FRAME,
            Opcode::Wait882 => WAIT_PAL_FRAME,
            Opcode::WaitShort(samples) | Opcode::Ym2612DacWait(samples) => u16::from(samples),
            Opcode::DataBlock => {
                let _compat = self.consume()?;
                let data_type = self.consume()?;
                let size = self.buffer.consume_u32(&mut self.source)?;
                trace!("skipping data block type 0x{data_type:02X}, {size} bytes");
                self.buffer.discard(&mut self.source, size)?;
                0
            }
            Opcode::SecondaryWrite(_)
            | Opcode::SegaPcmWrite(_)
            | Opcode::ForeignWrite { .. } => {
                let operands = opcode.skipped_operands().unwrap_or(0);
                self.buffer
                    .discard(&mut self.source, u32::from(operands))?;
                0
            }
            Opcode::EndOfData => {
                self.restart_loop()?;
                0
            }
            Opcode::Unknown(byte) => {
                let err = CommandError {
                    opcode: byte,
                    position,
                };
                debug!("{err}");
                self.last_error = Some(err);
                self.error_count = self.error_count.saturating_add(1);
                0
            }
        };
        self.publish();
        Ok(wait)
    }

    fn consume(&mut self) -> Result<u8, ParseError> {
        self.buffer.consume(&mut self.source)
    }

    /// End of data: reseed the buffer from the loop cache with the tick
    /// context held off.
    fn restart_loop(&mut self) -> Result<(), ParseError> {
        self.tick.set_ready(false);
        self.buffer.reset();
        self.loop_cache.inject(&mut self.buffer, &mut self.source)?;
        self.loop_count = self.loop_count.saturating_add(1);
        self.tick.set_ready(true);
        Ok(())
    }

    fn publish(&self) {
        self.tick.set_has_data(!self.buffer.is_empty());
    }
}
