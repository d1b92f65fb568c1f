use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, Producer};
use std::io;

use crate::binutil::ParseError;
use crate::source::ByteSource;

/// Bounded FIFO of pending command bytes.
///
/// The buffer is owned by a single track session and is refilled
/// opportunistically from the session's `ByteSource`. `len() <= capacity()`
/// holds at all times.
///
/// Two cursors are tracked alongside the bytes:
/// - `buffer_pos`: bytes consumed since the buffer was last cleared or
///   filled in full,
/// - `cmd_pos`: bytes consumed since the loop start, which bounds the window
///   in which the loop cache is valid.
pub struct CommandBuffer {
    ring: HeapRb<u8>,
    buffer_pos: u32,
    cmd_pos: u32,
}

impl std::fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("buffer_pos", &self.buffer_pos)
            .field("cmd_pos", &self.cmd_pos)
            .finish()
    }
}

impl CommandBuffer {
    /// Create an empty buffer holding at most `capacity` bytes (at least 1).
    pub fn new(capacity: usize) -> Self {
        CommandBuffer {
            ring: HeapRb::new(capacity.max(1)),
            buffer_pos: 0,
            cmd_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity().get()
    }

    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    pub fn buffer_pos(&self) -> u32 {
        self.buffer_pos
    }

    pub fn cmd_pos(&self) -> u32 {
        self.cmd_pos
    }

    pub(crate) fn set_cmd_pos(&mut self, pos: u32) {
        self.cmd_pos = pos;
    }

    /// Copy of the pending bytes, oldest first.
    pub fn contents(&self) -> Vec<u8> {
        self.ring.iter().copied().collect()
    }

    /// Top up the buffer by at most one byte.
    ///
    /// Returns `true` when there is nothing to do: the buffer is full, it
    /// already holds at least as many bytes as remain in the source, or the
    /// source is exhausted. Returns `false` after appending one byte. A single
    /// call never costs more than one byte read, so it is safe to call from
    /// the timing-sensitive main loop.
    pub fn refill<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> io::Result<bool> {
        if self.ring.is_full() || self.len() as u64 >= source.remaining() {
            return Ok(true);
        }
        match source.read()? {
            Some(byte) => {
                // Cannot fail: fullness was checked above.
                let _ = self.ring.try_push(byte);
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// Blocking variant of [`refill`](Self::refill): top up until it reports
    /// done. Only used at track load, before playback begins.
    pub fn fill<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> io::Result<()> {
        while !self.refill(source)? {}
        self.buffer_pos = 0;
        Ok(())
    }

    /// Pop the oldest byte, forcing one refill first if the buffer ran dry.
    ///
    /// Fails with `UnexpectedEof` only when the buffer is empty and the
    /// source has nothing left.
    pub fn consume<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<u8, ParseError> {
        if self.ring.is_empty() {
            self.refill(source)?;
        }
        let byte = self.ring.try_pop().ok_or(ParseError::UnexpectedEof)?;
        self.buffer_pos = self.buffer_pos.wrapping_add(1);
        self.cmd_pos = self.cmd_pos.wrapping_add(1);
        Ok(byte)
    }

    /// Two successive bytes as a little-endian `u16`.
    pub fn consume_u16<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<u16, ParseError> {
        let b0 = self.consume(source)?;
        let b1 = self.consume(source)?;
        Ok(u16::from_le_bytes([b0, b1]))
    }

    /// Four successive bytes as a little-endian `u32`.
    pub fn consume_u32<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
    ) -> Result<u32, ParseError> {
        let mut v = [0u8; 4];
        for b in &mut v {
            *b = self.consume(source)?;
        }
        Ok(u32::from_le_bytes(v))
    }

    /// Discard exactly `count` bytes of the stream.
    ///
    /// Bytes already buffered are dropped first; the rest are skipped with a
    /// single forward seek of the source instead of being read one by one.
    pub fn discard<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        count: u32,
    ) -> Result<(), ParseError> {
        if u64::from(count) > self.len() as u64 + source.remaining() {
            return Err(ParseError::UnexpectedEof);
        }
        let buffered = (count as usize).min(self.len());
        self.ring.skip(buffered);
        let rest = count - buffered as u32;
        if rest > 0 {
            source.seek(source.position() + u64::from(rest))?;
        }
        self.buffer_pos = self.buffer_pos.wrapping_add(count);
        self.cmd_pos = self.cmd_pos.wrapping_add(count);
        Ok(())
    }

    /// Append `bytes` without touching the source; returns how many fit.
    pub(crate) fn push_slice(&mut self, bytes: &[u8]) -> usize {
        self.ring.push_slice(bytes)
    }

    /// Drop every pending byte.
    pub fn clear(&mut self) {
        self.ring.clear();
        self.buffer_pos = 0;
    }

    /// Drop every pending byte and rewind both cursors.
    pub(crate) fn reset(&mut self) {
        self.clear();
        self.cmd_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    #[test]
    fn refill_stops_when_buffer_covers_remaining_source() {
        let mut src = MemorySource::from_bytes(vec![1u8, 2, 3, 4]);
        let mut buf = CommandBuffer::new(16);
        assert!(!buf.refill(&mut src).unwrap());
        assert!(!buf.refill(&mut src).unwrap());
        // 2 buffered, 2 remaining
        assert!(buf.refill(&mut src).unwrap());
        assert_eq!(buf.contents(), vec![1, 2]);
    }

    #[test]
    fn consume_on_empty_forces_refill() {
        let mut src = MemorySource::from_bytes(vec![0x61, 0x44, 0x01]);
        let mut buf = CommandBuffer::new(4);
        assert_eq!(buf.consume(&mut src).unwrap(), 0x61);
        assert_eq!(buf.consume_u16(&mut src).unwrap(), 0x0144);
        assert!(matches!(
            buf.consume(&mut src),
            Err(ParseError::UnexpectedEof)
        ));
        assert_eq!(buf.cmd_pos(), 3);
    }

    #[test]
    fn discard_skips_buffered_then_seeks() {
        let mut src = MemorySource::from_bytes((0u8..32).collect::<Vec<_>>());
        let mut buf = CommandBuffer::new(4);
        buf.fill(&mut src).unwrap();
        assert_eq!(buf.len(), 4);
        buf.discard(&mut src, 10).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.consume(&mut src).unwrap(), 10);
        assert_eq!(buf.cmd_pos(), 11);
    }

    #[test]
    fn discard_past_end_leaves_buffer_untouched() {
        let mut src = MemorySource::from_bytes((0u8..8).collect::<Vec<_>>());
        let mut buf = CommandBuffer::new(4);
        buf.fill(&mut src).unwrap();
        assert!(matches!(
            buf.discard(&mut src, 9),
            Err(ParseError::UnexpectedEof)
        ));
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.cmd_pos(), 0);
        assert_eq!(src.position(), 4);
        assert_eq!(buf.consume(&mut src).unwrap(), 0);
    }
}
