use std::io;

use crate::source::ByteSource;
use crate::stream::CommandBuffer;

/// Verbatim copy of the first bytes after the loop point.
///
/// Populated once per track load and immutable afterwards. On loop the
/// cached bytes reseed the command buffer directly, and the source is
/// repositioned just past them, so the first `len()` bytes after the loop
/// point never wait on storage.
#[derive(Debug, Clone)]
pub struct LoopCache {
    data: Box<[u8]>,
    len: usize,
    loop_offset: u64,
}

impl LoopCache {
    /// Create an empty cache of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        LoopCache {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
            loop_offset: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of valid cached bytes; short when the loop point is closer to
    /// the end of the source than the cache capacity.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn loop_offset(&self) -> u64 {
        self.loop_offset
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Copy the bytes at `loop_offset` into the cache. The source cursor is
    /// restored afterwards.
    pub fn snapshot<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        loop_offset: u64,
    ) -> io::Result<()> {
        let prev = source.position();
        self.data.fill(0);
        self.loop_offset = loop_offset;
        let read = source
            .seek(loop_offset)
            .and_then(|()| source.read_bytes(&mut self.data));
        source.seek(prev)?;
        self.len = read?;
        Ok(())
    }

    /// Replace the buffer contents with the cached bytes and move the source
    /// cursor just past them.
    pub fn inject<S: ByteSource + ?Sized>(
        &self,
        buffer: &mut CommandBuffer,
        source: &mut S,
    ) -> io::Result<()> {
        buffer.clear();
        let pushed = buffer.push_slice(self.bytes());
        source.seek(self.loop_offset + pushed as u64)?;
        buffer.set_cmd_pos(pushed.saturating_sub(1) as u32);
        Ok(())
    }
}
