//! Random-access byte sources that containers are streamed from.
//!
//! The player never assumes buffered or cached reads: every call on a
//! `ByteSource` may cost one storage operation. `IoSource` adapts any
//! `Read + Seek` (a file, a decompressed in-memory image) and keeps track of
//! the cursor so that `position()` and `size()` are free.
use std::io::{self, Cursor, ErrorKind, Read, Seek, SeekFrom};
use std::sync::Arc;

/// Storage collaborator the streaming buffer and the container parser
/// read from.
pub trait ByteSource {
    /// Move the read cursor to the absolute `offset`.
    fn seek(&mut self, offset: u64) -> io::Result<()>;

    /// Read one byte, `None` once the end of the source is reached.
    fn read(&mut self) -> io::Result<Option<u8>>;

    /// Read up to `buf.len()` bytes and return how many were read. The count
    /// is only short at the end of the source.
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Total size of the source in bytes.
    fn size(&self) -> u64;

    /// Current read cursor.
    fn position(&self) -> u64;

    /// Bytes left between the cursor and the end of the source.
    fn remaining(&self) -> u64 {
        self.size().saturating_sub(self.position())
    }
}

impl<T: ByteSource + ?Sized> ByteSource for Box<T> {
    fn seek(&mut self, offset: u64) -> io::Result<()> {
        (**self).seek(offset)
    }

    fn read(&mut self) -> io::Result<Option<u8>> {
        (**self).read()
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_bytes(buf)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    fn position(&self) -> u64 {
        (**self).position()
    }
}

/// `ByteSource` over any seekable reader.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
    size: u64,
    pos: u64,
}

/// In-memory source, used for decompressed `.vgz` images and in tests.
pub type MemorySource = IoSource<Cursor<Arc<[u8]>>>;

impl<R: Read + Seek> IoSource<R> {
    /// Wrap `inner`, measuring its size and rewinding it to the start.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let size = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(IoSource {
            inner,
            size,
            pos: 0,
        })
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl MemorySource {
    /// Build a source over an owned byte image.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        let data: Arc<[u8]> = bytes.into();
        let size = data.len() as u64;
        IoSource {
            inner: Cursor::new(data),
            size,
            pos: 0,
        }
    }
}

impl<R: Read + Seek> ByteSource for IoSource<R> {
    fn seek(&mut self, offset: u64) -> io::Result<()> {
        self.pos = self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn read(&mut self) -> io::Result<Option<u8>> {
        if self.pos >= self.size {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.inner.read_exact(&mut byte) {
            Ok(()) => {
                self.pos += 1;
                Ok(Some(byte[0]))
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.pos += filled as u64;
        Ok(filled)
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn position(&self) -> u64 {
        self.pos
    }
}
