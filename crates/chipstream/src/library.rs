//! Track enumeration.
//!
//! A `TrackLibrary` exposes an ordered list of track names and opens a
//! `ByteSource` for any of them. Storage order is the playback order of the
//! sequential strategies.
use std::io;
use std::sync::Arc;

use crate::source::{ByteSource, MemorySource};

pub trait TrackLibrary {
    /// Number of tracks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of track `index`, `None` when out of range.
    fn name(&self, index: usize) -> Option<&str>;

    /// Open track `index` for streaming.
    fn open(&self, index: usize) -> io::Result<Box<dyn ByteSource>>;

    /// First index whose name equals `request`, both trimmed.
    fn position(&self, request: &str) -> Option<usize> {
        let request = request.trim();
        (0..self.len()).find(|&i| self.name(i).is_some_and(|name| name.trim() == request))
    }
}

/// Library of in-memory track images.
#[derive(Debug, Clone, Default)]
pub struct MemoryLibrary {
    tracks: Vec<(String, Arc<[u8]>)>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.tracks.push((name.into(), bytes.into()));
    }
}

impl<N: Into<String>, B: Into<Arc<[u8]>>> FromIterator<(N, B)> for MemoryLibrary {
    fn from_iter<I: IntoIterator<Item = (N, B)>>(iter: I) -> Self {
        MemoryLibrary {
            tracks: iter
                .into_iter()
                .map(|(name, bytes)| (name.into(), bytes.into()))
                .collect(),
        }
    }
}

impl TrackLibrary for MemoryLibrary {
    fn len(&self) -> usize {
        self.tracks.len()
    }

    fn name(&self, index: usize) -> Option<&str> {
        self.tracks.get(index).map(|(name, _)| name.as_str())
    }

    fn open(&self, index: usize) -> io::Result<Box<dyn ByteSource>> {
        let (_, bytes) = self.tracks.get(index).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no track at index {index}"))
        })?;
        Ok(Box::new(MemorySource::from_bytes(Arc::clone(bytes))))
    }
}
