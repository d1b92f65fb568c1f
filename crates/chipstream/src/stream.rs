//! Streaming buffer and loop cache.
//!
//! The command bytes of a track never live in memory as a whole. The
//! `CommandBuffer` holds a bounded window of pending bytes that is topped up
//! one byte at a time from the `ByteSource`, and the `LoopCache` keeps a copy
//! of the bytes right after the loop point so that looping never waits on a
//! storage seek.
pub mod buffer;
pub mod loop_cache;

pub use buffer::CommandBuffer;
pub use loop_cache::LoopCache;

/// Default capacity of the command buffer in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 8192;
/// Default size of the loop cache in bytes.
pub const DEFAULT_LOOP_CACHE_LEN: usize = 512;
