#![doc = include_str!("../README.md")]
//! chipstream: streaming VGM player core
//!
//! The crate never loads a track into memory as a whole. A [`TrackSession`]
//! keeps a bounded [`CommandBuffer`] topped up one byte at a time from a
//! [`ByteSource`], decodes one command per [`TrackSession::step`] and returns
//! the wait in samples. A separate tick context counts the waits down
//! through the atomics in [`TickState`]; the main context does everything
//! else.
//!
//! Module map:
//! - `vgm`: header parsing, the opcode table, the interpreter session and
//!   a builder for synthesizing files.
//! - `meta`: Gd3 metadata.
//! - `stream`: command buffer and loop cache.
//! - `timing`: tick state and the ticker thread.
//! - `selector`, `library`, `player`: track selection and the playback
//!   driver with its command surface.
//!
//! Example: interpret a synthesized track
//!
//! ```rust
//! use std::sync::Arc;
//! use chipstream::{ChipWrite, MemorySource, TickState, TrackSession, VgmBuilder};
//!
//! let mut b = VgmBuilder::new();
//! b.ym2151_write(0x08, 0x78).wait_735();
//! let source = MemorySource::from_bytes(b.finalize());
//!
//! let mut session = TrackSession::open(source, 8192, 512, Arc::new(TickState::new()))
//!     .expect("valid track");
//! assert!(session.verify());
//!
//! let mut writes: Vec<ChipWrite> = Vec::new();
//! assert_eq!(session.step(&mut writes).unwrap(), 0);
//! assert_eq!(session.step(&mut writes).unwrap(), 735);
//! assert_eq!(writes, vec![ChipWrite { address: 0x08, data: 0x78 }]);
//! ```
pub mod binutil;
pub mod chip;
pub mod library;
pub mod meta;
pub mod player;
pub mod selector;
pub mod source;
pub mod stream;
pub mod timing;
pub mod vgm;

pub use binutil::ParseError;
pub use chip::{ChipSink, ChipWrite};
pub use library::{MemoryLibrary, TrackLibrary};
pub use meta::Gd3;
pub use player::{Player, PlayerConfig, PlayerError};
pub use selector::{PlayMode, Strategy, TrackSelector};
pub use source::{ByteSource, IoSource, MemorySource};
pub use stream::{CommandBuffer, LoopCache};
pub use timing::{TickState, Ticker};
pub use vgm::{CommandError, Opcode, TrackSession, VgmBuilder, VgmHeader};
