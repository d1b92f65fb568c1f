//! VGM container: header, command table, track session and a builder for
//! synthesizing files.
pub mod builder;
pub mod command;
mod header;
pub mod session;

pub use builder::VgmBuilder;
pub use command::Opcode;
pub use header::{
    DATA_OFFSET_BASE, EXTENDED_HEADER_VERSION, GD3_OFFSET_BASE, HEADER_IMAGE_SIZE,
    LEGACY_DATA_OFFSET, LEGACY_DATA_START, LOOP_OFFSET_BASE, MIN_HEADER_SIZE, VGM_IDENT,
    VgmHeader, WAIT_NTSC_FRAME, WAIT_PAL_FRAME, normalize_data_offset, normalize_loop_offset,
};
pub use session::{CommandError, TrackSession};
