//! Utilities used by the container parser: parse error type and
//! little-endian byte readers/writers over header images.
use thiserror::Error;

/// Error type returned while decoding a container or its command stream.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The command stream ended while the interpreter was expecting more
    /// bytes (buffer empty and the source exhausted).
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// The source is shorter than the fixed header.
    ///
    /// - `needed` is the minimum header length in bytes.
    /// - `available` is the number of bytes the source actually holds.
    #[error("header too short: needed {needed} bytes, available {available}")]
    HeaderTooShort { needed: usize, available: usize },

    /// The four-byte magic identifier did not spell `"Vgm "`.
    ///
    /// The contained array is the raw 4 bytes that were read.
    #[error("invalid ident: {0:?}")]
    InvalidIdent([u8; 4]),

    /// A header offset points outside the source.
    ///
    /// - `offset` is the normalized absolute offset.
    /// - `available` is the size of the source.
    /// - `context` names the header field (for example `"data_offset"`).
    #[error("offset out of range at {context}: 0x{offset:X} (available {available})")]
    OffsetOutOfRange {
        offset: u64,
        available: u64,
        context: &'static str,
    },

    /// The underlying byte source failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read a 32-bit little-endian unsigned integer from `bytes` at `off`.
///
/// Returns `None` when the four bytes starting at `off` are not all
/// available; callers treat missing fields as zero.
pub fn read_u32_le_at(bytes: &[u8], off: usize) -> Option<u32> {
    let raw = bytes.get(off..off.checked_add(4)?)?;
    let mut tmp: [u8; 4] = [0; 4];
    tmp.copy_from_slice(raw);
    Some(u32::from_le_bytes(tmp))
}

/// Write a 32-bit little-endian unsigned integer `v` into `buf` at `off`.
///
/// This function will copy four bytes into `buf[off..off+4]`. It does not
/// perform bounds checking; callers must ensure the destination range is valid.
pub fn write_u32(buf: &mut [u8], off: usize, v: u32) {
    let bytes = v.to_le_bytes();
    buf[off..off + 4].copy_from_slice(&bytes);
}
