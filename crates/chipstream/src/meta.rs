//! Gd3 metadata reading and serialization.
//!
//! The Gd3 chunk sits at `gd3_offset + 0x14` and consists of a four-byte
//! tag (`"Gd3 "`), a 32-bit little-endian version, a 32-bit little-endian
//! length and a sequence of nul-terminated UTF-16LE strings in a fixed slot
//! order (track, game, system, author each in English then Japanese, then
//! release date, converter and notes).
//!
//! Only the primary-language slots are kept. The others are still consumed
//! so that the slot index stays in step with the string table.
use log::{debug, warn};
use std::io;

use crate::source::ByteSource;
use crate::vgm::VgmHeader;

/// Sum of the bytes of the `"Gd3 "` tag.
pub const GD3_TAG_SUM: u32 = 0xFE;

/// Slot order of the Gd3 string table.
const SLOT_TRACK_NAME: usize = 0;
const SLOT_GAME_NAME: usize = 2;
const SLOT_SYSTEM_NAME: usize = 4;
const SLOT_AUTHOR: usize = 6;
const SLOT_RELEASE_DATE: usize = 8;
const SLOT_COUNT: usize = 11;

/// Primary-language Gd3 fields of the current track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gd3 {
    pub track_name: String,
    pub game_name: String,
    pub system_name: String,
    pub author: String,
    pub release_date: String,
    /// The Gd3 chunk version (as the raw u32 the chunk stores, e.g. 0x00000100 for 1.00)
    pub version: u32,
    /// Declared byte length of the string table.
    pub length: u32,
}

impl Gd3 {
    /// True when no metadata block was found.
    pub fn is_empty(&self) -> bool {
        self.length == 0
            && self.track_name.is_empty()
            && self.game_name.is_empty()
            && self.system_name.is_empty()
            && self.author.is_empty()
            && self.release_date.is_empty()
    }

    /// Serialize into a complete Gd3 chunk. Secondary-language, converter
    /// and notes slots are written empty.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();

        out.extend_from_slice(b"Gd3 ");
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&0_u32.to_le_bytes());

        let mut data: Vec<u8> = Vec::new();
        for slot in 0..SLOT_COUNT {
            let text = match slot {
                SLOT_TRACK_NAME => self.track_name.as_str(),
                SLOT_GAME_NAME => self.game_name.as_str(),
                SLOT_SYSTEM_NAME => self.system_name.as_str(),
                SLOT_AUTHOR => self.author.as_str(),
                SLOT_RELEASE_DATE => self.release_date.as_str(),
                _ => "",
            };
            for code in text.encode_utf16() {
                data.extend_from_slice(&code.to_le_bytes());
            }
            data.extend_from_slice(&0_u16.to_le_bytes());
        }

        let len = data.len() as u32;
        out.extend_from_slice(&data);
        out[8..12].copy_from_slice(&len.to_le_bytes());

        out
    }
}

/// Read the Gd3 block declared by `header` from `source`.
///
/// The source cursor is restored to where it was on entry, whether or not a
/// block was found. A missing block or a tag whose bytes do not sum to
/// [`GD3_TAG_SUM`] yields an empty `Gd3`.
pub fn read_gd3<S: ByteSource + ?Sized>(source: &mut S, header: &VgmHeader) -> io::Result<Gd3> {
    let prev = source.position();
    let result = match header.gd3_position() {
        Some(pos) => read_gd3_at(source, pos),
        None => Ok(Gd3::default()),
    };
    source.seek(prev)?;
    result
}

fn read_gd3_at<S: ByteSource + ?Sized>(source: &mut S, pos: u64) -> io::Result<Gd3> {
    source.seek(pos)?;

    let mut tag = [0u8; 4];
    let read = source.read_bytes(&mut tag)?;
    let sum: u32 = tag[..read].iter().map(|&b| u32::from(b)).sum();
    if read < tag.len() || sum != GD3_TAG_SUM {
        warn!("invalid gd3 tag sum at 0x{pos:X}: 0x{sum:X}");
        return Ok(Gd3::default());
    }

    let mut word = [0u8; 4];
    if source.read_bytes(&mut word)? < 4 {
        return Ok(Gd3::default());
    }
    let version = u32::from_le_bytes(word);
    if source.read_bytes(&mut word)? < 4 {
        return Ok(Gd3::default());
    }
    let length = u32::from_le_bytes(word);

    // Primary-language slots are the even ones up to the release date.
    let mut primary: [Vec<u16>; 5] = Default::default();
    let mut slot = 0usize;
    let mut unit = [0u8; 2];
    for _ in 0..length / 2 {
        if source.read_bytes(&mut unit)? < 2 {
            debug!("gd3 string table truncated in slot {slot}");
            break;
        }
        let code = u16::from_le_bytes(unit);
        if code == 0 {
            slot += 1;
            continue;
        }
        if slot % 2 == 0 && slot <= SLOT_RELEASE_DATE {
            primary[slot / 2].push(code);
        }
    }

    let text = |slot: usize| String::from_utf16_lossy(&primary[slot / 2]);
    Ok(Gd3 {
        track_name: text(SLOT_TRACK_NAME),
        game_name: text(SLOT_GAME_NAME),
        system_name: text(SLOT_SYSTEM_NAME),
        author: text(SLOT_AUTHOR),
        release_date: text(SLOT_RELEASE_DATE),
        version,
        length,
    })
}
