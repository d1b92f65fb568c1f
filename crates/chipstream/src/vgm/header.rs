//! VGM header parsing, verification and serialization.
//!
//! `VgmHeader` is the in-memory representation of the fixed-layout header
//! at the start of every container. All fields are 32-bit little-endian
//! words. `VgmHeader::parse` reads the header from a `ByteSource` and
//! normalizes the data and loop offsets into absolute file positions;
//! `VgmHeader::to_bytes` performs the inverse encoding.
//!
//! Notes:
//! - Fields at `0x80` and above exist only when `version > 1.51`; for older
//!   versions they read as zero.
//! - Fields that would overlap the command stream (at or beyond the data
//!   start) read as zero, so command bytes are never taken for header data.
use crate::binutil::{ParseError, read_u32_le_at, write_u32};
use crate::source::ByteSource;

/// `"Vgm "` read as a little-endian word.
pub const VGM_IDENT: u32 = 0x206D_6756;
/// Shortest header the parser accepts (the legacy header size).
pub const MIN_HEADER_SIZE: usize = 0x40;
/// Bytes covered by the fields this parser knows about.
pub const HEADER_IMAGE_SIZE: usize = 0xCC;
/// Fields from `EXTENDED_FIELDS_START` on are read only above this version.
pub const EXTENDED_HEADER_VERSION: u32 = 0x0000_0151;
pub const EXTENDED_FIELDS_START: usize = 0x80;

/// Raw data-offset value of legacy containers.
pub const LEGACY_DATA_OFFSET: u32 = 0x0C;
/// Absolute data start of legacy containers.
pub const LEGACY_DATA_START: u32 = 0x40;
/// Position of the data-offset field; the field is relative to it.
pub const DATA_OFFSET_BASE: u32 = 0x34;
/// Position of the loop-offset field; the field is relative to it.
pub const LOOP_OFFSET_BASE: u32 = 0x1C;
/// Position of the GD3-offset field; the field is relative to it.
pub const GD3_OFFSET_BASE: u32 = 0x14;

/// Samples in one 60 Hz video frame at 44.1 kHz.
pub const WAIT_NTSC_FRAME: u16 = 735;
/// Samples in one 50 Hz video frame at 44.1 kHz.
pub const WAIT_PAL_FRAME: u16 = 882;

#[derive(Debug, Clone, PartialEq, Eq)]
/// VGM container header.
///
/// `data_offset` and `loop_offset` hold absolute file positions once the
/// header has been parsed. `gd3_offset` and `extra_header_offset` keep the
/// raw relative values stored in the file.
pub struct VgmHeader {
    pub ident: u32,
    pub eof_offset: u32,
    pub version: u32,
    pub sn76489_clock: u32,
    pub ym2413_clock: u32,
    pub gd3_offset: u32,
    pub total_samples: u32,
    pub loop_offset: u32,
    pub loop_samples: u32,
    pub rate: u32,
    pub sn76489_flags: u32,
    pub ym2612_clock: u32,
    pub ym2151_clock: u32,
    pub data_offset: u32,
    pub sega_pcm_clock: u32,
    pub sega_pcm_interface: u32,
    pub rf5c68_clock: u32,
    pub ym2203_clock: u32,
    pub ym2608_clock: u32,
    pub ym2610_clock: u32,
    pub ym3812_clock: u32,
    pub ym3526_clock: u32,
    pub y8950_clock: u32,
    pub ymf262_clock: u32,
    pub ymf278b_clock: u32,
    pub ymf271_clock: u32,
    pub ymz280b_clock: u32,
    pub rf5c164_clock: u32,
    pub pwm_clock: u32,
    pub ay8910_clock: u32,
    pub ay8910_flags: u32,
    pub volume_loop_modifiers: u32,
    pub gb_dmg_clock: u32,
    pub nes_apu_clock: u32,
    pub multipcm_clock: u32,
    pub upd7759_clock: u32,
    pub okim6258_clock: u32,
    pub okim6258_flags: u32,
    pub okim6295_clock: u32,
    pub k051649_clock: u32,
    pub k054539_clock: u32,
    pub huc6280_clock: u32,
    pub c140_clock: u32,
    pub k053260_clock: u32,
    pub pokey_clock: u32,
    pub qsound_clock: u32,
    pub scsp_clock: u32,
    pub extra_header_offset: u32,
    pub wonderswan_clock: u32,
    pub vsu_clock: u32,
    pub saa1099_clock: u32,
}

impl Default for VgmHeader {
    fn default() -> Self {
        VgmHeader {
            ident: VGM_IDENT,
            eof_offset: 0,
            version: 0x00000171, // 1.71
            sn76489_clock: 0,
            ym2413_clock: 0,
            gd3_offset: 0,
            total_samples: 0,
            loop_offset: 0x100,
            loop_samples: 0,
            rate: 0,
            sn76489_flags: 0,
            ym2612_clock: 0,
            ym2151_clock: 0,
            data_offset: 0x100,
            sega_pcm_clock: 0,
            sega_pcm_interface: 0,
            rf5c68_clock: 0,
            ym2203_clock: 0,
            ym2608_clock: 0,
            ym2610_clock: 0,
            ym3812_clock: 0,
            ym3526_clock: 0,
            y8950_clock: 0,
            ymf262_clock: 0,
            ymf278b_clock: 0,
            ymf271_clock: 0,
            ymz280b_clock: 0,
            rf5c164_clock: 0,
            pwm_clock: 0,
            ay8910_clock: 0,
            ay8910_flags: 0,
            volume_loop_modifiers: 0,
            gb_dmg_clock: 0,
            nes_apu_clock: 0,
            multipcm_clock: 0,
            upd7759_clock: 0,
            okim6258_clock: 0,
            okim6258_flags: 0,
            okim6295_clock: 0,
            k051649_clock: 0,
            k054539_clock: 0,
            huc6280_clock: 0,
            c140_clock: 0,
            k053260_clock: 0,
            pokey_clock: 0,
            qsound_clock: 0,
            scsp_clock: 0,
            extra_header_offset: 0,
            wonderswan_clock: 0,
            vsu_clock: 0,
            saa1099_clock: 0,
        }
    }
}

/// Turn the raw data-offset field into an absolute file position, or `None`
/// when the position does not fit in 32 bits.
pub fn normalize_data_offset(raw: u32) -> Option<u32> {
    if raw == LEGACY_DATA_OFFSET || raw == 0 {
        Some(LEGACY_DATA_START)
    } else {
        raw.checked_add(DATA_OFFSET_BASE)
    }
}

/// Turn the raw loop-offset field into an absolute file position. A zero
/// field loops back to the start of the command data.
pub fn normalize_loop_offset(raw: u32, data_offset: u32) -> u32 {
    if raw == 0 {
        data_offset
    } else {
        raw.wrapping_add(LOOP_OFFSET_BASE)
    }
}

impl VgmHeader {
    /// Read and normalize the header at the start of `source`.
    ///
    /// The source cursor is left just after the header image. Fails with
    /// `HeaderTooShort` when the source holds fewer than `MIN_HEADER_SIZE`
    /// bytes and with `OffsetOutOfRange` when the data start lies beyond the
    /// end of the source. The magic identifier is not checked here; see
    /// [`VgmHeader::verify`].
    pub fn parse<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self, ParseError> {
        let mut image = [0u8; HEADER_IMAGE_SIZE];
        source.seek(0)?;
        let read = source.read_bytes(&mut image)?;
        let header = Self::from_image(&image[..read])?;
        if u64::from(header.data_offset) > source.size() {
            return Err(ParseError::OffsetOutOfRange {
                offset: u64::from(header.data_offset),
                available: source.size(),
                context: "data_offset",
            });
        }
        Ok(header)
    }

    /// Decode a header from an in-memory image (the first bytes of a file).
    #[rustfmt::skip]
    pub fn from_image(bytes: &[u8]) -> Result<Self, ParseError> {
        if bytes.len() < MIN_HEADER_SIZE {
            return Err(ParseError::HeaderTooShort {
                needed: MIN_HEADER_SIZE,
                available: bytes.len(),
            });
        }
        let word = |off: usize| read_u32_le_at(bytes, off).unwrap_or(0);

        let mut h = VgmHeader {
            ident: word(0x00),
            eof_offset: word(0x04),
            version: word(0x08),
            sn76489_clock: word(0x0C),
            ym2413_clock: word(0x10),
            gd3_offset: word(0x14),
            total_samples: word(0x18),
            loop_offset: word(0x1C),
            loop_samples: word(0x20),
            rate: word(0x24),
            sn76489_flags: word(0x28),
            ym2612_clock: word(0x2C),
            ym2151_clock: word(0x30),
            data_offset: word(0x34),
            ..VgmHeader::zeroed()
        };

        h.data_offset = normalize_data_offset(h.data_offset).ok_or(
            ParseError::OffsetOutOfRange {
                offset: u64::from(h.data_offset) + u64::from(DATA_OFFSET_BASE),
                available: bytes.len() as u64,
                context: "data_offset",
            },
        )?;
        h.loop_offset = normalize_loop_offset(h.loop_offset, h.data_offset);

        // Fields overlapping the command data read as zero, and the extended
        // block only exists in newer versions.
        let data_start = h.data_offset as usize;
        let extended = h.version > EXTENDED_HEADER_VERSION;
        let field = |off: usize| -> u32 {
            if off + 4 > data_start || (off >= EXTENDED_FIELDS_START && !extended) {
                0
            } else {
                word(off)
            }
        };

        h.sega_pcm_clock = field(0x38);
        h.sega_pcm_interface = field(0x3C);
        h.rf5c68_clock = field(0x40);
        h.ym2203_clock = field(0x44);
        h.ym2608_clock = field(0x48);
        h.ym2610_clock = field(0x4C);
        h.ym3812_clock = field(0x50);
        h.ym3526_clock = field(0x54);
        h.y8950_clock = field(0x58);
        h.ymf262_clock = field(0x5C);
        h.ymf278b_clock = field(0x60);
        h.ymf271_clock = field(0x64);
        h.ymz280b_clock = field(0x68);
        h.rf5c164_clock = field(0x6C);
        h.pwm_clock = field(0x70);
        h.ay8910_clock = field(0x74);
        h.ay8910_flags = field(0x78);
        h.volume_loop_modifiers = field(0x7C);
        h.gb_dmg_clock = field(0x80);
        h.nes_apu_clock = field(0x84);
        h.multipcm_clock = field(0x88);
        h.upd7759_clock = field(0x8C);
        h.okim6258_clock = field(0x90);
        h.okim6258_flags = field(0x94);
        h.okim6295_clock = field(0x98);
        h.k051649_clock = field(0x9C);
        h.k054539_clock = field(0xA0);
        h.huc6280_clock = field(0xA4);
        h.c140_clock = field(0xA8);
        h.k053260_clock = field(0xAC);
        h.pokey_clock = field(0xB0);
        h.qsound_clock = field(0xB4);
        h.scsp_clock = field(0xB8);
        h.extra_header_offset = field(0xBC);
        h.wonderswan_clock = field(0xC0);
        h.vsu_clock = field(0xC4);
        h.saa1099_clock = field(0xC8);

        Ok(h)
    }

    /// True when the magic identifier spells `"Vgm "`.
    pub fn verify(&self) -> bool {
        self.ident == VGM_IDENT
    }

    /// Absolute position of the GD3 metadata tag, if the header declares one.
    pub fn gd3_position(&self) -> Option<u64> {
        (self.gd3_offset != 0).then(|| u64::from(self.gd3_offset) + u64::from(GD3_OFFSET_BASE))
    }

    /// Serialize the header into `data_offset` bytes (at least
    /// `MIN_HEADER_SIZE`), re-encoding the absolute offsets as the relative
    /// fields stored in the file. Fields that do not fit before the data
    /// start are dropped, as are extended fields for old versions.
    #[rustfmt::skip]
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = (self.data_offset as usize).max(MIN_HEADER_SIZE);
        let mut buf = vec![0u8; len];
        let extended = self.version > EXTENDED_HEADER_VERSION;
        let mut put = |off: usize, v: u32| {
            let fits = off + 4 <= len;
            if fits && (off < EXTENDED_FIELDS_START || extended) {
                write_u32(&mut buf, off, v);
            }
        };

        let data_field = if self.data_offset == LEGACY_DATA_START {
            LEGACY_DATA_OFFSET
        } else {
            self.data_offset.wrapping_sub(DATA_OFFSET_BASE)
        };
        let loop_field = if self.loop_offset == self.data_offset || self.loop_offset == 0 {
            0
        } else {
            self.loop_offset.wrapping_sub(LOOP_OFFSET_BASE)
        };

        put(0x00, self.ident);
        put(0x04, self.eof_offset);
        put(0x08, self.version);
        put(0x0C, self.sn76489_clock);
        put(0x10, self.ym2413_clock);
        put(0x14, self.gd3_offset);
        put(0x18, self.total_samples);
        put(0x1C, loop_field);
        put(0x20, self.loop_samples);
        put(0x24, self.rate);
        put(0x28, self.sn76489_flags);
        put(0x2C, self.ym2612_clock);
        put(0x30, self.ym2151_clock);
        put(0x34, data_field);
        put(0x38, self.sega_pcm_clock);
        put(0x3C, self.sega_pcm_interface);
        put(0x40, self.rf5c68_clock);
        put(0x44, self.ym2203_clock);
        put(0x48, self.ym2608_clock);
        put(0x4C, self.ym2610_clock);
        put(0x50, self.ym3812_clock);
        put(0x54, self.ym3526_clock);
        put(0x58, self.y8950_clock);
        put(0x5C, self.ymf262_clock);
        put(0x60, self.ymf278b_clock);
        put(0x64, self.ymf271_clock);
        put(0x68, self.ymz280b_clock);
        put(0x6C, self.rf5c164_clock);
        put(0x70, self.pwm_clock);
        put(0x74, self.ay8910_clock);
        put(0x78, self.ay8910_flags);
        put(0x7C, self.volume_loop_modifiers);
        put(0x80, self.gb_dmg_clock);
        put(0x84, self.nes_apu_clock);
        put(0x88, self.multipcm_clock);
        put(0x8C, self.upd7759_clock);
        put(0x90, self.okim6258_clock);
        put(0x94, self.okim6258_flags);
        put(0x98, self.okim6295_clock);
        put(0x9C, self.k051649_clock);
        put(0xA0, self.k054539_clock);
        put(0xA4, self.huc6280_clock);
        put(0xA8, self.c140_clock);
        put(0xAC, self.k053260_clock);
        put(0xB0, self.pokey_clock);
        put(0xB4, self.qsound_clock);
        put(0xB8, self.scsp_clock);
        put(0xBC, self.extra_header_offset);
        put(0xC0, self.wonderswan_clock);
        put(0xC4, self.vsu_clock);
        put(0xC8, self.saa1099_clock);

        buf
    }

    fn zeroed() -> Self {
        VgmHeader {
            ident: 0,
            version: 0,
            loop_offset: 0,
            data_offset: 0,
            ..VgmHeader::default()
        }
    }
}

impl TryFrom<&[u8]> for VgmHeader {
    type Error = ParseError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        VgmHeader::from_image(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_and_zero_data_offsets_start_at_0x40() {
        assert_eq!(normalize_data_offset(0x0C), Some(0x40));
        assert_eq!(normalize_data_offset(0x00), Some(0x40));
        assert_eq!(normalize_data_offset(0xCC), Some(0x100));
        assert_eq!(normalize_data_offset(u32::MAX - 0x10), None);
    }

    #[test]
    fn loop_offset_defaults_to_data_start() {
        assert_eq!(normalize_loop_offset(0, 0x100), 0x100);
        assert_eq!(normalize_loop_offset(0x24, 0x40), 0x40);
        assert_eq!(normalize_loop_offset(0x100, 0x40), 0x11C);
    }

    #[test]
    fn to_bytes_drops_fields_overlapping_data() {
        let h = VgmHeader {
            data_offset: 0x40,
            loop_offset: 0x40,
            rf5c68_clock: 1234,
            ..VgmHeader::default()
        };
        let bytes = h.to_bytes();
        assert_eq!(bytes.len(), 0x40);
        assert_eq!(read_u32_le_at(&bytes, 0x34), Some(LEGACY_DATA_OFFSET));
        assert_eq!(read_u32_le_at(&bytes, 0x1C), Some(0));
    }
}
