use chipstream::binutil::ParseError;
use chipstream::source::{ByteSource, MemorySource};
use chipstream::vgm::{LEGACY_DATA_START, VgmHeader};

fn image(len: usize, fields: &[(usize, u32)]) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    bytes[0..4].copy_from_slice(b"Vgm ");
    for &(off, v) in fields {
        bytes[off..off + 4].copy_from_slice(&v.to_le_bytes());
    }
    bytes
}

#[test]
fn test_legacy_header_normalizes_to_0x40() {
    let bytes = image(0x100, &[(0x04, 0x100), (0x08, 0x150), (0x34, 0x0C), (0x1C, 0)]);
    let mut src = MemorySource::from_bytes(bytes);
    let header = VgmHeader::parse(&mut src).unwrap();
    assert_eq!(header.data_offset, 0x40);
    assert_eq!(header.loop_offset, 0x40);
    assert_eq!(header.version, 0x150);
    assert!(header.verify());
}

#[test]
fn test_explicit_offsets_are_made_absolute() {
    let bytes = image(0x200, &[(0x08, 0x171), (0x34, 0xCC), (0x1C, 0xF0)]);
    let header = VgmHeader::try_from(bytes.as_slice()).unwrap();
    assert_eq!(header.data_offset, 0x100);
    assert_eq!(header.loop_offset, 0x10C);
}

#[test]
fn test_zero_loop_field_loops_to_data_start() {
    let bytes = image(0x200, &[(0x08, 0x171), (0x34, 0xCC)]);
    let header = VgmHeader::try_from(bytes.as_slice()).unwrap();
    assert_eq!(header.loop_offset, header.data_offset);
}

#[test]
fn test_extended_fields_need_newer_version() {
    let fields = [(0x34, 0xCC), (0x80, 4_194_304), (0x44, 3_000_000)];

    let mut old = image(0x100, &fields);
    old[0x08..0x0C].copy_from_slice(&0x151_u32.to_le_bytes());
    let header = VgmHeader::try_from(old.as_slice()).unwrap();
    assert_eq!(header.gb_dmg_clock, 0);
    assert_eq!(header.ym2203_clock, 3_000_000);

    let mut new = image(0x100, &fields);
    new[0x08..0x0C].copy_from_slice(&0x161_u32.to_le_bytes());
    let header = VgmHeader::try_from(new.as_slice()).unwrap();
    assert_eq!(header.gb_dmg_clock, 4_194_304);
}

#[test]
fn test_fields_overlapping_data_read_as_zero() {
    // data starts at 0x40, so 0x44 is a command byte, not a clock
    let bytes = image(0x80, &[(0x08, 0x171), (0x34, 0x0C), (0x44, 0x12345678)]);
    let header = VgmHeader::try_from(bytes.as_slice()).unwrap();
    assert_eq!(header.data_offset, LEGACY_DATA_START);
    assert_eq!(header.ym2203_clock, 0);
}

#[test]
fn test_short_data_offset_hides_sega_pcm_fields() {
    // raw 0x04 puts the data at 0x38, over the Sega PCM clock and interface
    let bytes = image(0x80, &[(0x08, 0x150), (0x34, 0x04), (0x38, 0xDEADBEEF), (0x3C, 0x0000F000)]);
    let header = VgmHeader::try_from(bytes.as_slice()).unwrap();
    assert_eq!(header.data_offset, 0x38);
    assert_eq!(header.sega_pcm_clock, 0);
    assert_eq!(header.sega_pcm_interface, 0);
}

#[test]
fn test_sega_pcm_fields_read_below_data_start() {
    let bytes = image(0x80, &[(0x08, 0x150), (0x34, 0x0C), (0x38, 4_000_000), (0x3C, 0x0000F000)]);
    let header = VgmHeader::try_from(bytes.as_slice()).unwrap();
    assert_eq!(header.sega_pcm_clock, 4_000_000);
    assert_eq!(header.sega_pcm_interface, 0x0000F000);
}

#[test]
fn test_overflowing_data_offset_is_rejected() {
    let bytes = image(0x80, &[(0x08, 0x171), (0x34, 0xFFFF_FFF0)]);
    let err = VgmHeader::try_from(bytes.as_slice()).unwrap_err();
    match err {
        ParseError::OffsetOutOfRange { offset, available, context } => {
            assert_eq!(offset, 0xFFFF_FFF0 + 0x34);
            assert_eq!(available, 0x80);
            assert_eq!(context, "data_offset");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_short_source_is_rejected() {
    let mut src = MemorySource::from_bytes(vec![0x56, 0x67, 0x6D, 0x20, 0, 0]);
    let err = VgmHeader::parse(&mut src).unwrap_err();
    assert!(matches!(
        err,
        ParseError::HeaderTooShort {
            needed: 0x40,
            available: 6
        }
    ));
}

#[test]
fn test_data_offset_past_end_is_rejected() {
    let bytes = image(0x80, &[(0x08, 0x171), (0x34, 0x1000)]);
    let mut src = MemorySource::from_bytes(bytes);
    let err = VgmHeader::parse(&mut src).unwrap_err();
    assert!(matches!(err, ParseError::OffsetOutOfRange { context: "data_offset", .. }));
}

#[test]
fn test_bad_magic_fails_verify() {
    let mut bytes = image(0x100, &[(0x08, 0x171), (0x34, 0xCC)]);
    bytes[0..4].copy_from_slice(b"RIFF");
    let header = VgmHeader::try_from(bytes.as_slice()).unwrap();
    assert!(!header.verify());
}

#[test]
fn test_round_trip_explicit_offsets() {
    let header = VgmHeader {
        eof_offset: 0x1234,
        total_samples: 44_100,
        loop_offset: 0x180,
        loop_samples: 22_050,
        rate: 60,
        ym2151_clock: 3_579_545,
        sn76489_clock: 3_579_545,
        ym2203_clock: 1_500_000,
        ay8910_clock: 1_789_772,
        okim6295_clock: 1_000_000,
        saa1099_clock: 8_000_000,
        ..VgmHeader::default()
    };
    let bytes = header.to_bytes();
    assert_eq!(bytes.len(), 0x100);
    assert_eq!(VgmHeader::try_from(bytes.as_slice()).unwrap(), header);
}

#[test]
fn test_round_trip_legacy_offsets() {
    let header = VgmHeader {
        version: 0x110,
        data_offset: 0x40,
        loop_offset: 0x40,
        total_samples: 735,
        ym2151_clock: 3_579_545,
        ..VgmHeader::default()
    };
    let bytes = header.to_bytes();
    assert_eq!(bytes.len(), 0x40);
    assert_eq!(&bytes[0x34..0x38], &0x0C_u32.to_le_bytes());
    assert_eq!(&bytes[0x1C..0x20], &0_u32.to_le_bytes());
    assert_eq!(VgmHeader::try_from(bytes.as_slice()).unwrap(), header);
}

#[test]
fn test_parse_leaves_cursor_after_header_image() {
    let bytes = image(0x200, &[(0x08, 0x171), (0x34, 0xCC)]);
    let mut src = MemorySource::from_bytes(bytes);
    VgmHeader::parse(&mut src).unwrap();
    assert_eq!(src.position(), 0xCC);
}
