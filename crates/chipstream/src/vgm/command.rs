//! Opcode table of the VGM command stream.
//!
//! `Opcode::from(u8)` classifies one command byte. The interpreter matches on
//! the result exhaustively; every byte outside the known families becomes
//! `Opcode::Unknown` and is reported as a soft command error.

/// One decoded command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// `0x54 aa dd`: YM2151 register write.
    Ym2151Write,
    /// `0x61 nn nn`: wait a 16-bit number of samples.
    WaitSamples,
    /// `0x62`: wait one 60 Hz frame (735 samples).
    Wait735,
    /// `0x63`: wait one 50 Hz frame (882 samples).
    Wait882,
    /// `0x66`: end of the command data; restart at the loop point.
    EndOfData,
    /// `0x67 0x66 tt ss ss ss ss`: data block, skipped.
    DataBlock,
    /// `0x7n`: wait `n + 1` samples. Holds the resulting sample count.
    WaitShort(u8),
    /// `0x8n`: YM2612 DAC write then wait `n` samples. Holds the count.
    Ym2612DacWait(u8),
    /// `0xB0..=0xBF aa dd`: secondary chip write, acknowledged and ignored.
    SecondaryWrite(u8),
    /// `0xC0..=0xC3 aaaa dd`: Sega PCM family write, ignored.
    SegaPcmWrite(u8),
    /// Any other documented chip write; `operands` bytes are skipped.
    ForeignWrite { opcode: u8, operands: u8 },
    /// Not a known command.
    Unknown(u8),
}

impl From<u8> for Opcode {
    fn from(byte: u8) -> Self {
        let foreign = |operands: u8| Opcode::ForeignWrite {
            opcode: byte,
            operands,
        };
        match byte {
            0x54 => Opcode::Ym2151Write,
            0x61 => Opcode::WaitSamples,
            0x62 => Opcode::Wait735,
            0x63 => Opcode::Wait882,
            0x66 => Opcode::EndOfData,
            0x67 => Opcode::DataBlock,
            0x70..=0x7F => Opcode::WaitShort((byte & 0x0F) + 1),
            0x80..=0x8F => Opcode::Ym2612DacWait(byte & 0x0F),
            0xB0..=0xBF => Opcode::SecondaryWrite(byte),
            0xC0..=0xC3 => Opcode::SegaPcmWrite(byte),
            // SN76489 stereo / second-chip writes and other one-operand chips
            0x30..=0x3F | 0x4F | 0x50 => foreign(1),
            0x40..=0x4E | 0x51..=0x53 | 0x55..=0x5F | 0xA0..=0xAF => foreign(2),
            0xC4..=0xDF => foreign(3),
            0xE0..=0xFF => foreign(4),
            // DAC stream control
            0x90 | 0x91 | 0x95 => foreign(4),
            0x92 => foreign(5),
            0x93 => foreign(10),
            0x94 => foreign(1),
            // PCM RAM write
            0x68 => foreign(11),
            other => Opcode::Unknown(other),
        }
    }
}

impl Opcode {
    /// Operand bytes following the opcode that are discarded without
    /// interpretation, or `None` for commands with their own handling.
    pub fn skipped_operands(self) -> Option<u8> {
        match self {
            Opcode::SecondaryWrite(_) => Some(2),
            Opcode::SegaPcmWrite(_) => Some(3),
            Opcode::ForeignWrite { operands, .. } => Some(operands),
            _ => None,
        }
    }
}
