//! Programmatic construction of VGM files.
//!
//! `VgmBuilder` appends raw command bytes and computes the derived header
//! fields (`total_samples`, `loop_offset`, `gd3_offset`, `eof_offset`) when
//! finalized. It is what the tests and the command line tools use to
//! synthesize tracks; no attempt is made to validate the command stream.
use crate::meta::Gd3;
use crate::vgm::header::{GD3_OFFSET_BASE, MIN_HEADER_SIZE, VgmHeader, WAIT_NTSC_FRAME, WAIT_PAL_FRAME};

/// Builder for a complete VGM file image.
///
/// The header starts from [`VgmHeader::default`]: version 1.71 with the
/// command data at 0x100. Command methods return `&mut Self` for chaining.
#[derive(Debug, Clone, Default)]
pub struct VgmBuilder {
    header: VgmHeader,
    commands: Vec<u8>,
    loop_index: Option<usize>,
    total_samples: u32,
    gd3: Option<Gd3>,
}

impl VgmBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct access to the header. `data_offset` is absolute here; the
    /// derived fields are overwritten by [`finalize`](Self::finalize).
    pub fn header_mut(&mut self) -> &mut VgmHeader {
        &mut self.header
    }

    pub fn set_version(&mut self, version: u32) -> &mut Self {
        self.header.version = version;
        self
    }

    pub fn set_ym2151_clock(&mut self, hz: u32) -> &mut Self {
        self.header.ym2151_clock = hz;
        self
    }

    pub fn ym2151_write(&mut self, address: u8, data: u8) -> &mut Self {
        self.commands.extend_from_slice(&[0x54, address, data]);
        self
    }

    pub fn wait_samples(&mut self, samples: u16) -> &mut Self {
        self.commands.push(0x61);
        self.commands.extend_from_slice(&samples.to_le_bytes());
        self.add_samples(samples)
    }

    pub fn wait_735(&mut self) -> &mut Self {
        self.commands.push(0x62);
        self.add_samples(WAIT_NTSC_FRAME)
    }

    pub fn wait_882(&mut self) -> &mut Self {
        self.commands.push(0x63);
        self.add_samples(WAIT_PAL_FRAME)
    }

    /// `0x7n` short wait. `samples` is clamped to `1..=16`.
    pub fn wait_short(&mut self, samples: u8) -> &mut Self {
        let samples = samples.clamp(1, 16);
        self.commands.push(0x70 | (samples - 1));
        self.add_samples(u16::from(samples))
    }

    /// `0x67 0x66 tt ssssssss` data block followed by its payload.
    pub fn data_block(&mut self, data_type: u8, payload: &[u8]) -> &mut Self {
        self.commands.extend_from_slice(&[0x67, 0x66, data_type]);
        self.commands
            .extend_from_slice(&(payload.len() as u32).to_le_bytes());
        self.commands.extend_from_slice(payload);
        self
    }

    /// Append bytes verbatim. Waits inside them are not counted.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.commands.extend_from_slice(bytes);
        self
    }

    /// Make the next appended command the loop target.
    pub fn mark_loop(&mut self) -> &mut Self {
        self.loop_index = Some(self.commands.len());
        self
    }

    pub fn set_gd3(&mut self, gd3: Gd3) -> &mut Self {
        self.gd3 = Some(gd3);
        self
    }

    /// Number of command bytes appended so far.
    pub fn command_len(&self) -> usize {
        self.commands.len()
    }

    /// Assemble the file: header, commands, the `0x66` end marker and the
    /// Gd3 chunk when one was set.
    pub fn finalize(self) -> Vec<u8> {
        let VgmBuilder {
            mut header,
            commands,
            loop_index,
            total_samples,
            gd3,
        } = self;

        header.data_offset = header.data_offset.max(MIN_HEADER_SIZE as u32);
        header.total_samples = total_samples;
        header.loop_offset = match loop_index {
            Some(index) => header.data_offset + index as u32,
            None => header.data_offset,
        };

        let gd3_start = header.data_offset as usize + commands.len() + 1;
        let gd3_bytes = gd3.map(|g| g.to_bytes()).unwrap_or_default();
        header.gd3_offset = if gd3_bytes.is_empty() {
            0
        } else {
            gd3_start as u32 - GD3_OFFSET_BASE
        };
        header.eof_offset = (gd3_start + gd3_bytes.len()) as u32 - 4;

        let mut out = header.to_bytes();
        out.extend_from_slice(&commands);
        out.push(0x66);
        out.extend_from_slice(&gd3_bytes);
        out
    }

    fn add_samples(&mut self, samples: u16) -> &mut Self {
        self.total_samples = self.total_samples.saturating_add(u32::from(samples));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finalize_lays_out_header_and_commands() {
        let mut b = VgmBuilder::new();
        b.set_ym2151_clock(3_579_545);
        b.ym2151_write(0x08, 0x00).wait_735();
        let bytes = b.finalize();

        assert_eq!(bytes.len(), 0x100 + 5);
        assert_eq!(&bytes[0x100..], &[0x54, 0x08, 0x00, 0x62, 0x66]);

        let header = VgmHeader::from_image(&bytes).unwrap();
        assert!(header.verify());
        assert_eq!(header.data_offset, 0x100);
        assert_eq!(header.loop_offset, 0x100);
        assert_eq!(header.total_samples, 735);
        assert_eq!(header.ym2151_clock, 3_579_545);
        assert_eq!(header.eof_offset as usize, bytes.len() - 4);
        assert_eq!(header.gd3_position(), None);
    }

    #[test]
    fn loop_mark_points_at_next_command() {
        let mut b = VgmBuilder::new();
        b.wait_short(2).mark_loop().wait_samples(1000);
        let bytes = b.finalize();
        let header = VgmHeader::from_image(&bytes).unwrap();
        assert_eq!(header.loop_offset, 0x101);
        assert_eq!(bytes[header.loop_offset as usize], 0x61);
        assert_eq!(header.total_samples, 1002);
    }

    #[test]
    fn gd3_chunk_follows_end_marker() {
        let mut b = VgmBuilder::new();
        b.set_gd3(Gd3 {
            track_name: "Opening".into(),
            version: 0x100,
            ..Gd3::default()
        });
        let bytes = b.finalize();
        let header = VgmHeader::from_image(&bytes).unwrap();
        let pos = header.gd3_position().unwrap() as usize;
        assert_eq!(pos, 0x101);
        assert_eq!(&bytes[pos..pos + 4], b"Gd3 ");
    }
}
