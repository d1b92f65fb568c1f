//! Directory-backed track library.
//!
//! Every regular file in the directory is a track, in file-name order.
//! `.vgz` files are decompressed into memory when opened; plain files are
//! streamed straight from disk.
use std::fs::{self, File};
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chipstream::{ByteSource, IoSource, MemorySource, TrackLibrary};
use flate2::read::GzDecoder;
use log::debug;

/// Volume bookkeeping directory some hosts create on removable media.
pub const HIDDEN_VOLUME_ENTRY: &str = "System Volume Information";

pub struct DirLibrary {
    root: PathBuf,
    entries: Vec<(String, PathBuf)>,
}

impl DirLibrary {
    pub fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        let mut entries = Vec::new();
        for entry in fs::read_dir(&root)
            .with_context(|| format!("failed to read directory: {}", root.display()))?
        {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == HIDDEN_VOLUME_ENTRY || !entry.file_type()?.is_file() {
                debug!("skipping {name}");
                continue;
            }
            entries.push((name, entry.path()));
        }
        entries.sort();
        Ok(DirLibrary { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TrackLibrary for DirLibrary {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn name(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(name, _)| name.as_str())
    }

    fn open(&self, index: usize) -> io::Result<Box<dyn ByteSource>> {
        let (_, path) = self.entries.get(index).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no track at index {index}"))
        })?;
        if is_gzip_path(path) {
            let mut out = Vec::new();
            GzDecoder::new(File::open(path)?).read_to_end(&mut out)?;
            return Ok(Box::new(MemorySource::from_bytes(out)));
        }
        Ok(Box::new(IoSource::new(BufReader::new(File::open(path)?))?))
    }
}

fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("vgz") || ext.eq_ignore_ascii_case("gz"))
}

/// Read a whole track into memory, decompressing gzip by extension or by
/// magic bytes.
pub fn load_bytes(path: &Path) -> anyhow::Result<Vec<u8>> {
    let data =
        fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))?;
    let is_gzip = is_gzip_path(path) || data.starts_with(&[0x1F, 0x8B]);
    if !is_gzip {
        return Ok(data);
    }
    let mut out = Vec::new();
    GzDecoder::new(Cursor::new(data))
        .read_to_end(&mut out)
        .context("gzip decompression failed")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipstream::{VgmBuilder, VgmHeader};
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    fn vgm() -> Vec<u8> {
        let mut b = VgmBuilder::new();
        b.ym2151_write(0x08, 0x00).wait_735();
        b.finalize()
    }

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn lists_files_sorted_and_skips_volume_info() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.vgm"), vgm()).unwrap();
        fs::write(dir.path().join("a.vgz"), gzip(&vgm())).unwrap();
        fs::create_dir(dir.path().join(HIDDEN_VOLUME_ENTRY)).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let lib = DirLibrary::open(dir.path()).unwrap();
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.name(0), Some("a.vgz"));
        assert_eq!(lib.name(1), Some("b.vgm"));
        assert_eq!(lib.position(" b.vgm "), Some(1));
    }

    #[test]
    fn opens_plain_and_compressed_tracks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.vgz"), gzip(&vgm())).unwrap();
        fs::write(dir.path().join("b.vgm"), vgm()).unwrap();
        let lib = DirLibrary::open(dir.path()).unwrap();

        for index in 0..lib.len() {
            let mut src = lib.open(index).unwrap();
            assert_eq!(src.size(), vgm().len() as u64);
            let header = VgmHeader::parse(&mut src).unwrap();
            assert!(header.verify());
        }
    }

    #[test]
    fn load_bytes_detects_gzip_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("packed.bin");
        fs::write(&path, gzip(&vgm())).unwrap();
        assert_eq!(load_bytes(&path).unwrap(), vgm());
    }
}
