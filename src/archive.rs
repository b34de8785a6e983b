// src/archive.rs

//! Archive format detection and extraction
//!
//! Formats are identified by magic bytes rather than file extension, so a
//! mislabelled download is caught instead of misparsed. Tarballs are
//! streamed through the matching decompressor; nothing is buffered in
//! full.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Bytes of header needed for detection. The tar magic ("ustar") sits at
/// offset 257, so 262 bytes cover every supported format.
const HEADER_LEN: usize = 262;

/// Offset of the "ustar" magic within a tar header
const TAR_MAGIC_OFFSET: usize = 257;

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Gzip-compressed tarball (.tar.gz, .tgz)
    Gzip,
    /// Bzip2-compressed tarball (.tar.bz2, .tbz2)
    Bzip2,
    /// XZ-compressed tarball (.tar.xz, .txz)
    Xz,
    /// Uncompressed tarball (.tar)
    Tar,
    /// Zip archive (.zip)
    Zip,
}

impl ArchiveFormat {
    /// Detect the archive format from the first bytes of a file.
    ///
    /// Magic bytes:
    /// - Gzip: `1f 8b`
    /// - Bzip2: `42 5a 68` ("BZh")
    /// - XZ: `fd 37 7a 58 5a 00`
    /// - Zip: `50 4b` followed by `03 04`, `05 06` or `07 08`
    /// - Tar: "ustar" at offset 257
    pub fn detect(header: &[u8]) -> Option<Self> {
        if header.len() >= 2 && header[0] == 0x1f && header[1] == 0x8b {
            return Some(Self::Gzip);
        }
        if header.len() >= 3 && header[..3] == *b"BZh" {
            return Some(Self::Bzip2);
        }
        if header.len() >= 6 && header[..6] == [0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00] {
            return Some(Self::Xz);
        }
        if header.len() >= 4
            && header[..2] == *b"PK"
            && matches!(&header[2..4], [0x03, 0x04] | [0x05, 0x06] | [0x07, 0x08])
        {
            return Some(Self::Zip);
        }
        if header.len() >= TAR_MAGIC_OFFSET + 5
            && header[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + 5] == *b"ustar"
        {
            return Some(Self::Tar);
        }
        None
    }

    /// Human-readable format name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
            Self::Tar => "tar",
            Self::Zip => "zip",
        }
    }
}

/// Extract an archive into `target_dir`.
///
/// The format is autodetected from the file's magic bytes. File modes and
/// symlinks within the archive are preserved. Unrecognized files fail
/// with [`Error::UnsupportedArchive`] naming the offending path.
pub fn extract_archive(file_path: &Path, target_dir: &Path) -> Result<()> {
    let mut file = File::open(file_path)?;

    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        let n = file.read(&mut header[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    file.seek(SeekFrom::Start(0))?;

    let format = ArchiveFormat::detect(&header[..filled])
        .ok_or_else(|| Error::UnsupportedArchive(file_path.display().to_string()))?;
    debug!("extracting {} ({})", file_path.display(), format.name());

    match format {
        ArchiveFormat::Gzip => unpack_tar(flate2::read::GzDecoder::new(file), target_dir),
        ArchiveFormat::Bzip2 => unpack_tar(bzip2::read::BzDecoder::new(file), target_dir),
        ArchiveFormat::Xz => unpack_tar(xz2::read::XzDecoder::new(file), target_dir),
        ArchiveFormat::Tar => unpack_tar(file, target_dir),
        ArchiveFormat::Zip => {
            let mut archive = zip::ZipArchive::new(file).map_err(io::Error::other)?;
            archive.extract(target_dir).map_err(io::Error::other)?;
            Ok(())
        }
    }
}

fn unpack_tar<R: Read>(reader: R, target_dir: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.unpack(target_dir)?;
    Ok(())
}
