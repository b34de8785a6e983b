// src/hash.rs

//! BLAKE3 digests for source file integrity
//!
//! The digest is the only defense against source substitution: every
//! cached file is verified on cache hit (corruption, poisoned cache) and
//! again after download (tampering in transit). Digests are BLAKE3-256,
//! rendered as 64 lowercase hex characters.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Hex length of a BLAKE3-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// Compute the BLAKE3-256 digest of a reader, consuming it to EOF.
///
/// The contents are streamed through the hasher; nothing is buffered in
/// full.
pub fn digest<R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Compute the BLAKE3-256 digest of a file.
///
/// The file handle is closed before returning.
pub fn digest_file(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    digest(file)
}

/// Verify that a file's digest matches the expected hex string.
///
/// Comparison is case-insensitive. On mismatch the returned error
/// carries both the expected and the actual digest.
pub fn verify_file(path: &Path, expected: &str) -> Result<()> {
    debug!("validating {}", path.display());
    let actual = digest_file(path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(Error::DigestMismatch {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}
