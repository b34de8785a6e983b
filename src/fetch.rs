// src/fetch.rs

//! Per-source fetch lifecycle
//!
//! A source is fetched at most once: if its cached file already exists
//! it is only re-verified, so repeated builds of the same recipe do no
//! network I/O. Verification failures never delete the offending file;
//! it is left in place for inspection.

use crate::error::{Error, Result};
use crate::fsutil::ensure_dir;
use crate::hash;
use crate::recipe::{Recipe, Source};
use crate::transport::{fetch_file, Protocol, Transport};
use std::path::Path;
use tracing::{debug, info};

/// Fetch and verify a single source into the cache directory.
///
/// Cache hit: the existing file is digest-verified and reused. Cache
/// miss: the source is fetched over its protocol, then verified. Either
/// way a digest mismatch is surfaced with both digests.
pub fn fetch_source(source: &Source, cache: &Path, transport: &dyn Transport) -> Result<()> {
    ensure_dir(cache)?;

    if source.save_path().exists() {
        debug!("cache hit for {}", source.save_path().display());
        return hash::verify_file(source.save_path(), &source.b3sum);
    }

    match source.protocol {
        Some(Protocol::File) => {
            info!("copying {}", source.src_path);
            fetch_file(&source.src_path, source.save_path())?;
        }
        Some(Protocol::Http) => {
            info!("downloading {}", source.url);
            transport.fetch(&source.url, source.save_path())?;
        }
        None => return Err(Error::MissingScheme),
    }

    hash::verify_file(source.save_path(), &source.b3sum)
}

/// Fetch every source of a recipe, in recipe order.
///
/// Does not short-circuit: a misconfigured recipe often has several bad
/// sources, and surfacing them together avoids fix-one-rerun churn. The
/// returned list is empty on success.
pub fn fetch_sources(recipe: &Recipe, transport: &dyn Transport) -> Vec<Error> {
    let mut errors = Vec::new();
    for source in &recipe.sources {
        if let Err(e) = fetch_source(source, recipe.source_cache(), transport) {
            errors.push(e);
        }
    }
    errors
}
