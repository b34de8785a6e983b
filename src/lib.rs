// src/lib.rs

//! Mere: reproducible source package builds
//!
//! Given a declarative recipe naming a package, its sources (each pinned
//! by a BLAKE3 digest) and three shell stages, the engine fetches and
//! verifies the sources, materializes an isolated working tree and runs
//! the stages against it. A successful run is a deterministic function
//! of the recipe bytes, the upstream bytes at the verified digests and
//! the local shell.
//!
//! # Architecture
//!
//! - Recipe ingestion: YAML/JSON, schema-validated against the reflected
//!   [`Recipe`] type, then template-rendered (`{{.Version}}` and friends)
//! - Source acquisition: cached by filename under `~/.mere/src`,
//!   verified by BLAKE3 on both cache hit and miss
//! - Materialization: per-build temp tree with `build/`, `package/`,
//!   `source/` subdirectories
//! - Stages: `build`, `test`, `install` run under `/bin/sh` with a
//!   curated two-variable environment

pub mod archive;
pub mod build;
mod error;
pub mod fetch;
pub mod fsutil;
pub mod hash;
pub mod recipe;
pub mod stage;
pub mod transport;

pub use build::Engine;
pub use error::{Error, Result};
pub use recipe::{PackageSubset, Recipe, Source};
pub use transport::{HttpClient, Protocol, Transport};
