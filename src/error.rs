// src/error.rs

//! Central error type for the build engine
//!
//! Every library module surfaces failures through this enum. Causes are
//! preserved so callers can chain messages; nothing in here retries.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes surfaced by the engine
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid recipe data: {0}")]
    Json(#[from] serde_json::Error),

    /// Aggregated schema violations, one per line
    #[error("invalid recipe file: {path}\n\t{violations}")]
    Schema { path: String, violations: String },

    /// Aggregated template rendering failures
    #[error("rendering error: {0}")]
    Template(String),

    #[error("invalid source url: missing protocol scheme")]
    MissingScheme,

    #[error("invalid source url: unsupported protocol scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid source url: no path element detected")]
    NoPathElement,

    #[error("invalid source url: {0}")]
    Url(#[from] url::ParseError),

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("received an HTTP error: {code} {reason}")]
    HttpStatus { code: u16, reason: String },

    #[error("b3sum mismatch:\n\texpected: {expected}\n\tactual:   {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("not a supported archive: {0}")]
    UnsupportedArchive(String),

    #[error("stage {stage} failed with exit status {status}")]
    StageFailed { stage: String, status: i32 },

    /// Wraps the errors collected while fetching sources
    #[error("build error: [{}]", join_errors(.0))]
    Build(Vec<Error>),
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
