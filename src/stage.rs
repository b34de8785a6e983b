// src/stage.rs

//! Shell stage execution
//!
//! Each non-empty stage runs as `/bin/sh -c` with `set -e` prepended, so
//! the first failing command aborts the stage. The child environment
//! contains exactly `MERE_PKGDIR` and `MERE_SRCDIR` and nothing else:
//! no PATH, no HOME. A recipe that needs PATH must set it itself, which
//! keeps stage behavior independent of the invoking user's environment.

use crate::error::{Error, Result};
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Directory names inside the working tree
pub(crate) const BUILD_DIR: &str = "build";
pub(crate) const PACKAGE_DIR: &str = "package";
pub(crate) const SOURCE_DIR: &str = "source";

/// Environment variables exposed to stage scripts
const ENV_PKGDIR: &str = "MERE_PKGDIR";
const ENV_SRCDIR: &str = "MERE_SRCDIR";

/// Run one stage script in the build context.
///
/// Standard output is streamed to `output`; standard error is inherited
/// from the parent. A non-zero exit surfaces as [`Error::StageFailed`]
/// with the exit status.
pub fn run_stage<W: Write>(
    name: &str,
    script: &str,
    build_context: &Path,
    working_dir: &Path,
    output: &mut W,
) -> Result<()> {
    debug!("running stage {} in {}", name, build_context.display());

    let mut child = Command::new("/bin/sh")
        .arg("-c")
        .arg(format!("set -e\n{script}"))
        .current_dir(build_context)
        .env_clear()
        .env(ENV_PKGDIR, working_dir.join(PACKAGE_DIR))
        .env(ENV_SRCDIR, working_dir.join(SOURCE_DIR))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()?;

    if let Some(mut stdout) = child.stdout.take() {
        io::copy(&mut stdout, output)?;
    }

    let status = child.wait()?;
    if !status.success() {
        return Err(Error::StageFailed {
            stage: name.to_string(),
            status: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}
