// src/build.rs

//! Build orchestration: working-tree materialization and stage sequencing
//!
//! A build materializes a throwaway tree under the system temp root:
//!
//! ```text
//! $TMPDIR/{name}-{version}-XXXX/
//!   build/      extracted primary archive; stages execute here
//!   package/    $MERE_PKGDIR, the stage install destination
//!   source/     $MERE_SRCDIR, symlinks to the cached sources
//! ```
//!
//! The tree's lifetime is scoped to one [`Engine::build_steps`] call;
//! callers invoke [`Engine::cleanup`] unconditionally afterwards, so a
//! failed build can be inspected before removal.

use crate::archive::extract_archive;
use crate::error::{Error, Result};
use crate::fetch::fetch_sources;
use crate::fsutil::ensure_dir;
use crate::recipe::Recipe;
use crate::stage::{run_stage, BUILD_DIR, PACKAGE_DIR, SOURCE_DIR};
use crate::transport::{HttpClient, Transport};
use std::fs;
use std::io::{self, Write};
use std::os::unix;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Drives a recipe through fetch, materialization and the three stages.
///
/// The transport and the stage output writer are injected so tests can
/// run builds without a network or a terminal.
pub struct Engine<W: Write = io::Stdout> {
    transport: Box<dyn Transport>,
    output: W,
}

impl Engine {
    /// Production engine: real HTTP client, stage output on stdout.
    pub fn new() -> Result<Self> {
        Ok(Self {
            transport: Box::new(HttpClient::new()?),
            output: io::stdout(),
        })
    }
}

impl<W: Write> Engine<W> {
    /// Engine with an explicit transport and stage output writer.
    pub fn with_parts(transport: Box<dyn Transport>, output: W) -> Self {
        Self { transport, output }
    }

    /// Execute the full build: fetch and verify all sources, materialize
    /// the working tree, then run the non-empty stages in order
    /// build, test, install.
    ///
    /// On return the working tree is still on disk; call
    /// [`Engine::cleanup`] regardless of the outcome.
    pub fn build_steps(&mut self, recipe: &mut Recipe) -> Result<()> {
        let errors = fetch_sources(recipe, self.transport.as_ref());
        if !errors.is_empty() {
            return Err(Error::Build(errors));
        }

        let working_dir = create_working_dir(recipe)?;
        recipe.working_dir = Some(working_dir.clone());
        let mut context = working_dir.join(BUILD_DIR);

        if !recipe.sources.is_empty() {
            extract_archive(recipe.sources[0].save_path(), &context)?;
            context = descend_single_dir(context)?;
        }

        for source in &recipe.sources {
            let base = source
                .save_path()
                .file_name()
                .ok_or(Error::NoPathElement)?;
            unix::fs::symlink(source.save_path(), working_dir.join(SOURCE_DIR).join(base))?;
        }

        recipe.build_context = Some(context.clone());
        info!("context directory is {}", context.display());

        let stages = [
            ("build", recipe.build.clone()),
            ("test", recipe.test.clone()),
            ("install", recipe.install.clone()),
        ];
        for (name, script) in stages {
            if script.is_empty() {
                continue;
            }
            info!("executing stage {}", name);
            run_stage(name, &script, &context, &working_dir, &mut self.output)?;
        }

        Ok(())
    }

    /// Remove the recipe's working tree.
    ///
    /// Safe to call when no tree was ever created or when it is already
    /// gone; callers invoke this on every exit path.
    pub fn cleanup(&self, recipe: &mut Recipe) -> Result<()> {
        if let Some(working_dir) = recipe.working_dir.take() {
            if working_dir.exists() {
                debug!("removing {}", working_dir.display());
                fs::remove_dir_all(&working_dir)?;
            }
        }
        recipe.build_context = None;
        Ok(())
    }

    /// Fetch and verify all sources without building.
    ///
    /// Warms the cache so a later build can run without touching the
    /// network. Returns the collected per-source errors, empty on
    /// success.
    pub fn fetch(&self, recipe: &Recipe) -> Vec<Error> {
        fetch_sources(recipe, self.transport.as_ref())
    }

    /// Consume the engine and hand back the stage output writer.
    pub fn into_output(self) -> W {
        self.output
    }
}

/// Create the per-build temporary tree with its three subdirectories.
fn create_working_dir(recipe: &Recipe) -> Result<PathBuf> {
    let name = Path::new(&recipe.name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| recipe.name.clone());
    let prefix = format!("{}-{}-", name, recipe.version);

    let working_dir = tempfile::Builder::new().prefix(&prefix).tempdir()?.keep();
    for sub in [BUILD_DIR, PACKAGE_DIR, SOURCE_DIR] {
        if let Err(e) = ensure_dir(&working_dir.join(sub)) {
            warn!("failed to populate {}: {}", working_dir.display(), e);
            return Err(e);
        }
    }
    Ok(working_dir)
}

/// Tarballs conventionally wrap everything in a single top-level
/// directory; when that is the case, the build context descends into it.
fn descend_single_dir(context: PathBuf) -> Result<PathBuf> {
    let entries = fs::read_dir(&context)?.collect::<io::Result<Vec<_>>>()?;
    if entries.len() == 1 && entries[0].file_type()?.is_dir() {
        debug!("descending into {}", entries[0].path().display());
        return Ok(entries[0].path());
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoTransport;

    impl Transport for NoTransport {
        fn fetch(&self, url: &str, _dest: &Path) -> Result<()> {
            panic!("unexpected network fetch of {url}");
        }
    }

    fn recipe_from(doc: &str, cache: &Path) -> Recipe {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(doc.as_bytes()).unwrap();
        Recipe::with_cache(file.path(), cache).unwrap()
    }

    #[test]
    fn test_create_working_dir_layout() {
        let cache = tempfile::tempdir().unwrap();
        let recipe = recipe_from("name: hello\nversion: '2.12'\nrelease: 1\n", cache.path());

        let working_dir = create_working_dir(&recipe).unwrap();
        let base = working_dir.file_name().unwrap().to_str().unwrap().to_string();
        assert!(base.starts_with("hello-2.12-"), "got: {base}");
        for sub in [BUILD_DIR, PACKAGE_DIR, SOURCE_DIR] {
            assert!(working_dir.join(sub).is_dir());
        }
        fs::remove_dir_all(working_dir).unwrap();
    }

    #[test]
    fn test_build_steps_without_sources_runs_stages() {
        let cache = tempfile::tempdir().unwrap();
        let mut recipe = recipe_from(
            "name: x\nversion: '1'\nrelease: 1\nbuild: echo hi\n",
            cache.path(),
        );

        let mut engine = Engine::with_parts(Box::new(NoTransport), Vec::new());
        engine.build_steps(&mut recipe).unwrap();
        assert_eq!(String::from_utf8(engine.output.clone()).unwrap(), "hi\n");

        engine.cleanup(&mut recipe).unwrap();
        assert!(recipe.working_dir().is_none());
    }

    #[test]
    fn test_build_error_wraps_fetch_failures() {
        let cache = tempfile::tempdir().unwrap();
        let doc = format!(
            "name: x\nversion: '1'\nrelease: 1\nsources:\n  - url: https://blergh/blargh\n    b3sum: {}\n",
            "0".repeat(64)
        );

        struct FailingTransport;
        impl Transport for FailingTransport {
            fn fetch(&self, _url: &str, _dest: &Path) -> Result<()> {
                Err(Error::HttpStatus { code: 404, reason: "Not Found".to_string() })
            }
        }

        let mut recipe = recipe_from(&doc, cache.path());
        let mut engine = Engine::with_parts(Box::new(FailingTransport), Vec::new());
        match engine.build_steps(&mut recipe).unwrap_err() {
            Error::Build(errors) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
        // No working tree was created, cleanup must still be safe.
        engine.cleanup(&mut recipe).unwrap();
    }

    #[test]
    fn test_failing_stage_surfaces_exit_status() {
        let cache = tempfile::tempdir().unwrap();
        let mut recipe = recipe_from(
            "name: x\nversion: '1'\nrelease: 1\nbuild: exit 1\n",
            cache.path(),
        );

        let mut engine = Engine::with_parts(Box::new(NoTransport), Vec::new());
        match engine.build_steps(&mut recipe).unwrap_err() {
            Error::StageFailed { stage, status } => {
                assert_eq!(stage, "build");
                assert_eq!(status, 1);
            }
            other => panic!("unexpected error: {other}"),
        }

        let working_dir = recipe.working_dir().unwrap().to_path_buf();
        assert!(working_dir.exists(), "tree is kept for inspection until cleanup");
        engine.cleanup(&mut recipe).unwrap();
        assert!(!working_dir.exists());
    }

    #[test]
    fn test_stages_run_in_order_and_empty_stages_skip() {
        let cache = tempfile::tempdir().unwrap();
        let mut recipe = recipe_from(
            "name: x\nversion: '1'\nrelease: 1\nbuild: echo one\ninstall: echo three\n",
            cache.path(),
        );

        let mut engine = Engine::with_parts(Box::new(NoTransport), Vec::new());
        engine.build_steps(&mut recipe).unwrap();
        assert_eq!(String::from_utf8(engine.output.clone()).unwrap(), "one\nthree\n");
        engine.cleanup(&mut recipe).unwrap();
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let cache = tempfile::tempdir().unwrap();
        let mut recipe = recipe_from("name: x\nversion: '1'\nrelease: 1\n", cache.path());

        let engine = Engine::with_parts(Box::new(NoTransport), Vec::new());
        engine.cleanup(&mut recipe).unwrap();
        engine.cleanup(&mut recipe).unwrap();
    }

    #[test]
    fn test_descend_single_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let inner = tmp.path().join("pkg-1.0");
        fs::create_dir(&inner).unwrap();
        assert_eq!(descend_single_dir(tmp.path().to_path_buf()).unwrap(), inner);

        // A second entry keeps the context at the top.
        fs::write(tmp.path().join("README"), b"x").unwrap();
        assert_eq!(
            descend_single_dir(tmp.path().to_path_buf()).unwrap(),
            tmp.path().to_path_buf()
        );
    }
}
