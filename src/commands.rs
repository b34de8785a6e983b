// src/commands.rs
//! Command handlers for the mere CLI

use anyhow::{bail, Context, Result};
use mere::{Engine, Recipe};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Required mode of a store directory
const STORE_DIR_MODE: u32 = 0o775;

/// Load a recipe, honoring an optional source cache override.
fn load_recipe(path: &str, source_cache: Option<PathBuf>) -> Result<Recipe> {
    let recipe = match source_cache {
        Some(cache) => Recipe::with_cache(path, cache),
        None => Recipe::new(path),
    };
    recipe.with_context(|| format!("failed to load recipe {path}"))
}

/// Check that a store directory exists, is a directory and has mode 0775.
///
/// This is a frontend gate only; the engine itself never touches the
/// store.
pub fn validate_store_dir(store: &Path) -> Result<()> {
    let meta = fs::metadata(store)
        .with_context(|| format!("store directory {} does not exist", store.display()))?;
    if !meta.is_dir() {
        bail!("store path {} is not a directory", store.display());
    }
    let mode = meta.permissions().mode() & 0o7777;
    if mode != STORE_DIR_MODE {
        bail!(
            "store directory {} has mode {:o}, expected {:o}",
            store.display(),
            mode,
            STORE_DIR_MODE
        );
    }
    Ok(())
}

/// Full build: fetch, materialize, run stages, then clean up
/// unconditionally.
pub fn cmd_build(
    recipe_path: &str,
    source_cache: Option<PathBuf>,
    store: Option<PathBuf>,
) -> Result<()> {
    if let Some(store) = store {
        validate_store_dir(&store)?;
    }

    let mut recipe = load_recipe(recipe_path, source_cache)?;
    let mut engine = Engine::new()?;

    let outcome = engine.build_steps(&mut recipe);
    if let Err(e) = engine.cleanup(&mut recipe) {
        warn!("cleanup failed: {}", e);
    }
    outcome?;

    println!("built {}-{}-{}", recipe.name, recipe.version, recipe.release);
    Ok(())
}

/// Fetch and verify all sources without building.
pub fn cmd_fetch(recipe_path: &str, source_cache: Option<PathBuf>) -> Result<()> {
    let recipe = load_recipe(recipe_path, source_cache)?;
    let engine = Engine::new()?;

    let errors = engine.fetch(&recipe);
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        bail!("{} of {} sources failed", errors.len(), recipe.sources.len());
    }

    println!("fetched {} source(s)", recipe.sources.len());
    Ok(())
}

/// Run the ingestion pipeline only and print a summary.
pub fn cmd_validate(recipe_path: &str) -> Result<()> {
    let recipe = load_recipe(recipe_path, None)?;

    println!("{}-{}-{}", recipe.name, recipe.version, recipe.release);
    if !recipe.description.is_empty() {
        println!("  {}", recipe.description);
    }
    for source in &recipe.sources {
        println!("  source: {}", source.url);
    }
    for package in &recipe.packages {
        println!("  package: {}", package.name);
    }
    Ok(())
}
