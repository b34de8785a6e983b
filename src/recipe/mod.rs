// src/recipe/mod.rs

//! Recipe model: typed representation of a package build specification
//!
//! A recipe moves through a fixed ingestion pipeline: read the file,
//! convert YAML to JSON, validate against the reflected schema, then
//! deserialize and render templates. Validation and rendering are kept
//! as separate passes; schema errors and template errors are different
//! failure domains with different user remedies.

mod schema;
mod template;

use crate::error::{Error, Result};
use crate::transport::{parse_url, Protocol};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A package build recipe.
///
/// The serialized fields double as the template scope: `{{.Version}}`
/// inside a rendered field interpolates the recipe's own version.
/// Working-directory state is transient and never serialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub home: String,
    pub version: String,
    /// Rebuild counter for the same upstream version
    #[schemars(range(min = 1))]
    pub release: i64,
    /// Ordered sources; element 0 is the primary archive
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub build_deps: String,
    #[serde(default)]
    pub build: String,
    #[serde(default)]
    pub test: String,
    #[serde(default)]
    pub install: String,
    #[serde(default)]
    pub packages: Vec<PackageSubset>,

    #[serde(skip)]
    #[schemars(skip)]
    pub(crate) source_cache: PathBuf,
    #[serde(skip)]
    #[schemars(skip)]
    pub(crate) working_dir: Option<PathBuf>,
    #[serde(skip)]
    #[schemars(skip)]
    pub(crate) build_context: Option<PathBuf>,
}

/// One upstream artifact, pinned by BLAKE3 digest
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Source {
    /// `http(s)://` or `file://` URL of the artifact
    pub url: String,
    /// BLAKE3-256 digest of the artifact, 64 hex characters
    #[schemars(length(equal = 64), regex(pattern = r"^[0-9a-fA-F]{64}$"))]
    pub b3sum: String,
    /// Override for the cached filename; defaults to the URL basename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_name: Option<String>,

    #[serde(skip)]
    #[schemars(skip)]
    pub(crate) protocol: Option<Protocol>,
    #[serde(skip)]
    #[schemars(skip)]
    pub(crate) save_path: PathBuf,
    #[serde(skip)]
    #[schemars(skip)]
    pub(crate) src_path: String,
}

/// Declarative slice of the install tree.
///
/// Only `files` is template-rendered; actual packaging is out of scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PackageSubset {
    pub name: String,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub libs: Vec<String>,
}

impl Recipe {
    /// Ingest a recipe file, using the default source cache
    /// (`$HOME/.mere/src`).
    pub fn new(path: impl AsRef<Path>) -> Result<Recipe> {
        Self::load(path.as_ref(), None)
    }

    /// Ingest a recipe file with an explicit source cache directory.
    pub fn with_cache(path: impl AsRef<Path>, cache: impl Into<PathBuf>) -> Result<Recipe> {
        Self::load(path.as_ref(), Some(cache.into()))
    }

    fn load(path: &Path, cache_override: Option<PathBuf>) -> Result<Recipe> {
        let raw = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_yaml::from_str(&raw)?;
        schema::validate(&path.display().to_string(), &value)?;

        let mut recipe: Recipe = serde_json::from_value(value)?;
        recipe.render_all()?;

        recipe.source_cache = match cache_override {
            Some(dir) => dir,
            None => default_source_cache()?,
        };

        let cache = recipe.source_cache.clone();
        for source in &mut recipe.sources {
            source.validate(&cache)?;
        }

        Ok(recipe)
    }

    /// The directory verified source files are cached in
    pub fn source_cache(&self) -> &Path {
        &self.source_cache
    }

    /// Per-build temporary tree, present between materialization and cleanup
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// The directory stage scripts execute in
    pub fn build_context(&self) -> Option<&Path> {
        self.build_context.as_deref()
    }

    /// Render template substitutions inside the supported fields, in
    /// order: `sources[].url`, `packages[].files[]`, `build`, `test`,
    /// `install`. All rendering failures are collected and reported
    /// together.
    fn render_all(&mut self) -> Result<()> {
        let scope = self.template_scope();
        let lookup =
            |field: &str| scope.iter().find(|(name, _)| *name == field).map(|(_, v)| v.clone());
        let mut messages = Vec::new();

        for i in 0..self.sources.len() {
            match template::render(&self.sources[i].url, &lookup) {
                Ok(rendered) => self.sources[i].url = rendered,
                Err(msg) => messages.push(msg),
            }
        }

        for i in 0..self.packages.len() {
            for j in 0..self.packages[i].files.len() {
                match template::render(&self.packages[i].files[j], &lookup) {
                    Ok(rendered) => self.packages[i].files[j] = rendered,
                    Err(msg) => messages.push(msg),
                }
            }
        }

        match template::render(&self.build, &lookup) {
            Ok(rendered) => self.build = rendered,
            Err(msg) => messages.push(msg),
        }
        match template::render(&self.test, &lookup) {
            Ok(rendered) => self.test = rendered,
            Err(msg) => messages.push(msg),
        }
        match template::render(&self.install, &lookup) {
            Ok(rendered) => self.install = rendered,
            Err(msg) => messages.push(msg),
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(Error::Template(messages.join("; ")))
        }
    }

    /// The template scope: public scalar fields by their exported names.
    ///
    /// Transient fields deliberately do not appear here, so a template
    /// can never leak working-directory state.
    fn template_scope(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Name", self.name.clone()),
            ("Description", self.description.clone()),
            ("Home", self.home.clone()),
            ("Version", self.version.clone()),
            ("Release", self.release.to_string()),
            ("BuildDeps", self.build_deps.clone()),
            ("Build", self.build.clone()),
            ("Test", self.test.clone()),
            ("Install", self.install.clone()),
        ]
    }
}

impl Source {
    /// Validate the URL, tag the protocol and derive the cache path.
    ///
    /// The cached filename is the basename of `localName` when set,
    /// otherwise the basename of the URL path. A URL that yields no
    /// basename at all fails with [`Error::NoPathElement`].
    pub(crate) fn validate(&mut self, cache: &Path) -> Result<()> {
        let parsed = parse_url(&self.url, true)?;
        self.protocol = Some(parsed.protocol);
        if parsed.protocol == Protocol::File {
            self.src_path = parsed.local_path();
        }

        let local = match &self.local_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => parsed.path.clone(),
        };
        let base = Path::new(&local)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or(Error::NoPathElement)?;

        self.save_path = cache.join(base);
        Ok(())
    }

    /// Absolute location of the cached, digest-verified file
    pub fn save_path(&self) -> &Path {
        &self.save_path
    }
}

fn default_source_cache() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Io(std::io::Error::other("cannot determine home directory")))?;
    Ok(home.join(".mere").join("src"))
}
