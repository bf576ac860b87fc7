//! Build context: where the project lives and what gets published
//!
//! Defaults can be overridden per project with a `libforge.yaml` file at the
//! project root:
//!
//! ```yaml
//! out_dir: build/
//! entry: src/main.ts
//! exclude_from_package: [private, scripts, devDependencies, files, jest]
//! additional_files: [README.md, LICENSE, CHANGELOG.md]
//! ```

use crate::error::ConfigError;
use crate::paths;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the optional per-project configuration file
pub const CONFIG_FILE: &str = "libforge.yaml";

const DEFAULT_OUT_DIR: &str = "dist/";
const DEFAULT_ENTRY: &str = "src/index.ts";
const DEFAULT_EXCLUDE_FROM_PACKAGE: &[&str] = &["private", "scripts", "devDependencies", "files"];
const DEFAULT_ADDITIONAL_FILES: &[&str] = &[".npmrc", "README.md", "LICENSE"];

/// Immutable settings for one command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Project root (where `package.json` lives)
    pub root_dir: PathBuf,

    /// Output directory, always absolute and normalized
    pub out_dir: PathBuf,

    /// Bundler entry point, relative to the project root
    pub entry: String,

    /// Keys to remove from the package.json when building
    pub exclude_from_package: Vec<String>,

    /// Additional files copied from the project into the output directory
    pub additional_files: Vec<String>,
}

/// Overrides read from `libforge.yaml`; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectConfig {
    out_dir: Option<String>,
    entry: Option<String>,
    exclude_from_package: Option<Vec<String>>,
    additional_files: Option<Vec<String>>,
}

impl BuildContext {
    /// Default context for a project rooted at `root_dir`
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = paths::normalize(&root_dir.into());
        let out_dir = paths::resolve(&root_dir, DEFAULT_OUT_DIR);
        Self {
            root_dir,
            out_dir,
            entry: DEFAULT_ENTRY.to_string(),
            exclude_from_package: DEFAULT_EXCLUDE_FROM_PACKAGE
                .iter()
                .map(|s| s.to_string())
                .collect(),
            additional_files: DEFAULT_ADDITIONAL_FILES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Load the context for `root_dir`, applying `libforge.yaml` if present
    pub fn load(root_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut ctx = Self::new(root_dir);
        let config_path = ctx.root_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let config: ProjectConfig =
                serde_yaml::from_str(&content).map_err(|e| ConfigError::InvalidConfig {
                    file: config_path.clone(),
                    message: e.to_string(),
                })?;
            ctx.apply(config);
        }

        Ok(ctx)
    }

    fn apply(&mut self, config: ProjectConfig) {
        if let Some(out_dir) = config.out_dir {
            self.out_dir = paths::resolve(&self.root_dir, out_dir);
        }
        if let Some(entry) = config.entry {
            self.entry = entry;
        }
        if let Some(exclude) = config.exclude_from_package {
            self.exclude_from_package = exclude;
        }
        if let Some(files) = config.additional_files {
            self.additional_files = files;
        }
    }

    /// Override the output directory (resolved against the project root)
    pub fn with_out_dir(mut self, out_dir: impl AsRef<Path>) -> Self {
        self.out_dir = paths::resolve(&self.root_dir, out_dir);
        self
    }

    /// Absolute path of a file inside the project
    pub fn project_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        paths::resolve(&self.root_dir, relative)
    }

    /// Absolute path of a file inside the output directory
    pub fn out_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        paths::resolve(&self.out_dir, relative)
    }
}
