//! Template manifest types for external template sources

use super::FileKind;
use crate::error::ConfigError;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions that get the license banner
const SOURCE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs"];

/// Root template manifest (`<source>/template.yaml`)
/// Lists the templates a source provides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootManifest {
    /// List of template directory names
    pub templates: Vec<String>,
}

/// Per-template manifest (`<source>/<name>/template.yaml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateManifest {
    /// Display name of the template
    pub name: String,

    /// Description of what the template provides
    #[serde(default)]
    pub description: String,

    /// Semver version for CLI compatibility checking
    pub version: String,

    /// Explicit list of files to render
    pub files: Vec<String>,

    /// Patterns of files copied byte-for-byte (no placeholder substitution, no banner)
    #[serde(default)]
    pub raw: Vec<String>,
}

impl TemplateManifest {
    /// How a listed file is rendered
    pub fn kind_for(&self, file_path: &str) -> FileKind {
        let filename = file_path.rsplit('/').next().unwrap_or(file_path);

        if matches_any(filename, &self.raw) || matches_any(file_path, &self.raw) {
            FileKind::Raw
        } else if SOURCE_EXTENSIONS.iter().any(|ext| filename.ends_with(ext)) {
            FileKind::Source
        } else {
            FileKind::Text
        }
    }

    /// Reject listed files that are absolute or climb out with `..`
    pub fn check_paths(&self, template_name: &str) -> Result<(), ConfigError> {
        match self.files.iter().find(|f| !paths::is_confined(Path::new(f))) {
            Some(path) => Err(ConfigError::UnsafeTemplatePath {
                template: template_name.to_string(),
                path: path.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Check if a filename matches any pattern in a list
fn matches_any(filename: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        if let Some(suffix) = pattern.strip_prefix('*') {
            // Suffix match: *.png matches logo.png
            filename.ends_with(suffix)
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            // Prefix match: assets/* matches assets/logo.png
            filename.starts_with(prefix)
        } else {
            filename == pattern
        }
    })
}
