//! Template rendering
//!
//! This module provides:
//! - The built-in `recommended` template
//! - External templates fetched from a remote URL or a local directory
//! - Placeholder substitution and license banners
//! - Version compatibility checking

pub mod fetcher;
pub mod licenses;
pub mod manifest;
mod recommended;
pub mod version;

use crate::error::ConfigError;
use crate::package::Manifest;
use anyhow::Result;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use fetcher::{TemplateFetcher, TemplateSource};
pub use manifest::{RootManifest, TemplateManifest};
pub use version::check_compatibility;

/// Templates shipped with the CLI
pub const BUILTIN_TEMPLATES: &[&str] = &["recommended"];

/// How a template file is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Placeholders substituted, license banner prepended
    Source,
    /// Placeholders substituted
    Text,
    /// Written byte-for-byte
    Raw,
}

/// One file of a template, relative to the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFile {
    pub name: String,
    pub kind: FileKind,
    pub contents: Vec<u8>,
}

impl TemplateFile {
    pub fn new(name: impl Into<String>, kind: FileKind, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            kind,
            contents: contents.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub email: String,
}

impl Author {
    /// Read an npm `author` field: either `{name, email}` or `"Name <email> (url)"`
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Object(obj) => Self {
                name: obj
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                email: obj
                    .get("email")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            _ => Self::default(),
        }
    }

    fn parse(s: &str) -> Self {
        let name_end = s.find(['<', '(']).unwrap_or(s.len());
        let email = s
            .find('<')
            .and_then(|start| {
                s[start + 1..]
                    .find('>')
                    .map(|end| s[start + 1..start + 1 + end].trim().to_string())
            })
            .unwrap_or_default();
        Self {
            name: s[..name_end].trim().to_string(),
            email,
        }
    }
}

/// Values a template is rendered with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateConfig {
    pub lib_name: String,
    pub author: Author,
    pub license: String,
}

impl TemplateConfig {
    /// Derive the config from a loaded `package.json`; missing fields become empty
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let text = |key: &str| {
            manifest
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            lib_name: text("name"),
            author: manifest
                .get("author")
                .map(Author::from_value)
                .unwrap_or_default(),
            license: text("license"),
        }
    }
}

/// Replace `{{lib_name}}`, `{{author_name}}`, `{{author_email}}`, `{{license}}` and `{{year}}`
pub(crate) fn substitute(text: &str, cfg: &TemplateConfig) -> String {
    text.replace("{{lib_name}}", &cfg.lib_name)
        .replace("{{author_name}}", &cfg.author.name)
        .replace("{{author_email}}", &cfg.author.email)
        .replace("{{license}}", &cfg.license)
        .replace("{{year}}", &chrono::Local::now().year().to_string())
}

fn render_file(file: TemplateFile, cfg: &TemplateConfig) -> TemplateFile {
    if file.kind == FileKind::Raw {
        return file;
    }

    // Non-UTF-8 content can't carry placeholders
    let text = match String::from_utf8(file.contents) {
        Ok(text) => text,
        Err(e) => {
            return TemplateFile {
                contents: e.into_bytes(),
                ..file
            }
        }
    };

    let mut rendered = substitute(&text, cfg);
    if file.kind == FileKind::Source {
        if let Some(license) = licenses::find(&cfg.license) {
            rendered = format!("{}\n\n{}", license.render_banner(cfg), rendered);
        }
    }

    TemplateFile {
        contents: rendered.into_bytes(),
        ..file
    }
}

fn render_files(files: Vec<TemplateFile>, cfg: &TemplateConfig) -> Vec<TemplateFile> {
    files.into_iter().map(|f| render_file(f, cfg)).collect()
}

/// Rendered file set of a built-in template
pub fn get_template(name: &str, cfg: &TemplateConfig) -> Result<Vec<TemplateFile>, ConfigError> {
    match name {
        "recommended" => Ok(render_files(recommended::files(cfg), cfg)),
        _ => Err(ConfigError::UnknownTemplate(name.to_string())),
    }
}

/// Rendered template plus an optional compatibility warning
#[derive(Debug, Clone)]
pub struct RenderedTemplate {
    pub files: Vec<TemplateFile>,
    pub warning: Option<String>,
}

/// Resolves template names against the built-in set and an optional external source
#[derive(Default)]
pub struct TemplateRegistry {
    fetcher: Option<TemplateFetcher>,
}

impl TemplateRegistry {
    /// Built-in templates only
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn with_source(source: TemplateSource) -> Self {
        Self {
            fetcher: Some(TemplateFetcher::new(source)),
        }
    }

    /// Built-in templates plus the source named by `LIBFORGE_TEMPLATE_URL`, if any
    pub fn from_env() -> Result<Self> {
        Ok(match TemplateSource::from_env()? {
            Some(source) => Self::with_source(source),
            None => Self::builtin(),
        })
    }

    pub async fn has_template(&self, name: &str) -> Result<bool> {
        if BUILTIN_TEMPLATES.contains(&name) {
            return Ok(true);
        }
        match &self.fetcher {
            Some(fetcher) => {
                let root = fetcher.fetch_root_manifest().await?;
                Ok(root.templates.iter().any(|t| t == name))
            }
            None => Ok(false),
        }
    }

    pub async fn render(&self, name: &str, cfg: &TemplateConfig) -> Result<RenderedTemplate> {
        if BUILTIN_TEMPLATES.contains(&name) {
            return Ok(RenderedTemplate {
                files: get_template(name, cfg)?,
                warning: None,
            });
        }

        let fetcher = self
            .fetcher
            .as_ref()
            .ok_or_else(|| ConfigError::UnknownTemplate(name.to_string()))?;
        let mut fetched = fetcher.fetch_template(name).await?;

        let files = fetched
            .manifest
            .files
            .iter()
            .filter_map(|path| {
                let contents = fetched.files.remove(path)?;
                Some(TemplateFile::new(
                    path.as_str(),
                    fetched.manifest.kind_for(path),
                    contents,
                ))
            })
            .collect();

        Ok(RenderedTemplate {
            files: render_files(files, cfg),
            warning: check_compatibility(crate::CLI_VERSION, &fetched.manifest.version),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cfg(license: &str) -> TemplateConfig {
        TemplateConfig {
            lib_name: "my-lib".to_string(),
            author: Author {
                name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
            },
            license: license.to_string(),
        }
    }

    fn file<'a>(files: &'a [TemplateFile], name: &str) -> &'a str {
        let f = files.iter().find(|f| f.name == name).unwrap();
        std::str::from_utf8(&f.contents).unwrap()
    }

    #[test]
    fn test_substitute() {
        let out = substitute(
            "{{lib_name}} by {{author_name}} <{{author_email}}>, {{license}} {{year}}",
            &cfg("MIT"),
        );
        let year = chrono::Local::now().year();
        assert_eq!(
            out,
            format!("my-lib by Ada Lovelace <ada@example.com>, MIT {}", year)
        );
    }

    #[test]
    fn test_recommended_template() {
        let files = get_template("recommended", &cfg("Apache-2.0")).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "LICENSE",
                "src/index.ts",
                "README.md",
                "tests/index.test.ts",
                "tsconfig.json",
                ".gitignore"
            ]
        );

        assert!(file(&files, "src/index.ts").starts_with("/**\n * Copyright"));
        assert!(file(&files, "src/index.ts").contains("export const Hello"));
        assert!(file(&files, "README.md").starts_with("# my-lib"));
        assert!(!file(&files, "tsconfig.json").contains("/**"));
    }

    #[test]
    fn test_unlicensed_template_has_no_license_file() {
        let files = get_template("recommended", &cfg("UNLICENSED")).unwrap();
        assert!(files.iter().all(|f| f.name != "LICENSE"));
    }

    #[test]
    fn test_unknown_template() {
        let err = get_template("fancy", &cfg("MIT")).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTemplate(name) if name == "fancy"));
    }

    #[test]
    fn test_config_from_manifest() {
        let manifest: Manifest = serde_json::from_value(json!({
            "name": "my-lib",
            "license": "MIT",
            "author": {"name": "Ada", "email": "ada@example.com"}
        }))
        .unwrap();
        let cfg = TemplateConfig::from_manifest(&manifest);
        assert_eq!(cfg.lib_name, "my-lib");
        assert_eq!(cfg.author.email, "ada@example.com");

        let manifest: Manifest =
            serde_json::from_value(json!({"author": "Ada Lovelace <ada@example.com> (https://ada.dev)"}))
                .unwrap();
        let cfg = TemplateConfig::from_manifest(&manifest);
        assert_eq!(cfg.author.name, "Ada Lovelace");
        assert_eq!(cfg.author.email, "ada@example.com");
        assert!(cfg.license.is_empty());
    }

    #[tokio::test]
    async fn test_registry_with_local_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("template.yaml"), "templates: [minimal]\n").unwrap();
        std::fs::create_dir_all(dir.path().join("minimal/src")).unwrap();
        std::fs::write(
            dir.path().join("minimal/template.yaml"),
            "name: Minimal\nversion: 999.0.0\nfiles: [src/index.ts, README.md, logo.png]\nraw: ['*.png']\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("minimal/src/index.ts"), "export {};\n").unwrap();
        std::fs::write(dir.path().join("minimal/README.md"), "# {{lib_name}}\n").unwrap();
        std::fs::write(dir.path().join("minimal/logo.png"), [0x89u8, b'{', b'{']).unwrap();

        let registry =
            TemplateRegistry::with_source(TemplateSource::Local(dir.path().to_path_buf()));
        assert!(registry.has_template("minimal").await.unwrap());
        assert!(registry.has_template("recommended").await.unwrap());
        assert!(!registry.has_template("other").await.unwrap());

        let rendered = registry.render("minimal", &cfg("MIT")).await.unwrap();
        assert!(rendered.warning.unwrap().contains("999.0.0"));
        assert!(file(&rendered.files, "src/index.ts").starts_with("/**"));
        assert_eq!(file(&rendered.files, "README.md"), "# my-lib\n");
        let logo = rendered.files.iter().find(|f| f.name == "logo.png").unwrap();
        assert_eq!(logo.contents, vec![0x89u8, b'{', b'{']);
    }

    #[tokio::test]
    async fn test_builtin_registry_rejects_unknown() {
        let registry = TemplateRegistry::builtin();
        assert!(!registry.has_template("minimal").await.unwrap());
        assert!(registry.render("minimal", &cfg("MIT")).await.is_err());
    }
}
