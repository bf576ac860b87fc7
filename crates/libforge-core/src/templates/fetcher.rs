//! Template fetching from a remote URL or a local directory
//!
//! - Remote: `<base>/template.yaml` lists templates, `<base>/<name>.zip` holds each one
//! - Local: `<dir>/template.yaml` and `<dir>/<name>/template.yaml` plus the listed files

use super::manifest::{RootManifest, TemplateManifest};
use crate::error::ConfigError;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use tokio::fs;
use url::Url;
use zip::ZipArchive;

/// Environment variable selecting a remote template source
pub const TEMPLATE_URL_ENV: &str = "LIBFORGE_TEMPLATE_URL";

/// Template source - either remote URL or local directory
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Remote(Url),
    Local(PathBuf),
}

impl TemplateSource {
    /// Remote source configured through `LIBFORGE_TEMPLATE_URL`, if set
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var(TEMPLATE_URL_ENV) {
            Ok(url_str) if !url_str.trim().is_empty() => {
                let url = Url::parse(url_str.trim())
                    .with_context(|| format!("Invalid template URL: {}", url_str))?;
                Ok(Some(Self::Remote(url)))
            }
            _ => Ok(None),
        }
    }
}

/// Raw content of one external template
#[derive(Debug, Clone)]
pub struct FetchedTemplate {
    pub manifest: TemplateManifest,
    pub files: HashMap<String, Vec<u8>>,
}

/// Template fetcher - handles retrieving templates from remote or local sources
pub struct TemplateFetcher {
    source: TemplateSource,
    client: reqwest::Client,
}

impl TemplateFetcher {
    pub fn new(source: TemplateSource) -> Self {
        Self {
            source,
            client: reqwest::Client::builder()
                .user_agent(concat!("libforge/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Build a URL by appending a path segment, preserving query parameters
    fn build_url(base: &Url, path_segment: &str) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("URL cannot have path segments: {}", base))?
            .pop_if_empty()
            .push(path_segment);
        Ok(url)
    }

    async fn get_bytes(&self, url: Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to fetch {}: HTTP {}", url, response.status());
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch the root manifest listing available templates
    pub async fn fetch_root_manifest(&self) -> Result<RootManifest> {
        let content = match &self.source {
            TemplateSource::Remote(base_url) => {
                let url = Self::build_url(base_url, "template.yaml")?;
                String::from_utf8(self.get_bytes(url).await?)
                    .context("Root template manifest is not valid UTF-8")?
            }
            TemplateSource::Local(path) => {
                let manifest_path = path.join("template.yaml");
                fs::read_to_string(&manifest_path)
                    .await
                    .with_context(|| format!("Failed to read {}", manifest_path.display()))?
            }
        };
        serde_yaml::from_str(&content).context("Failed to parse root manifest")
    }

    /// Fetch a template's manifest and every file it lists
    pub async fn fetch_template(&self, template_name: &str) -> Result<FetchedTemplate> {
        match &self.source {
            TemplateSource::Remote(base_url) => {
                let zip_url = Self::build_url(base_url, &format!("{}.zip", template_name))?;
                let zip_bytes = self
                    .get_bytes(zip_url)
                    .await
                    .with_context(|| format!("Failed to fetch template zip: {}", template_name))?;
                Self::extract_zip(&zip_bytes, template_name)
            }
            TemplateSource::Local(path) => Self::read_local(path, template_name).await,
        }
    }

    async fn read_local(dir: &PathBuf, template_name: &str) -> Result<FetchedTemplate> {
        let template_path = dir.join(template_name);
        let manifest_path = template_path.join("template.yaml");
        let manifest_content = fs::read_to_string(&manifest_path)
            .await
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
        let manifest: TemplateManifest = serde_yaml::from_str(&manifest_content)
            .with_context(|| format!("Failed to parse template '{}' manifest", template_name))?;
        manifest.check_paths(template_name)?;

        let mut files = HashMap::new();
        for file_path in &manifest.files {
            let full_path = template_path.join(file_path);
            let content = fs::read(&full_path)
                .await
                .with_context(|| format!("Failed to read {}", full_path.display()))?;
            files.insert(file_path.clone(), content);
        }

        Ok(FetchedTemplate { manifest, files })
    }

    /// Extract a template zip; entries are laid out as `<template_name>/<file>`
    fn extract_zip(zip_bytes: &[u8], template_name: &str) -> Result<FetchedTemplate> {
        let mut archive = ZipArchive::new(Cursor::new(zip_bytes)).with_context(|| {
            format!("Failed to read zip archive for template '{}'", template_name)
        })?;

        let mut files: HashMap<String, Vec<u8>> = HashMap::new();
        let mut manifest: Option<TemplateManifest> = None;
        let prefix = format!("{}/", template_name);

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }

            if file.enclosed_name().is_none() {
                return Err(ConfigError::UnsafeTemplatePath {
                    template: template_name.to_string(),
                    path: file.name().to_string(),
                }
                .into());
            }

            let full_path = file.name().to_string();
            let relative_path = full_path
                .strip_prefix(&prefix)
                .unwrap_or(&full_path)
                .to_string();

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;

            if relative_path == "template.yaml" {
                let content_str = String::from_utf8_lossy(&contents);
                manifest = Some(serde_yaml::from_str(&content_str).with_context(|| {
                    format!("Failed to parse template '{}' manifest", template_name)
                })?);
                continue;
            }

            files.insert(relative_path, contents);
        }

        let manifest = manifest.ok_or_else(|| {
            anyhow::anyhow!("Template '{}' zip missing template.yaml", template_name)
        })?;
        manifest.check_paths(template_name)?;

        for file_path in &manifest.files {
            if !files.contains_key(file_path) {
                anyhow::bail!(
                    "File '{}' listed in template '{}' is missing from the archive",
                    file_path,
                    template_name
                );
            }
        }

        Ok(FetchedTemplate { manifest, files })
    }
}
