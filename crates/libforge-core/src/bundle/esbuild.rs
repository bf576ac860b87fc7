//! esbuild-backed bundler
//!
//! Ingress bundles the entry once into an ESM staging file inside a temporary
//! directory; every write re-bundles the staged file into the requested format.

use super::{Bundle, Bundler, OutputOptions, WarningSink};
use crate::runtime::process::{run_streaming, Stream};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::process::Command;

const STAGED_FILE: &str = "bundle.mjs";

/// Runs esbuild through `npx`
#[derive(Debug, Clone, Default)]
pub struct EsbuildBundler;

impl EsbuildBundler {
    pub fn new() -> Self {
        Self
    }
}

fn esbuild(root: &Path) -> Command {
    let mut cmd = Command::new("npx");
    cmd.current_dir(root)
        .args(["--no-install", "esbuild"])
        .args(["--bundle", "--platform=node", "--packages=external"]);
    cmd
}

/// Message of an esbuild warning line, e.g. `▲ [WARNING] Duplicate key "a" [duplicate-object-key]`
fn parse_warning(line: &str) -> Option<String> {
    let (_, message) = line.split_once("[WARNING]")?;
    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

async fn run_esbuild(mut cmd: Command, warnings: Option<&WarningSink>) -> Result<()> {
    let output = run_streaming(&mut cmd, |stream, line| {
        if stream == Stream::Stderr {
            if let (Some(sink), Some(warning)) = (warnings, parse_warning(line)) {
                sink(warning);
            }
        }
    })
    .await?;

    if !output.success() {
        anyhow::bail!(
            "esbuild exited with {}\n{}",
            output.status,
            output.combined().trim_end()
        );
    }
    Ok(())
}

#[async_trait]
impl Bundler for EsbuildBundler {
    async fn ingress(
        &self,
        entry: &Path,
        root: &Path,
        warnings: WarningSink,
    ) -> Result<Arc<dyn Bundle>> {
        let staging = tempfile::Builder::new()
            .prefix("libforge-bundle-")
            .tempdir()
            .context("Failed to create a staging directory")?;
        let staged = staging.path().join(STAGED_FILE);

        let mut cmd = esbuild(root);
        cmd.arg(entry)
            .args(["--format=esm", "--sourcemap=inline", "--log-level=warning"])
            .arg(format!("--outfile={}", staged.display()));
        run_esbuild(cmd, Some(&warnings))
            .await
            .with_context(|| format!("Failed to compile {}", entry.display()))?;

        Ok(Arc::new(EsbuildBundle {
            root: root.to_path_buf(),
            staged,
            staging: Mutex::new(Some(staging)),
        }))
    }
}

/// Staged module graph; removed on close
pub struct EsbuildBundle {
    root: PathBuf,
    staged: PathBuf,
    staging: Mutex<Option<TempDir>>,
}

impl EsbuildBundle {
    fn is_open(&self) -> bool {
        self.staging
            .lock()
            .map(|staging| staging.is_some())
            .unwrap_or(false)
    }
}

#[async_trait]
impl Bundle for EsbuildBundle {
    async fn write(&self, options: &OutputOptions) -> Result<()> {
        if !self.is_open() {
            anyhow::bail!("bundle is already closed");
        }

        let mut cmd = esbuild(&self.root);
        cmd.arg(&self.staged)
            .arg(format!("--format={}", options.format))
            .arg("--log-level=error")
            .arg(format!("--outfile={}", options.file.display()));
        if options.sourcemap {
            cmd.arg("--sourcemap");
        }
        if !options.banner.is_empty() {
            cmd.arg(format!("--banner:js={}", options.banner));
        }

        run_esbuild(cmd, None)
            .await
            .with_context(|| format!("Failed to write {}", options.file.display()))
    }

    async fn close(&self) -> Result<()> {
        let staging = self
            .staging
            .lock()
            .map_err(|_| anyhow::anyhow!("bundle state poisoned"))?
            .take();
        if let Some(staging) = staging {
            staging
                .close()
                .context("Failed to remove the staging directory")?;
        }
        Ok(())
    }
}
