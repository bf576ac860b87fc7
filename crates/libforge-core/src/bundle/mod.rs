//! Dual-format (ESM + CommonJS) bundling
//!
//! The compiled module graph is produced once by [`Bundler::ingress`] and shared by both
//! writes. The bundle is closed exactly once, after both writes have settled.

pub mod esbuild;

use crate::context::BuildContext;
use crate::tasks::TaskScope;
use crate::templates::{licenses, TemplateConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use esbuild::EsbuildBundler;

/// Output module format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Esm,
    Cjs,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::Esm, Format::Cjs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Esm => "esm",
            Format::Cjs => "cjs",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for one write of a bundle
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub file: PathBuf,
    pub format: Format,
    /// Comment placed at the top of the emitted file
    pub banner: String,
    pub sourcemap: bool,
}

/// Receives bundler warnings; warnings never stop the bundler
pub type WarningSink = Arc<dyn Fn(String) + Send + Sync>;

/// Compiles an entry point into a bundle that can be written in several formats
#[async_trait]
pub trait Bundler: Send + Sync {
    async fn ingress(
        &self,
        entry: &Path,
        root: &Path,
        warnings: WarningSink,
    ) -> Result<Arc<dyn Bundle>>;
}

/// A compiled module graph
#[async_trait]
pub trait Bundle: Send + Sync {
    async fn write(&self, options: &OutputOptions) -> Result<()>;

    /// Release resources held by the bundle
    async fn close(&self) -> Result<()>;
}

/// Shared bundle whose close runs at most once
struct SharedBundle {
    inner: Arc<dyn Bundle>,
    closed: AtomicBool,
}

impl SharedBundle {
    async fn write(&self, options: &OutputOptions) -> Result<()> {
        if let Some(parent) = options.file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        self.inner.write(options).await
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.inner.close().await
    }
}

/// `<out>/<format>/index.js`
pub fn output_file(ctx: &BuildContext, format: Format) -> PathBuf {
    ctx.out_path(format!("{}/index.js", format))
}

/// Bundle the project entry into `<out>/esm/index.js` and `<out>/cjs/index.js`.
///
/// Schedules `Ingress`, `Generation` (with one child per format) and `Closing up`
/// under `scope`.
pub async fn emit_dual_format(
    scope: TaskScope,
    bundler: Arc<dyn Bundler>,
    cfg: TemplateConfig,
    ctx: Arc<BuildContext>,
) -> Result<()> {
    let banner = licenses::compile_banner(&cfg);

    let ingress = {
        let ctx = ctx.clone();
        scope.run("Ingress", move |task| async move {
            let sink: WarningSink = Arc::new(move |warning: String| task.warn(warning));
            let entry = ctx.project_path(&ctx.entry);
            let bundle = bundler.ingress(&entry, &ctx.root_dir, sink).await?;
            Ok(Arc::new(SharedBundle {
                inner: bundle,
                closed: AtomicBool::new(false),
            }))
        })
    };

    let generation = {
        let ingress = ingress.clone();
        scope.run("Generation", move |task| async move {
            let bundle = ingress.join().await?;
            for format in Format::ALL {
                let bundle = bundle.clone();
                let options = OutputOptions {
                    file: output_file(&ctx, format),
                    format,
                    banner: banner.clone(),
                    sourcemap: true,
                };
                task.run(format.as_str(), move |_| async move {
                    bundle.write(&options).await
                });
            }
            Ok(())
        })
    };

    scope
        .run("Closing up", move |_| async move {
            // Settled either way; its failure is reported through its own task
            let _ = generation.join().await;
            if let Ok(bundle) = ingress.join().await {
                bundle.close().await?;
            }
            Ok(())
        })
        .join()
        .await?;

    Ok(())
}
