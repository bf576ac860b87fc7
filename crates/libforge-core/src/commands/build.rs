//! `libforge build`: bundle the library and assemble the publishable output directory

use crate::bundle::{emit_dual_format, Bundler, EsbuildBundler};
use crate::context::BuildContext;
use crate::package::{load_manifest, transform_manifest, write_manifest, write_npm_ignore};
use crate::tasks::{Orchestrator, TaskReport};
use crate::templates::TemplateConfig;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::fs;

#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Only run the packaging step
    pub package_only: bool,
    /// Empty the output directory beforehand
    pub clean: bool,
    /// Treat warnings on non-optional steps as errors
    pub werror: bool,
}

/// Build with the default (esbuild) bundler
pub async fn build(
    orchestrator: &Orchestrator,
    opts: BuildOptions,
    ctx: BuildContext,
) -> Result<TaskReport> {
    build_with(orchestrator, opts, ctx, Arc::new(EsbuildBundler::new())).await
}

pub async fn build_with(
    orchestrator: &Orchestrator,
    opts: BuildOptions,
    ctx: BuildContext,
    bundler: Arc<dyn Bundler>,
) -> Result<TaskReport> {
    let ctx = Arc::new(ctx);

    let run = orchestrator
        .run("Build", move |scope| async move {
            if opts.clean {
                let ctx = ctx.clone();
                scope
                    .run("Cleaning up previous build", move |_| async move {
                        match fs::remove_dir_all(&ctx.out_dir).await {
                            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e)
                                .with_context(|| format!("Failed to remove {}", ctx.out_dir.display())),
                            _ => Ok(()),
                        }
                    })
                    .join()
                    .await?;
            }

            let dist_ready = {
                let ctx = ctx.clone();
                scope.run_optional("Creating dist dir", move |_| async move {
                    fs::create_dir_all(&ctx.out_dir)
                        .await
                        .with_context(|| format!("Failed to create {}", ctx.out_dir.display()))
                })
            };

            let manifest = {
                let ctx = ctx.clone();
                scope.run("Loading package.json", move |_| async move {
                    load_manifest(&ctx).await
                })
            };

            if !opts.package_only {
                let ctx = ctx.clone();
                let manifest = manifest.clone();
                scope.run("rolling up...", move |task| async move {
                    let cfg = TemplateConfig::from_manifest(&manifest.join().await?);
                    emit_dual_format(task, bundler, cfg, ctx).await
                });
            }

            scope.run("packaging", move |packaging| async move {
                {
                    let ctx = ctx.clone();
                    let dist_ready = dist_ready.clone();
                    packaging.run("building package.json", move |_| async move {
                        dist_ready.join().await?;
                        let mut manifest = manifest.join().await?;
                        transform_manifest(&mut manifest, &ctx)?;
                        write_manifest(&manifest, &ctx).await
                    });
                }

                {
                    let ctx = ctx.clone();
                    let dist_ready = dist_ready.clone();
                    packaging.run("Creating a npmignore", move |_| async move {
                        dist_ready.join().await?;
                        write_npm_ignore(&ctx).await
                    });
                }

                packaging.run("Additional files", move |task| async move {
                    dist_ready.join().await?;
                    for file in ctx.additional_files.clone() {
                        let ctx = ctx.clone();
                        task.run_optional(file.clone(), move |_| async move {
                            copy_additional_file(&ctx, &file).await
                        });
                    }
                    Ok(())
                });

                Ok(())
            });

            Ok(())
        })
        .await;

    super::finish(run, opts.werror, "Build")
}

async fn copy_additional_file(ctx: &BuildContext, file: &str) -> Result<()> {
    let from = ctx.project_path(file);
    let to = ctx.out_path(file);
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::copy(&from, &to)
        .await
        .with_context(|| format!("Failed to copy {}", from.display()))?;
    Ok(())
}
