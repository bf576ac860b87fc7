//! Rewriting a project manifest for publication from the output directory

use super::Manifest;
use crate::context::BuildContext;
use crate::error::ConfigError;
use crate::paths;
use serde_json::Value;
use std::path::Component;

/// Rewrite a project-relative path so it is relative to the output directory.
///
/// Paths that do not land inside the output directory are returned unchanged,
/// unless `force` is set, in which case they are a configuration error. Not every
/// string in a manifest is a path, so the lenient mode is the common one.
pub fn move_dist_path(p: &str, ctx: &BuildContext, force: bool) -> Result<String, ConfigError> {
    let resolved = paths::resolve(&ctx.root_dir, p);
    let relative = paths::relative_path(&ctx.out_dir, &resolved);

    let escapes = matches!(relative.components().next(), Some(Component::ParentDir));
    if !relative.as_os_str().is_empty() && !escapes && !relative.is_absolute() {
        return Ok(paths::to_forward_slashes(&relative));
    }

    if force {
        return Err(ConfigError::PathOutsideOutput {
            path: p.to_string(),
        });
    }

    Ok(p.to_string())
}

/// Make every path in `manifest` relative to the output directory and drop the
/// keys that only matter during development.
///
/// `bin` entries must point inside the output directory; they are rewritten as
/// `./<path>`.
pub fn transform_manifest(manifest: &mut Manifest, ctx: &BuildContext) -> Result<(), ConfigError> {
    for (key, value) in manifest.iter_mut() {
        if key == "bin" {
            continue;
        }
        if let Value::String(s) = value {
            *s = move_dist_path(s, ctx, false)?;
        }
    }

    match manifest.get_mut("bin") {
        Some(Value::String(executable)) => {
            *executable = format!("./{}", move_dist_path(executable, ctx, true)?);
        }
        Some(Value::Object(commands)) => {
            for executable in commands.values_mut() {
                if let Value::String(s) = executable {
                    *s = format!("./{}", move_dist_path(s, ctx, true)?);
                }
            }
        }
        _ => {}
    }

    for key in &ctx.exclude_from_package {
        manifest.shift_remove(key);
    }

    Ok(())
}
