//! The project manifest (`package.json`): loading, rewriting and writing it out

mod transform;

pub use transform::{move_dist_path, transform_manifest};

use crate::context::BuildContext;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tokio::fs;

/// Ordered JSON object; key order survives a load/write cycle
pub type Manifest = serde_json::Map<String, Value>;

pub const MANIFEST_FILE: &str = "package.json";

/// Entries of the `.npmignore` written next to the published manifest
pub const NPM_IGNORE: &[&str] = &["node_modules", ".npmrc"];

/// Parse a manifest, which must be a JSON object
pub fn parse_manifest(source: &str) -> Result<Manifest> {
    match serde_json::from_str::<Value>(source).context("package.json is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!(
            "package.json must contain a JSON object, found {}",
            json_kind(&other)
        ),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Read `<root>/package.json`
pub async fn load_manifest(ctx: &BuildContext) -> Result<Manifest> {
    let path = ctx.project_path(MANIFEST_FILE);
    let source = fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_manifest(&source).with_context(|| format!("Failed to load {}", path.display()))
}

/// Serialize with 2-space indentation
pub fn render_manifest(manifest: &Manifest) -> Result<String> {
    serde_json::to_string_pretty(manifest).context("Failed to serialize package.json")
}

/// Write the published manifest to `<out_dir>/package.json`
pub async fn write_manifest(manifest: &Manifest, ctx: &BuildContext) -> Result<()> {
    let path = ctx.out_path(MANIFEST_FILE);
    write_text(&path, &render_manifest(manifest)?).await
}

/// Write the `.npmignore` of the output directory
pub async fn write_npm_ignore(ctx: &BuildContext) -> Result<()> {
    let path = ctx.out_path(".npmignore");
    write_text(&path, &format!("{}\n", NPM_IGNORE.join("\n"))).await
}

async fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents.as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_key_order() {
        let m = parse_manifest(r#"{"name":"a","version":"1.0.0","author":"me","main":"x.js"}"#).unwrap();
        let keys: Vec<&str> = m.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "version", "author", "main"]);
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        let err = parse_manifest("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("an array"));
        assert!(parse_manifest("{ nope").is_err());
    }

    #[test]
    fn test_render_uses_two_space_indent() {
        let m = parse_manifest(r#"{"name":"a","bin":{"a":"./cli.js"}}"#).unwrap();
        assert_eq!(
            render_manifest(&m).unwrap(),
            "{\n  \"name\": \"a\",\n  \"bin\": {\n    \"a\": \"./cli.js\"\n  }\n}"
        );
    }

    #[tokio::test]
    async fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildContext::new(dir.path());
        fs::create_dir_all(&ctx.out_dir).await.unwrap();

        let m = parse_manifest(r#"{"name":"a"}"#).unwrap();
        write_manifest(&m, &ctx).await.unwrap();
        write_npm_ignore(&ctx).await.unwrap();

        let written = std::fs::read_to_string(ctx.out_path("package.json")).unwrap();
        assert_eq!(parse_manifest(&written).unwrap(), m);
        let ignore = std::fs::read_to_string(ctx.out_path(".npmignore")).unwrap();
        assert_eq!(ignore, "node_modules\n.npmrc\n");
    }
}
