//! Runtime detection for Node.js

use anyhow::Result;
use semver::{Version, VersionReq};
use tokio::process::Command;

/// Node.js range every generated project supports
pub const MIN_NODE_VERSION: &str = ">=14";

/// Runtime detection result
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    pub name: &'static str,
    pub version: Option<String>,
    pub available: bool,
}

impl RuntimeInfo {
    /// Detected version as semver, ignoring a leading `v`
    pub fn semver(&self) -> Option<Version> {
        let raw = self.version.as_deref()?.trim();
        Version::parse(raw.strip_prefix('v').unwrap_or(raw)).ok()
    }
}

/// Check if Node.js is available
pub async fn check_node() -> RuntimeInfo {
    detect("Node.js", "node").await
}

/// Run `<program> --version` and record what it printed
async fn detect(name: &'static str, program: &str) -> RuntimeInfo {
    let output = Command::new(program).arg("--version").output().await;

    match output {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout).trim().to_string();
            RuntimeInfo {
                name,
                version: Some(version),
                available: true,
            }
        }
        _ => RuntimeInfo {
            name,
            version: None,
            available: false,
        },
    }
}

/// Fail unless Node.js is installed and matches `req`
pub async fn require_node(req: &VersionReq) -> Result<RuntimeInfo> {
    let info = check_node().await;
    ensure_satisfies(&info, req)?;
    Ok(info)
}

fn ensure_satisfies(info: &RuntimeInfo, req: &VersionReq) -> Result<()> {
    if !info.available {
        anyhow::bail!(
            "{} is required but was not found in PATH.\n\
             Install it from https://nodejs.org and try again.",
            info.name
        );
    }

    match info.semver() {
        Some(version) if req.matches(&version) => Ok(()),
        Some(version) => anyhow::bail!(
            "{} {} is not supported, {} {} is required",
            info.name,
            version,
            info.name,
            req
        ),
        None => anyhow::bail!(
            "Could not determine the {} version from {:?}",
            info.name,
            info.version.as_deref().unwrap_or_default()
        ),
    }
}
