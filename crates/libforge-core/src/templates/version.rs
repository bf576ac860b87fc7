//! Version comparison for CLI and template compatibility

use semver::Version;

/// Compare CLI version against template version
/// Returns a warning message if the CLI is older than the template expects
pub fn check_compatibility(cli_version: &str, template_version: &str) -> Option<String> {
    let cli_ver = parse_version(cli_version)?;
    let template_ver = parse_version(template_version)?;

    if cli_ver < template_ver {
        Some(format!(
            "This template was designed for libforge {} or newer, you are running {}. \
             Consider updating: cargo install libforge --force",
            template_version, cli_version
        ))
    } else {
        None
    }
}

/// Parse a version, tolerating a leading `v`
fn parse_version(version_str: &str) -> Option<Version> {
    let cleaned = version_str.trim().strip_prefix('v').unwrap_or(version_str.trim());
    Version::parse(cleaned).ok()
}
