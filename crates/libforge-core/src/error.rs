//! Typed configuration errors
//!
//! Everything else travels as `anyhow::Error`; these are the failures callers (and
//! tests) need to tell apart.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot create a project named \"{name}\" because of npm naming restrictions:\n{}", format_problems(.problems))]
    InvalidProjectName { name: String, problems: Vec<String> },

    #[error("unknown template: {0}")]
    UnknownTemplate(String),

    #[error("unknown license: {0}")]
    UnknownLicense(String),

    #[error("Template '{template}' lists a file outside the project directory: {path}")]
    UnsafeTemplatePath { template: String, path: String },

    #[error("Expecting a path relative to the dist directory, but got {path} instead")]
    PathOutsideOutput { path: String },

    #[error("Invalid configuration in {}: {message}", .file.display())]
    InvalidConfig { file: PathBuf, message: String },
}

fn format_problems(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("  * {}", p))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_name_lists_every_problem() {
        let err = ConfigError::InvalidProjectName {
            name: "My App".to_string(),
            problems: vec![
                "name can no longer contain capital letters".to_string(),
                "name can only contain URL-friendly characters".to_string(),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("\"My App\""));
        assert!(text.contains("  * name can no longer contain capital letters"));
        assert!(text.contains("  * name can only contain URL-friendly characters"));
    }
}
