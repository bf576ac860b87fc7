//! `libforge lint`: run eslint over the project sources with a generated base config

use crate::context::BuildContext;
use crate::runtime::process::{describe, run_streaming};
use crate::tasks::{Orchestrator, TaskReport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use walkdir::WalkDir;

/// Extensions linted under `src/`
const LINTED_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

#[derive(Debug, Clone, Copy, Default)]
pub struct LintOptions {
    /// Write fixable problems back to the sources
    pub fix: bool,
    /// Treat warnings on non-optional steps as errors
    pub werror: bool,
}

/// Lint result for one file (eslint's JSON formatter output)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintResult {
    pub file_path: PathBuf,
    #[serde(default)]
    pub messages: Vec<LintMessage>,
    #[serde(default)]
    pub error_count: usize,
    #[serde(default)]
    pub warning_count: usize,
    /// Fixed source, present when fixes were computed
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintMessage {
    #[serde(default)]
    pub rule_id: Option<String>,
    /// 1 = warning, 2 = error
    pub severity: u8,
    pub message: String,
    #[serde(default)]
    pub line: usize,
    #[serde(default)]
    pub column: usize,
}

/// Runs a linter over a set of files
#[async_trait]
pub trait Linter: Send + Sync {
    async fn lint(&self, root: &Path, files: &[PathBuf], fix: bool) -> Result<Vec<LintResult>>;
}

/// eslint through `npx`, configured with [`eslint_config`]
#[derive(Debug, Clone, Default)]
pub struct Eslint;

#[async_trait]
impl Linter for Eslint {
    async fn lint(&self, root: &Path, files: &[PathBuf], fix: bool) -> Result<Vec<LintResult>> {
        let mut config = tempfile::Builder::new()
            .prefix("libforge-eslint-")
            .suffix(".json")
            .tempfile()
            .context("Failed to create the eslint config file")?;
        config.write_all(serde_json::to_string_pretty(&eslint_config())?.as_bytes())?;

        let mut cmd = Command::new("npx");
        cmd.current_dir(root)
            .args(["--no-install", "eslint", "--no-eslintrc", "--format", "json"])
            .arg("--config")
            .arg(config.path());
        if fix {
            cmd.arg("--fix-dry-run");
        }
        cmd.args(files);

        let display = describe(&cmd);
        let output = run_streaming(&mut cmd, |_, _| {}).await?;

        // 0: clean, 1: lint errors, anything else: eslint itself failed
        match output.status.code() {
            Some(0) | Some(1) => serde_json::from_str(&output.stdout)
                .with_context(|| format!("Unexpected output from `{}`", display)),
            _ => anyhow::bail!(
                "`{}` failed with {}\n{}",
                display,
                output.status,
                output.combined().trim_end()
            ),
        }
    }
}

/// Base eslint configuration applied to every project
pub fn eslint_config() -> Value {
    json!({
        "root": true,
        "settings": {
            "import/resolver": {
                "node": { "extensions": [".ts", ".js", ".tsx", ".jsx"] }
            }
        },
        "env": { "node": true, "browser": true, "es2021": true },
        "parserOptions": { "ecmaVersion": 12, "sourceType": "module" },
        "extends": [
            "eslint:recommended",
            "plugin:import/errors",
            "plugin:import/warnings"
        ],
        "plugins": ["prettier"],
        "rules": {
            "prettier/prettier": [
                "error",
                { "singleQuote": true, "endOfLine": "lf", "printWidth": 80, "trailingComma": "es5" }
            ],
            "require-atomic-updates": "warn",
            "class-methods-use-this": "warn",
            "no-caller": "warn",
            "no-empty-function": "warn"
        },
        "overrides": [
            {
                "files": ["*.ts", "*.tsx"],
                "parser": "@typescript-eslint/parser",
                "extends": [
                    "plugin:@typescript-eslint/eslint-recommended",
                    "plugin:@typescript-eslint/recommended",
                    "plugin:import/typescript"
                ],
                "plugins": ["@typescript-eslint"],
                "rules": {
                    "@typescript-eslint/no-non-null-assertion": "off",
                    "@typescript-eslint/no-explicit-any": ["error", { "ignoreRestArgs": true }],
                    "no-unused-vars": "off",
                    "@typescript-eslint/no-unused-vars": ["error", { "argsIgnorePattern": "^_" }],
                    "@typescript-eslint/ban-ts-comment": "off"
                }
            }
        ]
    })
}

/// Lintable files under `<root>/src`, sorted
pub fn source_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root.join("src"))
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| LINTED_EXTENSIONS.contains(&ext))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Total (errors, warnings)
pub fn count_problems(results: &[LintResult]) -> (usize, usize) {
    results.iter().fold((0, 0), |(errors, warnings), r| {
        (errors + r.error_count, warnings + r.warning_count)
    })
}

/// Human-readable report in the style of eslint's `stylish` formatter
pub fn format_results(results: &[LintResult], root: &Path) -> String {
    let mut out = String::new();

    for result in results.iter().filter(|r| !r.messages.is_empty()) {
        let path = result.file_path.strip_prefix(root).unwrap_or(&result.file_path);
        out.push_str(&format!("\n{}\n", path.display().to_string().underline()));

        for msg in &result.messages {
            let severity = if msg.severity >= 2 {
                "error".red()
            } else {
                "warning".yellow()
            };
            out.push_str(&format!(
                "  {}  {}  {}  {}\n",
                format!("{}:{}", msg.line, msg.column).dimmed(),
                severity,
                msg.message,
                msg.rule_id.as_deref().unwrap_or_default().dimmed()
            ));
        }
    }

    let (errors, warnings) = count_problems(results);
    if errors + warnings > 0 {
        let summary = format!(
            "\n✖ {} problem{} ({} error{}, {} warning{})\n",
            errors + warnings,
            plural(errors + warnings),
            errors,
            plural(errors),
            warnings,
            plural(warnings)
        );
        out.push_str(&if errors > 0 {
            summary.red().bold().to_string()
        } else {
            summary.yellow().bold().to_string()
        });
    }

    out
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Lint with eslint
pub async fn lint(
    orchestrator: &Orchestrator,
    opts: LintOptions,
    ctx: BuildContext,
) -> Result<TaskReport> {
    lint_with(orchestrator, opts, ctx, Arc::new(Eslint)).await
}

pub async fn lint_with(
    orchestrator: &Orchestrator,
    opts: LintOptions,
    ctx: BuildContext,
    linter: Arc<dyn Linter>,
) -> Result<TaskReport> {
    let root = ctx.root_dir.clone();

    let run = orchestrator
        .run("Lint...", move |scope| async move {
            scope.run("Processing source", move |task| async move {
                let files = source_files(&root);
                if files.is_empty() {
                    task.set_message("No source files found");
                    return Ok(());
                }

                let results = linter.lint(&root, &files, opts.fix).await?;
                let (errors, warnings) = count_problems(&results);
                if errors + warnings > 0 {
                    eprintln!("{}", format_results(&results, &root));
                }

                if opts.fix {
                    task.run("Applying fixes", move |_| async move {
                        apply_fixes(&results).await
                    });
                }

                if errors > 0 {
                    anyhow::bail!("Errors found: {} error{}", errors, plural(errors));
                }
                if warnings > 0 {
                    task.warn(format!("Warnings found: {} warning{}", warnings, plural(warnings)));
                }
                Ok(())
            });
            Ok(())
        })
        .await;

    super::finish(run, opts.werror, "Lint")
}

/// Write fixed sources back to disk
async fn apply_fixes(results: &[LintResult]) -> Result<usize> {
    let mut fixed = 0;
    for result in results {
        if let Some(output) = &result.output {
            tokio::fs::write(&result.file_path, output)
                .await
                .with_context(|| format!("Failed to write {}", result.file_path.display()))?;
            fixed += 1;
        }
    }
    Ok(fixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns canned results and records what it was asked to lint
    struct FakeLinter {
        results: Vec<LintResult>,
        calls: Mutex<Vec<(Vec<PathBuf>, bool)>>,
    }

    impl FakeLinter {
        fn new(results: Vec<LintResult>) -> Arc<Self> {
            Arc::new(Self {
                results,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Linter for FakeLinter {
        async fn lint(&self, _root: &Path, files: &[PathBuf], fix: bool) -> Result<Vec<LintResult>> {
            self.calls.lock().unwrap().push((files.to_vec(), fix));
            Ok(self.results.clone())
        }
    }

    fn result(path: PathBuf, severities: &[u8], output: Option<&str>) -> LintResult {
        let messages: Vec<LintMessage> = severities
            .iter()
            .map(|&severity| LintMessage {
                rule_id: Some("no-console".to_string()),
                severity,
                message: "Unexpected console statement.".to_string(),
                line: 3,
                column: 5,
            })
            .collect();
        LintResult {
            file_path: path,
            error_count: severities.iter().filter(|&&s| s == 2).count(),
            warning_count: severities.iter().filter(|&&s| s == 1).count(),
            messages,
            output: output.map(str::to_string),
        }
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        std::fs::write(dir.path().join("src/index.ts"), "console.log(1)\n").unwrap();
        std::fs::write(dir.path().join("src/nested/util.js"), "").unwrap();
        std::fs::write(dir.path().join("src/notes.md"), "").unwrap();
        dir
    }

    #[test]
    fn test_source_files_filters_extensions() {
        let dir = project();
        let files = source_files(dir.path());
        assert_eq!(
            files,
            vec![
                dir.path().join("src/index.ts"),
                dir.path().join("src/nested/util.js")
            ]
        );
        assert!(source_files(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_parse_eslint_json() {
        let raw = r#"[{"filePath":"/p/src/index.ts","messages":[{"ruleId":null,"severity":2,"message":"Parsing error","line":1,"column":1,"fatal":true}],"errorCount":1,"warningCount":0,"fixableErrorCount":0,"source":"x"}]"#;
        let results: Vec<LintResult> = serde_json::from_str(raw).unwrap();
        assert_eq!(results[0].error_count, 1);
        assert!(results[0].messages[0].rule_id.is_none());
        assert!(results[0].output.is_none());
    }

    #[test]
    fn test_format_results() {
        colored::control::set_override(false);
        let results = vec![
            result(PathBuf::from("/p/src/index.ts"), &[2, 1], None),
            result(PathBuf::from("/p/src/clean.ts"), &[], None),
        ];
        let text = format_results(&results, Path::new("/p"));
        assert!(text.contains("src/index.ts"));
        assert!(!text.contains("clean.ts"));
        assert!(text.contains("3:5  error  Unexpected console statement.  no-console"));
        assert!(text.contains("✖ 2 problems (1 error, 1 warning)"));
    }

    #[tokio::test]
    async fn test_warnings_warn_and_werror_fails() {
        let dir = project();
        let linter = FakeLinter::new(vec![result(dir.path().join("src/index.ts"), &[1], None)]);
        let ctx = BuildContext::new(dir.path());

        let report = lint_with(
            &Orchestrator::silent(),
            LintOptions::default(),
            ctx.clone(),
            linter.clone(),
        )
        .await
        .unwrap();
        assert!(report.outcome().unwrap().is_warn());
        assert_eq!(linter.calls.lock().unwrap()[0].0.len(), 2);

        let opts = LintOptions {
            werror: true,
            ..Default::default()
        };
        let err = lint_with(&Orchestrator::silent(), opts, ctx, linter).await.unwrap_err();
        assert!(err.to_string().contains("Warnings found: 1 warning"));
    }

    #[tokio::test]
    async fn test_errors_fail() {
        let dir = project();
        let linter = FakeLinter::new(vec![result(dir.path().join("src/index.ts"), &[2, 1], None)]);

        let err = lint_with(
            &Orchestrator::silent(),
            LintOptions::default(),
            BuildContext::new(dir.path()),
            linter,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Errors found: 1 error"));
    }

    #[tokio::test]
    async fn test_fix_writes_outputs_even_with_remaining_errors() {
        let dir = project();
        let index = dir.path().join("src/index.ts");
        let linter = FakeLinter::new(vec![result(index.clone(), &[2], Some("console.log(1);\n"))]);
        let opts = LintOptions {
            fix: true,
            ..Default::default()
        };

        let outcome = lint_with(
            &Orchestrator::silent(),
            opts,
            BuildContext::new(dir.path()),
            linter.clone(),
        )
        .await;
        assert!(outcome.is_err());
        assert!(linter.calls.lock().unwrap()[0].1);
        assert_eq!(std::fs::read_to_string(&index).unwrap(), "console.log(1);\n");
    }

    #[tokio::test]
    async fn test_no_sources() {
        let dir = tempfile::tempdir().unwrap();
        let linter = FakeLinter::new(vec![]);
        let report = lint_with(
            &Orchestrator::silent(),
            LintOptions::default(),
            BuildContext::new(dir.path()),
            linter.clone(),
        )
        .await
        .unwrap();
        assert!(report.outcome().unwrap().is_ok());
        assert!(linter.calls.lock().unwrap().is_empty());
        assert_eq!(
            report.find("Processing source").unwrap().message.as_deref(),
            Some("No source files found")
        );
    }
}
