//! `libforge init`: create a new library project
//!
//! validate → create dir → check destination → (render template ∥ write package.json)
//! → write files, install dev dependencies once package.json exists.

use crate::error::ConfigError;
use crate::package::{render_manifest, Manifest, MANIFEST_FILE};
use crate::paths;
use crate::runtime::check::{require_node, MIN_NODE_VERSION};
use crate::runtime::process::{describe, run_streaming};
use crate::tasks::{Orchestrator, TaskReport, TaskScope};
use crate::templates::{licenses, Author, TemplateConfig, TemplateRegistry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use semver::VersionReq;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::process::Command;

pub const DEFAULT_TEMPLATE: &str = "recommended";
pub const DEFAULT_LICENSE: &str = "Apache-2.0";

/// Environment variable overriding the package manager used for installs
pub const PACKAGE_MANAGER_ENV: &str = "LIBFORGE_PACKAGE_MANAGER";
const DEFAULT_PACKAGE_MANAGER: &str = "pnpm";

/// Tooling `build`, `lint` and `test` drive, installed into every new project
pub const DEV_DEPENDENCIES: &[&str] = &[
    "typescript",
    "esbuild",
    "eslint@^8",
    "@typescript-eslint/parser",
    "@typescript-eslint/eslint-plugin",
    "eslint-plugin-import",
    "eslint-plugin-prettier",
    "prettier",
    "jest",
    "ts-jest",
    "@types/jest",
];

/// Entries that may already exist in a directory we initialize into
const ALLOWED_FILES: &[&str] = &[
    ".DS_Store",
    ".git",
    ".gitattributes",
    ".gitignore",
    ".gitlab-ci.yml",
    ".hg",
    ".hgcheck",
    ".hgignore",
    ".idea",
    ".npmignore",
    ".travis.yml",
    "docs",
    "LICENSE",
    "README.md",
    "mkdocs.yml",
    "Thumbs.db",
];

/// Leftovers of a failed install; removed silently on the next init
const ERROR_LOG_PREFIXES: &[&str] = &[".pnpm-debug.log"];

const NODE_CORE_MODULES: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

const MAX_NAME_LENGTH: usize = 214;

#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Directory name of the new project, resolved against `base_dir`
    pub name: String,
    pub author: Author,
    pub template: String,
    pub license: String,
    pub base_dir: PathBuf,
    pub skip_install: bool,
}

impl InitOptions {
    pub fn new(name: impl Into<String>, author: Author, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            author,
            template: DEFAULT_TEMPLATE.to_string(),
            license: DEFAULT_LICENSE.to_string(),
            base_dir: base_dir.into(),
            skip_install: false,
        }
    }

    /// Absolute project directory
    pub fn root(&self) -> PathBuf {
        paths::resolve(&self.base_dir, &self.name)
    }

    /// Package name: last component of the project directory
    pub fn app_name(&self) -> String {
        self.root()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// Every npm naming problem with `name`; empty when it is valid for a new package
pub fn validate_project_name(name: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if name.is_empty() {
        errors.push("name length must be greater than zero".to_string());
    }
    if name.starts_with('.') {
        errors.push("name cannot start with a period".to_string());
    }
    if name.starts_with('_') {
        errors.push("name cannot start with an underscore".to_string());
    }
    if name.trim() != name {
        errors.push("name cannot contain leading or trailing spaces".to_string());
    }
    for blacklisted in ["node_modules", "favicon.ico"] {
        if name.eq_ignore_ascii_case(blacklisted) {
            errors.push(format!("{} is a blacklisted name", blacklisted));
        }
    }

    if NODE_CORE_MODULES.contains(&name.to_lowercase().as_str()) {
        warnings.push(format!("{} is a core module name", name));
    }
    if name.len() > MAX_NAME_LENGTH {
        warnings.push(format!(
            "name can no longer contain more than {} characters",
            MAX_NAME_LENGTH
        ));
    }
    if name.to_lowercase() != name {
        warnings.push("name can no longer contain capital letters".to_string());
    }
    let last_segment = name.rsplit('/').next().unwrap_or(name);
    if last_segment.contains(['~', '\'', '!', '(', ')', '*']) {
        warnings.push("name can no longer contain special characters (\"~'!()*\")".to_string());
    }

    if !is_url_friendly_name(name) {
        errors.push("name can only contain URL-friendly characters".to_string());
    }

    errors.extend(warnings);
    errors
}

/// `name` or `@scope/name` made of characters `encodeURIComponent` leaves alone
fn is_url_friendly_name(name: &str) -> bool {
    let unreserved = |s: &str| {
        !s.is_empty()
            && s.chars().all(|c| {
                c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '!' | '~' | '*' | '\'' | '(' | ')')
            })
    };

    match name.strip_prefix('@').and_then(|rest| rest.split_once('/')) {
        Some((scope, pkg)) => unreserved(scope) && unreserved(pkg),
        None => unreserved(name),
    }
}

fn is_error_log(file: &str) -> bool {
    ERROR_LOG_PREFIXES.iter().any(|prefix| file.starts_with(prefix))
}

/// Directory entries that could clash with a new project, sorted
pub fn find_conflicts<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut conflicts: Vec<String> = entries
        .into_iter()
        .map(Into::into)
        .filter(|file| !ALLOWED_FILES.contains(&file.as_str()))
        .filter(|file| !file.ends_with(".iml"))
        .filter(|file| !is_error_log(file))
        .collect();
    conflicts.sort();
    conflicts
}

async fn list_dir(root: &Path) -> Result<Vec<(String, bool)>> {
    let mut entries = Vec::new();
    let mut dir = fs::read_dir(root)
        .await
        .with_context(|| format!("Failed to read {}", root.display()))?;
    while let Some(entry) = dir.next_entry().await? {
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }
    Ok(entries)
}

/// Warn about conflicting files in `root` and delete stale error logs.
///
/// Conflicts never stop the initialization.
async fn check_destination(scope: TaskScope, root: PathBuf, name: String) -> Result<()> {
    {
        let root = root.clone();
        scope.run("Checking existing files", move |task| async move {
            let entries = list_dir(&root).await?;
            let conflicts = find_conflicts(entries.iter().map(|(file, _)| file.as_str()));
            if !conflicts.is_empty() {
                let listing: Vec<String> = conflicts
                    .iter()
                    .map(|file| {
                        let is_dir = entries.iter().any(|(f, d)| f == file && *d);
                        format!("  {}{}", file, if is_dir { "/" } else { "" })
                    })
                    .collect();
                task.warn(format!(
                    "{} contains potentially conflicting files:\n{}\n\
                     Either try using a new directory name, or remove the files listed above.",
                    name,
                    listing.join("\n")
                ));
            }
            Ok(conflicts)
        });
    }

    scope.run_optional("Removing old error logs", move |_| async move {
        for (file, _) in list_dir(&root).await? {
            if is_error_log(&file) {
                let path = root.join(&file);
                fs::remove_file(&path)
                    .await
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    });

    Ok(())
}

/// `package.json` of a freshly initialized project
pub fn manifest_draft(app_name: &str, author: &Author, license: &str) -> Manifest {
    let draft = json!({
        "name": app_name,
        "version": "0.1.0",
        "private": true,
        "author": author,
        "license": license,
        "type": "module",
        "main": "dist/cjs/index.js",
        "module": "dist/esm/index.js",
        "scripts": {
            "build": "libforge build",
            "test": "libforge test",
            "lint": "libforge lint"
        }
    });
    match draft {
        serde_json::Value::Object(map) => map,
        _ => Manifest::new(),
    }
}

/// Installs npm packages into a project
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    async fn install(
        &self,
        scope: &TaskScope,
        root: &Path,
        dev: bool,
        packages: &[String],
    ) -> Result<()>;
}

/// Runs `<package manager> install [-D] <packages...>`
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
}

impl CommandInstaller {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `pnpm`, unless `LIBFORGE_PACKAGE_MANAGER` names another one
    pub fn from_env() -> Self {
        match std::env::var(PACKAGE_MANAGER_ENV) {
            Ok(program) if !program.trim().is_empty() => Self::new(program.trim()),
            _ => Self::new(DEFAULT_PACKAGE_MANAGER),
        }
    }

    fn command(&self, root: &Path, dev: bool, packages: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(root).arg("install");
        if dev {
            cmd.arg("-D");
        }
        cmd.args(packages);
        cmd
    }
}

#[async_trait]
impl PackageInstaller for CommandInstaller {
    async fn install(
        &self,
        scope: &TaskScope,
        root: &Path,
        dev: bool,
        packages: &[String],
    ) -> Result<()> {
        let mut cmd = self.command(root, dev, packages);
        let display = describe(&cmd);

        let output = run_streaming(&mut cmd, |_, line| {
            if !line.trim().is_empty() {
                scope.set_message(line.trim_end());
            }
        })
        .await?;

        if !output.success() {
            anyhow::bail!(
                "`{}` failed with {}\n{}",
                display,
                output.status,
                output.combined().trim_end()
            );
        }
        Ok(())
    }
}

/// Runs the initialization state machine
pub struct Initializer {
    installer: Arc<dyn PackageInstaller>,
    registry: Arc<TemplateRegistry>,
    min_node: Option<VersionReq>,
    dev_dependencies: Vec<String>,
}

impl Initializer {
    pub fn new(installer: Arc<dyn PackageInstaller>, registry: TemplateRegistry) -> Self {
        Self {
            installer,
            registry: Arc::new(registry),
            min_node: VersionReq::parse(MIN_NODE_VERSION).ok(),
            dev_dependencies: DEV_DEPENDENCIES.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Package manager from the environment, templates from `registry`
    pub fn with_registry(registry: TemplateRegistry) -> Self {
        Self::new(Arc::new(CommandInstaller::from_env()), registry)
    }

    /// Skip the Node.js version check
    pub fn without_runtime_check(mut self) -> Self {
        self.min_node = None;
        self
    }

    /// Check everything that can be checked without touching the disk
    pub async fn validate(&self, opts: &InitOptions) -> Result<()> {
        if let Some(req) = &self.min_node {
            require_node(req).await?;
        }

        let app_name = opts.app_name();
        let problems = validate_project_name(&app_name);
        if !problems.is_empty() {
            return Err(ConfigError::InvalidProjectName {
                name: app_name,
                problems,
            }
            .into());
        }

        if licenses::find(&opts.license).is_none() {
            return Err(ConfigError::UnknownLicense(opts.license.clone()).into());
        }

        if !self.registry.has_template(&opts.template).await? {
            return Err(ConfigError::UnknownTemplate(opts.template.clone()).into());
        }

        Ok(())
    }

    pub async fn init(&self, orchestrator: &Orchestrator, opts: InitOptions) -> Result<TaskReport> {
        self.validate(&opts).await?;

        let root = opts.root();
        let app_name = opts.app_name();
        let license = licenses::find(&opts.license)
            .map(|l| l.id.to_string())
            .unwrap_or_else(|| opts.license.clone());
        let cfg = TemplateConfig {
            lib_name: opts.name.clone(),
            author: opts.author.clone(),
            license: license.clone(),
        };
        let installer = self.installer.clone();
        let registry = self.registry.clone();
        let packages = self.dev_dependencies.clone();

        let run = orchestrator
            .run(format!("Init {}", opts.name), move |scope| async move {
                {
                    let root = root.clone();
                    scope
                        .run("Creating dir", move |_| async move {
                            fs::create_dir_all(&root)
                                .await
                                .with_context(|| format!("Failed to create {}", root.display()))
                        })
                        .join()
                        .await?;
                }

                {
                    let root = root.clone();
                    let name = opts.name.clone();
                    scope
                        .run("Checking destination", move |task| {
                            check_destination(task, root, name)
                        })
                        .join()
                        .await?;
                }

                let template = {
                    let template_name = opts.template.clone();
                    scope.run(format!("loading template {}", opts.template), move |task| async move {
                        let rendered = registry.render(&template_name, &cfg).await?;
                        if let Some(warning) = &rendered.warning {
                            task.warn(warning.clone());
                        }
                        Ok(rendered.files)
                    })
                };

                let manifest_created = {
                    let root = root.clone();
                    let author = opts.author.clone();
                    scope.run("creating package.json", move |_| async move {
                        let draft = manifest_draft(&app_name, &author, &license);
                        let path = root.join(MANIFEST_FILE);
                        fs::write(&path, format!("{}\n", render_manifest(&draft)?))
                            .await
                            .with_context(|| format!("Failed to write {}", path.display()))
                    })
                };

                if !opts.skip_install {
                    let root = root.clone();
                    scope.run("installing dependencies", move |task| async move {
                        manifest_created.join().await?;
                        installer.install(&task, &root, true, &packages).await
                    });
                }

                let template_name = opts.template.clone();
                scope.run("Copying files", move |task| async move {
                    let files = template.join().await?;
                    let escaping = files
                        .iter()
                        .find(|f| !paths::is_confined(Path::new(&f.name)));
                    if let Some(file) = escaping {
                        return Err(ConfigError::UnsafeTemplatePath {
                            template: template_name,
                            path: file.name.clone(),
                        }
                        .into());
                    }
                    for file in files {
                        let path = root.join(&file.name);
                        task.run(file.name.clone(), move |_| async move {
                            if let Some(parent) = path.parent() {
                                fs::create_dir_all(parent).await?;
                            }
                            fs::write(&path, &file.contents)
                                .await
                                .with_context(|| format!("Failed to write {}", path.display()))
                        });
                    }
                    Ok(())
                });

                Ok(())
            })
            .await;

        super::finish(run, false, "Init")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::find_error;
    use crate::templates::TemplateSource;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeInstaller {
        /// (root, dev, packages, package.json present at install time)
        calls: Mutex<Vec<(PathBuf, bool, Vec<String>, bool)>>,
        fail: bool,
    }

    #[async_trait]
    impl PackageInstaller for FakeInstaller {
        async fn install(
            &self,
            scope: &TaskScope,
            root: &Path,
            dev: bool,
            packages: &[String],
        ) -> Result<()> {
            scope.set_message("Progress: resolved 1, reused 0, downloaded 1");
            self.calls.lock().unwrap().push((
                root.to_path_buf(),
                dev,
                packages.to_vec(),
                root.join(MANIFEST_FILE).exists(),
            ));
            if self.fail {
                anyhow::bail!("ERR_PNPM_FETCH_404");
            }
            Ok(())
        }
    }

    fn author() -> Author {
        Author {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    fn initializer(installer: Arc<FakeInstaller>) -> Initializer {
        Initializer::new(installer, TemplateRegistry::builtin()).without_runtime_check()
    }

    #[test]
    fn test_valid_names() {
        for name in ["my-lib", "my.lib", "@scope/my-lib", "lib_2"] {
            assert!(validate_project_name(name).is_empty(), "{}", name);
        }
    }

    #[test]
    fn test_invalid_names() {
        let problems = validate_project_name("My App");
        assert!(problems.contains(&"name can only contain URL-friendly characters".to_string()));
        assert!(problems.contains(&"name can no longer contain capital letters".to_string()));

        assert!(!validate_project_name("").is_empty());
        assert!(!validate_project_name(".hidden").is_empty());
        assert!(!validate_project_name("_private").is_empty());
        assert!(!validate_project_name(" padded").is_empty());
        assert!(!validate_project_name("node_modules").is_empty());
        assert!(!validate_project_name("fs").is_empty());
        assert!(!validate_project_name("wow!").is_empty());
        assert!(!validate_project_name(&"a".repeat(215)).is_empty());
    }

    #[test]
    fn test_find_conflicts() {
        assert!(find_conflicts(["README.md", ".git"]).is_empty());
        assert!(find_conflicts(["project.iml", ".pnpm-debug.log.1", "docs"]).is_empty());
        assert_eq!(
            find_conflicts(["src", "build.log", "LICENSE"]),
            vec!["build.log", "src"]
        );
    }

    #[test]
    fn test_manifest_draft() {
        let draft = manifest_draft("my-lib", &author(), "MIT");
        let keys: Vec<_> = draft.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["name", "version", "private", "author", "license", "type", "main", "module", "scripts"]
        );
        assert_eq!(draft["author"]["email"], "ada@example.com");
        assert_eq!(draft["scripts"]["build"], "libforge build");
    }

    #[test]
    fn test_installer_command() {
        let installer = CommandInstaller::new("pnpm");
        let cmd = installer.command(Path::new("/proj"), true, &["jest".to_string()]);
        assert_eq!(describe(&cmd), "pnpm install -D jest");
    }

    #[tokio::test]
    async fn test_invalid_name_touches_nothing() {
        let base = tempfile::tempdir().unwrap();
        let installer = Arc::new(FakeInstaller::default());
        let opts = InitOptions::new("My App", author(), base.path());

        let err = initializer(installer.clone())
            .init(&Orchestrator::silent(), opts)
            .await
            .unwrap_err();
        assert!(matches!(
            find_error::<ConfigError>(&err),
            Some(ConfigError::InvalidProjectName { name, .. }) if name == "My App"
        ));
        assert!(!base.path().join("My App").exists());
        assert!(installer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_license_and_template() {
        let base = tempfile::tempdir().unwrap();
        let init = initializer(Arc::new(FakeInstaller::default()));

        let mut opts = InitOptions::new("my-lib", author(), base.path());
        opts.license = "WTFPL".to_string();
        let err = init.validate(&opts).await.unwrap_err();
        assert!(matches!(find_error::<ConfigError>(&err), Some(ConfigError::UnknownLicense(_))));

        let mut opts = InitOptions::new("my-lib", author(), base.path());
        opts.template = "fancy".to_string();
        let err = init.validate(&opts).await.unwrap_err();
        assert!(matches!(find_error::<ConfigError>(&err), Some(ConfigError::UnknownTemplate(_))));
        assert!(!base.path().join("my-lib").exists());
    }

    #[tokio::test]
    async fn test_full_init() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("my-lib");
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("README.md"), "old readme").unwrap();

        let installer = Arc::new(FakeInstaller::default());
        let mut opts = InitOptions::new("my-lib", author(), base.path());
        opts.license = "mit".to_string();

        let report = initializer(installer.clone())
            .init(&Orchestrator::silent(), opts)
            .await
            .unwrap();

        assert!(report.find("Checking existing files").unwrap().outcome().unwrap().is_ok());
        assert!(report.outcome().unwrap().is_ok());

        let manifest = std::fs::read_to_string(root.join("package.json")).unwrap();
        assert!(manifest.ends_with("}\n"));
        let manifest: serde_json::Value = serde_json::from_str(&manifest).unwrap();
        assert_eq!(manifest["name"], "my-lib");
        assert_eq!(manifest["license"], "MIT");
        assert_eq!(manifest["author"]["name"], "Ada Lovelace");

        let index = std::fs::read_to_string(root.join("src/index.ts")).unwrap();
        assert!(index.starts_with("/**\n * Copyright"));
        assert!(std::fs::read_to_string(root.join("LICENSE"))
            .unwrap()
            .starts_with("MIT License"));
        assert!(root.join("tests/index.test.ts").exists());
        assert!(std::fs::read_to_string(root.join("README.md"))
            .unwrap()
            .starts_with("# my-lib"));

        let calls = installer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (install_root, dev, packages, had_manifest) = &calls[0];
        assert_eq!(install_root, &root);
        assert!(*dev);
        assert!(packages.contains(&"typescript".to_string()));
        assert!(*had_manifest);
        assert_eq!(
            report.find("installing dependencies").unwrap().message.as_deref(),
            Some("Progress: resolved 1, reused 0, downloaded 1")
        );
    }

    #[tokio::test]
    async fn test_template_files_stay_inside_project() {
        let base = tempfile::tempdir().unwrap();
        let templates = tempfile::tempdir().unwrap();
        std::fs::write(templates.path().join("template.yaml"), "templates: [sneaky]\n").unwrap();
        std::fs::create_dir_all(templates.path().join("sneaky")).unwrap();
        std::fs::write(
            templates.path().join("sneaky/template.yaml"),
            "name: Sneaky\nversion: 0.1.0\nfiles: ['../escaped.txt']\n",
        )
        .unwrap();
        std::fs::write(templates.path().join("escaped.txt"), "outside").unwrap();

        let registry =
            TemplateRegistry::with_source(TemplateSource::Local(templates.path().to_path_buf()));
        let initializer = Initializer::new(Arc::new(FakeInstaller::default()), registry)
            .without_runtime_check();
        let mut opts = InitOptions::new("my-lib", author(), base.path());
        opts.template = "sneaky".to_string();
        opts.skip_install = true;

        let err = initializer
            .init(&Orchestrator::silent(), opts)
            .await
            .unwrap_err();
        assert!(matches!(
            find_error::<ConfigError>(&err),
            Some(ConfigError::UnsafeTemplatePath { path, .. }) if path == "../escaped.txt"
        ));
        assert!(!base.path().join("escaped.txt").exists());
    }

    #[tokio::test]
    async fn test_conflicts_warn_and_continue() {
        let base = tempfile::tempdir().unwrap();
        let root = base.path().join("my-lib");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("build.log"), "").unwrap();
        std::fs::write(root.join(".pnpm-debug.log"), "").unwrap();

        let mut opts = InitOptions::new("my-lib", author(), base.path());
        opts.skip_install = true;
        let installer = Arc::new(FakeInstaller::default());

        let report = initializer(installer.clone())
            .init(&Orchestrator::silent(), opts)
            .await
            .unwrap();

        let check = report.find("Checking existing files").unwrap();
        assert!(check.outcome().unwrap().is_warn());
        assert!(check.warnings[0].contains("build.log"));
        assert!(report.outcome().unwrap().is_warn());

        assert!(root.join("src/index.ts").exists());
        assert!(root.join("build.log").exists());
        assert!(!root.join(".pnpm-debug.log").exists());
        assert!(installer.calls.lock().unwrap().is_empty());
        assert!(report.find("installing dependencies").is_none());
    }

    #[tokio::test]
    async fn test_install_failure_fails_init() {
        let base = tempfile::tempdir().unwrap();
        let installer = Arc::new(FakeInstaller {
            fail: true,
            ..Default::default()
        });
        let opts = InitOptions::new("my-lib", author(), base.path());

        let err = initializer(installer)
            .init(&Orchestrator::silent(), opts)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ERR_PNPM_FETCH_404"));
        // Files are still written
        assert!(base.path().join("my-lib/src/index.ts").exists());
    }
}
