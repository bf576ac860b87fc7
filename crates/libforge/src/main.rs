//! libforge CLI - scaffold, build, lint and test JavaScript/TypeScript libraries

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use libforge_core::commands::build::{build, BuildOptions};
use libforge_core::commands::lint::{lint, LintOptions};
use libforge_core::tui::InitArgs;
use libforge_core::{BuildContext, Orchestrator, TaskError};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "libforge")]
#[command(about = "Scaffold, build, lint and test JavaScript/TypeScript libraries")]
#[command(version)]
pub struct Args {
    /// Do not print task progress
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new library
    Init(CliInitArgs),
    /// Build the library
    Build(CliBuildArgs),
    /// Verify code quality
    Lint(CliLintArgs),
    /// Run the tests
    Test,
}

#[derive(Parser, Debug)]
pub struct CliInitArgs {
    /// Name of the library (and of its directory)
    pub name: String,

    /// The template to use
    #[arg(long)]
    pub template: Option<String>,

    /// The license to apply
    #[arg(long)]
    pub license: Option<String>,

    /// Author name (prompted for when missing)
    #[arg(long)]
    pub author: Option<String>,

    /// Author email (prompted for when missing)
    #[arg(long)]
    pub email: Option<String>,

    /// Local directory to use for templates instead of fetching from remote (for development use)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,

    /// Do not install dev dependencies
    #[arg(long = "skip-install")]
    pub skip_install: bool,
}

impl From<CliInitArgs> for InitArgs {
    fn from(args: CliInitArgs) -> Self {
        InitArgs {
            name: args.name,
            template: args.template,
            license: args.license,
            author: args.author,
            email: args.email,
            template_dir: args.template_dir,
            skip_install: args.skip_install,
        }
    }
}

#[derive(Parser, Debug)]
pub struct CliBuildArgs {
    /// Only run the packaging step
    #[arg(short, long)]
    pub package_only: bool,

    /// Empty the build directory beforehand
    #[arg(short, long)]
    pub clean: bool,

    /// Treat warnings on non-optional steps as errors
    #[arg(short = 'e', long)]
    pub werror: bool,
}

#[derive(Parser, Debug)]
pub struct CliLintArgs {
    /// Fix the code
    #[arg(long)]
    pub fix: bool,

    /// Treat warnings on non-optional steps as errors
    #[arg(short = 'e', long)]
    pub werror: bool,
}

async fn run(args: Args) -> Result<()> {
    let orchestrator = if args.quiet {
        Orchestrator::silent()
    } else {
        Orchestrator::console()
    };

    match args.command {
        Command::Init(init_args) => {
            let result = libforge_core::tui::run_init(init_args.into(), &orchestrator).await;

            // Ensure cursor is visible on normal exit
            let _ = console::Term::stderr().show_cursor();

            result
        }
        Command::Build(build_args) => {
            let ctx = BuildContext::load(std::env::current_dir()?)?;
            let opts = BuildOptions {
                package_only: build_args.package_only,
                clean: build_args.clean,
                werror: build_args.werror,
            };
            build(&orchestrator, opts, ctx).await.map(|_| ())
        }
        Command::Lint(lint_args) => {
            let ctx = BuildContext::load(std::env::current_dir()?)?;
            let opts = LintOptions {
                fix: lint_args.fix,
                werror: lint_args.werror,
            };
            lint(&orchestrator, opts, ctx).await.map(|_| ())
        }
        Command::Test => {
            let ctx = BuildContext::load(std::env::current_dir()?)?;
            libforge_core::commands::test::test(&ctx).await
        }
    }
}

#[tokio::main]
async fn main() {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    let quiet = args.quiet;

    if let Err(e) = run(args).await {
        // Task failures were already shown by the console reporter
        if quiet || e.downcast_ref::<TaskError>().is_none() {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_build_flags() {
        let args = Args::parse_from(["libforge", "build", "-p", "-c", "-e"]);
        match args.command {
            Command::Build(b) => assert!(b.package_only && b.clean && b.werror),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_init_args() {
        let args = Args::parse_from([
            "libforge",
            "--quiet",
            "init",
            "my-lib",
            "--license=MIT",
            "--author",
            "Ada",
        ]);
        assert!(args.quiet);
        match args.command {
            Command::Init(init) => {
                let init: InitArgs = init.into();
                assert_eq!(init.name, "my-lib");
                assert_eq!(init.license.as_deref(), Some("MIT"));
                assert_eq!(init.author.as_deref(), Some("Ada"));
                assert!(init.email.is_none());
                assert!(init.template.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_lint_defaults() {
        let args = Args::parse_from(["libforge", "lint"]);
        match args.command {
            Command::Lint(l) => assert!(!l.fix && !l.werror),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
