//! Charm-style prompts around `libforge init`

use crate::commands::init::{InitOptions, Initializer, DEFAULT_LICENSE, DEFAULT_TEMPLATE};
use crate::tasks::Orchestrator;
use crate::templates::{licenses, Author, TemplateRegistry, TemplateSource};
use anyhow::Result;
use std::path::PathBuf;

/// Arguments of the init command; missing author details are prompted for
#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    pub name: String,
    pub template: Option<String>,
    pub license: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
    /// Local directory to use for templates instead of the built-in/remote ones
    pub template_dir: Option<PathBuf>,
    pub skip_install: bool,
}

/// Run `init` with interactive prompts
pub async fn run_init(args: InitArgs, orchestrator: &Orchestrator) -> Result<()> {
    cliclack::intro("libforge")?;

    let author = Author {
        name: match args.author {
            Some(name) => name,
            None => cliclack::input("Author name").interact()?,
        },
        email: match args.email {
            Some(email) => email,
            None => cliclack::input("Author email")
                .required(false)
                .placeholder("you@example.com")
                .interact()?,
        },
    };

    let registry = match &args.template_dir {
        Some(path) => {
            cliclack::log::info(format!("Using local templates from {}", path.display()))?;
            TemplateRegistry::with_source(TemplateSource::Local(path.clone()))
        }
        None => TemplateRegistry::from_env()?,
    };

    let mut opts = InitOptions::new(args.name.clone(), author, std::env::current_dir()?);
    opts.template = args.template.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
    opts.license = args.license.unwrap_or_else(|| DEFAULT_LICENSE.to_string());
    opts.skip_install = args.skip_install;

    if licenses::find(&opts.license).is_none() {
        cliclack::log::warning(format!(
            "Known licenses: {}",
            licenses::known_ids().join(", ")
        ))?;
    }

    let project_dir = opts.root();
    let skip_install = opts.skip_install;
    Initializer::with_registry(registry)
        .init(orchestrator, opts)
        .await?;

    print_next_steps(&args.name, &project_dir, skip_install)
}

fn print_next_steps(name: &str, project_dir: &PathBuf, skip_install: bool) -> Result<()> {
    let mut steps = Vec::new();
    if std::env::current_dir().ok().as_ref() != Some(project_dir) {
        steps.push(format!("cd {}", name));
    }
    if skip_install {
        steps.push("pnpm install".to_string());
    }
    steps.push("libforge build".to_string());
    steps.push("libforge test".to_string());

    println!();
    println!("  Next steps");
    println!();

    for (i, step) in steps.iter().enumerate() {
        println!("  {}.  {}", i + 1, step);
    }

    cliclack::outro("Happy hacking!")?;

    Ok(())
}
