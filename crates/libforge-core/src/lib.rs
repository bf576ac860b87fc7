//! libforge Core - Shared library for the `libforge` CLI
//!
//! This library provides everything needed to scaffold, bundle, package, lint and
//! test a JavaScript/TypeScript library project. The heavy lifting (compiling,
//! linting, running tests, installing packages) is delegated to external tools;
//! this crate drives them and keeps track of what happened.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Task Orchestration** - [`tasks`] runs a tree of named async steps and
//!   aggregates their `ok`/`warn`/`fail` status
//! - **Layer 2: Core Operations** - manifest rewriting ([`package`]), dual-format
//!   bundling ([`bundle`]), template rendering ([`templates`]), external process
//!   plumbing ([`runtime`])
//! - **Layer 3: Commands** - [`commands`] wires the operations into `init`, `build`,
//!   `lint` and `test`
//! - **Layer 4: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based prompts module
//!
//! # Example Usage
//!
//! ```ignore
//! use libforge_core::{BuildContext, Orchestrator};
//! use libforge_core::commands::build::{build, BuildOptions};
//!
//! let ctx = BuildContext::load(std::env::current_dir()?)?;
//! let orchestrator = Orchestrator::console();
//! let report = build(&orchestrator, BuildOptions::default(), ctx).await?;
//! ```

pub mod bundle;
pub mod commands;
pub mod context;
pub mod error;
pub mod package;
pub mod paths;
pub mod runtime;
pub mod tasks;
pub mod templates;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use context::BuildContext;
pub use error::ConfigError;
pub use package::{move_dist_path, transform_manifest, Manifest};
pub use tasks::{Orchestrator, Outcome, TaskError, TaskHandle, TaskReport, TaskScope};
pub use templates::{get_template, Author, FileKind, TemplateConfig, TemplateFile};

/// CLI version - used for template compatibility checking
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");
