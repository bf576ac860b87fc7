//! Runtime detection and external process plumbing
//!
//! This module provides:
//! - Node.js detection and version requirements
//! - Spawning external tools with streamed, captured output

pub mod check;
pub mod process;

pub use check::{check_node, require_node, RuntimeInfo, MIN_NODE_VERSION};
pub use process::{describe, run_inherited, run_streaming, ProcessOutput, Stream};
