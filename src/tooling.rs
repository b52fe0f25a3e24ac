//! Tooling & Integration Layer
//!
//! Thin command-line surface over the catalog operations. No catalog logic
//! lives here; every command is a direct call into the library.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
