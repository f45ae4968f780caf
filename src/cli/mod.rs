//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Task | Work item management | `task add`, `task list`, `task next` |
//! | Deps | Dependency graph and planning | `deps add`, `deps plan`, `deps critical` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Database
//!
//! `--db <path>` (or `CASCADE_DB`) selects the SQLite database; otherwise the
//! configured `database` or the platform data directory is used.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output on stderr:
//! ```bash
//! cascade --verbose deps plan
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod task;
mod deps;

pub use app::{AppContext, Cli, Commands, run};
pub use output::{Output, OutputFormat};
