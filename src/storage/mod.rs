//! # Storage Layer
//!
//! Persistence for Cascade tasks and dependency rows.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | SQLite table `tasks` | `<data dir>/cascade.db` |
//! | Dependencies | SQLite table `task_dependencies` | `<data dir>/cascade.db` |
//! | Config | TOML | `<config dir>/config.toml` |
//!
//! ## Key Types
//!
//! - [`TaskStore`] - Interface the planner reads and writes through
//! - [`SqliteStore`] - Durable store used by the CLI
//! - [`MemoryStore`] - Ordered in-memory store for tests and embedding
//! - [`Config`] - User configuration

mod store;
mod sqlite;
mod memory;
mod config;

pub use store::{StoreError, TaskStore};
pub use sqlite::SqliteStore;
pub use memory::MemoryStore;
pub use config::{Config, ConfigError, OutputFormat, DB_ENV};
