//! Main CLI application structure

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{deps, task};
use crate::logging;
use crate::planner::Planner;
use crate::storage::{Config, SqliteStore, DB_ENV};

#[derive(Parser)]
#[command(name = "cascade")]
#[command(author, version, about = "Task manager with dependency-aware planning")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the configured format, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Path to the task database
    #[arg(long, global = true, env = DB_ENV)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage tasks
    #[command(subcommand)]
    Task(task::TaskCommands),

    /// Manage dependencies and plan work
    #[command(subcommand)]
    Deps(deps::DepsCommands),
}

/// Resolved settings shared by every command
pub struct AppContext {
    pub config: Config,
    db_path: PathBuf,
}

impl AppContext {
    pub fn new(config: Config, explicit_db: Option<&Path>) -> Result<Self> {
        let db_path = config.database_path(explicit_db)?;
        Ok(Self { config, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Opens the database and wraps it in a planner
    pub fn planner(&self) -> Result<Planner<SqliteStore>> {
        let store = SqliteStore::open(&self.db_path)
            .with_context(|| format!("Failed to open database: {}", self.db_path.display()))?;
        Ok(Planner::new(store))
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    let config = Config::load()?;
    let format = cli
        .format
        .unwrap_or_else(|| config.default_format.into());
    let output = Output::new(format);
    let ctx = AppContext::new(config, cli.db.as_deref())?;

    output.verbose(&format!("Using database: {}", ctx.db_path().display()));

    match cli.command {
        Commands::Task(cmd) => task::run(cmd, &ctx, &output)?,
        Commands::Deps(cmd) => deps::run(cmd, &ctx, &output)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}
