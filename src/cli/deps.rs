//! Dependency and planning CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::app::AppContext;
use super::output::{task_row, Output};
use crate::domain::TaskId;

#[derive(Subcommand)]
pub enum DepsCommands {
    /// Make a task depend on another
    ///
    /// Rejected if it would create a cycle.
    Add {
        /// Task that will be blocked
        task: TaskId,

        /// Task that must be completed first
        depends_on: TaskId,
    },

    /// Remove a dependency
    Remove {
        /// Task to unblock
        task: TaskId,

        /// Dependency to remove
        depends_on: TaskId,
    },

    /// Show what a task depends on and what depends on it
    Show {
        /// Task ID
        id: TaskId,
    },

    /// Print an execution order for all incomplete tasks
    Plan,

    /// Print the longest chain of dependent incomplete tasks
    Critical,
}

pub fn run(cmd: DepsCommands, ctx: &AppContext, output: &Output) -> Result<()> {
    match cmd {
        DepsCommands::Add { task, depends_on } => add_dependency(ctx, output, task, depends_on),
        DepsCommands::Remove { task, depends_on } => {
            remove_dependency(ctx, output, task, depends_on)
        }
        DepsCommands::Show { id } => show_dependencies(ctx, output, id),
        DepsCommands::Plan => show_plan(ctx, output),
        DepsCommands::Critical => show_critical_path(ctx, output),
    }
}

fn add_dependency(ctx: &AppContext, output: &Output, task: TaskId, depends_on: TaskId) -> Result<()> {
    let mut planner = ctx.planner()?;
    planner.add_dependency(task, depends_on)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task,
            "depends_on": depends_on,
        }));
    } else {
        output.success(&format!("{} now depends on {}", task, depends_on));
    }

    Ok(())
}

fn remove_dependency(
    ctx: &AppContext,
    output: &Output,
    task: TaskId,
    depends_on: TaskId,
) -> Result<()> {
    let mut planner = ctx.planner()?;
    let removed = planner.remove_dependency(task, depends_on)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task,
            "depends_on": depends_on,
            "removed": removed,
        }));
    } else if removed {
        output.success(&format!(
            "Removed dependency: {} no longer depends on {}",
            task, depends_on
        ));
    } else {
        println!("No dependency: {} does not depend on {}", task, depends_on);
    }

    Ok(())
}

fn show_dependencies(ctx: &AppContext, output: &Output, id: TaskId) -> Result<()> {
    let planner = ctx.planner()?;
    let view = planner.dependencies(id)?;

    if output.is_json() {
        output.data(&view);
        return Ok(());
    }

    println!("{}", task_row(&view.task));

    println!("\nDependencies ({}):", view.dependencies.len());
    for dep in &view.dependencies {
        println!("  {}", task_row(dep));
    }

    println!("\nDependents ({}):", view.dependents.len());
    for dep in &view.dependents {
        println!("  {}", task_row(dep));
    }

    if view.task.is_incomplete() {
        println!();
        println!("Ready: {}", if view.ready { "yes" } else { "no" });
    }

    Ok(())
}

fn show_plan(ctx: &AppContext, output: &Output) -> Result<()> {
    let planner = ctx.planner()?;
    let plan = planner.execution_plan()?;
    output.verbose_ctx("plan", &format!("Ordered {} tasks", plan.len()));

    if output.is_json() {
        output.data(&plan);
    } else if plan.is_empty() {
        println!("No incomplete tasks to plan.");
    } else {
        println!("Execution plan ({} tasks):", plan.len());
        println!("{:<5} {}", "STEP", "TASK");
        println!("{}", "-".repeat(70));
        for (step, task) in plan.iter().enumerate() {
            println!("{:<5} {}", step + 1, task_row(task));
        }
    }

    Ok(())
}

fn show_critical_path(ctx: &AppContext, output: &Output) -> Result<()> {
    let planner = ctx.planner()?;
    let path = planner.critical_path()?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "length": path.len(),
            "path": path,
        }));
    } else if path.is_empty() {
        println!("No incomplete tasks.");
    } else {
        println!("Critical path ({} tasks):", path.len());
        let chain: Vec<String> = path.iter().map(|t| t.id.to_string()).collect();
        println!("{}", chain.join(" -> "));
        println!();
        for task in &path {
            println!("{}", task_row(task));
        }
    }

    Ok(())
}
