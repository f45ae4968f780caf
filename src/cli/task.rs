//! Task CLI commands

use anyhow::Result;
use chrono::Utc;
use clap::Subcommand;

use super::app::AppContext;
use super::output::{task_row, Output};
use crate::domain::{format_due, parse_due, NewTask, SortKey, Task, TaskId, TaskStatus, TaskUpdate};
use crate::planner::ListFilter;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task
    ///
    /// Examples:
    ///   cascade task add "Write release notes"
    ///   cascade task add "Fix login" -p 1 --due tomorrow
    Add {
        /// Task title
        title: String,

        /// Priority from 1 (most urgent) to 4
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(1..=4))]
        priority: Option<u8>,

        /// Initial status (todo, in_progress, done, wont_do)
        #[arg(long, short)]
        status: Option<TaskStatus>,

        /// Due date: YYYY-MM-DD or today, tomorrow, next-week, next-month
        #[arg(long)]
        due: Option<String>,
    },

    /// List tasks (incomplete only unless --all)
    List {
        /// Include done and won't-do tasks
        #[arg(long, short)]
        all: bool,

        /// Only tasks with this status
        #[arg(long, short)]
        status: Option<TaskStatus>,

        /// Only tasks with this priority
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(1..=4))]
        priority: Option<u8>,

        /// Sort order (defaults to the configured sort, then priority-due)
        #[arg(long, value_enum)]
        sort: Option<SortKey>,
    },

    /// Show task details
    Show {
        /// Task ID
        id: TaskId,
    },

    /// Change fields of a task
    Update {
        /// Task ID
        id: TaskId,

        /// New title
        #[arg(long, short)]
        title: Option<String>,

        /// New priority from 1 to 4
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(1..=4))]
        priority: Option<u8>,

        /// New status
        #[arg(long, short)]
        status: Option<TaskStatus>,

        /// New due date (0 or none clears it)
        #[arg(long)]
        due: Option<String>,
    },

    /// Delete a task and its dependencies
    Delete {
        /// Task ID
        id: TaskId,
    },

    /// Mark task as done
    Done {
        /// Task ID
        id: TaskId,
    },

    /// Mark task as in progress
    Start {
        /// Task ID
        id: TaskId,
    },

    /// Show the next task to work on by priority and due date
    Next {
        /// Skip tasks waiting on incomplete dependencies
        #[arg(long)]
        ready: bool,
    },
}

pub fn run(cmd: TaskCommands, ctx: &AppContext, output: &Output) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            title,
            priority,
            status,
            due,
        } => add_task(ctx, output, title, priority, status, due.as_deref()),
        TaskCommands::List {
            all,
            status,
            priority,
            sort,
        } => {
            let filter = ListFilter {
                all,
                status,
                priority,
            };
            list_tasks(ctx, output, &filter, sort.unwrap_or(ctx.config.default_sort))
        }
        TaskCommands::Show { id } => show_task(ctx, output, id),
        TaskCommands::Update {
            id,
            title,
            priority,
            status,
            due,
        } => {
            let update = TaskUpdate {
                title,
                priority,
                status,
                due: due.as_deref().map(parse_due_now).transpose()?,
            };
            update_task(ctx, output, id, &update)
        }
        TaskCommands::Delete { id } => delete_task(ctx, output, id),
        TaskCommands::Done { id } => set_status(ctx, output, id, TaskStatus::Done),
        TaskCommands::Start { id } => set_status(ctx, output, id, TaskStatus::InProgress),
        TaskCommands::Next { ready } => next_task(ctx, output, ready),
    }
}

fn parse_due_now(input: &str) -> Result<Option<chrono::DateTime<Utc>>> {
    Ok(parse_due(input, Utc::now())?)
}

fn add_task(
    ctx: &AppContext,
    output: &Output,
    title: String,
    priority: Option<u8>,
    status: Option<TaskStatus>,
    due: Option<&str>,
) -> Result<()> {
    let mut planner = ctx.planner()?;

    let new_task = NewTask::new(title)
        .priority(priority.unwrap_or(ctx.config.default_priority))
        .status(status.unwrap_or_default())
        .due(due.map(parse_due_now).transpose()?.flatten());

    let task = planner.add_task(new_task)?;
    output.verbose_ctx("add", &format!("Stored task {}", task.id));

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!("Created task: {} - {}", task.id, task.title));
    }

    Ok(())
}

fn list_tasks(ctx: &AppContext, output: &Output, filter: &ListFilter, sort: SortKey) -> Result<()> {
    let planner = ctx.planner()?;
    let tasks = planner.list_tasks(filter, sort)?;

    output.verbose_ctx(
        "list",
        &format!("Found {} tasks, sorted by {}", tasks.len(), sort.as_str()),
    );

    if output.is_json() {
        output.data(&tasks);
    } else if tasks.is_empty() {
        println!("No tasks");
    } else {
        output.task_table(&tasks);
    }

    Ok(())
}

fn show_task(ctx: &AppContext, output: &Output, id: TaskId) -> Result<()> {
    let planner = ctx.planner()?;
    let view = planner.dependencies(id)?;

    if output.is_json() {
        output.data(&view);
        return Ok(());
    }

    let task = &view.task;
    println!("Task: {}", task.id);
    println!("Title: {}", task.title);
    println!("Status: {}", task.status);
    println!("Priority: {}", task.priority);
    println!("Due: {}", format_due(task.due));
    println!("Created: {}", task.created_at.format("%Y-%m-%d %H:%M"));

    if !view.dependencies.is_empty() {
        println!("\nDepends on:");
        for dep in &view.dependencies {
            println!("  {} {} ({})", dep.id, dep.title, dep.status);
        }
    }

    if !view.dependents.is_empty() {
        println!("\nRequired by:");
        for dep in &view.dependents {
            println!("  {} {} ({})", dep.id, dep.title, dep.status);
        }
    }

    if task.is_incomplete() {
        println!();
        if view.ready {
            println!("Status: READY (all dependencies complete)");
        } else {
            println!("Status: BLOCKED (waiting on dependencies)");
        }
    }

    Ok(())
}

fn update_task(ctx: &AppContext, output: &Output, id: TaskId, update: &TaskUpdate) -> Result<()> {
    if update.is_empty() {
        anyhow::bail!("Nothing to update; pass --title, --priority, --status or --due");
    }

    let mut planner = ctx.planner()?;
    let task = planner.update_task(id, update)?;

    print_task_change(output, &task, &format!("Updated task: {}", task.id));
    Ok(())
}

fn delete_task(ctx: &AppContext, output: &Output, id: TaskId) -> Result<()> {
    let mut planner = ctx.planner()?;
    let task = planner.delete_task(id)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id,
            "deleted": true,
        }));
    } else {
        output.success(&format!("Deleted task: {} - {}", task.id, task.title));
    }

    Ok(())
}

fn set_status(ctx: &AppContext, output: &Output, id: TaskId, status: TaskStatus) -> Result<()> {
    let mut planner = ctx.planner()?;
    let task = planner.set_status(id, status)?;

    let message = match status {
        TaskStatus::Done => format!("Completed task: {}", task.id),
        TaskStatus::InProgress => format!("Started task: {}", task.id),
        other => format!("Task {} is now {}", task.id, other),
    };
    print_task_change(output, &task, &message);
    Ok(())
}

fn next_task(ctx: &AppContext, output: &Output, ready_only: bool) -> Result<()> {
    let planner = ctx.planner()?;
    let next = planner.next_task(ready_only)?;

    if output.is_json() {
        output.data(&next);
        return Ok(());
    }

    match next {
        Some(task) => {
            println!("Next task:");
            println!("{}", task_row(&task));
        }
        None if ready_only => println!("No tasks ready to work on."),
        None => println!("No incomplete tasks."),
    }

    Ok(())
}

fn print_task_change(output: &Output, task: &Task, message: &str) {
    if output.is_json() {
        output.data(task);
    } else {
        output.success(message);
    }
}
