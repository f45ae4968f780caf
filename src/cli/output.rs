//! Output formatting for CLI commands

use serde::Serialize;
use tracing::debug;

use crate::domain::{format_due, Task};
use crate::storage;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl From<storage::OutputFormat> for OutputFormat {
    fn from(format: storage::OutputFormat) -> Self {
        match format {
            storage::OutputFormat::Text => OutputFormat::Text,
            storage::OutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Prints a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "success": true,
                        "message": message
                    })
                );
            }
        }
    }

    /// Prints structured data
    pub fn data<T: Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Text => {
                // Fallback for callers without a text rendering
                if let Ok(json) = serde_json::to_string_pretty(data) {
                    println!("{}", json);
                }
            }
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(data) {
                    println!("{}", json);
                }
            }
        }
    }

    /// Returns true if using JSON format
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Emits a debug message (shown with --verbose or CASCADE_LOG=debug)
    pub fn verbose(&self, message: &str) {
        debug!("{}", message);
    }

    /// Emits a debug message tagged with the command it came from
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        debug!(command = context, "{}", message);
    }

    /// Prints tasks as a table (text only)
    pub fn task_table(&self, tasks: &[Task]) {
        println!(
            "{:<6} {:<4} {:<12} {:<10} TITLE",
            "ID", "PRI", "STATUS", "DUE"
        );
        println!("{}", "-".repeat(70));

        for task in tasks {
            println!("{}", task_row(task));
        }
    }
}

/// One table row for a task
pub fn task_row(task: &Task) -> String {
    let due = match task.due {
        Some(_) => format_due(task.due),
        None => "-".to_string(),
    };

    format!(
        "{:<6} {:<4} {:<12} {:<10} {}",
        task.id,
        task.priority,
        task.status.as_str(),
        due,
        task.title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn row_layout() {
        let task = Task::new(12, "Write docs").with_priority(1);
        let row = task_row(&task);
        assert!(row.starts_with("12     1    todo         -"));
        assert!(row.ends_with("Write docs"));

        let due = Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap();
        let row = task_row(&task.with_due(Some(due)));
        assert!(row.contains("2025-03-04"));
    }

    #[test]
    fn format_from_config() {
        assert_eq!(OutputFormat::from(storage::OutputFormat::Json), OutputFormat::Json);
        assert_eq!(OutputFormat::from(storage::OutputFormat::Text), OutputFormat::Text);
    }
}
