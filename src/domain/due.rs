//! Due date parsing and display

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DueDateError {
    #[error("Invalid due date '{0}' (expected YYYY-MM-DD, today, tomorrow, next-week or next-month)")]
    Invalid(String),
}

/// Parses a user-supplied due date relative to `now`
///
/// `0`, `none` or an empty string clear the date.
pub fn parse_due(input: &str, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, DueDateError> {
    let input = input.trim();

    let due = match input.to_lowercase().as_str() {
        "" | "0" | "none" => return Ok(None),
        "today" => now,
        "tomorrow" => now + Duration::days(1),
        "next-week" => now + Duration::days(7),
        "next-month" => now + Duration::days(30),
        _ => NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| DueDateError::Invalid(input.to_string()))?,
    };

    // Timestamp 0 is the store's "no due date" sentinel
    if due.timestamp() == 0 {
        return Err(DueDateError::Invalid(input.to_string()));
    }

    Ok(Some(due))
}

/// Renders a due date for display
pub fn format_due(due: Option<DateTime<Utc>>) -> String {
    match due {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => "Not set".to_string(),
    }
}
