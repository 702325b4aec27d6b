//! Boundary validation and normalization of task fields.

use crate::error::{TaskError, ValidationReason};
use crate::types::{MAX_DESCRIPTION_LEN, MAX_ID_LEN, MAX_TITLE_LEN};
use chrono::{DateTime, NaiveDate, Utc};

/// Trim a title and enforce the non-empty / length rules.
pub fn normalize_title(title: &str) -> Result<String, TaskError> {
    check_title(title, "title", ValidationReason::MissingTitle, ValidationReason::TitleTooLong)
}

/// Absent, empty and whitespace-only descriptions all become `None`.
pub fn normalize_description(description: Option<String>) -> Result<Option<String>, TaskError> {
    let Some(trimmed) = description.as_deref().map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };

    let len = trimmed.chars().count();
    if len > MAX_DESCRIPTION_LEN {
        return Err(TaskError::validation(
            ValidationReason::DescriptionTooLong,
            "description",
            format!(
                "Description is {} characters; the limit is {}",
                len, MAX_DESCRIPTION_LEN
            ),
        ));
    }
    Ok(Some(trimmed.to_string()))
}

/// Trim a caller-chosen task id. Blank or oversized ids are rejected, since
/// they could never be addressed again.
pub fn normalize_id(id: &str) -> Result<String, TaskError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(TaskError::validation(
            ValidationReason::InvalidId,
            "id",
            "Task id must not be blank",
        ));
    }
    if trimmed.chars().count() > MAX_ID_LEN {
        return Err(TaskError::validation(
            ValidationReason::InvalidId,
            "id",
            format!("Task id is longer than {} characters", MAX_ID_LEN),
        ));
    }
    Ok(trimmed.to_string())
}

/// Parse a due date given as RFC 3339 or as a bare `YYYY-MM-DD` (midnight UTC).
/// Returns milliseconds since the epoch.
pub fn parse_due_date(input: &str) -> Result<i64, TaskError> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc).timestamp_millis());
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        && let Some(dt) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(dt.and_utc().timestamp_millis());
    }

    Err(TaskError::validation(
        ValidationReason::InvalidDueDate,
        "due_date",
        format!(
            "Invalid due date '{}'. Use YYYY-MM-DD or an RFC 3339 timestamp",
            input
        ),
    ))
}

/// Render a millisecond timestamp as RFC 3339 (UTC).
pub fn format_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

/// Validate a proposed list of sub-task titles for breakdown.
pub fn validate_subtask_titles(
    titles: &[String],
    min: usize,
    max: usize,
) -> Result<Vec<String>, TaskError> {
    if titles.len() < min || titles.len() > max {
        return Err(TaskError::validation(
            ValidationReason::InvalidSubtaskCount,
            "titles",
            format!(
                "Breakdown needs between {} and {} sub-task titles, got {}",
                min,
                max,
                titles.len()
            ),
        ));
    }

    titles
        .iter()
        .map(|t| {
            check_title(
                t,
                "titles",
                ValidationReason::InvalidSubtaskTitle,
                ValidationReason::InvalidSubtaskTitle,
            )
        })
        .collect()
}

fn check_title(
    title: &str,
    field: &str,
    empty: ValidationReason,
    too_long: ValidationReason,
) -> Result<String, TaskError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskError::validation(empty, field, "Title must not be empty"));
    }
    let len = trimmed.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(TaskError::validation(
            too_long,
            field,
            format!(
                "Title is {} characters; the limit is {}",
                len, MAX_TITLE_LEN
            ),
        ));
    }
    Ok(trimmed.to_string())
}
