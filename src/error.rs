//! Structured error types for engine and tool responses.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Rejected input
    ValidationFailed,

    // Task absent or owned by someone else. Never distinguish the two.
    NotFound,

    // Stale concurrency token
    Conflict,

    // Hierarchy rules
    DeleteBlocked,
    InvalidOperation,
    CycleRejected,

    // Internal errors
    DatabaseError,
    InternalError,
    UnknownTool,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::DeleteBlocked => "DELETE_BLOCKED",
            ErrorCode::InvalidOperation => "INVALID_OPERATION",
            ErrorCode::CycleRejected => "CYCLE_REJECTED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::UnknownTool => "UNKNOWN_TOOL",
        }
    }
}

/// Finer-grained cause for `ValidationFailed`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    MissingField,
    MissingTitle,
    TitleTooLong,
    DescriptionTooLong,
    InvalidId,
    InvalidStatus,
    InvalidPriority,
    InvalidDueDate,
    ParentNotFound,
    DuplicateId,
    InvalidSubtaskCount,
    InvalidSubtaskTitle,
}

/// Structured error returned by every engine operation.
///
/// Engine methods return `anyhow::Result`; callers recover this value with
/// `downcast` to get the stable code.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct TaskError {
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ValidationReason>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl TaskError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            reason: None,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn validation(reason: ValidationReason, field: &str, message: impl Into<String>) -> Self {
        Self {
            reason: Some(reason),
            ..Self::new(ErrorCode::ValidationFailed, message)
        }
        .with_field(field)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::validation(
            ValidationReason::MissingField,
            field,
            format!("{} is required", field),
        )
    }

    pub fn parent_not_found(parent_id: &str) -> Self {
        Self::validation(
            ValidationReason::ParentNotFound,
            "parent_id",
            format!("Parent task not found: {}", parent_id),
        )
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("Task not found: {}", task_id))
    }

    pub fn conflict(task_id: &str) -> Self {
        Self::new(
            ErrorCode::Conflict,
            format!(
                "Task {} was modified since it was read; fetch it again and retry",
                task_id
            ),
        )
        .with_field("etag")
    }

    pub fn delete_blocked(task_id: &str, children: i64) -> Self {
        Self::new(
            ErrorCode::DeleteBlocked,
            format!(
                "Task {} has {} sub-task(s); delete or move them first",
                task_id, children
            ),
        )
        .with_details(children.to_string())
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidOperation, message)
    }

    pub fn cycle(task_id: &str, parent_id: &str) -> Self {
        Self::new(
            ErrorCode::CycleRejected,
            format!(
                "Making {} the parent of {} would create a cycle",
                parent_id, task_id
            ),
        )
        .with_field("parent_id")
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorCode::UnknownTool, format!("Unknown tool: {}", name))
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<TaskError>() {
            Ok(task_err) => task_err,
            Err(err) => {
                if err.downcast_ref::<rusqlite::Error>().is_some() {
                    TaskError::database(err)
                } else {
                    TaskError::internal(err)
                }
            }
        }
    }
}

/// Result type for tool operations.
pub type TaskResult<T> = std::result::Result<T, TaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_serializes_reason_and_field() {
        let err = TaskError::parent_not_found("abc");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "VALIDATION_FAILED");
        assert_eq!(json["reason"], "parent_not_found");
        assert_eq!(json["field"], "parent_id");
    }

    #[test]
    fn non_validation_errors_omit_reason() {
        let err = TaskError::conflict("abc");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "CONFLICT");
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn anyhow_roundtrip_preserves_code() {
        let err: anyhow::Error = TaskError::delete_blocked("t1", 2).into();
        let back: TaskError = err.into();
        assert_eq!(back.code, ErrorCode::DeleteBlocked);
        assert_eq!(back.details.as_deref(), Some("2"));
    }

    #[test]
    fn plain_anyhow_becomes_internal() {
        let back: TaskError = anyhow::anyhow!("boom").into();
        assert_eq!(back.code, ErrorCode::InternalError);
        assert_eq!(back.to_string(), "boom");
    }

    #[test]
    fn code_strings_match_serde() {
        for code in [
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::Conflict,
            ErrorCode::DeleteBlocked,
            ErrorCode::InvalidOperation,
            ErrorCode::CycleRejected,
        ] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }
}
