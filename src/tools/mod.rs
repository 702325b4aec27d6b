//! MCP tool implementations.

pub mod assistant;
pub mod context;
pub mod tasks;

pub use context::ToolContext;

use crate::assistant::TextGenerator;
use crate::config::Config;
use crate::db::Database;
use crate::error::{TaskError, ValidationReason};
use crate::format::OutputFormat;
use crate::validation::parse_due_date;
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

/// Tool handler that processes MCP tool calls.
pub struct ToolHandler {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    /// LLM backend for `parse_task` / `suggest_breakdown`; `None` when no key
    /// is configured.
    pub assistant: Option<Arc<dyn TextGenerator>>,
}

impl ToolHandler {
    pub fn new(db: Arc<Database>, config: Arc<Config>) -> Self {
        Self {
            db,
            config,
            assistant: None,
        }
    }

    pub fn with_assistant(mut self, assistant: Arc<dyn TextGenerator>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    /// Get all available tools.
    pub fn get_tools(&self) -> Vec<Tool> {
        let mut tools = tasks::get_tools(&self.config);
        tools.extend(assistant::get_tools());
        tools
    }

    /// Resolve the owner for a call: explicit `owner` argument or the
    /// configured default.
    fn owner(&self, args: &Value) -> String {
        get_string(args, "owner")
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| self.config.server.default_owner.clone())
    }

    /// Call a tool by name.
    pub async fn call_tool(&self, name: &str, args: Value, ctx: &ToolContext) -> Result<Value> {
        let owner = self.owner(&args);
        let db = &self.db;
        let config = &self.config;

        match name {
            "create" => tasks::create(db, &owner, args, ctx),
            "get" => tasks::get(db, config, &owner, args),
            "list_tasks" => tasks::list_tasks(db, config, &owner, args),
            "update" => tasks::update(db, &owner, args, ctx),
            "delete" => tasks::delete(db, &owner, args, ctx),
            "promote" => tasks::promote(db, &owner, args, ctx),
            "breakdown" => tasks::breakdown(db, config, &owner, args, ctx),
            "next" => tasks::next(db, config, &owner, args),
            "stats" => tasks::stats(db, config, &owner, args),
            "tree" => tasks::tree(db, config, &owner, args),

            "parse_task" => assistant::parse_task(self.assistant.as_deref(), args, ctx).await,
            "suggest_breakdown" => {
                assistant::suggest_breakdown(self.assistant.as_deref(), db, config, &owner, args, ctx)
                    .await
            }

            _ => Err(TaskError::unknown_tool(name).into()),
        }
    }
}

/// Helper to create a tool definition.
pub fn make_tool(name: &str, description: &str, properties: Value, required: Vec<&str>) -> Tool {
    let input_schema = rmcp::model::JsonObject::from_iter([
        ("type".to_string(), serde_json::json!("object")),
        ("properties".to_string(), properties),
        ("required".to_string(), serde_json::json!(required)),
    ]);

    Tool::new(name.to_string(), description.to_string(), input_schema)
}

/// Helper to get a string from arguments.
pub fn get_string(args: &Value, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str().map(String::from))
}

/// Helper to get a required string, failing with `missing_field`.
pub fn require_string(args: &Value, key: &str) -> Result<String, TaskError> {
    get_string(args, key).ok_or_else(|| TaskError::missing_field(key))
}

pub fn get_i64(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(|v| v.as_i64())
}

/// Helper to get a string array from arguments. Non-string entries are
/// kept as their JSON text so validation can reject them by content.
pub fn get_string_array(args: &Value, key: &str) -> Option<Vec<String>> {
    args.get(key).and_then(|v| {
        v.as_array().map(|arr| {
            arr.iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
    })
}

/// Tri-state read for clearable fields: absent → `None`, `null` → `Some(None)`.
pub fn get_nullable_string(args: &Value, key: &str) -> Option<Option<String>> {
    match args.get(key) {
        None => None,
        Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(other) => Some(Some(other.to_string())),
    }
}

/// Parse an optional closed-enum argument (`status`, `priority`). Wrong JSON
/// types are rejected the same way as unknown strings.
pub fn get_enum<T>(args: &Value, key: &str) -> Result<Option<T>, TaskError>
where
    T: FromStr<Err = TaskError>,
{
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s.parse().map(Some),
        Some(other) => other.to_string().parse().map(Some),
    }
}

/// Parse a due date given as a date string or as epoch milliseconds.
pub fn parse_due_value(value: &Value) -> Result<i64, TaskError> {
    match value {
        Value::String(s) => parse_due_date(s),
        Value::Number(n) => n.as_i64().ok_or_else(|| {
            TaskError::validation(
                ValidationReason::InvalidDueDate,
                "due_date",
                format!("Invalid due date {}", n),
            )
        }),
        other => Err(TaskError::validation(
            ValidationReason::InvalidDueDate,
            "due_date",
            format!("Invalid due date {}", other),
        )),
    }
}

/// Requested output format, falling back to the configured default.
pub fn get_format(args: &Value, config: &Config) -> OutputFormat {
    get_string(args, "format")
        .and_then(|s| OutputFormat::parse(&s))
        .unwrap_or(config.server.default_format)
}
