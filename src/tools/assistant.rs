//! Assistant tools. They only propose; nothing here writes to the database.

use super::{ToolContext, get_string, make_tool, require_string};
use crate::assistant::{self, AssistantError, TextGenerator};
use crate::config::Config;
use crate::db::Database;
use crate::error::TaskError;
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

pub fn get_tools() -> Vec<Tool> {
    vec![
        make_tool(
            "parse_task",
            "Turn a free-text request (\"call mom tomorrow, urgent\") into a proposed task. Review it, then pass it to create.",
            json!({
                "text": { "type": "string", "description": "Natural-language task description" }
            }),
            vec!["text"],
        ),
        make_tool(
            "suggest_breakdown",
            "Propose sub-task titles for a task. Pass an existing task ID, or a title and optional description. Review the list, then pass it to breakdown.",
            json!({
                "task": { "type": "string", "description": "Existing task ID" },
                "title": { "type": "string", "description": "Title, when no task ID is given" },
                "description": { "type": "string" },
                "owner": {
                    "type": "string",
                    "description": "Owner id (defaults to the server's configured owner)"
                }
            }),
            vec![],
        ),
    ]
}

/// Map assistant failures onto tool error codes.
fn to_task_error(err: AssistantError) -> TaskError {
    match err {
        AssistantError::NotConfigured(_) => TaskError::invalid_operation(err.to_string()),
        other => TaskError::internal(other),
    }
}

fn require_assistant(assistant: Option<&dyn TextGenerator>) -> Result<&dyn TextGenerator> {
    assistant.ok_or_else(|| {
        TaskError::invalid_operation(
            "AI assistant is not configured; set the API key environment variable",
        )
        .into()
    })
}

pub async fn parse_task(
    assistant: Option<&dyn TextGenerator>,
    args: Value,
    ctx: &ToolContext,
) -> Result<Value> {
    let text = require_string(&args, "text")?;
    if text.trim().is_empty() {
        return Err(TaskError::missing_field("text").into());
    }
    let generator = require_assistant(assistant)?;

    let today = chrono::Utc::now().date_naive();
    let parsed = assistant::parse_task_input(generator, &text, today)
        .await
        .map_err(to_task_error)?;

    ctx.logger
        .debug(&format!("Parsed task proposal \"{}\"", parsed.title));
    Ok(json!({ "proposal": parsed }))
}

pub async fn suggest_breakdown(
    assistant: Option<&dyn TextGenerator>,
    db: &Database,
    config: &Config,
    owner: &str,
    args: Value,
    ctx: &ToolContext,
) -> Result<Value> {
    let (title, description) = match get_string(&args, "task") {
        Some(task_id) => {
            let record = db.require_task(&task_id, owner)?;
            (record.task.title, record.task.description)
        }
        None => (
            require_string(&args, "title")?,
            get_string(&args, "description"),
        ),
    };
    let generator = require_assistant(assistant)?;

    let titles = assistant::suggest_breakdown(
        generator,
        &title,
        description.as_deref(),
        config.tasks.breakdown_min,
        config.tasks.breakdown_max,
    )
    .await
    .map_err(to_task_error)?;

    ctx.logger
        .debug(&format!("Suggested {} sub-tasks for \"{}\"", titles.len(), title));
    Ok(json!({
        "task": get_string(&args, "task"),
        "titles": titles
    }))
}
