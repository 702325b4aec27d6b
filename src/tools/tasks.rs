//! Task tools: CRUD, hierarchy moves, breakdown and Focus Mode.

use super::{
    ToolContext, get_enum, get_format, get_i64, get_nullable_string, get_string,
    get_string_array, make_tool, parse_due_value, require_string,
};
use crate::config::Config;
use crate::db::Database;
use crate::error::TaskError;
use crate::format::{
    OutputFormat, format_stats_markdown, format_task_markdown, format_tasks_markdown,
    format_tree_markdown, markdown_to_json,
};
use crate::types::{ParentFilter, TaskDraft, TaskFilter, TaskPatch};
use anyhow::Result;
use rmcp::model::Tool;
use serde_json::{Value, json};

fn owner_prop() -> Value {
    json!({
        "type": "string",
        "description": "Owner id (defaults to the server's configured owner)"
    })
}

fn format_prop() -> Value {
    json!({
        "type": "string",
        "enum": ["json", "markdown"],
        "description": "Output format"
    })
}

fn etag_prop() -> Value {
    json!({
        "type": "string",
        "description": "Concurrency token from the last read of this task"
    })
}

pub fn get_tools(config: &Config) -> Vec<Tool> {
    let breakdown_desc = format!(
        "Create {}-{} sub-tasks under a task, in the given order. All are created or none.",
        config.tasks.breakdown_min, config.tasks.breakdown_max
    );

    vec![
        make_tool(
            "create",
            "Create a task. Use parent to nest it under another task.",
            json!({
                "title": { "type": "string", "description": "Task title (1-255 characters)" },
                "description": { "type": "string", "description": "Free-text details" },
                "status": {
                    "type": "string",
                    "enum": ["todo", "inprogress", "done", "blocked"],
                    "description": "Initial status (default: todo)"
                },
                "priority": {
                    "type": "string",
                    "enum": ["urgent", "high", "medium", "low"],
                    "description": "Priority (default: medium)"
                },
                "due_date": {
                    "type": "string",
                    "description": "Due date as YYYY-MM-DD or RFC 3339"
                },
                "parent": { "type": "string", "description": "Parent task ID" },
                "id": { "type": "string", "description": "Caller-chosen task ID (optional)" },
                "owner": owner_prop()
            }),
            vec!["title"],
        ),
        make_tool(
            "get",
            "Get a task by ID, including its concurrency token.",
            json!({
                "task": { "type": "string", "description": "Task ID" },
                "format": format_prop(),
                "owner": owner_prop()
            }),
            vec!["task"],
        ),
        make_tool(
            "list_tasks",
            "List tasks, newest first. Filter by status or parent (use 'null' for root tasks).",
            json!({
                "status": {
                    "type": "string",
                    "enum": ["todo", "inprogress", "done", "blocked"]
                },
                "parent": { "type": "string", "description": "Parent task ID, or 'null' for roots" },
                "limit": { "type": "integer", "minimum": 1 },
                "format": format_prop(),
                "owner": owner_prop()
            }),
            vec![],
        ),
        make_tool(
            "update",
            "Change task fields. Pass null for description, due_date or parent to clear them. Requires the etag from your last read.",
            json!({
                "task": { "type": "string", "description": "Task ID" },
                "etag": etag_prop(),
                "title": { "type": "string" },
                "description": { "type": ["string", "null"] },
                "status": {
                    "type": "string",
                    "enum": ["todo", "inprogress", "done", "blocked"]
                },
                "priority": {
                    "type": "string",
                    "enum": ["urgent", "high", "medium", "low"]
                },
                "due_date": { "type": ["string", "null"] },
                "parent": { "type": ["string", "null"], "description": "New parent task ID" },
                "owner": owner_prop()
            }),
            vec!["task", "etag"],
        ),
        make_tool(
            "delete",
            "Delete a task. Tasks with sub-tasks cannot be deleted.",
            json!({
                "task": { "type": "string", "description": "Task ID" },
                "etag": etag_prop(),
                "owner": owner_prop()
            }),
            vec!["task", "etag"],
        ),
        make_tool(
            "promote",
            "Move a sub-task up one level: it becomes a sibling of its former parent.",
            json!({
                "task": { "type": "string", "description": "Task ID" },
                "etag": etag_prop(),
                "owner": owner_prop()
            }),
            vec!["task", "etag"],
        ),
        make_tool(
            "breakdown",
            &breakdown_desc,
            json!({
                "task": { "type": "string", "description": "Parent task ID" },
                "titles": {
                    "type": "array",
                    "items": { "type": "string" },
                    "minItems": config.tasks.breakdown_min,
                    "maxItems": config.tasks.breakdown_max
                },
                "owner": owner_prop()
            }),
            vec!["task", "titles"],
        ),
        make_tool(
            "next",
            "Focus Mode: the one todo/inprogress task to work on now (highest priority, then earliest due, then oldest).",
            json!({
                "format": format_prop(),
                "owner": owner_prop()
            }),
            vec![],
        ),
        make_tool(
            "stats",
            "Task counts per status, plus overdue.",
            json!({
                "format": format_prop(),
                "owner": owner_prop()
            }),
            vec![],
        ),
        make_tool(
            "tree",
            "Get a task with all of its descendants.",
            json!({
                "task": { "type": "string", "description": "Root task ID" },
                "format": format_prop(),
                "owner": owner_prop()
            }),
            vec!["task"],
        ),
    ]
}

pub fn create(db: &Database, owner: &str, args: Value, ctx: &ToolContext) -> Result<Value> {
    let title = require_string(&args, "title")?;
    let due_date = match args.get("due_date") {
        None | Some(Value::Null) => None,
        Some(v) => Some(parse_due_value(v)?),
    };

    let draft = TaskDraft {
        id: get_string(&args, "id"),
        title,
        description: get_string(&args, "description"),
        status: get_enum(&args, "status")?,
        priority: get_enum(&args, "priority")?,
        due_date,
        parent_id: get_string(&args, "parent"),
    };

    let record = db.create_task(owner, draft)?;
    ctx.logger
        .info(&format!("Created task {} \"{}\"", record.task.id, record.task.title));

    Ok(serde_json::to_value(record)?)
}

pub fn get(db: &Database, config: &Config, owner: &str, args: Value) -> Result<Value> {
    let task_id = require_string(&args, "task")?;
    let record = db.require_task(&task_id, owner)?;

    match get_format(&args, config) {
        OutputFormat::Markdown => Ok(markdown_to_json(format_task_markdown(&record.task))),
        OutputFormat::Json => Ok(serde_json::to_value(record)?),
    }
}

pub fn list_tasks(db: &Database, config: &Config, owner: &str, args: Value) -> Result<Value> {
    let parent = get_string(&args, "parent").map(|p| match p.as_str() {
        "null" | "root" => ParentFilter::Root,
        _ => ParentFilter::Of(p),
    });

    let filter = TaskFilter {
        status: get_enum(&args, "status")?,
        parent,
        limit: get_i64(&args, "limit")
            .filter(|l| *l > 0)
            .map(|l| l.min(u32::MAX as i64) as u32),
    };

    let records = db.list_tasks(owner, &filter)?;

    match get_format(&args, config) {
        OutputFormat::Markdown => Ok(markdown_to_json(format_tasks_markdown(&records))),
        OutputFormat::Json => Ok(json!({ "tasks": records })),
    }
}

pub fn update(db: &Database, owner: &str, args: Value, ctx: &ToolContext) -> Result<Value> {
    let task_id = require_string(&args, "task")?;
    let etag = require_string(&args, "etag")?;

    let due_date = match args.get("due_date") {
        None => None,
        Some(Value::Null) => Some(None),
        Some(v) => Some(Some(parse_due_value(v)?)),
    };

    let patch = TaskPatch {
        title: get_string(&args, "title"),
        description: get_nullable_string(&args, "description"),
        status: get_enum(&args, "status")?,
        priority: get_enum(&args, "priority")?,
        due_date,
        parent_id: get_nullable_string(&args, "parent"),
    };

    let record = db.update_task(&task_id, owner, &etag, patch)?;
    ctx.logger.debug(&format!("Updated task {}", task_id));

    Ok(serde_json::to_value(record)?)
}

pub fn delete(db: &Database, owner: &str, args: Value, ctx: &ToolContext) -> Result<Value> {
    let task_id = require_string(&args, "task")?;
    let etag = require_string(&args, "etag")?;

    db.delete_task(&task_id, owner, &etag)?;
    ctx.logger.info(&format!("Deleted task {}", task_id));

    Ok(json!({
        "success": true,
        "task": task_id
    }))
}

pub fn promote(db: &Database, owner: &str, args: Value, ctx: &ToolContext) -> Result<Value> {
    let task_id = require_string(&args, "task")?;
    let etag = require_string(&args, "etag")?;

    let record = db.promote_task(&task_id, owner, &etag)?;
    ctx.logger.debug(&format!(
        "Promoted task {} to parent {:?}",
        task_id, record.task.parent_id
    ));

    Ok(serde_json::to_value(record)?)
}

pub fn breakdown(
    db: &Database,
    config: &Config,
    owner: &str,
    args: Value,
    ctx: &ToolContext,
) -> Result<Value> {
    let task_id = require_string(&args, "task")?;
    let titles = get_string_array(&args, "titles").ok_or_else(|| TaskError::missing_field("titles"))?;

    let children = db.breakdown_task(&task_id, owner, &titles, &config.tasks)?;
    ctx.logger.info(&format!(
        "Created {} sub-tasks under {}",
        children.len(),
        task_id
    ));

    Ok(json!({
        "parent": task_id,
        "tasks": children
    }))
}

pub fn next(db: &Database, config: &Config, owner: &str, args: Value) -> Result<Value> {
    let record = db.select_next(owner)?;

    match get_format(&args, config) {
        OutputFormat::Markdown => {
            let md = match record {
                Some(ref r) => format_task_markdown(&r.task),
                None => "No actionable tasks.\n".to_string(),
            };
            Ok(markdown_to_json(md))
        }
        OutputFormat::Json => Ok(json!({ "task": record })),
    }
}

pub fn stats(db: &Database, config: &Config, owner: &str, args: Value) -> Result<Value> {
    let stats = db.task_stats(owner)?;

    match get_format(&args, config) {
        OutputFormat::Markdown => Ok(markdown_to_json(format_stats_markdown(&stats))),
        OutputFormat::Json => Ok(serde_json::to_value(stats)?),
    }
}

pub fn tree(db: &Database, config: &Config, owner: &str, args: Value) -> Result<Value> {
    let task_id = require_string(&args, "task")?;
    let tree = db
        .get_task_tree(&task_id, owner)?
        .ok_or_else(|| TaskError::task_not_found(&task_id))?;

    match get_format(&args, config) {
        OutputFormat::Markdown => Ok(markdown_to_json(format_tree_markdown(&tree))),
        OutputFormat::Json => Ok(serde_json::to_value(tree)?),
    }
}
