//! Output formatting utilities for markdown and JSON.

use crate::types::{Status, Task, TaskRecord, TaskStats, TaskTree};
use crate::validation::format_timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output format for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Format a single task as markdown.
pub fn format_task_markdown(task: &Task) -> String {
    let mut md = String::new();

    md.push_str(&format!("## Task: {}\n", task.title));
    md.push_str(&format!("- **id**: `{}`\n", task.id));
    md.push_str(&format!("- **status**: {}\n", status_label(task.status)));
    md.push_str(&format!("- **priority**: {}\n", task.priority));

    if let Some(due) = task.due_date {
        md.push_str(&format!("- **due**: {}\n", format_timestamp(due)));
    }

    if let Some(ref parent_id) = task.parent_id {
        md.push_str(&format!("- **parent_id**: `{}`\n", parent_id));
    }

    if let Some(ref desc) = task.description {
        md.push_str("\n### Description\n");
        md.push_str(desc);
        md.push('\n');
    }

    md
}

/// Format a list of tasks as markdown, grouped by status.
pub fn format_tasks_markdown(records: &[TaskRecord]) -> String {
    let mut md = format!("# Tasks ({})\n\n", records.len());

    for status in Status::ALL {
        let group: Vec<&Task> = records
            .iter()
            .map(|r| &r.task)
            .filter(|t| t.status == status)
            .collect();
        if group.is_empty() {
            continue;
        }

        md.push_str(&format!("## {} ({})\n", status_label(status), group.len()));
        for task in group {
            md.push_str(&format_task_short(task));
        }
        md.push('\n');
    }

    md
}

/// Indented outline of a task and its descendants.
pub fn format_tree_markdown(tree: &TaskTree) -> String {
    let mut md = String::new();
    push_tree_line(&mut md, tree, 0);
    md
}

fn push_tree_line(md: &mut String, tree: &TaskTree, depth: usize) {
    let task = &tree.record.task;
    md.push_str(&"  ".repeat(depth));
    md.push_str(&format_task_short(task));
    for child in &tree.children {
        push_tree_line(md, child, depth + 1);
    }
}

pub fn format_stats_markdown(stats: &TaskStats) -> String {
    format!(
        "# Task Stats\n\
         - **total**: {}\n\
         - **todo**: {}\n\
         - **in progress**: {}\n\
         - **done**: {}\n\
         - **blocked**: {}\n\
         - **overdue**: {}\n",
        stats.total, stats.todo, stats.inprogress, stats.done, stats.blocked, stats.overdue
    )
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Todo => "To Do",
        Status::InProgress => "In Progress",
        Status::Done => "Done",
        Status::Blocked => "Blocked",
    }
}

fn format_task_short(task: &Task) -> String {
    let mut line = format!("- `{}` **{}** [{}]", task.id, task.title, task.priority);
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", format_timestamp(due)));
    }
    line.push('\n');
    line
}

/// Wrap markdown output in a JSON envelope.
pub fn markdown_to_json(md: String) -> Value {
    serde_json::json!({
        "format": "markdown",
        "content": md
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::token::with_etag;
    use crate::types::Priority;

    fn task(id: &str, title: &str, status: Status) -> Task {
        Task {
            id: id.into(),
            owner_id: "local".into(),
            title: title.into(),
            description: None,
            status,
            priority: Priority::High,
            due_date: None,
            parent_id: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn single_task_includes_description_section() {
        let mut t = task("t1", "Write report", Status::Todo);
        t.description = Some("Quarterly numbers".into());
        let md = format_task_markdown(&t);
        assert!(md.starts_with("## Task: Write report"));
        assert!(md.contains("- **priority**: high"));
        assert!(md.contains("### Description\nQuarterly numbers"));
    }

    #[test]
    fn list_groups_by_status_and_skips_empty_groups() {
        let records = vec![
            with_etag(task("a", "A", Status::Done)),
            with_etag(task("b", "B", Status::Todo)),
        ];
        let md = format_tasks_markdown(&records);
        assert!(md.starts_with("# Tasks (2)"));
        assert!(md.contains("## To Do (1)"));
        assert!(md.contains("## Done (1)"));
        assert!(!md.contains("Blocked"));
        assert!(md.find("To Do").unwrap() < md.find("Done").unwrap());
    }

    #[test]
    fn tree_indents_children() {
        let tree = TaskTree {
            record: with_etag(task("p", "Parent", Status::Todo)),
            children: vec![TaskTree {
                record: with_etag(task("c", "Child", Status::Todo)),
                children: vec![],
            }],
        };
        let md = format_tree_markdown(&tree);
        let lines: Vec<&str> = md.lines().collect();
        assert!(lines[0].starts_with("- `p`"));
        assert!(lines[1].starts_with("  - `c`"));
    }

    #[test]
    fn output_format_parse() {
        assert_eq!(OutputFormat::parse("MD"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("xml"), None);
    }
}
