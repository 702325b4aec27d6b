//! Prompt construction and response cleanup for the two assistant features.

use super::{AssistantError, TextGenerator};
use crate::types::{MAX_DESCRIPTION_LEN, MAX_TITLE_LEN, Priority};
use crate::validation::parse_due_date;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// A task proposed from free text. Not persisted until the caller creates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    /// `YYYY-MM-DD`, only when the model produced a date we can parse.
    pub due_date: Option<String>,
}

pub fn parse_prompt(input: &str, today: NaiveDate) -> String {
    format!(
        r#"You are a task parsing assistant. Parse the following natural language input into a structured task.

Today's date is: {today}

User input: "{input}"

Extract the following information and return as JSON:
- title: The main task action (required, be concise but complete)
- description: Any additional details or context (null if none)
- priority: One of "low", "medium", "high", "urgent" (default to "medium" if not specified)
- due_date: ISO format date string YYYY-MM-DD if a date/time is mentioned, null otherwise. Interpret relative dates like "tomorrow", "next week", "friday" relative to today's date.

Examples of priority indicators:
- "urgent", "ASAP", "immediately", "critical" → "urgent"
- "important", "high priority", "soon" → "high"
- "when you can", "low priority", "eventually" → "low"
- No indicator → "medium"

Return ONLY valid JSON in this exact format:
{{"title": "string", "description": "string or null", "priority": "string", "due_date": "string or null"}}
"#,
        today = today.format("%Y-%m-%d"),
        input = input,
    )
}

pub fn breakdown_prompt(title: &str, description: Option<&str>, min: usize, max: usize) -> String {
    let mut context = title.to_string();
    if let Some(desc) = description.filter(|d| !d.trim().is_empty()) {
        context.push_str("\n\nAdditional context: ");
        context.push_str(desc);
    }

    format!(
        r#"You are a task breakdown assistant. Break down the following task into smaller, actionable sub-tasks.

Task: {context}

Rules:
- Create {min}-{max} specific, actionable sub-tasks
- Each sub-task should be a clear, single action
- Sub-tasks should be in logical order of execution
- Keep each sub-task title concise (under 100 characters)
- Don't include the original task as a sub-task
- Focus on concrete steps, not vague items like "research" without specifics

Return ONLY valid JSON in this exact format:
{{"sub_tasks": ["First sub-task", "Second sub-task", "Third sub-task"]}}
"#
    )
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Non-empty trimmed string, or `None` for null, blank or non-string values.
fn non_blank(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Ask the model to turn free text into a task proposal.
pub async fn parse_task_input(
    generator: &dyn TextGenerator,
    input: &str,
    today: NaiveDate,
) -> Result<ParsedTask, AssistantError> {
    let response = generator.generate_json(&parse_prompt(input, today)).await?;

    let title = non_blank(&response["title"])
        .map(|t| truncate_chars(&t, MAX_TITLE_LEN))
        .ok_or_else(|| AssistantError::BadResponse("response has no title".into()))?;

    let priority = response["priority"]
        .as_str()
        .and_then(|p| p.parse::<Priority>().ok())
        .unwrap_or_default();

    let due_date = non_blank(&response["due_date"]).filter(|d| match parse_due_date(d) {
        Ok(_) => true,
        Err(_) => {
            warn!(due_date = %d, "Dropping unparseable due date from assistant");
            false
        }
    });

    let parsed = ParsedTask {
        title,
        description: non_blank(&response["description"])
            .map(|d| truncate_chars(&d, MAX_DESCRIPTION_LEN)),
        priority,
        due_date,
    };
    debug!(title = %parsed.title, priority = %parsed.priority, "Parsed task input");
    Ok(parsed)
}

/// Ask the model for sub-task titles. Blank entries are dropped, each title
/// is cut to the length limit and at most `max` are returned.
pub async fn suggest_breakdown(
    generator: &dyn TextGenerator,
    title: &str,
    description: Option<&str>,
    min: usize,
    max: usize,
) -> Result<Vec<String>, AssistantError> {
    let response = generator
        .generate_json(&breakdown_prompt(title, description, min, max))
        .await?;

    let items = response["sub_tasks"]
        .as_array()
        .ok_or_else(|| AssistantError::BadResponse("response has no sub_tasks list".into()))?;

    let titles: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
        .map(|s| truncate_chars(&s, MAX_TITLE_LEN))
        .take(max)
        .collect();

    if titles.is_empty() {
        return Err(AssistantError::BadResponse("no usable sub-tasks".into()));
    }

    debug!(count = titles.len(), "Suggested breakdown");
    Ok(titles)
}
