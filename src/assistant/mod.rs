//! Hosted LLM assistant: natural-language task parsing and breakdown proposals.
//!
//! Everything here only ever proposes. Persisting a parsed task or a list of
//! sub-task titles goes through `Database::create_task` / `breakdown_task`.

mod gemini;
mod prompts;

pub use gemini::GeminiClient;
pub use prompts::{
    ParsedTask, breakdown_prompt, parse_prompt, parse_task_input, suggest_breakdown,
};

use async_trait::async_trait;
use serde_json::Value;

/// Errors from the assistant collaborator.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// No usable API key.
    #[error("assistant is not configured: set {0}")]
    NotConfigured(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed JSON without the expected shape.
    #[error("unexpected assistant response: {0}")]
    BadResponse(String),
}

/// Something that turns a prompt into a JSON document.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_json(&self, prompt: &str) -> Result<Value, AssistantError>;
}
