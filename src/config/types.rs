//! Configuration types and structures.

use crate::format::OutputFormat;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default port for the HTTP API.
pub const DEFAULT_UI_PORT: u16 = 8501;

/// Key value that ships in sample `.env` files and means "not configured".
pub const PLACEHOLDER_API_KEY: &str = "your-google-ai-api-key-here";

/// UI mode for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum UiMode {
    /// No UI, MCP server only (default)
    #[default]
    None,
    /// Enable the HTTP JSON API
    Web,
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub mode: UiMode,

    #[serde(default = "default_ui_port")]
    pub port: u16,

    /// Initial retry delay in milliseconds when the listener fails to bind.
    #[serde(default = "default_retry_initial_ms")]
    pub retry_initial_ms: u64,

    /// Jitter range in milliseconds for retry delay (±).
    #[serde(default = "default_retry_jitter_ms")]
    pub retry_jitter_ms: u64,

    /// Maximum retry interval in milliseconds.
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,

    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mode: UiMode::default(),
            port: default_ui_port(),
            retry_initial_ms: default_retry_initial_ms(),
            retry_jitter_ms: default_retry_jitter_ms(),
            retry_max_ms: default_retry_max_ms(),
            retry_multiplier: default_retry_multiplier(),
        }
    }
}

fn default_ui_port() -> u16 {
    DEFAULT_UI_PORT
}

fn default_retry_initial_ms() -> u64 {
    15_000
}

fn default_retry_jitter_ms() -> u64 {
    5_000
}

fn default_retry_max_ms() -> u64 {
    240_000 // 4 minutes
}

fn default_retry_multiplier() -> f64 {
    2.0
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub tasks: TasksConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl Config {
    /// Create the database's parent directory if needed.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Owner used when a caller doesn't name one.
    #[serde(default = "default_owner")]
    pub default_owner: String,

    /// Default output format for query results (json or markdown).
    #[serde(default)]
    pub default_format: OutputFormat,

    #[serde(default)]
    pub ui: UiConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            default_owner: default_owner(),
            default_format: OutputFormat::default(),
            ui: UiConfig::default(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cognitask/tasks.db")
}

fn default_owner() -> String {
    "local".to_string()
}

/// Limits on task operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Fewest sub-task titles a breakdown accepts.
    #[serde(default = "default_breakdown_min")]
    pub breakdown_min: usize,

    /// Most sub-task titles a breakdown accepts.
    #[serde(default = "default_breakdown_max")]
    pub breakdown_max: usize,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            breakdown_min: default_breakdown_min(),
            breakdown_max: default_breakdown_max(),
        }
    }
}

fn default_breakdown_min() -> usize {
    3
}

fn default_breakdown_max() -> usize {
    7
}

/// Hosted LLM settings for natural-language parsing and breakdown suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AssistantConfig {
    /// The configured API key, if one is set and isn't the sample placeholder.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != PLACEHOLDER_API_KEY)
    }
}

fn default_api_key_env() -> String {
    "GOOGLE_AI_API_KEY".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}
