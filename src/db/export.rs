//! Snapshot export of an owner's tasks.
//!
//! Rows are ordered by id so repeated exports of unchanged data diff cleanly.

use super::Database;
use super::tasks::parse_task_row;
use crate::types::Task;
use anyhow::Result;
use rusqlite::params;
use serde::{Deserialize, Serialize};

/// Export format version (semver).
pub const EXPORT_VERSION: &str = "1.0.0";

/// A JSON snapshot of one owner's tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Export format version
    pub export_version: String,

    /// RFC 3339 timestamp of export
    pub exported_at: String,

    /// Tool name and version that created this export
    pub exported_by: String,

    pub owner_id: String,

    pub tasks: Vec<Task>,
}

impl Snapshot {
    pub fn new(owner_id: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            export_version: EXPORT_VERSION.to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            exported_by: format!("cognitask-mcp v{}", env!("CARGO_PKG_VERSION")),
            owner_id: owner_id.into(),
            tasks,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Database {
    /// Build a snapshot of every task belonging to `owner`.
    pub fn export_snapshot(&self, owner: &str) -> Result<Snapshot> {
        let tasks = self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tasks WHERE owner_id = ?1 ORDER BY id")?;
            let tasks = stmt
                .query_map(params![owner], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })?;

        Ok(Snapshot::new(owner, tasks))
    }
}
