//! Aggregation queries for statistics.

use super::{Database, now_ms};
use crate::types::TaskStats;
use anyhow::Result;
use rusqlite::params;

impl Database {
    /// Per-status counts for one owner, plus the number of overdue tasks.
    ///
    /// A task is overdue when its due date is before now and it is still
    /// todo or inprogress.
    pub fn task_stats(&self, owner: &str) -> Result<TaskStats> {
        self.task_stats_at(owner, now_ms())
    }

    /// Same as [`Database::task_stats`] with an explicit reference time.
    pub fn task_stats_at(&self, owner: &str, now: i64) -> Result<TaskStats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    COUNT(*) AS total,
                    COALESCE(SUM(status = 'todo'), 0) AS todo,
                    COALESCE(SUM(status = 'inprogress'), 0) AS inprogress,
                    COALESCE(SUM(status = 'done'), 0) AS done,
                    COALESCE(SUM(status = 'blocked'), 0) AS blocked,
                    COALESCE(SUM(
                        due_date IS NOT NULL
                        AND due_date < ?2
                        AND status IN ('todo', 'inprogress')
                    ), 0) AS overdue
                FROM tasks WHERE owner_id = ?1",
                params![owner, now],
                |row| {
                    Ok(TaskStats {
                        total: row.get("total")?,
                        todo: row.get("todo")?,
                        inprogress: row.get("inprogress")?,
                        done: row.get("done")?,
                        blocked: row.get("blocked")?,
                        overdue: row.get("overdue")?,
                    })
                },
            )?;
            Ok(stats)
        })
    }
}
