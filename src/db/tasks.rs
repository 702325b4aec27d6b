//! Task CRUD, hierarchy rules and focus selection.
//!
//! Every public operation runs in a single transaction. Checks happen in a
//! fixed order: input validation, existence/ownership, concurrency token,
//! then the operation's own rules. A failed check leaves the table untouched.

use super::token::with_etag;
use super::{Database, now_ms};
use crate::config::TasksConfig;
use crate::error::{TaskError, ValidationReason};
use crate::types::{
    ParentFilter, Priority, Status, Task, TaskDraft, TaskFilter, TaskPatch, TaskRecord, TaskTree,
};
use crate::validation::{
    normalize_description, normalize_id, normalize_title, validate_subtask_titles,
};
use anyhow::Result;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Priority rank as SQL, matching `Priority::rank`.
const PRIORITY_RANK_SQL: &str = "CASE priority
        WHEN 'urgent' THEN 4
        WHEN 'high' THEN 3
        WHEN 'medium' THEN 2
        WHEN 'low' THEN 1
        ELSE 0
    END";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let priority: String = row.get("priority")?;

    Ok(Task {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: status
            .parse::<Status>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
        priority: priority
            .parse::<Priority>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?,
        due_date: row.get("due_date")?,
        parent_id: row.get("parent_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
fn get_task_internal(conn: &Connection, task_id: &str, owner: &str) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            "SELECT * FROM tasks WHERE id = ?1 AND owner_id = ?2",
            params![task_id, owner],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

/// Load a task for mutation: absent/foreign first, then stale token.
fn load_for_write(
    conn: &Connection,
    task_id: &str,
    owner: &str,
    expected_etag: &str,
) -> Result<Task> {
    let task = get_task_internal(conn, task_id, owner)?
        .ok_or_else(|| TaskError::task_not_found(task_id))?;

    let current = with_etag(task);
    if current.etag != expected_etag {
        debug!(task_id, "Rejecting write with stale etag");
        return Err(TaskError::conflict(task_id).into());
    }

    Ok(current.task)
}

fn id_exists(conn: &Connection, task_id: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
        params![task_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn count_children(conn: &Connection, task_id: &str, owner: &str) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE parent_id = ?1 AND owner_id = ?2",
        params![task_id, owner],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn count_owner_tasks(conn: &Connection, owner: &str) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks WHERE owner_id = ?1",
        params![owner],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Parent link of a task, or `None` if the task doesn't exist for this owner.
fn parent_of(conn: &Connection, task_id: &str, owner: &str) -> Result<Option<Option<String>>> {
    let parent = conn
        .query_row(
            "SELECT parent_id FROM tasks WHERE id = ?1 AND owner_id = ?2",
            params![task_id, owner],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()?;
    Ok(parent)
}

/// Ensure `parent_id` names an existing task of the same owner.
fn require_parent(conn: &Connection, parent_id: &str, owner: &str) -> Result<()> {
    if parent_of(conn, parent_id, owner)?.is_none() {
        return Err(TaskError::parent_not_found(parent_id).into());
    }
    Ok(())
}

/// Check whether making `new_parent` the parent of `task_id` would close a
/// cycle, by walking up from `new_parent`.
///
/// The walk is bounded by the owner's task count, so it terminates even if
/// the stored links were already corrupt; hitting the bound or revisiting a
/// node counts as a cycle.
fn would_create_cycle(
    conn: &Connection,
    task_id: &str,
    new_parent: &str,
    owner: &str,
) -> Result<bool> {
    let bound = count_owner_tasks(conn, owner)? + 1;
    let mut seen: HashSet<String> = HashSet::new();
    let mut current = Some(new_parent.to_string());
    let mut steps = 0i64;

    while let Some(id) = current {
        if id == task_id {
            return Ok(true);
        }
        if !seen.insert(id.clone()) || steps > bound {
            return Ok(true);
        }
        steps += 1;
        current = parent_of(conn, &id, owner)?.flatten();
    }

    Ok(false)
}

fn insert_task(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "INSERT INTO tasks (
            id, owner_id, title, description, status, priority,
            due_date, parent_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            task.id,
            task.owner_id,
            task.title,
            task.description,
            task.status.as_str(),
            task.priority.as_str(),
            task.due_date,
            task.parent_id,
            task.created_at,
            task.updated_at,
        ],
    )?;
    Ok(())
}

fn write_task(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET
            title = ?1, description = ?2, status = ?3, priority = ?4,
            due_date = ?5, parent_id = ?6, updated_at = ?7
        WHERE id = ?8 AND owner_id = ?9",
        params![
            task.title,
            task.description,
            task.status.as_str(),
            task.priority.as_str(),
            task.due_date,
            task.parent_id,
            task.updated_at,
            task.id,
            task.owner_id,
        ],
    )?;
    Ok(())
}

/// Next `updated_at`, strictly after the previous one so every successful
/// write produces a fresh token.
fn next_updated_at(previous: i64) -> i64 {
    now_ms().max(previous + 1)
}

fn query_tasks(conn: &Connection, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(sql)?;
    let tasks = stmt
        .query_map(params, parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

fn children_internal(conn: &Connection, task_id: &str, owner: &str) -> Result<Vec<Task>> {
    query_tasks(
        conn,
        "SELECT * FROM tasks WHERE parent_id = ?1 AND owner_id = ?2
         ORDER BY created_at ASC, rowid ASC",
        &[&task_id, &owner],
    )
}

fn tree_internal(
    conn: &Connection,
    task: Task,
    owner: &str,
    seen: &mut HashSet<String>,
) -> Result<TaskTree> {
    seen.insert(task.id.clone());
    let mut children = Vec::new();
    for child in children_internal(conn, &task.id, owner)? {
        if seen.contains(&child.id) {
            continue;
        }
        children.push(tree_internal(conn, child, owner, seen)?);
    }
    Ok(TaskTree {
        record: with_etag(task),
        children,
    })
}

impl Database {
    /// Create a new task.
    /// If the draft carries an id, it is used as-is; otherwise a UUID7 is generated.
    pub fn create_task(&self, owner: &str, draft: TaskDraft) -> Result<TaskRecord> {
        let title = normalize_title(&draft.title)?;
        let description = normalize_description(draft.description)?;
        let task_id = match draft.id {
            Some(ref id) => normalize_id(id)?,
            None => Uuid::now_v7().to_string(),
        };

        if draft.parent_id.as_deref() == Some(task_id.as_str()) {
            return Err(TaskError::cycle(&task_id, &task_id).into());
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if id_exists(&tx, &task_id)? {
                return Err(TaskError::validation(
                    ValidationReason::DuplicateId,
                    "id",
                    format!("Task id already in use: {}", task_id),
                )
                .into());
            }

            if let Some(ref parent_id) = draft.parent_id {
                require_parent(&tx, parent_id, owner)?;
            }

            let now = now_ms();
            let task = Task {
                id: task_id,
                owner_id: owner.to_string(),
                title,
                description,
                status: draft.status.unwrap_or_default(),
                priority: draft.priority.unwrap_or_default(),
                due_date: draft.due_date,
                parent_id: draft.parent_id,
                created_at: now,
                updated_at: now,
            };

            insert_task(&tx, &task)?;
            tx.commit()?;

            info!(task_id = %task.id, owner, parent_id = ?task.parent_id, "Created task");
            Ok(with_etag(task))
        })
    }

    /// Get a task by ID.
    pub fn get_task(&self, task_id: &str, owner: &str) -> Result<Option<TaskRecord>> {
        self.with_conn(|conn| Ok(get_task_internal(conn, task_id, owner)?.map(with_etag)))
    }

    /// Get a task or fail with `NotFound`.
    pub fn require_task(&self, task_id: &str, owner: &str) -> Result<TaskRecord> {
        self.get_task(task_id, owner)?
            .ok_or_else(|| TaskError::task_not_found(task_id).into())
    }

    /// Apply a partial update guarded by the caller's last-seen token. An
    /// empty patch is rejected rather than minting a new token.
    pub fn update_task(
        &self,
        task_id: &str,
        owner: &str,
        expected_etag: &str,
        patch: TaskPatch,
    ) -> Result<TaskRecord> {
        if patch.is_empty() {
            return Err(TaskError::validation(
                ValidationReason::MissingField,
                "fields",
                "Nothing to update: pass at least one field to change",
            )
            .into());
        }
        let title = patch.title.as_deref().map(normalize_title).transpose()?;
        let description = patch.description.map(normalize_description).transpose()?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let task = load_for_write(&tx, task_id, owner, expected_etag)?;

            let parent_id = match patch.parent_id {
                Some(Some(new_parent)) => {
                    if new_parent == task_id {
                        return Err(TaskError::cycle(task_id, &new_parent).into());
                    }
                    require_parent(&tx, &new_parent, owner)?;
                    if would_create_cycle(&tx, task_id, &new_parent, owner)? {
                        return Err(TaskError::cycle(task_id, &new_parent).into());
                    }
                    Some(new_parent)
                }
                Some(None) => None,
                None => task.parent_id.clone(),
            };

            let updated = Task {
                title: title.unwrap_or_else(|| task.title.clone()),
                description: description.unwrap_or_else(|| task.description.clone()),
                status: patch.status.unwrap_or(task.status),
                priority: patch.priority.unwrap_or(task.priority),
                due_date: patch.due_date.unwrap_or(task.due_date),
                parent_id,
                updated_at: next_updated_at(task.updated_at),
                ..task.clone()
            };

            write_task(&tx, &updated)?;
            tx.commit()?;

            if task.status != updated.status {
                info!(task_id, from = %task.status, to = %updated.status, "Task status changed");
            } else {
                debug!(task_id, "Updated task");
            }
            Ok(with_etag(updated))
        })
    }

    /// Delete a task. Fails with `DeleteBlocked` while it still has children.
    pub fn delete_task(&self, task_id: &str, owner: &str, expected_etag: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            load_for_write(&tx, task_id, owner, expected_etag)?;

            let children = count_children(&tx, task_id, owner)?;
            if children > 0 {
                return Err(TaskError::delete_blocked(task_id, children).into());
            }

            tx.execute(
                "DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2",
                params![task_id, owner],
            )?;
            tx.commit()?;

            info!(task_id, owner, "Deleted task");
            Ok(())
        })
    }

    /// Move a task up one level: its parent becomes its former grandparent
    /// (or none, making it a root).
    pub fn promote_task(
        &self,
        task_id: &str,
        owner: &str,
        expected_etag: &str,
    ) -> Result<TaskRecord> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let task = load_for_write(&tx, task_id, owner, expected_etag)?;

            let Some(ref parent_id) = task.parent_id else {
                return Err(TaskError::invalid_operation(format!(
                    "Task {} has no parent to promote from",
                    task_id
                ))
                .into());
            };

            // The parent was validated on write; a missing one means it was
            // removed out from under us, so promote straight to root.
            let grandparent = parent_of(&tx, parent_id, owner)?.flatten();

            let updated = Task {
                parent_id: grandparent,
                updated_at: next_updated_at(task.updated_at),
                ..task.clone()
            };

            write_task(&tx, &updated)?;
            tx.commit()?;

            info!(task_id, new_parent = ?updated.parent_id, "Promoted task");
            Ok(with_etag(updated))
        })
    }

    /// Create one child per proposed title under `task_id`, all or nothing.
    pub fn breakdown_task(
        &self,
        task_id: &str,
        owner: &str,
        titles: &[String],
        config: &TasksConfig,
    ) -> Result<Vec<TaskRecord>> {
        let titles = validate_subtask_titles(titles, config.breakdown_min, config.breakdown_max)?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if get_task_internal(&tx, task_id, owner)?.is_none() {
                return Err(TaskError::task_not_found(task_id).into());
            }

            let now = now_ms();
            let mut created = Vec::with_capacity(titles.len());
            for title in titles {
                let child = Task {
                    id: Uuid::now_v7().to_string(),
                    owner_id: owner.to_string(),
                    title,
                    description: None,
                    status: Status::default(),
                    priority: Priority::default(),
                    due_date: None,
                    parent_id: Some(task_id.to_string()),
                    created_at: now,
                    updated_at: now,
                };
                insert_task(&tx, &child)?;
                created.push(child);
            }

            tx.commit()?;

            info!(task_id, count = created.len(), "Broke task down into sub-tasks");
            Ok(created.into_iter().map(with_etag).collect())
        })
    }

    /// Focus Mode: the single todo/inprogress task to work on next.
    ///
    /// Highest priority first, then earliest due date (undated last), then
    /// oldest. Returns `None` when nothing is actionable.
    pub fn select_next(&self, owner: &str) -> Result<Option<TaskRecord>> {
        let sql = format!(
            "SELECT * FROM tasks
             WHERE owner_id = ?1 AND status IN ('todo', 'inprogress')
             ORDER BY {} DESC,
                      due_date IS NULL ASC,
                      due_date ASC,
                      created_at ASC,
                      rowid ASC
             LIMIT 1",
            PRIORITY_RANK_SQL
        );

        self.with_conn(|conn| {
            let task = conn
                .query_row(&sql, params![owner], parse_task_row)
                .optional()?;
            Ok(task.map(with_etag))
        })
    }

    /// List tasks with optional filters, newest first.
    pub fn list_tasks(&self, owner: &str, filter: &TaskFilter) -> Result<Vec<TaskRecord>> {
        self.with_conn(|conn| {
            let mut sql = String::from("SELECT * FROM tasks WHERE owner_id = ?");
            let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner.to_string())];

            if let Some(status) = filter.status {
                sql.push_str(" AND status = ?");
                params_vec.push(Box::new(status.as_str()));
            }

            match filter.parent {
                Some(ParentFilter::Root) => sql.push_str(" AND parent_id IS NULL"),
                Some(ParentFilter::Of(ref pid)) => {
                    sql.push_str(" AND parent_id = ?");
                    params_vec.push(Box::new(pid.clone()));
                }
                None => {}
            }

            sql.push_str(" ORDER BY created_at DESC, rowid DESC");

            if let Some(limit) = filter.limit {
                sql.push_str(&format!(" LIMIT {}", limit));
            }

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|b| b.as_ref()).collect();

            let tasks = query_tasks(conn, &sql, &params_refs)?;
            Ok(tasks.into_iter().map(with_etag).collect())
        })
    }

    /// Direct children of a task, oldest first.
    pub fn get_children(&self, task_id: &str, owner: &str) -> Result<Vec<TaskRecord>> {
        self.with_conn(|conn| {
            Ok(children_internal(conn, task_id, owner)?
                .into_iter()
                .map(with_etag)
                .collect())
        })
    }

    /// Whether any task names this one as its parent.
    pub fn has_children(&self, task_id: &str, owner: &str) -> Result<bool> {
        self.with_conn(|conn| Ok(count_children(conn, task_id, owner)? > 0))
    }

    /// Get a task with all its descendants.
    pub fn get_task_tree(&self, task_id: &str, owner: &str) -> Result<Option<TaskTree>> {
        self.with_conn(|conn| {
            let Some(task) = get_task_internal(conn, task_id, owner)? else {
                return Ok(None);
            };
            let mut seen = HashSet::new();
            Ok(Some(tree_internal(conn, task, owner, &mut seen)?))
        })
    }
}
