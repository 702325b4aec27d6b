//! Concurrency tokens derived from task content.
//!
//! A token is a SHA-256 digest over every persisted field of a task, encoded
//! as URL-safe base64. It is recomputed on every read and never stored, so it
//! cannot drift from the row it describes.

use crate::types::{Task, TaskRecord};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Compute the concurrency token for a task.
pub fn compute_etag(task: &Task) -> String {
    let mut hasher = Sha256::new();

    // Length-prefix every field so adjacent values can't run together.
    field(&mut hasher, task.id.as_bytes());
    field(&mut hasher, task.owner_id.as_bytes());
    field(&mut hasher, task.title.as_bytes());
    optional(&mut hasher, task.description.as_deref().map(str::as_bytes));
    field(&mut hasher, task.status.as_str().as_bytes());
    field(&mut hasher, task.priority.as_str().as_bytes());
    optional(&mut hasher, task.due_date.map(i64::to_be_bytes).as_ref().map(|b| &b[..]));
    optional(&mut hasher, task.parent_id.as_deref().map(str::as_bytes));
    field(&mut hasher, &task.created_at.to_be_bytes());
    field(&mut hasher, &task.updated_at.to_be_bytes());

    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Pair a task with its freshly computed token.
pub fn with_etag(task: Task) -> TaskRecord {
    let etag = compute_etag(&task);
    TaskRecord { task, etag }
}

fn field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

fn optional(hasher: &mut Sha256, bytes: Option<&[u8]>) {
    match bytes {
        Some(b) => {
            hasher.update([1u8]);
            field(hasher, b);
        }
        None => hasher.update([0u8]),
    }
}
