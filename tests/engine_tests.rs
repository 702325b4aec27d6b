//! Integration tests for the task engine.
//!
//! Every test runs against a fresh in-memory SQLite database.

use cognitask_mcp::config::TasksConfig;
use cognitask_mcp::db::Database;
use cognitask_mcp::error::{ErrorCode, TaskError, ValidationReason};
use cognitask_mcp::types::{
    ParentFilter, Priority, Status, TaskDraft, TaskFilter, TaskPatch, TaskRecord,
};
use cognitask_mcp::validation::parse_due_date;

const OWNER: &str = "alice";

fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn create(db: &Database, title: &str) -> TaskRecord {
    db.create_task(OWNER, TaskDraft::new(title))
        .expect("Failed to create task")
}

fn create_child(db: &Database, parent: &str, title: &str) -> TaskRecord {
    db.create_task(OWNER, TaskDraft::new(title).with_parent(parent))
        .expect("Failed to create child task")
}

fn task_err(err: anyhow::Error) -> TaskError {
    err.downcast::<TaskError>()
        .expect("expected a structured TaskError")
}

fn titles(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("Step {}", i)).collect()
}

mod create_tests {
    use super::*;

    #[test]
    fn create_applies_defaults() {
        let db = setup_db();
        let record = create(&db, "  Write report  ");

        assert_eq!(record.task.title, "Write report");
        assert_eq!(record.task.owner_id, OWNER);
        assert_eq!(record.task.status, Status::Todo);
        assert_eq!(record.task.priority, Priority::Medium);
        assert!(record.task.parent_id.is_none());
        assert!(record.task.due_date.is_none());
        assert_eq!(record.task.created_at, record.task.updated_at);
        assert!(!record.etag.is_empty());
    }

    #[test]
    fn create_rejects_blank_title() {
        let db = setup_db();
        let err = task_err(db.create_task(OWNER, TaskDraft::new("   ")).unwrap_err());

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.reason, Some(ValidationReason::MissingTitle));
        assert_eq!(err.field.as_deref(), Some("title"));
    }

    #[test]
    fn create_rejects_overlong_title() {
        let db = setup_db();
        let err = task_err(
            db.create_task(OWNER, TaskDraft::new("x".repeat(256)))
                .unwrap_err(),
        );
        assert_eq!(err.reason, Some(ValidationReason::TitleTooLong));

        // Exactly at the limit is fine
        assert!(db.create_task(OWNER, TaskDraft::new("x".repeat(255))).is_ok());
    }

    #[test]
    fn create_blank_description_is_stored_as_none() {
        let db = setup_db();
        let record = db
            .create_task(OWNER, TaskDraft::new("Task").with_description("   "))
            .unwrap();
        assert!(record.task.description.is_none());
    }

    #[test]
    fn create_with_missing_parent_fails() {
        let db = setup_db();
        let err = task_err(
            db.create_task(OWNER, TaskDraft::new("Orphan").with_parent("nope"))
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.reason, Some(ValidationReason::ParentNotFound));
        assert_eq!(db.list_tasks(OWNER, &TaskFilter::default()).unwrap().len(), 0);
    }

    #[test]
    fn create_with_foreign_parent_fails() {
        let db = setup_db();
        let theirs = db.create_task("bob", TaskDraft::new("Bob's")).unwrap();
        let err = task_err(
            db.create_task(OWNER, TaskDraft::new("Mine").with_parent(&theirs.task.id))
                .unwrap_err(),
        );
        assert_eq!(err.reason, Some(ValidationReason::ParentNotFound));
    }

    #[test]
    fn create_with_duplicate_id_fails() {
        let db = setup_db();
        let mut draft = TaskDraft::new("First");
        draft.id = Some("fixed-id".into());
        db.create_task(OWNER, draft.clone()).unwrap();

        let err = task_err(db.create_task(OWNER, draft).unwrap_err());
        assert_eq!(err.reason, Some(ValidationReason::DuplicateId));
    }

    #[test]
    fn create_rejects_blank_id() {
        let db = setup_db();
        for id in ["", "   "] {
            let mut draft = TaskDraft::new("Task");
            draft.id = Some(id.into());
            let err = task_err(db.create_task(OWNER, draft).unwrap_err());
            assert_eq!(err.code, ErrorCode::ValidationFailed);
            assert_eq!(err.reason, Some(ValidationReason::InvalidId));
            assert_eq!(err.field.as_deref(), Some("id"));
        }
        assert_eq!(db.list_tasks(OWNER, &TaskFilter::default()).unwrap().len(), 0);

        let mut draft = TaskDraft::new("Task");
        draft.id = Some("  padded  ".into());
        let record = db.create_task(OWNER, draft).unwrap();
        assert_eq!(record.task.id, "padded");
    }

    #[test]
    fn duplicate_id_across_owners_reveals_nothing_else() {
        let db = setup_db();
        let mut draft = TaskDraft::new("Bob's secret");
        draft.id = Some("shared-id".into());
        db.create_task("bob", draft).unwrap();

        let mut draft = TaskDraft::new("Mine");
        draft.id = Some("shared-id".into());
        let err = task_err(db.create_task(OWNER, draft).unwrap_err());
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.reason, Some(ValidationReason::DuplicateId));
        assert!(!err.message.contains("Bob's secret"));
        assert!(!err.message.contains("bob"));

        assert!(db.get_task("shared-id", OWNER).unwrap().is_none());
        assert_eq!(db.list_tasks(OWNER, &TaskFilter::default()).unwrap().len(), 0);
    }

    #[test]
    fn create_rejects_overlong_description() {
        let db = setup_db();
        let err = task_err(
            db.create_task(OWNER, TaskDraft::new("Task").with_description("d".repeat(10_001)))
                .unwrap_err(),
        );
        assert_eq!(err.reason, Some(ValidationReason::DescriptionTooLong));
        assert_eq!(err.field.as_deref(), Some("description"));

        assert!(db
            .create_task(OWNER, TaskDraft::new("Task").with_description("d".repeat(10_000)))
            .is_ok());
    }

    #[test]
    fn create_with_self_parent_is_a_cycle() {
        let db = setup_db();
        let mut draft = TaskDraft::new("Loop").with_parent("self-id");
        draft.id = Some("self-id".into());

        let err = task_err(db.create_task(OWNER, draft).unwrap_err());
        assert_eq!(err.code, ErrorCode::CycleRejected);
    }
}

mod read_tests {
    use super::*;

    #[test]
    fn get_returns_same_etag_until_write() {
        let db = setup_db();
        let created = create(&db, "Task");

        let first = db.get_task(&created.task.id, OWNER).unwrap().unwrap();
        let second = db.get_task(&created.task.id, OWNER).unwrap().unwrap();
        assert_eq!(first.etag, created.etag);
        assert_eq!(first.etag, second.etag);
    }

    #[test]
    fn other_owner_sees_not_found() {
        let db = setup_db();
        let created = create(&db, "Private");

        assert!(db.get_task(&created.task.id, "bob").unwrap().is_none());
        let err = task_err(db.require_task(&created.task.id, "bob").unwrap_err());
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn list_is_newest_first_and_owner_scoped() {
        let db = setup_db();
        let a = create(&db, "A");
        let b = create(&db, "B");
        db.create_task("bob", TaskDraft::new("Bob's")).unwrap();

        let ids: Vec<String> = db
            .list_tasks(OWNER, &TaskFilter::default())
            .unwrap()
            .into_iter()
            .map(|r| r.task.id)
            .collect();
        assert_eq!(ids, vec![b.task.id, a.task.id]);
    }

    #[test]
    fn list_filters_by_status_parent_and_limit() {
        let db = setup_db();
        let root = create(&db, "Root");
        create_child(&db, &root.task.id, "Child 1");
        create_child(&db, &root.task.id, "Child 2");
        db.create_task(OWNER, TaskDraft::new("Done").with_status(Status::Done))
            .unwrap();

        let done = db
            .list_tasks(
                OWNER,
                &TaskFilter {
                    status: Some(Status::Done),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(done.len(), 1);

        let roots = db
            .list_tasks(
                OWNER,
                &TaskFilter {
                    parent: Some(ParentFilter::Root),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(roots.len(), 2);

        let children = db
            .list_tasks(
                OWNER,
                &TaskFilter {
                    parent: Some(ParentFilter::Of(root.task.id.clone())),
                    limit: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].task.title, "Child 2");
    }

    #[test]
    fn children_are_oldest_first() {
        let db = setup_db();
        let root = create(&db, "Root");
        create_child(&db, &root.task.id, "First");
        create_child(&db, &root.task.id, "Second");

        let children = db.get_children(&root.task.id, OWNER).unwrap();
        let titles: Vec<&str> = children.iter().map(|r| r.task.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert!(db.has_children(&root.task.id, OWNER).unwrap());
        assert!(!db.has_children(&children[0].task.id, OWNER).unwrap());
    }

    #[test]
    fn tree_nests_descendants() {
        let db = setup_db();
        let root = create(&db, "Root");
        let child = create_child(&db, &root.task.id, "Child");
        create_child(&db, &child.task.id, "Grandchild");

        let tree = db.get_task_tree(&root.task.id, OWNER).unwrap().unwrap();
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].children.len(), 1);
        assert_eq!(tree.children[0].children[0].record.task.title, "Grandchild");

        assert!(db.get_task_tree("missing", OWNER).unwrap().is_none());
    }
}

mod update_tests {
    use super::*;

    #[test]
    fn update_changes_fields_and_etag() {
        let db = setup_db();
        let created = create(&db, "Task");

        let patch = TaskPatch {
            title: Some("Renamed".into()),
            priority: Some(Priority::Urgent),
            due_date: Some(Some(1_800_000_000_000)),
            ..Default::default()
        };
        let updated = db
            .update_task(&created.task.id, OWNER, &created.etag, patch)
            .unwrap();

        assert_eq!(updated.task.title, "Renamed");
        assert_eq!(updated.task.priority, Priority::Urgent);
        assert_eq!(updated.task.due_date, Some(1_800_000_000_000));
        assert_ne!(updated.etag, created.etag);
        assert!(updated.task.updated_at > created.task.updated_at);
        assert_eq!(updated.task.created_at, created.task.created_at);
    }

    #[test]
    fn update_with_stale_etag_conflicts() {
        let db = setup_db();
        let created = create(&db, "Task");
        db.update_task(
            &created.task.id,
            OWNER,
            &created.etag,
            TaskPatch::status(Status::InProgress),
        )
        .unwrap();

        let err = task_err(
            db.update_task(
                &created.task.id,
                OWNER,
                &created.etag,
                TaskPatch::status(Status::Done),
            )
            .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::Conflict);

        let current = db.require_task(&created.task.id, OWNER).unwrap();
        assert_eq!(current.task.status, Status::InProgress);
    }

    #[test]
    fn identical_update_still_refreshes_etag() {
        let db = setup_db();
        let created = create(&db, "Task");
        let same = db
            .update_task(
                &created.task.id,
                OWNER,
                &created.etag,
                TaskPatch::status(Status::Todo),
            )
            .unwrap();
        assert_ne!(same.etag, created.etag);
    }

    #[test]
    fn update_clears_nullable_fields() {
        let db = setup_db();
        let root = create(&db, "Root");
        let child = db
            .create_task(
                OWNER,
                TaskDraft::new("Child")
                    .with_parent(&root.task.id)
                    .with_description("Notes")
                    .with_due_date(1_800_000_000_000),
            )
            .unwrap();

        let patch = TaskPatch {
            description: Some(None),
            due_date: Some(None),
            parent_id: Some(None),
            ..Default::default()
        };
        let updated = db
            .update_task(&child.task.id, OWNER, &child.etag, patch)
            .unwrap();
        assert!(updated.task.description.is_none());
        assert!(updated.task.due_date.is_none());
        assert!(updated.task.parent_id.is_none());
    }

    #[test]
    fn reparent_under_descendant_is_rejected() {
        let db = setup_db();
        let a = create(&db, "A");
        let b = create_child(&db, &a.task.id, "B");
        let c = create_child(&db, &b.task.id, "C");

        let err = task_err(
            db.update_task(
                &a.task.id,
                OWNER,
                &a.etag,
                TaskPatch::reparent(Some(c.task.id.clone())),
            )
            .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::CycleRejected);

        let err = task_err(
            db.update_task(
                &a.task.id,
                OWNER,
                &a.etag,
                TaskPatch::reparent(Some(a.task.id.clone())),
            )
            .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::CycleRejected);

        // Hierarchy unchanged
        let a_now = db.require_task(&a.task.id, OWNER).unwrap();
        assert!(a_now.task.parent_id.is_none());
    }

    #[test]
    fn reparent_to_missing_parent_fails() {
        let db = setup_db();
        let a = create(&db, "A");
        let err = task_err(
            db.update_task(
                &a.task.id,
                OWNER,
                &a.etag,
                TaskPatch::reparent(Some("ghost".into())),
            )
            .unwrap_err(),
        );
        assert_eq!(err.reason, Some(ValidationReason::ParentNotFound));
    }

    #[test]
    fn not_found_is_reported_before_conflict() {
        let db = setup_db();
        let created = create(&db, "Task");

        let err = task_err(
            db.update_task(&created.task.id, "bob", "stale", TaskPatch::status(Status::Done))
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn validation_is_reported_before_existence() {
        let db = setup_db();
        let patch = TaskPatch {
            title: Some("   ".into()),
            ..Default::default()
        };
        let err = task_err(db.update_task("missing", OWNER, "stale", patch).unwrap_err());
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn update_with_empty_patch_is_rejected() {
        let db = setup_db();
        let created = create(&db, "Task");

        let err = task_err(
            db.update_task(&created.task.id, OWNER, &created.etag, TaskPatch::default())
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.reason, Some(ValidationReason::MissingField));
        assert_eq!(err.field.as_deref(), Some("fields"));

        let current = db.require_task(&created.task.id, OWNER).unwrap();
        assert_eq!(current.etag, created.etag);
        assert_eq!(current.task.updated_at, created.task.updated_at);
    }

    #[test]
    fn update_rejects_overlong_description() {
        let db = setup_db();
        let created = create(&db, "Task");
        let patch = TaskPatch {
            description: Some(Some("d".repeat(10_001))),
            ..Default::default()
        };
        let err = task_err(
            db.update_task(&created.task.id, OWNER, &created.etag, patch)
                .unwrap_err(),
        );
        assert_eq!(err.reason, Some(ValidationReason::DescriptionTooLong));
    }
}

mod delete_tests {
    use super::*;

    #[test]
    fn delete_leaf_removes_it() {
        let db = setup_db();
        let created = create(&db, "Task");
        db.delete_task(&created.task.id, OWNER, &created.etag)
            .unwrap();
        assert!(db.get_task(&created.task.id, OWNER).unwrap().is_none());
    }

    #[test]
    fn delete_with_children_is_blocked() {
        let db = setup_db();
        let root = create(&db, "Root");
        create_child(&db, &root.task.id, "Child");

        let err = task_err(
            db.delete_task(&root.task.id, OWNER, &root.etag)
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::DeleteBlocked);
        assert!(db.get_task(&root.task.id, OWNER).unwrap().is_some());
    }

    #[test]
    fn delete_with_stale_etag_conflicts() {
        let db = setup_db();
        let created = create(&db, "Task");
        let err = task_err(db.delete_task(&created.task.id, OWNER, "stale").unwrap_err());
        assert_eq!(err.code, ErrorCode::Conflict);
    }
}

mod promote_tests {
    use super::*;

    #[test]
    fn promote_moves_to_grandparent() {
        let db = setup_db();
        let a = create(&db, "A");
        let b = create_child(&db, &a.task.id, "B");
        let c = create_child(&db, &b.task.id, "C");

        let promoted = db.promote_task(&c.task.id, OWNER, &c.etag).unwrap();
        assert_eq!(promoted.task.parent_id.as_deref(), Some(a.task.id.as_str()));

        let promoted = db
            .promote_task(&c.task.id, OWNER, &promoted.etag)
            .unwrap();
        assert!(promoted.task.parent_id.is_none());
    }

    #[test]
    fn promote_root_is_invalid() {
        let db = setup_db();
        let a = create(&db, "A");
        let err = task_err(db.promote_task(&a.task.id, OWNER, &a.etag).unwrap_err());
        assert_eq!(err.code, ErrorCode::InvalidOperation);
    }
}

mod breakdown_tests {
    use super::*;

    #[test]
    fn breakdown_creates_children_in_order() {
        let db = setup_db();
        let root = create(&db, "Plan trip");
        let created = db
            .breakdown_task(&root.task.id, OWNER, &titles(3), &TasksConfig::default())
            .unwrap();

        assert_eq!(created.len(), 3);
        for record in &created {
            assert_eq!(record.task.parent_id.as_deref(), Some(root.task.id.as_str()));
            assert_eq!(record.task.status, Status::Todo);
            assert_eq!(record.task.priority, Priority::Medium);
        }

        let children = db.get_children(&root.task.id, OWNER).unwrap();
        let names: Vec<&str> = children.iter().map(|r| r.task.title.as_str()).collect();
        assert_eq!(names, vec!["Step 1", "Step 2", "Step 3"]);
    }

    #[test]
    fn breakdown_enforces_count_bounds() {
        let db = setup_db();
        let root = create(&db, "Root");
        let config = TasksConfig::default();

        for n in [2, 8] {
            let err = task_err(
                db.breakdown_task(&root.task.id, OWNER, &titles(n), &config)
                    .unwrap_err(),
            );
            assert_eq!(err.reason, Some(ValidationReason::InvalidSubtaskCount));
        }
        assert!(db.breakdown_task(&root.task.id, OWNER, &titles(7), &config).is_ok());
    }

    #[test]
    fn breakdown_is_all_or_nothing() {
        let db = setup_db();
        let root = create(&db, "Root");
        let mut proposed = titles(4);
        proposed[2] = "   ".into();

        let err = task_err(
            db.breakdown_task(&root.task.id, OWNER, &proposed, &TasksConfig::default())
                .unwrap_err(),
        );
        assert_eq!(err.reason, Some(ValidationReason::InvalidSubtaskTitle));
        assert!(!db.has_children(&root.task.id, OWNER).unwrap());
    }

    #[test]
    fn breakdown_rolls_back_when_a_later_insert_fails() {
        let db = setup_db();
        let root = create(&db, "Root");
        db.with_conn(|conn| {
            conn.execute_batch(
                "CREATE TRIGGER reject_step_three BEFORE INSERT ON tasks
                 WHEN NEW.title = 'Step 3'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )?;
            Ok(())
        })
        .unwrap();

        let err = db
            .breakdown_task(&root.task.id, OWNER, &titles(4), &TasksConfig::default())
            .unwrap_err();
        assert_eq!(TaskError::from(err).code, ErrorCode::DatabaseError);
        assert!(!db.has_children(&root.task.id, OWNER).unwrap());
        assert_eq!(db.list_tasks(OWNER, &TaskFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn breakdown_of_missing_task_fails() {
        let db = setup_db();
        let err = task_err(
            db.breakdown_task("missing", OWNER, &titles(3), &TasksConfig::default())
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}

mod focus_tests {
    use super::*;

    #[test]
    fn next_is_none_when_nothing_actionable() {
        let db = setup_db();
        assert!(db.select_next(OWNER).unwrap().is_none());

        db.create_task(OWNER, TaskDraft::new("Done").with_status(Status::Done))
            .unwrap();
        db.create_task(OWNER, TaskDraft::new("Blocked").with_status(Status::Blocked))
            .unwrap();
        assert!(db.select_next(OWNER).unwrap().is_none());
    }

    #[test]
    fn next_prefers_priority_then_due_then_age() {
        let db = setup_db();
        create(&db, "Medium, oldest");
        db.create_task(
            OWNER,
            TaskDraft::new("Urgent, done")
                .with_priority(Priority::Urgent)
                .with_status(Status::Done),
        )
        .unwrap();
        db.create_task(OWNER, TaskDraft::new("High, undated").with_priority(Priority::High))
            .unwrap();
        db.create_task(
            OWNER,
            TaskDraft::new("High, due later")
                .with_priority(Priority::High)
                .with_due_date(2_000_000_000_000),
        )
        .unwrap();
        db.create_task(
            OWNER,
            TaskDraft::new("High, due sooner")
                .with_priority(Priority::High)
                .with_due_date(1_900_000_000_000)
                .with_status(Status::InProgress),
        )
        .unwrap();

        let next = db.select_next(OWNER).unwrap().unwrap();
        assert_eq!(next.task.title, "High, due sooner");
    }

    #[test]
    fn next_picks_earliest_due_among_urgent() {
        let db = setup_db();
        let due = |date: &str| parse_due_date(date).unwrap();
        db.create_task(
            OWNER,
            TaskDraft::new("Urgent, Jan 15")
                .with_priority(Priority::Urgent)
                .with_due_date(due("2026-01-15")),
        )
        .unwrap();
        let expected = db
            .create_task(
                OWNER,
                TaskDraft::new("Urgent, Jan 10")
                    .with_priority(Priority::Urgent)
                    .with_due_date(due("2026-01-10")),
            )
            .unwrap();
        db.create_task(
            OWNER,
            TaskDraft::new("High, Jan 1")
                .with_priority(Priority::High)
                .with_due_date(due("2026-01-01")),
        )
        .unwrap();

        let next = db.select_next(OWNER).unwrap().unwrap();
        assert_eq!(next.task.id, expected.task.id);
    }

    #[test]
    fn next_breaks_ties_by_creation_order() {
        let db = setup_db();
        let first = create(&db, "First");
        create(&db, "Second");

        let next = db.select_next(OWNER).unwrap().unwrap();
        assert_eq!(next.task.id, first.task.id);
    }

    #[test]
    fn next_ignores_other_owners() {
        let db = setup_db();
        db.create_task("bob", TaskDraft::new("Bob's").with_priority(Priority::Urgent))
            .unwrap();
        assert!(db.select_next(OWNER).unwrap().is_none());
    }
}

mod stats_tests {
    use super::*;

    #[test]
    fn stats_count_statuses_and_overdue() {
        let db = setup_db();
        let now = 1_800_000_000_000;

        db.create_task(OWNER, TaskDraft::new("Late").with_due_date(now - 1))
            .unwrap();
        db.create_task(
            OWNER,
            TaskDraft::new("Late but done")
                .with_due_date(now - 1)
                .with_status(Status::Done),
        )
        .unwrap();
        db.create_task(
            OWNER,
            TaskDraft::new("Future")
                .with_due_date(now + 1)
                .with_status(Status::InProgress),
        )
        .unwrap();
        db.create_task(OWNER, TaskDraft::new("Stuck").with_status(Status::Blocked))
            .unwrap();
        db.create_task("bob", TaskDraft::new("Bob's")).unwrap();

        let stats = db.task_stats_at(OWNER, now).unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.todo, 1);
        assert_eq!(stats.inprogress, 1);
        assert_eq!(stats.done, 1);
        assert_eq!(stats.blocked, 1);
        assert_eq!(stats.overdue, 1);
    }

    #[test]
    fn stats_for_empty_owner_are_zero() {
        let db = setup_db();
        let stats = db.task_stats(OWNER).unwrap();
        assert_eq!(stats, Default::default());
    }
}

mod export_tests {
    use super::*;

    #[test]
    fn snapshot_holds_only_owner_tasks() {
        let db = setup_db();
        create(&db, "Mine");
        db.create_task("bob", TaskDraft::new("Bob's")).unwrap();

        let snapshot = db.export_snapshot(OWNER).unwrap();
        assert_eq!(snapshot.owner_id, OWNER);
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.tasks[0].title, "Mine");
    }
}
