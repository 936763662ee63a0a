mod common;

#[cfg(test)]
mod tests {
    use super::common::{new_task, reference, BasketContext, USER};
    use basket::libs::error::{ErrorKind, TaskError};
    use basket::libs::history::HistoryEventKind;
    use basket::db::tasks::SqliteTaskStore;
    use basket::libs::store::TaskStore;
    use basket::libs::task::{NewTask, ObjectReference, TaskState, WorkbasketLocator};
    use std::time::{Duration, Instant};
    use test_context::test_context;

    #[test_context(BasketContext)]
    #[test]
    fn test_create_task_initial_state(ctx: &mut BasketContext) {
        let task = ctx.user().task_service().create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();

        assert!(task.id.starts_with("TKI:"));
        assert_eq!(task.created, task.modified);
        assert_eq!(task.created, task.planned);
        assert!(task.claimed.is_none());
        assert!(task.completed.is_none());
        assert_eq!(task.state, TaskState::Ready);
        assert!(!task.is_read);
        assert!(!task.is_transferred);
        assert_eq!(task.workbasket.key, "USER-1-1");
        assert_eq!(task.domain, "DOMAIN_A");
        assert!(task.business_process_id.as_deref().unwrap().starts_with("BPI:"));

        let loaded = ctx.user().task_service().get_task(&task.id).unwrap();
        assert_eq!(loaded, task);
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_create_task_resolves_classification_in_workbasket_domain(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();

        let in_a = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();
        assert_eq!(in_a.classification.id, "CLI:1");
        assert_eq!(in_a.priority, 1);

        let by_key = NewTask::new(
            WorkbasketLocator::KeyDomain {
                key: "USER-B-1".to_string(),
                domain: "DOMAIN_B".to_string(),
            },
            "L10000",
        )
        .with_primary_obj_ref(reference("00000002"));
        let in_b = service.create_task(by_key).unwrap();
        assert_eq!(in_b.classification.id, "CLI:2");
        assert_eq!(in_b.classification.domain, "DOMAIN_B");
        assert_eq!(in_b.priority, 2);
        assert_eq!(in_b.workbasket.id, "WBI:3");
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_create_task_failures(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();

        let no_append = service.create_task(new_task("WBI:4", "L10000", "1")).unwrap_err();
        assert_eq!(no_append.kind(), ErrorKind::NotAuthorized);

        let unknown_workbasket = service.create_task(new_task("WBI:404", "L10000", "1")).unwrap_err();
        assert!(matches!(unknown_workbasket, TaskError::WorkbasketNotFound(_)));

        let unknown_classification = service.create_task(new_task("WBI:1", "NOPE", "1")).unwrap_err();
        assert!(matches!(unknown_classification, TaskError::ClassificationNotFound { .. }));

        let mut bad_key = new_task("WBI:1", "L10000", "1");
        bad_key.custom_attributes.insert("17".to_string(), "x".to_string());
        assert_eq!(service.create_task(bad_key).unwrap_err().kind(), ErrorKind::InvalidArgument);

        let no_reference = NewTask::new(WorkbasketLocator::Id("WBI:1".to_string()), "L10000");
        assert_eq!(service.create_task(no_reference).unwrap_err().kind(), ErrorKind::InvalidArgument);

        let mut with_id = new_task("WBI:1", "L10000", "1");
        with_id.id = Some("TKI:fixed".to_string());
        service.create_task(with_id.clone()).unwrap();
        assert_eq!(service.create_task(with_id).unwrap_err().kind(), ErrorKind::AlreadyExists);
    }

    fn incomplete_references() -> Vec<ObjectReference> {
        let full = reference("00000001");
        vec![
            ObjectReference { company: None, ..full.clone() },
            ObjectReference { system: None, ..full.clone() },
            ObjectReference {
                system_instance: None,
                ..full.clone()
            },
            ObjectReference {
                reference_type: None,
                ..full.clone()
            },
            ObjectReference { value: None, ..full },
        ]
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_incomplete_object_reference_is_rejected(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();
        let existing = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();

        for incomplete in incomplete_references() {
            let create = service.create_task(new_task("WBI:1", "L10000", "x").with_primary_obj_ref(incomplete.clone()));
            assert_eq!(create.unwrap_err().kind(), ErrorKind::InvalidArgument);

            let mut changed = existing.clone();
            changed.primary_obj_ref = Some(incomplete);
            assert_eq!(service.update_task(changed).unwrap_err().kind(), ErrorKind::InvalidArgument);
        }

        assert_eq!(service.get_task(&existing.id).unwrap(), existing);
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_update_task_fields_and_classification(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();
        let task = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();

        let mut changed = task.clone();
        changed.name = Some("Check claim".to_string());
        changed.classification_key = "T2100".to_string();
        changed.set_custom_attribute("3", Some("blue")).unwrap();
        // Lifecycle fields are not writable through a general update.
        changed.state = TaskState::Completed;
        changed.owner = Some("someone".to_string());

        let updated = service.update_task(changed).unwrap();
        assert_eq!(updated.name.as_deref(), Some("Check claim"));
        assert_eq!(updated.classification.key, "T2100");
        assert_eq!(updated.classification.id, "CLI:3");
        assert_eq!(updated.priority, 10);
        assert_eq!(updated.custom_attribute("3"), Some("blue"));
        assert_eq!(updated.state, TaskState::Ready);
        assert!(updated.owner.is_none());
        assert!(updated.modified > task.modified);
        assert_ne!(updated.classification, task.classification);
        assert_eq!(updated.created, task.created);
        assert_eq!(updated.planned, task.planned);

        assert_eq!(service.get_task(&task.id).unwrap(), updated);
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_update_replaces_callback_info(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();
        let mut input = new_task("WBI:1", "L10000", "00000001");
        input.callback_info.insert("callback".to_string(), "https://example.org/done".to_string());
        input.callback_info.insert("retries".to_string(), "3".to_string());
        let task = service.create_task(input).unwrap();
        assert_eq!(task.callback_info.len(), 2);

        let mut changed = task.clone();
        changed.callback_info.remove("retries");
        changed.callback_info.insert("token".to_string(), "abc".to_string());
        let updated = service.update_task(changed).unwrap();

        let loaded = service.get_task(&task.id).unwrap();
        assert_eq!(loaded.callback_info, updated.callback_info);
        assert_eq!(loaded.callback_info.get("callback").map(String::as_str), Some("https://example.org/done"));
        assert_eq!(loaded.callback_info.get("token").map(String::as_str), Some("abc"));
        assert!(!loaded.callback_info.contains_key("retries"));
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_general_update_keeps_read_flag(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();
        let task = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();

        let mut changed = task.clone();
        changed.is_read = true;
        changed.name = Some("renamed".to_string());
        let updated = service.update_task(changed).unwrap();
        assert!(!updated.is_read);
        assert!(!service.get_task(&task.id).unwrap().is_read);

        let read = service.set_task_read(&task.id, true).unwrap();
        let mut changed = read.clone();
        changed.is_read = false;
        assert!(service.update_task(changed).unwrap().is_read);
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_update_rejects_workbasket_and_created_changes(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();
        let task = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();

        let mut moved = task.clone();
        moved.workbasket.key = "USER-1-2".to_string();
        assert_eq!(service.update_task(moved).unwrap_err().kind(), ErrorKind::InvalidArgument);

        let mut moved_by_id = task.clone();
        moved_by_id.workbasket.id = "WBI:2".to_string();
        assert_eq!(service.update_task(moved_by_id).unwrap_err().kind(), ErrorKind::InvalidArgument);

        let mut backdated = task.clone();
        backdated.created = task.created - chrono::Duration::days(1);
        assert_eq!(service.update_task(backdated).unwrap_err().kind(), ErrorKind::InvalidArgument);

        let mut bad_attribute = task.clone();
        bad_attribute.custom_attributes.insert("0".to_string(), "x".to_string());
        assert_eq!(service.update_task(bad_attribute).unwrap_err().kind(), ErrorKind::InvalidArgument);

        let mut unknown_classification = task.clone();
        unknown_classification.classification_key = "NOPE".to_string();
        assert_eq!(service.update_task(unknown_classification).unwrap_err().kind(), ErrorKind::NotFound);

        assert_eq!(service.get_task(&task.id).unwrap(), task);
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_modified_increases_with_every_update(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();
        let mut task = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();
        let created = task.created;
        let mut previous = task.modified;

        for round in 0..5 {
            task.description = Some(format!("round {}", round));
            task = service.update_task(task).unwrap();
            assert!(task.modified > previous);
            assert!(task.modified > created);
            assert_eq!(task.created, created);
            previous = task.modified;
        }
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_stale_update_fails_with_conflict(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();
        let task = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();

        let mut first = service.get_task(&task.id).unwrap();
        let mut second = service.get_task(&task.id).unwrap();

        first.name = Some("first".to_string());
        let winner = service.update_task(first).unwrap();

        second.name = Some("second".to_string());
        let err = service.update_task(second).unwrap_err();
        assert!(matches!(err, TaskError::ConcurrencyConflict { .. }));

        let persisted = service.get_task(&task.id).unwrap();
        assert_eq!(persisted.name.as_deref(), Some("first"));
        assert_eq!(persisted.modified, winner.modified);
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_stale_copy_after_transfer_or_completion_is_a_conflict(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();

        let transferred = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();
        engine.transferrer().transfer(&transferred.id, "WBI:2").unwrap();
        let mut stale = transferred.clone();
        stale.name = Some("late edit".to_string());
        assert_eq!(service.update_task(stale).unwrap_err().kind(), ErrorKind::ConcurrencyConflict);

        let completed = service.create_task(new_task("WBI:1", "L10000", "00000002")).unwrap();
        service.claim(&completed.id).unwrap();
        service.complete(&completed.id).unwrap();
        let mut stale = completed.clone();
        stale.name = Some("late edit".to_string());
        assert_eq!(service.update_task(stale).unwrap_err().kind(), ErrorKind::ConcurrencyConflict);

        // A fresh copy of the completed task still hits the lock.
        let fresh = service.get_task(&completed.id).unwrap();
        assert_eq!(service.update_task(fresh).unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_reads_do_not_wait_for_open_writer(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();
        let task = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();

        let store = SqliteTaskStore::new(ctx.db.clone());
        let mut writer = store.begin().unwrap();
        let mut pending = task.clone();
        pending.name = Some("uncommitted".to_string());
        writer.update(&pending, task.modified).unwrap();

        let started = Instant::now();
        assert_eq!(service.get_task(&task.id).unwrap(), task);
        let report = ctx.admin().monitor().task_status_report(None, None).unwrap();
        assert_eq!(report.sum.total, 1);
        assert!(started.elapsed() < Duration::from_secs(2));

        writer.rollback().unwrap();
        assert_eq!(service.get_task(&task.id).unwrap(), task);
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_concurrent_updates_have_one_winner(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let task = engine.task_service().create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();

        let outcomes: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|n| {
                    let mut copy = task.clone();
                    let engine = &engine;
                    scope.spawn(move || {
                        copy.name = Some(format!("writer {}", n));
                        engine.task_service().update_task(copy)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        for outcome in outcomes.iter().filter(|o| o.is_err()) {
            assert_eq!(outcome.as_ref().unwrap_err().kind(), ErrorKind::ConcurrencyConflict);
        }
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_set_task_read_toggle(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();
        let task = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();

        let read = service.set_task_read(&task.id, true).unwrap();
        assert!(read.is_read);
        let unread = service.set_task_read(&task.id, false).unwrap();
        assert!(!unread.is_read);
        assert!(read.modified > task.modified);
        assert!(unread.modified > read.modified);

        assert!(!service.get_task(&task.id).unwrap().is_read);

        let err = service.set_task_read("TKI:unknown", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_read_permission_is_required(ctx: &mut BasketContext) {
        let task = ctx.seed_task("WBI:5", "00000001");
        let engine = ctx.user();
        let service = engine.task_service();

        assert_eq!(service.get_task(&task.id).unwrap_err().kind(), ErrorKind::NotAuthorized);
        assert_eq!(service.set_task_read(&task.id, true).unwrap_err().kind(), ErrorKind::NotAuthorized);
        assert_eq!(service.update_task(task.clone()).unwrap_err().kind(), ErrorKind::NotAuthorized);
        assert_eq!(service.get_task("TKI:unknown").unwrap_err().kind(), ErrorKind::NotFound);

        // READ granted through a group is enough.
        let group_task = ctx.seed_task("WBI:4", "00000002");
        assert_eq!(service.get_task(&group_task.id).unwrap().id, group_task.id);
        assert_eq!(
            ctx.engine_for(USER, &[]).task_service().get_task(&group_task.id).unwrap_err().kind(),
            ErrorKind::NotAuthorized
        );
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_claim_and_complete(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();
        let task = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();

        assert_eq!(service.complete(&task.id).unwrap_err().kind(), ErrorKind::InvalidState);

        let claimed = service.claim(&task.id).unwrap();
        assert_eq!(claimed.state, TaskState::Claimed);
        assert_eq!(claimed.owner.as_deref(), Some(USER));
        assert_eq!(claimed.claimed, Some(claimed.modified));
        assert!(claimed.is_read);

        let other = ctx.engine_for("user-1-2", &[]);
        assert_eq!(other.task_service().claim(&task.id).unwrap_err().kind(), ErrorKind::NotAuthorized);
        assert_eq!(ctx.admin().task_service().claim(&task.id).unwrap_err().kind(), ErrorKind::InvalidState);

        let completed = service.complete(&task.id).unwrap();
        assert_eq!(completed.state, TaskState::Completed);
        assert_eq!(completed.completed, Some(completed.modified));

        let mut late_change = completed.clone();
        late_change.name = Some("too late".to_string());
        assert_eq!(service.update_task(late_change).unwrap_err().kind(), ErrorKind::InvalidState);
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_completed_tasks_can_be_updated_when_unlocked(ctx: &mut BasketContext) {
        ctx.config.policy.lock_completed_tasks = false;
        let engine = ctx.user();
        let service = engine.task_service();
        let task = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();
        service.claim(&task.id).unwrap();
        let mut completed = service.complete(&task.id).unwrap();

        completed.name = Some("annotated".to_string());
        let updated = service.update_task(completed).unwrap();
        assert_eq!(updated.name.as_deref(), Some("annotated"));
        assert_eq!(updated.state, TaskState::Completed);
    }

    #[test_context(BasketContext)]
    #[test]
    fn test_history_records_committed_mutations(ctx: &mut BasketContext) {
        let engine = ctx.user();
        let service = engine.task_service();
        let task = service.create_task(new_task("WBI:1", "L10000", "00000001")).unwrap();
        service.set_task_read(&task.id, true).unwrap();
        service.claim(&task.id).unwrap();

        let mut stale = task.clone();
        stale.name = Some("stale".to_string());
        service.update_task(stale).unwrap_err();

        let kinds: Vec<HistoryEventKind> = ctx.history().events_for(&task.id).unwrap().into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                HistoryEventKind::TaskCreated,
                HistoryEventKind::TaskReadFlagChanged,
                HistoryEventKind::TaskClaimed
            ]
        );
        assert!(ctx.history().events_for(&task.id).unwrap().iter().all(|e| e.actor == USER));
    }
}
