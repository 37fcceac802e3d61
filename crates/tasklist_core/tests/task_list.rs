use std::collections::HashSet;
use tasklist_core::db::{open_db, open_db_in_memory};
use tasklist_core::{
    DurableStore, KvRepository, MemoryKvRepository, SqliteKvRepository, StoreError, Task,
    TaskCounts, TaskFilter, TaskListError, TaskListService, TaskValidationError, TASKS_KEY,
};

fn empty_service() -> TaskListService<MemoryKvRepository> {
    TaskListService::hydrate(DurableStore::new(MemoryKvRepository::new()))
}

fn persisted_tasks(service: &TaskListService<MemoryKvRepository>) -> Vec<Task> {
    let raw = service
        .store()
        .repo()
        .raw(TASKS_KEY)
        .expect("tasks should be persisted");
    serde_json::from_str(&raw).unwrap()
}

fn ids(tasks: &[Task]) -> Vec<u64> {
    tasks.iter().map(|task| task.id).collect()
}

#[test]
fn add_assigns_max_plus_one_and_persists_every_step() {
    let mut service = empty_service();

    for (expected_id, name) in [(1, "one"), (2, "two"), (3, "three")] {
        let task = service.add(name).unwrap();
        assert_eq!(task.id, expected_id);
        assert!(!task.completed);
        assert_eq!(persisted_tasks(&service), service.tasks());
    }

    let unique: HashSet<_> = service.tasks().iter().map(|task| task.id).collect();
    assert_eq!(unique.len(), service.tasks().len());
}

#[test]
fn add_rejects_blank_name_without_touching_storage() {
    let mut service = empty_service();

    let err = service.add(" \n ").unwrap_err();
    assert!(matches!(
        err,
        TaskListError::Validation(TaskValidationError::EmptyName)
    ));
    assert!(service.tasks().is_empty());
    assert_eq!(service.store().repo().raw(TASKS_KEY), None);
}

#[test]
fn edit_replaces_only_the_trimmed_name() {
    let mut service = empty_service();
    service.add("first").unwrap();
    let original = service.add("second").unwrap();
    service.toggle(original.id).unwrap();

    assert!(service.edit(original.id, "  renamed  ").unwrap());

    let edited = service.get(original.id).unwrap();
    assert_eq!(edited.name, "renamed");
    assert_eq!(edited.id, original.id);
    assert!(edited.completed);
    assert_eq!(edited.created_at, original.created_at);
    assert_eq!(service.tasks()[0].name, "first");
    assert_eq!(persisted_tasks(&service), service.tasks());
}

#[test]
fn edit_rejects_blank_name_even_for_existing_task() {
    let mut service = empty_service();
    let task = service.add("keep me").unwrap();

    assert!(matches!(
        service.edit(task.id, "   "),
        Err(TaskListError::Validation(_))
    ));
    assert_eq!(service.get(task.id).unwrap().name, "keep me");
}

#[test]
fn toggle_twice_restores_completion() {
    let mut service = empty_service();
    let task = service.add("walk").unwrap();

    assert!(service.toggle(task.id).unwrap());
    assert!(service.get(task.id).unwrap().completed);
    assert!(persisted_tasks(&service)[0].completed);

    assert!(service.toggle(task.id).unwrap());
    assert_eq!(service.get(task.id).unwrap(), &task);
}

#[test]
fn delete_removes_one_task_and_keeps_order() {
    let mut service = empty_service();
    for name in ["a", "b", "c", "d"] {
        service.add(name).unwrap();
    }

    assert!(service.delete(2).unwrap());
    assert_eq!(ids(service.tasks()), [1, 3, 4]);
    assert_eq!(ids(&persisted_tasks(&service)), [1, 3, 4]);
}

#[test]
fn unknown_ids_are_silent_noops() {
    let mut service = empty_service();
    service.add("only").unwrap();
    service.store().repo().set_item(TASKS_KEY, "sentinel").unwrap();

    assert!(!service.edit(42, "whatever").unwrap());
    assert!(!service.toggle(42).unwrap());
    assert!(!service.delete(42).unwrap());

    assert_eq!(service.tasks().len(), 1);
    assert_eq!(
        service.store().repo().raw(TASKS_KEY).as_deref(),
        Some("sentinel")
    );
}

#[test]
fn end_to_end_single_task_lifecycle() {
    let mut service = empty_service();

    let task = service.add("Buy milk").unwrap();
    assert_eq!(ids(service.tasks()), [1]);
    assert_eq!(task.name, "Buy milk");
    assert!(!task.completed);

    service.toggle(1).unwrap();
    assert!(service.get(1).unwrap().completed);

    service.edit(1, "Buy oat milk").unwrap();
    let edited = service.get(1).unwrap();
    assert_eq!(edited.name, "Buy oat milk");
    assert!(edited.completed);

    service.delete(1).unwrap();
    assert!(service.tasks().is_empty());
    assert!(persisted_tasks(&service).is_empty());
}

#[test]
fn id_follows_current_maximum_after_deletes() {
    let mut service = empty_service();
    service.add("A").unwrap();
    service.add("B").unwrap();
    service.delete(1).unwrap();
    assert_eq!(service.add("C").unwrap().id, 3);

    service.delete(3).unwrap();
    assert_eq!(service.add("D").unwrap().id, 3);

    service.delete(2).unwrap();
    service.delete(3).unwrap();
    assert_eq!(service.add("E").unwrap().id, 1);
}

#[test]
fn hydrate_round_trips_every_field() {
    let repo = MemoryKvRepository::new();
    let mut service = TaskListService::hydrate(DurableStore::new(repo));
    service.add("first").unwrap();
    service.add("second").unwrap();
    service.toggle(2).unwrap();
    let expected = service.tasks().to_vec();

    let raw = service.store().repo().raw(TASKS_KEY).unwrap();
    let fresh_repo = MemoryKvRepository::new();
    fresh_repo.set_item(TASKS_KEY, &raw).unwrap();

    let hydrated = TaskListService::hydrate(DurableStore::new(fresh_repo));
    assert_eq!(hydrated.tasks(), expected.as_slice());
    assert!(hydrated.is_synced());
}

#[test]
fn hydrate_reconstructs_timestamps_from_text() {
    let repo = MemoryKvRepository::new();
    repo.set_item(
        TASKS_KEY,
        r#"[{"id":1,"name":"Buy milk","completed":true,"createdAt":"2024-05-01T10:20:30.123Z"}]"#,
    )
    .unwrap();

    let service = TaskListService::hydrate(DurableStore::new(repo));
    let task = service.get(1).unwrap();
    assert_eq!(task.created_at.timestamp_millis(), 1_714_558_830_123);
    assert!(task.completed);
}

#[test]
fn corrupt_storage_hydrates_empty_collection() {
    let repo = MemoryKvRepository::new();
    repo.set_item(TASKS_KEY, "not-json").unwrap();

    let mut service = TaskListService::hydrate(DurableStore::new(repo));
    assert!(service.tasks().is_empty());
    assert!(!service.is_synced());
    assert_eq!(
        service.store().repo().raw(TASKS_KEY).as_deref(),
        Some("not-json")
    );

    service.add("fresh start").unwrap();
    assert!(service.is_synced());
    assert_eq!(ids(&persisted_tasks(&service)), [1]);
}

#[test]
fn flush_replaces_corrupt_storage_with_empty_collection() {
    let repo = MemoryKvRepository::new();
    repo.set_item(TASKS_KEY, "{\"id\":").unwrap();

    let mut service = TaskListService::hydrate(DurableStore::new(repo));
    assert!(!service.is_synced());

    service.flush().unwrap();
    assert!(service.is_synced());
    assert_eq!(service.store().repo().raw(TASKS_KEY).as_deref(), Some("[]"));
}

#[test]
fn hydrate_keeps_tasks_whose_timestamp_is_null_or_invalid() {
    let repo = MemoryKvRepository::new();
    repo.set_item(
        TASKS_KEY,
        r#"[
            {"id":1,"name":"dated","completed":false,"createdAt":"2024-05-01T10:00:00.000Z"},
            {"id":2,"name":"null date","completed":true,"createdAt":null},
            {"id":3,"name":"bad date","completed":false,"createdAt":"Invalid Date"}
        ]"#,
    )
    .unwrap();

    let service = TaskListService::hydrate(DurableStore::new(repo));
    assert_eq!(ids(service.tasks()), [1, 2, 3]);
    assert!(service.is_synced());
    assert_eq!(
        service.get(1).unwrap().created_at.timestamp_millis(),
        1_714_557_600_000
    );
    assert!(service.get(2).unwrap().completed);
    assert!(service.get(3).unwrap().created_at > service.get(1).unwrap().created_at);
}

#[test]
fn add_reports_exhausted_id_space_without_changes() {
    let repo = MemoryKvRepository::new();
    let stored = r#"[{"id":18446744073709551615,"name":"last","completed":false,"createdAt":"2024-05-01T10:00:00.000Z"}]"#;
    repo.set_item(TASKS_KEY, stored).unwrap();

    let mut service = TaskListService::hydrate(DurableStore::new(repo));
    assert_eq!(ids(service.tasks()), [u64::MAX]);

    let err = service.add("next one").unwrap_err();
    assert!(matches!(err, TaskListError::IdSpaceExhausted));
    assert_eq!(ids(service.tasks()), [u64::MAX]);
    assert!(service.is_synced());
    assert_eq!(service.store().repo().raw(TASKS_KEY).as_deref(), Some(stored));

    assert!(matches!(
        service.add("   "),
        Err(TaskListError::Validation(TaskValidationError::EmptyName))
    ));
}

#[test]
fn hydrate_drops_duplicate_ids_and_reports_unsynced() {
    let repo = MemoryKvRepository::new();
    repo.set_item(
        TASKS_KEY,
        r#"[
            {"id":1,"name":"first","completed":false,"createdAt":"2024-05-01T10:00:00.000Z"},
            {"id":1,"name":"copy","completed":true,"createdAt":"2024-05-01T11:00:00.000Z"}
        ]"#,
    )
    .unwrap();

    let mut service = TaskListService::hydrate(DurableStore::new(repo));
    assert_eq!(service.tasks().len(), 1);
    assert_eq!(service.tasks()[0].name, "first");
    assert!(!service.is_synced());

    service.flush().unwrap();
    assert!(service.is_synced());
    assert_eq!(persisted_tasks(&service).len(), 1);
}

#[test]
fn write_failure_keeps_memory_and_marks_unsynced() {
    let mut service = TaskListService::hydrate(DurableStore::new(MemoryKvRepository::with_quota(
        100,
    )));

    let first = service.add("fits").unwrap();
    let err = service
        .add("this name is long enough to push the stored array past its quota")
        .unwrap_err();

    assert!(matches!(
        err,
        TaskListError::Persist(StoreError::Repo { .. })
    ));
    assert_eq!(ids(service.tasks()), [1, 2]);
    assert!(!service.is_synced());
    assert_eq!(persisted_tasks(&service), vec![first.clone()]);

    service.delete(2).unwrap();
    assert!(service.is_synced());
    assert_eq!(persisted_tasks(&service), vec![first]);
}

#[test]
fn filtered_and_counts_follow_completion() {
    let mut service = empty_service();
    service.add("a").unwrap();
    service.add("b").unwrap();
    service.add("c").unwrap();
    service.toggle(2).unwrap();

    let active: Vec<_> = service.filtered(TaskFilter::Active).map(|task| task.id).collect();
    let done: Vec<_> = service
        .filtered(TaskFilter::Completed)
        .map(|task| task.id)
        .collect();
    assert_eq!(active, [1, 3]);
    assert_eq!(done, [2]);
    assert_eq!(
        service.counts(),
        TaskCounts {
            total: 3,
            active: 2,
            completed: 1
        }
    );
}

#[test]
fn sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasklist.sqlite3");

    let expected = {
        let conn = open_db(&path).unwrap();
        let repo = SqliteKvRepository::try_new(&conn).unwrap();
        let mut service = TaskListService::hydrate(DurableStore::new(repo));
        service.add("persist me").unwrap();
        service.add("and me").unwrap();
        service.toggle(1).unwrap();
        service.tasks().to_vec()
    };

    let conn = open_db(&path).unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let service = TaskListService::hydrate(DurableStore::new(repo));
    assert_eq!(service.tasks(), expected.as_slice());
}

#[test]
fn sqlite_write_failure_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKvRepository::try_new(&conn).unwrap();
    let mut service = TaskListService::hydrate(DurableStore::new(repo));
    conn.execute_batch("DROP TABLE kv_entries;").unwrap();

    let err = service.add("lost write").unwrap_err();
    assert!(matches!(err, TaskListError::Persist(_)));
    assert_eq!(service.tasks().len(), 1);
    assert!(!service.is_synced());
}
