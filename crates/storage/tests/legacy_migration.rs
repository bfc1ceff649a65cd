#![forbid(unsafe_code)]

use fc_core::graph::Project;
use fc_storage::{SqliteStore, StoreError, StoreEvent};
use rusqlite::{Connection, params};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let dir = base.join(format!("fc_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn project(id: &str, name: &str) -> Project {
    Project {
        id: id.to_string(),
        name: name.to_string(),
        nodes: Vec::new(),
        edges: Vec::new(),
        created_at_ms: 500,
        updated_at_ms: 500,
    }
}

#[test]
fn legacy_slot_round_trips() {
    let storage_dir = temp_dir("legacy_slot_round_trips");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    assert_eq!(store.legacy_load().expect("empty load"), None);

    let saved = project("proj-old", "Old single project");
    store.legacy_save(&saved).expect("save");
    assert_eq!(store.legacy_load().expect("load"), Some(saved));
}

#[test]
fn migration_copies_slot_then_clears_it() {
    let storage_dir = temp_dir("migration_copies_slot_then_clears_it");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let legacy = project("proj-old", "Old single project");
    store.legacy_save(&legacy).expect("save");

    let migrated = store.migrate_legacy_slot().expect("migrate");
    assert_eq!(migrated.as_deref(), Some("proj-old"));

    let row = store
        .get_project("proj-old")
        .expect("get")
        .expect("migrated row exists");
    assert_eq!(row, legacy, "timestamps and body survive verbatim");

    assert_eq!(store.legacy_load().expect("load"), None, "slot cleared");
    assert_eq!(store.migrate_legacy_slot().expect("rerun"), None);
}

#[test]
fn migration_never_clobbers_existing_project() {
    let storage_dir = temp_dir("migration_never_clobbers_existing_project");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let current = project("proj-shared", "Newer multi-project copy");
    store.save_project(&current).expect("save current");

    let mut stale = project("proj-shared", "Stale legacy copy");
    stale.updated_at_ms = 100;
    store.legacy_save(&stale).expect("save legacy");

    let migrated = store.migrate_legacy_slot().expect("migrate");
    assert_eq!(migrated.as_deref(), Some("proj-shared"));

    let kept = store
        .get_project("proj-shared")
        .expect("get")
        .expect("exists");
    assert_eq!(kept.name, "Newer multi-project copy");
    assert_eq!(store.legacy_load().expect("load"), None, "slot still cleared");
}

#[test]
fn corrupt_slot_fails_without_clearing() {
    let storage_dir = temp_dir("corrupt_slot_fails_without_clearing");
    {
        let store = SqliteStore::open(&storage_dir).expect("open store");
        drop(store);
    }

    let db_path = storage_dir.join("framecanvas.db");
    let conn = Connection::open(&db_path).expect("raw open");
    conn.execute(
        "INSERT INTO meta(key, value) VALUES (?1, ?2)",
        params!["legacy_project", "{not json"],
    )
    .expect("inject corrupt slot");
    drop(conn);

    let mut store = SqliteStore::open(&storage_dir).expect("reopen store");
    let err = store.migrate_legacy_slot().expect_err("corrupt slot");
    assert!(matches!(err, StoreError::InvalidFormat(_)));
    drop(store);

    let conn = Connection::open(&db_path).expect("raw reopen");
    let kept: String = conn
        .query_row(
            "SELECT value FROM meta WHERE key=?1",
            params!["legacy_project"],
            |row| row.get(0),
        )
        .expect("slot untouched");
    assert_eq!(kept, "{not json");
}

#[test]
fn migration_emits_event() {
    let storage_dir = temp_dir("migration_emits_event");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    store
        .legacy_save(&project("proj-old", "Old"))
        .expect("save legacy");

    let seen: Rc<RefCell<Vec<StoreEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    store.migrate_legacy_slot().expect("migrate");
    assert_eq!(
        seen.borrow().clone(),
        vec![StoreEvent::LegacyMigrated {
            project_id: "proj-old".to_string()
        }]
    );
}
