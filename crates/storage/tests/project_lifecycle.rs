#![forbid(unsafe_code)]

use fc_core::graph::{ArtifactRef, Edge, EdgeData, FrameMeta, FrameNode, Position, Project};
use fc_storage::{ProjectPatch, SqliteStore, StoreError, StoreEvent};
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

fn frame(id: &str, title: &str) -> FrameNode {
    FrameNode {
        id: id.to_string(),
        position: Position { x: 10.0, y: 20.0 },
        size: None,
        reference: ArtifactRef {
            source_key: "figma".to_string(),
            artifact_id: format!("art-{id}"),
            artifact_url: format!("https://example.test/{id}"),
        },
        meta: FrameMeta {
            title: title.to_string(),
            ..FrameMeta::default()
        },
    }
}

fn edge(id: &str, source: &str, target: &str) -> Edge {
    Edge {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        source_handle: None,
        target_handle: None,
        label: None,
        data: EdgeData::default(),
    }
}

#[test]
fn create_then_get_round_trips() {
    let storage_dir = temp_dir("create_then_get_round_trips");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let created = store.create_project("  Homepage Redesign  ").expect("create");
    assert_eq!(created.name, "Homepage Redesign", "name is trimmed");
    assert!(created.nodes.is_empty());
    assert_eq!(created.created_at_ms, created.updated_at_ms);

    let loaded = store
        .get_project(&created.id)
        .expect("get")
        .expect("project exists");
    assert_eq!(loaded, created);
}

#[test]
fn create_rejects_blank_and_oversized_names() {
    let storage_dir = temp_dir("create_rejects_blank_and_oversized_names");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let err = store.create_project("   ").expect_err("blank name");
    assert!(matches!(err, StoreError::InvalidInput(_)));

    let long = "x".repeat(201);
    let err = store.create_project(&long).expect_err("oversized name");
    assert!(matches!(err, StoreError::InvalidInput(_)));
}

#[test]
fn list_orders_by_creation_time() {
    let storage_dir = temp_dir("list_orders_by_creation_time");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    // Force distinct, descending timestamps through save_project so list
    // ordering is actually exercised rather than relying on wall clock ticks.
    for (idx, name) in ["third", "second", "first"].iter().enumerate() {
        let project = Project {
            id: format!("proj-{name}"),
            name: name.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            created_at_ms: 3_000 - (idx as i64) * 1_000,
            updated_at_ms: 3_000,
        };
        store.save_project(&project).expect("save");
    }

    let names: Vec<String> = store
        .list_projects()
        .expect("list")
        .into_iter()
        .map(|project| project.name)
        .collect();
    assert_eq!(names, vec!["first", "second", "third"]);
}

#[test]
fn update_applies_patch_and_restamps() {
    let storage_dir = temp_dir("update_applies_patch_and_restamps");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let seed = Project {
        id: "proj-patch".to_string(),
        name: "Before".to_string(),
        nodes: vec![frame("a", "A")],
        edges: Vec::new(),
        created_at_ms: 1_000,
        updated_at_ms: 1_000,
    };
    store.save_project(&seed).expect("save");

    let patched = store
        .update_project(
            "proj-patch",
            ProjectPatch {
                name: Some("After".to_string()),
                edges: Some(vec![edge("edge-a-a", "a", "a")]),
                ..ProjectPatch::default()
            },
        )
        .expect("update");

    assert_eq!(patched.name, "After");
    assert_eq!(patched.nodes, seed.nodes, "unpatched field kept");
    assert_eq!(patched.edges.len(), 1);
    assert_eq!(patched.created_at_ms, 1_000);
    assert!(patched.updated_at_ms > 1_000, "updated_at_ms is re-stamped");

    let err = store
        .update_project("proj-missing", ProjectPatch::default())
        .expect_err("unknown id");
    assert!(matches!(err, StoreError::UnknownId));
}

#[test]
fn save_preserves_caller_timestamps() {
    let storage_dir = temp_dir("save_preserves_caller_timestamps");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let project = Project {
        id: "proj-lww".to_string(),
        name: "Remote copy".to_string(),
        nodes: Vec::new(),
        edges: Vec::new(),
        created_at_ms: 42,
        updated_at_ms: 99,
    };
    store.save_project(&project).expect("save");

    let loaded = store
        .get_project("proj-lww")
        .expect("get")
        .expect("exists");
    assert_eq!(loaded.created_at_ms, 42);
    assert_eq!(loaded.updated_at_ms, 99);
}

#[test]
fn delete_clears_current_pointer() {
    let storage_dir = temp_dir("delete_clears_current_pointer");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let keep = store.create_project("keep").expect("create keep");
    let drop_me = store.create_project("drop").expect("create drop");
    store.current_project_set(&drop_me.id).expect("set current");

    assert!(store.delete_project(&drop_me.id).expect("delete"));
    assert_eq!(store.current_project_get().expect("get current"), None);
    assert!(store.get_project(&keep.id).expect("get").is_some());

    assert!(!store.delete_project(&drop_me.id).expect("second delete"));
}

#[test]
fn current_pointer_rejects_unknown_project() {
    let storage_dir = temp_dir("current_pointer_rejects_unknown_project");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let err = store.current_project_set("proj-ghost").expect_err("unknown");
    assert!(matches!(err, StoreError::UnknownId));

    let project = store.create_project("real").expect("create");
    store.current_project_set(&project.id).expect("set");
    assert_eq!(
        store.current_project_get().expect("get"),
        Some(project.id.clone())
    );
    store.current_project_clear().expect("clear");
    assert_eq!(store.current_project_get().expect("get"), None);
}

#[test]
fn writes_survive_reopen() {
    let storage_dir = temp_dir("writes_survive_reopen");
    let project_id;
    {
        let mut store = SqliteStore::open(&storage_dir).expect("open store");
        let mut project = store.create_project("durable").expect("create");
        project.nodes.push(frame("n1", "Frame one"));
        store.save_project(&project).expect("save");
        store.current_project_set(&project.id).expect("set current");
        project_id = project.id;
    }

    let store = SqliteStore::open(&storage_dir).expect("reopen store");
    let loaded = store
        .get_project(&project_id)
        .expect("get")
        .expect("exists");
    assert_eq!(loaded.nodes.len(), 1);
    assert_eq!(
        store.current_project_get().expect("current"),
        Some(project_id)
    );
}

#[test]
fn subscribers_observe_committed_writes() {
    let storage_dir = temp_dir("subscribers_observe_committed_writes");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let seen: Rc<RefCell<Vec<StoreEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let subscription = store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    let project = store.create_project("observed").expect("create");
    store.current_project_set(&project.id).expect("set current");
    store.delete_project(&project.id).expect("delete");

    let events = seen.borrow().clone();
    assert_eq!(
        events,
        vec![
            StoreEvent::ProjectSaved {
                project_id: project.id.clone()
            },
            StoreEvent::CurrentProjectChanged {
                project_id: Some(project.id.clone())
            },
            StoreEvent::ProjectDeleted {
                project_id: project.id.clone()
            },
            StoreEvent::CurrentProjectChanged { project_id: None },
        ]
    );

    assert!(store.unsubscribe(subscription));
    store.create_project("unobserved").expect("create");
    assert_eq!(seen.borrow().len(), 4, "no events after unsubscribe");
}
