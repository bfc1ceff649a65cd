#![forbid(unsafe_code)]

mod error;
mod events;
mod export;
mod queue;

pub use error::StoreError;
pub use events::{StoreEvent, SubscriptionId};
pub use export::{export_project, parse_project_document};
pub use queue::{PendingOp, PendingSyncItem};

use fc_core::graph::{Edge, EdgePreset, FrameNode, Project};
use fc_core::ids;
use fc_core::time::now_ms;
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA_VERSION: &str = "1";

const META_SCHEMA_VERSION: &str = "schema_version";
const META_CURRENT_PROJECT: &str = "current_project_id";
const META_LEGACY_PROJECT: &str = "legacy_project";
const META_EDGE_PRESETS: &str = "edge_presets";
const META_ACCESS_TOKEN: &str = "access_token";
const META_SYNC_IDENTITY: &str = "sync_identity";

const MAX_PROJECT_NAME_LEN: usize = 200;

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Body column of a project row; name and timestamps live in dedicated
/// columns so list queries never parse documents.
#[derive(Serialize, Deserialize)]
struct ProjectDoc {
    nodes: Vec<FrameNode>,
    edges: Vec<Edge>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub nodes: Option<Vec<FrameNode>>,
    pub edges: Option<Vec<Edge>>,
}

/// Durable, synchronous local store for one device. Every write runs in a
/// single transaction, so callers never observe a torn project, and emits
/// a [`StoreEvent`] on commit instead of relying on interval polling.
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
    listeners: Vec<(u64, Listener)>,
    next_subscription: u64,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join("framecanvas.db");
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;

        let store = Self {
            conn,
            storage_dir,
            listeners: Vec::new(),
            next_subscription: 0,
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;

            CREATE TABLE IF NOT EXISTS meta (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
              id TEXT PRIMARY KEY,
              name TEXT NOT NULL,
              doc TEXT NOT NULL,
              created_at_ms INTEGER NOT NULL,
              updated_at_ms INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_projects_created
              ON projects(created_at_ms, id);

            CREATE TABLE IF NOT EXISTS pending_sync (
              project_id TEXT PRIMARY KEY,
              op TEXT NOT NULL,
              doc TEXT,
              queued_at_ms INTEGER NOT NULL
            );
            "#,
        )?;
        self.conn.execute(
            "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
            params![META_SCHEMA_VERSION, SCHEMA_VERSION],
        )?;
        Ok(())
    }

    // ── Change notification ──

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(key, _)| *key != id.0);
        before != self.listeners.len()
    }

    pub(crate) fn notify(&mut self, event: &StoreEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    // ── Multi-project slots ──

    pub fn create_project(&mut self, name: &str) -> Result<Project, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("project name must not be empty"));
        }
        if name.len() > MAX_PROJECT_NAME_LEN {
            return Err(StoreError::InvalidInput("project name is too long"));
        }

        let now_ms = now_ms();
        let project = Project {
            id: ids::new_project_id(),
            name: name.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        };

        let doc = doc_json(&project)?;
        let insert = self.conn.execute(
            "INSERT INTO projects(id, name, doc, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project.id,
                project.name,
                doc,
                project.created_at_ms,
                project.updated_at_ms
            ],
        );
        if let Err(err) = insert {
            return Err(map_insert_conflict(err));
        }

        self.notify(&StoreEvent::ProjectSaved {
            project_id: project.id.clone(),
        });
        Ok(project)
    }

    /// Upserts a full project, preserving the caller's timestamps. Used by
    /// import and by the cloud merge write-back, where re-stamping
    /// `updated_at_ms` would break last-write-wins across devices.
    pub fn save_project(&mut self, project: &Project) -> Result<(), StoreError> {
        let doc = doc_json(project)?;
        self.conn.execute(
            "INSERT INTO projects(id, name, doc, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(id) DO UPDATE SET \
               name=excluded.name, doc=excluded.doc, \
               created_at_ms=excluded.created_at_ms, updated_at_ms=excluded.updated_at_ms",
            params![
                project.id,
                project.name,
                doc,
                project.created_at_ms,
                project.updated_at_ms
            ],
        )?;

        self.notify(&StoreEvent::ProjectSaved {
            project_id: project.id.clone(),
        });
        Ok(())
    }

    /// Applies a partial edit and stamps a fresh `updated_at_ms`.
    pub fn update_project(&mut self, id: &str, patch: ProjectPatch) -> Result<Project, StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;

        let row = tx
            .query_row(
                "SELECT name, doc, created_at_ms FROM projects WHERE id=?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((name, doc, created_at_ms)) = row else {
            return Err(StoreError::UnknownId);
        };

        let body: ProjectDoc =
            serde_json::from_str(&doc).map_err(|_| StoreError::InvalidFormat("corrupt project row"))?;

        let project = Project {
            id: id.to_string(),
            name: patch.name.unwrap_or(name),
            nodes: patch.nodes.unwrap_or(body.nodes),
            edges: patch.edges.unwrap_or(body.edges),
            created_at_ms,
            updated_at_ms: now_ms,
        };

        let doc = doc_json(&project)?;
        tx.execute(
            "UPDATE projects SET name=?2, doc=?3, updated_at_ms=?4 WHERE id=?1",
            params![project.id, project.name, doc, project.updated_at_ms],
        )?;
        tx.commit()?;

        self.notify(&StoreEvent::ProjectSaved {
            project_id: project.id.clone(),
        });
        Ok(project)
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, doc, created_at_ms, updated_at_ms FROM projects WHERE id=?1",
                params![id],
                project_row,
            )
            .optional()?;

        match row {
            Some(raw) => Ok(Some(project_from_row(raw)?)),
            None => Ok(None),
        }
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, doc, created_at_ms, updated_at_ms FROM projects \
             ORDER BY created_at_ms ASC, id ASC",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let raw = project_row(row)?;
            out.push(project_from_row(raw)?);
        }
        Ok(out)
    }

    /// Deletes a project and, when it was current, clears the pointer.
    pub fn delete_project(&mut self, id: &str) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM projects WHERE id=?1", params![id])?;
        let was_current = tx
            .query_row(
                "SELECT value FROM meta WHERE key=?1",
                params![META_CURRENT_PROJECT],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .is_some_and(|current| current == id);
        if was_current {
            tx.execute("DELETE FROM meta WHERE key=?1", params![META_CURRENT_PROJECT])?;
        }
        tx.commit()?;

        if deleted > 0 {
            self.notify(&StoreEvent::ProjectDeleted {
                project_id: id.to_string(),
            });
        }
        if was_current {
            self.notify(&StoreEvent::CurrentProjectChanged { project_id: None });
        }
        Ok(deleted > 0)
    }

    // ── Current-project pointer ──

    pub fn current_project_get(&self) -> Result<Option<String>, StoreError> {
        self.meta_get(META_CURRENT_PROJECT)
    }

    pub fn current_project_set(&mut self, id: &str) -> Result<(), StoreError> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM projects WHERE id=?1", params![id], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?
            .is_some();
        if !exists {
            return Err(StoreError::UnknownId);
        }

        self.meta_set(META_CURRENT_PROJECT, id)?;
        self.notify(&StoreEvent::CurrentProjectChanged {
            project_id: Some(id.to_string()),
        });
        Ok(())
    }

    pub fn current_project_clear(&mut self) -> Result<(), StoreError> {
        self.meta_delete(META_CURRENT_PROJECT)?;
        self.notify(&StoreEvent::CurrentProjectChanged { project_id: None });
        Ok(())
    }

    // ── Legacy single-project slot ──

    pub fn legacy_save(&mut self, project: &Project) -> Result<(), StoreError> {
        let raw = serde_json::to_string(project)?;
        self.meta_set(META_LEGACY_PROJECT, &raw)?;
        self.notify(&StoreEvent::ProjectSaved {
            project_id: project.id.clone(),
        });
        Ok(())
    }

    pub fn legacy_load(&self) -> Result<Option<Project>, StoreError> {
        match self.meta_get(META_LEGACY_PROJECT)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// One-shot migration out of the legacy slot: the stored project is
    /// copied into the multi-project table (never clobbering an existing
    /// row with the same id) and the slot is cleared. Returns the migrated
    /// project id, or None when the slot was already empty.
    pub fn migrate_legacy_slot(&mut self) -> Result<Option<String>, StoreError> {
        let tx = self.conn.transaction()?;

        let raw = tx
            .query_row(
                "SELECT value FROM meta WHERE key=?1",
                params![META_LEGACY_PROJECT],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let project: Project = serde_json::from_str(&raw)
            .map_err(|_| StoreError::InvalidFormat("corrupt legacy project slot"))?;
        let doc = doc_json(&project)?;

        tx.execute(
            "INSERT OR IGNORE INTO projects(id, name, doc, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project.id,
                project.name,
                doc,
                project.created_at_ms,
                project.updated_at_ms
            ],
        )?;
        tx.execute("DELETE FROM meta WHERE key=?1", params![META_LEGACY_PROJECT])?;
        tx.commit()?;

        log::info!("migrated legacy project slot into project {}", project.id);
        self.notify(&StoreEvent::LegacyMigrated {
            project_id: project.id.clone(),
        });
        Ok(Some(project.id))
    }

    // ── Edge presets ──

    pub fn edge_presets_get(&self) -> Result<Vec<EdgePreset>, StoreError> {
        match self.meta_get(META_EDGE_PRESETS)? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|_| StoreError::InvalidFormat("corrupt edge presets")),
            None => Ok(Vec::new()),
        }
    }

    pub fn edge_presets_set(&mut self, presets: &[EdgePreset]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(presets)?;
        self.meta_set(META_EDGE_PRESETS, &raw)
    }

    // ── Credentials & cached identity ──

    pub fn access_token_get(&self) -> Result<Option<String>, StoreError> {
        self.meta_get(META_ACCESS_TOKEN)
    }

    pub fn access_token_set(&mut self, token: &str) -> Result<(), StoreError> {
        self.meta_set(META_ACCESS_TOKEN, token)
    }

    pub fn access_token_clear(&mut self) -> Result<(), StoreError> {
        self.meta_delete(META_ACCESS_TOKEN)
    }

    pub fn sync_identity_get(&self) -> Result<Option<String>, StoreError> {
        self.meta_get(META_SYNC_IDENTITY)
    }

    pub fn sync_identity_set(&mut self, user_id: &str) -> Result<(), StoreError> {
        self.meta_set(META_SYNC_IDENTITY, user_id)
    }

    // ── meta helpers ──

    fn meta_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT value FROM meta WHERE key=?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?)
    }

    fn meta_set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO meta(key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn meta_delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM meta WHERE key=?1", params![key])?;
        Ok(())
    }
}

type ProjectRow = (String, String, String, i64, i64);

fn project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn project_from_row(
    (id, name, doc, created_at_ms, updated_at_ms): ProjectRow,
) -> Result<Project, StoreError> {
    let body: ProjectDoc =
        serde_json::from_str(&doc).map_err(|_| StoreError::InvalidFormat("corrupt project row"))?;
    Ok(Project {
        id,
        name,
        nodes: body.nodes,
        edges: body.edges,
        created_at_ms,
        updated_at_ms,
    })
}

fn doc_json(project: &Project) -> Result<String, StoreError> {
    Ok(serde_json::to_string(&ProjectDoc {
        nodes: project.nodes.clone(),
        edges: project.edges.clone(),
    })?)
}

fn map_insert_conflict(err: rusqlite::Error) -> StoreError {
    if is_constraint_violation(&err) {
        return StoreError::DuplicateId;
    }
    StoreError::Sql(err)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                })
        }
        _ => false,
    }
}
