#![forbid(unsafe_code)]

use super::{SqliteStore, StoreError, StoreEvent};
use fc_core::graph::Project;
use rusqlite::params;

const OP_SAVE: &str = "save";
const OP_DELETE: &str = "delete";

/// One queued cloud write awaiting a successful remote round-trip. The
/// sync engine owns the live queue; this module only persists it.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSyncItem {
    pub project_id: String,
    pub op: PendingOp,
    pub queued_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PendingOp {
    Save(Project),
    Delete,
}

impl PendingSyncItem {
    pub fn save(project: Project, queued_at_ms: i64) -> Self {
        Self {
            project_id: project.id.clone(),
            op: PendingOp::Save(project),
            queued_at_ms,
        }
    }

    pub fn delete(project_id: impl Into<String>, queued_at_ms: i64) -> Self {
        Self {
            project_id: project_id.into(),
            op: PendingOp::Delete,
            queued_at_ms,
        }
    }
}

impl SqliteStore {
    /// Rewrites the durable queue in one transaction so an app restart
    /// resumes retries from exactly this state.
    pub fn pending_queue_replace(&mut self, items: &[PendingSyncItem]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM pending_sync", [])?;
        for item in items {
            let (op, doc) = match &item.op {
                PendingOp::Save(project) => (OP_SAVE, Some(serde_json::to_string(project)?)),
                PendingOp::Delete => (OP_DELETE, None),
            };
            tx.execute(
                "INSERT INTO pending_sync(project_id, op, doc, queued_at_ms) VALUES (?1, ?2, ?3, ?4)",
                params![item.project_id, op, doc, item.queued_at_ms],
            )?;
        }
        tx.commit()?;

        self.notify(&StoreEvent::PendingQueueReplaced { len: items.len() });
        Ok(())
    }

    /// Loads the persisted queue in enqueue order. A malformed row is
    /// skipped with a warning rather than aborting the whole load.
    pub fn pending_queue_load(&self) -> Result<Vec<PendingSyncItem>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT project_id, op, doc, queued_at_ms FROM pending_sync \
             ORDER BY queued_at_ms ASC, project_id ASC",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();

        while let Some(row) = rows.next()? {
            let project_id: String = row.get(0)?;
            let op: String = row.get(1)?;
            let doc: Option<String> = row.get(2)?;
            let queued_at_ms: i64 = row.get(3)?;

            let op = match (op.as_str(), doc) {
                (OP_SAVE, Some(doc)) => match serde_json::from_str::<Project>(&doc) {
                    Ok(project) => PendingOp::Save(project),
                    Err(err) => {
                        log::warn!("dropping malformed pending save for {project_id}: {err}");
                        continue;
                    }
                },
                (OP_DELETE, _) => PendingOp::Delete,
                _ => {
                    log::warn!("dropping malformed pending op for {project_id}");
                    continue;
                }
            };

            out.push(PendingSyncItem {
                project_id,
                op,
                queued_at_ms,
            });
        }

        Ok(out)
    }
}
