#![forbid(unsafe_code)]

use crate::identity::IdentityProvider;
use crate::remote::{RemoteError, RemoteStore, UserIdentity};
use crate::sanitize::sanitize_for_upload;
use fc_core::graph::Project;
use fc_core::time::now_ms;
use fc_storage::{PendingOp, PendingSyncItem, SqliteStore, StoreError};

pub const DEFAULT_RETRY_BACKOFF_MS: i64 = 30_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Disabled,
    Enabled,
    /// Identity resolution failed but a cached identity exists; local
    /// writes keep queuing coherently instead of being dropped.
    EnabledCached,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced,
    Queued,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncAllReport {
    pub synced: usize,
    pub queued: usize,
    pub failures: Vec<(String, String)>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub drained: usize,
    pub requeued: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub local_wins: usize,
    pub remote_wins: usize,
    pub local_only: usize,
    pub remote_only: usize,
}

/// Read-only operator view of the engine (no mutable backdoor into the
/// queue itself).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncDiagnostics {
    pub state: SyncState,
    pub queue_len: usize,
    pub retry_due_at_ms: Option<i64>,
    pub retry_backoff_ms: i64,
    pub last_error: Option<String>,
}

/// Single delayed-task abstraction: at most one retry outstanding at a
/// time, cancel-and-reschedule semantics, no threads.
#[derive(Debug, Default)]
struct RetryTimer {
    due_at_ms: Option<i64>,
}

impl RetryTimer {
    /// Coalesced: scheduling while a timer is outstanding keeps the
    /// earlier deadline.
    fn schedule(&mut self, at_ms: i64) {
        if self.due_at_ms.is_none() {
            self.due_at_ms = Some(at_ms);
        }
    }

    fn is_due(&self, now_ms: i64) -> bool {
        self.due_at_ms.is_some_and(|due| now_ms >= due)
    }

    fn clear(&mut self) {
        self.due_at_ms = None;
    }
}

/// Queued, retrying reconciliation between the local store and a remote
/// project store that may be intermittently unavailable.
///
/// Local writes are already durable before this engine sees them; the
/// cloud is strictly best-effort. The engine is the sole writer to the
/// pending queue, coalescing entries so a retry for a project id always
/// carries the latest enqueued payload.
pub struct SyncEngine {
    remote: Option<Box<dyn RemoteStore>>,
    identity_provider: Option<Box<dyn IdentityProvider>>,
    identity: Option<UserIdentity>,
    state: SyncState,
    queue: Vec<PendingSyncItem>,
    timer: RetryTimer,
    backoff_ms: i64,
    last_error: Option<String>,
}

impl SyncEngine {
    pub fn new(
        remote: Option<Box<dyn RemoteStore>>,
        identity_provider: Option<Box<dyn IdentityProvider>>,
    ) -> Self {
        Self {
            remote,
            identity_provider,
            identity: None,
            state: SyncState::Disabled,
            queue: Vec::new(),
            timer: RetryTimer::default(),
            backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            last_error: None,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Restores the durable queue at boot so retries resume across
    /// restarts.
    pub fn load_queue(&mut self, store: &SqliteStore) -> Result<usize, StoreError> {
        self.queue = store.pending_queue_load()?;
        if !self.queue.is_empty() {
            self.timer.schedule(now_ms() + self.backoff_ms);
        }
        Ok(self.queue.len())
    }

    /// Enablement requires a configured remote backend and a resolvable
    /// identity. A failed resolution falls back to the cached identity
    /// when one exists.
    pub fn enable(
        &mut self,
        store: &mut SqliteStore,
        credential: Option<&str>,
    ) -> Result<SyncState, StoreError> {
        if self.remote.is_none() {
            self.state = SyncState::Disabled;
            return Ok(self.state);
        }

        let resolved = match (self.identity_provider.as_mut(), credential) {
            (Some(provider), Some(credential)) => match provider.resolve(credential) {
                Ok(identity) => Some(identity),
                Err(err) => {
                    log::warn!("identity resolution failed: {err}");
                    self.last_error = Some(err.to_string());
                    None
                }
            },
            _ => None,
        };

        self.state = match resolved {
            Some(identity) => {
                store.sync_identity_set(&identity.user_id)?;
                self.identity = Some(identity);
                SyncState::Enabled
            }
            None => match store.sync_identity_get()? {
                Some(user_id) => {
                    self.identity = Some(UserIdentity { user_id });
                    SyncState::EnabledCached
                }
                None => {
                    self.identity = None;
                    SyncState::Disabled
                }
            },
        };
        Ok(self.state)
    }

    /// Best-effort upload of one project. Disabled or failing remote
    /// writes queue the item; the call itself only fails when the durable
    /// queue cannot be persisted locally.
    pub fn sync_to_cloud(
        &mut self,
        store: &mut SqliteStore,
        project: &Project,
    ) -> Result<SyncOutcome, StoreError> {
        if !self.is_enabled() {
            self.enqueue(store, PendingSyncItem::save(project.clone(), now_ms()))?;
            return Ok(SyncOutcome::Queued);
        }

        let sanitized = sanitize_for_upload(project);
        let doc = serde_json::to_string(&sanitized)?;
        match self.remote_put(&project.id, &doc) {
            Ok(()) => {
                self.last_error = None;
                Ok(SyncOutcome::Synced)
            }
            Err(err) => {
                log::warn!("cloud save failed for {}: {err}", project.id);
                self.last_error = Some(err.to_string());
                let now = now_ms();
                self.enqueue(store, PendingSyncItem::save(project.clone(), now))?;
                self.timer.schedule(now + self.backoff_ms);
                Ok(SyncOutcome::Queued)
            }
        }
    }

    /// Same enqueue-on-failure contract as [`SyncEngine::sync_to_cloud`].
    pub fn delete_from_cloud(
        &mut self,
        store: &mut SqliteStore,
        project_id: &str,
    ) -> Result<SyncOutcome, StoreError> {
        if !self.is_enabled() {
            self.enqueue(store, PendingSyncItem::delete(project_id, now_ms()))?;
            return Ok(SyncOutcome::Queued);
        }

        match self.remote_delete(project_id) {
            Ok(()) => {
                self.last_error = None;
                Ok(SyncOutcome::Synced)
            }
            Err(err) => {
                log::warn!("cloud delete failed for {project_id}: {err}");
                self.last_error = Some(err.to_string());
                let now = now_ms();
                self.enqueue(store, PendingSyncItem::delete(project_id, now))?;
                self.timer.schedule(now + self.backoff_ms);
                Ok(SyncOutcome::Queued)
            }
        }
    }

    /// Fetches every remote project. Disabled or unreachable cloud yields
    /// an empty list; callers must treat empty as "no cloud data
    /// available," not "cloud is empty." A malformed document is skipped
    /// without aborting the others.
    pub fn sync_from_cloud(&mut self) -> Vec<Project> {
        if !self.is_enabled() {
            return Vec::new();
        }
        let Some(identity) = self.identity.as_ref() else {
            return Vec::new();
        };
        let Some(remote) = self.remote.as_mut() else {
            return Vec::new();
        };

        let docs = match remote.list_docs(identity) {
            Ok(docs) => docs,
            Err(err) => {
                log::warn!("cloud load failed: {err}");
                self.last_error = Some(err.to_string());
                return Vec::new();
            }
        };

        let mut projects = Vec::with_capacity(docs.len());
        for doc in docs {
            match serde_json::from_str::<Project>(&doc) {
                Ok(project) => projects.push(project),
                Err(err) => {
                    log::warn!("skipping malformed remote project document: {err}");
                }
            }
        }
        projects
    }

    /// Reconciles remote projects into local storage: for ids present on
    /// both sides the greater `updated_at_ms` wins and the winner is
    /// written back locally; one-sided projects are unioned in.
    pub fn merge_remote(
        &mut self,
        store: &mut SqliteStore,
        remote_projects: Vec<Project>,
    ) -> Result<MergeReport, StoreError> {
        let local = store.list_projects()?;
        let mut report = MergeReport::default();
        let mut remote_ids: Vec<String> = Vec::with_capacity(remote_projects.len());

        for remote in remote_projects {
            remote_ids.push(remote.id.clone());
            match local.iter().find(|project| project.id == remote.id) {
                Some(existing) => {
                    if remote.updated_at_ms > existing.updated_at_ms {
                        store.save_project(&remote)?;
                        report.remote_wins += 1;
                    } else {
                        report.local_wins += 1;
                    }
                }
                None => {
                    store.save_project(&remote)?;
                    report.remote_only += 1;
                }
            }
        }

        report.local_only = local
            .iter()
            .filter(|project| !remote_ids.contains(&project.id))
            .count();
        Ok(report)
    }

    /// Best-effort upload of every local project. Each failure is queued
    /// individually; the report carries per-item outcomes, never a single
    /// aggregate error.
    pub fn sync_all(&mut self, store: &mut SqliteStore) -> Result<SyncAllReport, StoreError> {
        let mut report = SyncAllReport::default();
        for project in store.list_projects()? {
            self.last_error = None;
            match self.sync_to_cloud(store, &project)? {
                SyncOutcome::Synced => report.synced += 1,
                SyncOutcome::Queued => {
                    report.queued += 1;
                    if let Some(error) = self.last_error.clone() {
                        report.failures.push((project.id.clone(), error));
                    }
                }
            }
        }
        Ok(report)
    }

    /// Drains the queue sequentially. Items that still fail are re-queued,
    /// never dropped, and the durable queue is rewritten after the drain so
    /// a restart resumes from the surviving items.
    pub fn retry_pending(&mut self, store: &mut SqliteStore) -> Result<DrainReport, StoreError> {
        let items = std::mem::take(&mut self.queue);
        let mut report = DrainReport::default();

        for item in items {
            if !self.is_enabled() {
                self.queue.push(item);
                report.requeued += 1;
                continue;
            }

            let attempt = match &item.op {
                PendingOp::Save(project) => {
                    let sanitized = sanitize_for_upload(project);
                    match serde_json::to_string(&sanitized) {
                        Ok(doc) => self.remote_put(&item.project_id, &doc),
                        Err(err) => {
                            // Unserializable payloads would re-fail forever.
                            log::warn!("dropping unserializable queue item {}: {err}", item.project_id);
                            report.drained += 1;
                            continue;
                        }
                    }
                }
                PendingOp::Delete => self.remote_delete(&item.project_id),
            };

            match attempt {
                Ok(()) => report.drained += 1,
                Err(err) => {
                    log::warn!("retry failed for {}: {err}", item.project_id);
                    self.last_error = Some(err.to_string());
                    self.queue.push(item);
                    report.requeued += 1;
                }
            }
        }

        store.pending_queue_replace(&self.queue)?;
        log::info!(
            "pending queue drained: {} done, {} requeued",
            report.drained,
            report.requeued
        );

        self.timer.clear();
        if !self.queue.is_empty() {
            self.timer.schedule(now_ms() + self.backoff_ms);
        }
        Ok(report)
    }

    /// Cooperative driver: runs the pending drain when the retry timer is
    /// due. Call from the host event loop.
    pub fn tick(
        &mut self,
        store: &mut SqliteStore,
        now_ms: i64,
    ) -> Result<Option<DrainReport>, StoreError> {
        if !self.timer.is_due(now_ms) {
            return Ok(None);
        }
        self.timer.clear();
        Ok(Some(self.retry_pending(store)?))
    }

    pub fn diagnostics(&self) -> SyncDiagnostics {
        SyncDiagnostics {
            state: self.state,
            queue_len: self.queue.len(),
            retry_due_at_ms: self.timer.due_at_ms,
            retry_backoff_ms: self.backoff_ms,
            last_error: self.last_error.clone(),
        }
    }

    /// Operator override for the retry spacing (diagnostics surface; the
    /// queue itself stays private).
    pub fn set_retry_backoff_ms(&mut self, backoff_ms: i64) {
        self.backoff_ms = backoff_ms.max(1);
    }

    fn is_enabled(&self) -> bool {
        matches!(self.state, SyncState::Enabled | SyncState::EnabledCached)
            && self.remote.is_some()
            && self.identity.is_some()
    }

    /// Coalesces by project id (only the latest pending op per project
    /// survives) and persists the queue.
    fn enqueue(&mut self, store: &mut SqliteStore, item: PendingSyncItem) -> Result<(), StoreError> {
        self.queue.retain(|queued| queued.project_id != item.project_id);
        log::debug!("queueing cloud op for {}", item.project_id);
        self.queue.push(item);
        store.pending_queue_replace(&self.queue)
    }

    fn remote_put(&mut self, project_id: &str, doc: &str) -> Result<(), RemoteError> {
        let identity = self
            .identity
            .as_ref()
            .ok_or_else(|| RemoteError::Auth("no identity".to_string()))?;
        let remote = self
            .remote
            .as_mut()
            .ok_or_else(|| RemoteError::Network("no remote backend".to_string()))?;
        remote.put_doc(identity, project_id, doc)
    }

    fn remote_delete(&mut self, project_id: &str) -> Result<(), RemoteError> {
        let identity = self
            .identity
            .as_ref()
            .ok_or_else(|| RemoteError::Auth("no identity".to_string()))?;
        let remote = self
            .remote
            .as_mut()
            .ok_or_else(|| RemoteError::Network("no remote backend".to_string()))?;
        remote.delete_doc(identity, project_id)
    }
}
