#![forbid(unsafe_code)]

/// Emitted after every committed write so consumers can react without
/// polling the database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    ProjectSaved { project_id: String },
    ProjectDeleted { project_id: String },
    CurrentProjectChanged { project_id: Option<String> },
    LegacyMigrated { project_id: String },
    PendingQueueReplaced { len: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);
