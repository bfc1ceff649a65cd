#![forbid(unsafe_code)]

/// Failures crossing the remote seam. All of them are recoverable by
/// retry; none may abort the local editing flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteError {
    Network(String),
    Auth(String),
    Quota,
    Rejected(String),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(message) => write!(f, "network: {message}"),
            Self::Auth(message) => write!(f, "auth: {message}"),
            Self::Quota => write!(f, "remote quota exceeded"),
            Self::Rejected(message) => write!(f, "rejected: {message}"),
        }
    }
}

impl std::error::Error for RemoteError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
}

/// The remote project store, scoped by authenticated identity.
///
/// `list_docs` returns raw JSON documents so that one malformed document
/// can be skipped without aborting the rest of the load.
pub trait RemoteStore {
    fn list_docs(&mut self, identity: &UserIdentity) -> Result<Vec<String>, RemoteError>;
    fn put_doc(
        &mut self,
        identity: &UserIdentity,
        project_id: &str,
        doc: &str,
    ) -> Result<(), RemoteError>;
    fn delete_doc(&mut self, identity: &UserIdentity, project_id: &str) -> Result<(), RemoteError>;
}
