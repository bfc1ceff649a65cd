#![forbid(unsafe_code)]

use crate::remote::{RemoteError, UserIdentity};

/// Resolves the external identity behind an auth credential. A resolution
/// failure is not fatal when a previously cached identity exists; the
/// engine degrades to cached mode so queued writes stay coherent.
pub trait IdentityProvider {
    fn resolve(&mut self, credential: &str) -> Result<UserIdentity, RemoteError>;
}
