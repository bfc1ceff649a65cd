#![forbid(unsafe_code)]

use fc_core::graph::{ArtifactRef, Project};

/// Strips privacy-sensitive fields before any remote write: the cloud only
/// ever holds graph topology and decorative style, never artifact-identifying
/// data or thumbnail URLs.
pub fn sanitize_for_upload(project: &Project) -> Project {
    let mut out = project.clone();
    for node in &mut out.nodes {
        node.reference = ArtifactRef::default();
        node.meta.thumbnail_url = None;
    }
    out
}
