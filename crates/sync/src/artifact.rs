#![forbid(unsafe_code)]

use fc_core::graph::{Project, Size};
use fc_core::time::now_ms;

/// Lookup result for one artifact. Transport failures arrive in `error`,
/// never as a panic or an `Err` across this seam.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArtifactInfo {
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub dimensions: Option<Size>,
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactFrameInfo {
    pub id: String,
    pub name: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactPage {
    pub id: String,
    pub name: String,
    pub frames: Vec<ArtifactFrameInfo>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArtifactListing {
    pub pages: Vec<ArtifactPage>,
    pub error: Option<String>,
}

/// Side-effect-free view into the external artifact system.
pub trait ArtifactLookup {
    fn artifact_info(
        &mut self,
        credential: &str,
        source_key: &str,
        artifact_id: &str,
    ) -> ArtifactInfo;

    fn list_artifacts(&mut self, credential: &str, source_key: &str) -> ArtifactListing;
}

/// Re-pulls display metadata for every frame in the project, stamping
/// `last_synced_at_ms` on success. Frames whose lookup failed keep their
/// previous metadata. Returns the number of frames refreshed.
pub fn refresh_artifacts(
    project: &mut Project,
    credential: &str,
    lookup: &mut dyn ArtifactLookup,
) -> usize {
    let now_ms = now_ms();
    let mut refreshed = 0usize;

    for node in &mut project.nodes {
        let info = lookup.artifact_info(
            credential,
            &node.reference.source_key,
            &node.reference.artifact_id,
        );
        if let Some(error) = info.error {
            log::warn!("artifact lookup failed for frame {}: {error}", node.id);
            continue;
        }

        if !info.name.is_empty() {
            node.meta.title = info.name;
        }
        node.meta.thumbnail_url = info.thumbnail_url;
        node.meta.dimensions = info.dimensions;
        node.meta.last_synced_at_ms = Some(now_ms);
        refreshed += 1;
    }

    refreshed
}
