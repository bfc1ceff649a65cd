#![forbid(unsafe_code)]

use fc_core::graph::{ArtifactRef, FrameMeta, FrameNode, Position, Project, Size};
use fc_sync::{ArtifactInfo, ArtifactListing, ArtifactLookup, refresh_artifacts};
use std::collections::BTreeMap;

struct FakeLookup {
    by_artifact_id: BTreeMap<String, ArtifactInfo>,
}

impl ArtifactLookup for FakeLookup {
    fn artifact_info(
        &mut self,
        _credential: &str,
        _source_key: &str,
        artifact_id: &str,
    ) -> ArtifactInfo {
        self.by_artifact_id
            .get(artifact_id)
            .cloned()
            .unwrap_or_else(|| ArtifactInfo {
                error: Some("not found".to_string()),
                ..ArtifactInfo::default()
            })
    }

    fn list_artifacts(&mut self, _credential: &str, _source_key: &str) -> ArtifactListing {
        ArtifactListing::default()
    }
}

fn frame(id: &str, artifact_id: &str, title: &str) -> FrameNode {
    FrameNode {
        id: id.to_string(),
        position: Position::default(),
        size: None,
        reference: ArtifactRef {
            source_key: "file-key".to_string(),
            artifact_id: artifact_id.to_string(),
            artifact_url: String::new(),
        },
        meta: FrameMeta {
            title: title.to_string(),
            thumbnail_url: Some("https://example.test/stale.png".to_string()),
            ..FrameMeta::default()
        },
    }
}

fn canvas(nodes: Vec<FrameNode>) -> Project {
    Project {
        id: "proj-refresh".to_string(),
        name: "Refresh".to_string(),
        nodes,
        edges: Vec::new(),
        created_at_ms: 1,
        updated_at_ms: 2,
    }
}

#[test]
fn refresh_updates_metadata_and_stamps_sync_time() {
    let mut project = canvas(vec![frame("n1", "1:23", "Old title")]);
    let mut lookup = FakeLookup {
        by_artifact_id: BTreeMap::from([(
            "1:23".to_string(),
            ArtifactInfo {
                name: "Login screen".to_string(),
                thumbnail_url: Some("https://example.test/fresh.png".to_string()),
                dimensions: Some(Size {
                    width: 375.0,
                    height: 812.0,
                }),
                error: None,
            },
        )]),
    };

    let refreshed = refresh_artifacts(&mut project, "tok", &mut lookup);
    assert_eq!(refreshed, 1);

    let meta = &project.nodes[0].meta;
    assert_eq!(meta.title, "Login screen");
    assert_eq!(
        meta.thumbnail_url.as_deref(),
        Some("https://example.test/fresh.png")
    );
    assert_eq!(
        meta.dimensions,
        Some(Size {
            width: 375.0,
            height: 812.0
        })
    );
    assert!(meta.last_synced_at_ms.is_some());
}

#[test]
fn failed_lookup_keeps_previous_metadata() {
    let mut project = canvas(vec![
        frame("n1", "1:23", "Keep me"),
        frame("n2", "4:56", "Update me"),
    ]);
    let mut lookup = FakeLookup {
        by_artifact_id: BTreeMap::from([(
            "4:56".to_string(),
            ArtifactInfo {
                name: "Checkout".to_string(),
                ..ArtifactInfo::default()
            },
        )]),
    };

    let refreshed = refresh_artifacts(&mut project, "tok", &mut lookup);
    assert_eq!(refreshed, 1, "only the resolvable frame counts");

    let failed = &project.nodes[0].meta;
    assert_eq!(failed.title, "Keep me");
    assert_eq!(
        failed.thumbnail_url.as_deref(),
        Some("https://example.test/stale.png")
    );
    assert_eq!(failed.last_synced_at_ms, None);

    assert_eq!(project.nodes[1].meta.title, "Checkout");
}

#[test]
fn empty_remote_name_keeps_local_title() {
    let mut project = canvas(vec![frame("n1", "1:23", "Hand-edited title")]);
    let mut lookup = FakeLookup {
        by_artifact_id: BTreeMap::from([(
            "1:23".to_string(),
            ArtifactInfo {
                name: String::new(),
                thumbnail_url: None,
                dimensions: None,
                error: None,
            },
        )]),
    };

    refresh_artifacts(&mut project, "tok", &mut lookup);
    assert_eq!(project.nodes[0].meta.title, "Hand-edited title");
}
