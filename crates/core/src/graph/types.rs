#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Fallback footprint used by geometry when a frame has no measured size.
pub const DEFAULT_NODE_SIZE: Size = Size {
    width: 300.0,
    height: 400.0,
};

pub const DEFAULT_HANDLE: &str = "default";

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Opaque identifiers into the external artifact system. The core never
/// interprets these beyond equality.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRef {
    pub source_key: String,
    pub artifact_id: String,
    pub artifact_url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStatus {
    Draft,
    Review,
    Approved,
    Deprecated,
}

impl FrameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameStatus::Draft => "draft",
            FrameStatus::Review => "review",
            FrameStatus::Approved => "approved",
            FrameStatus::Deprecated => "deprecated",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeta {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FrameStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(rename = "lastSyncedAt", skip_serializing_if = "Option::is_none")]
    pub last_synced_at_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Size>,
}

/// Shallow-merge source for [`FrameMeta`]. Outer `None` leaves the field
/// untouched; `Some(None)` clears an optional field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameMetaPatch {
    pub title: Option<String>,
    pub status: Option<Option<FrameStatus>>,
    pub notes: Option<Option<String>>,
    pub thumbnail_url: Option<Option<String>>,
    pub last_synced_at_ms: Option<Option<i64>>,
    pub dimensions: Option<Option<Size>>,
}

impl FrameMetaPatch {
    pub fn apply(self, meta: &mut FrameMeta) {
        if let Some(title) = self.title {
            meta.title = title;
        }
        if let Some(status) = self.status {
            meta.status = status;
        }
        if let Some(notes) = self.notes {
            meta.notes = notes;
        }
        if let Some(thumbnail_url) = self.thumbnail_url {
            meta.thumbnail_url = thumbnail_url;
        }
        if let Some(last_synced_at_ms) = self.last_synced_at_ms {
            meta.last_synced_at_ms = last_synced_at_ms;
        }
        if let Some(dimensions) = self.dimensions {
            meta.dimensions = dimensions;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameNode {
    pub id: String,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    pub reference: ArtifactRef,
    pub meta: FrameMeta,
}

impl FrameNode {
    pub fn effective_size(&self) -> Size {
        self.size.unwrap_or(DEFAULT_NODE_SIZE)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Auto,
    #[default]
    Manual,
    Inferred,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowType {
    None,
    #[default]
    Forward,
    Backward,
    Both,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    #[serde(rename = "sourceType")]
    pub kind: EdgeKind,
    pub style: EdgeStyle,
    #[serde(rename = "arrowType")]
    pub arrow: ArrowType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub data: EdgeData,
}

impl Edge {
    /// Structural identity of an edge. At most one edge may hold a given
    /// key at any time.
    pub fn dedup_key(&self) -> EdgeKey {
        EdgeKey {
            source: self.source.clone(),
            source_handle: self
                .source_handle
                .clone()
                .unwrap_or_else(|| DEFAULT_HANDLE.to_string()),
            target: self.target.clone(),
            target_handle: self
                .target_handle
                .clone()
                .unwrap_or_else(|| DEFAULT_HANDLE.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub source: String,
    pub source_handle: String,
    pub target: String,
    pub target_handle: String,
}

/// A saved edge style the user can re-apply to new connections.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgePreset {
    pub name: String,
    pub style: EdgeStyle,
    pub arrow: ArrowType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub nodes: Vec<FrameNode>,
    pub edges: Vec<Edge>,
    #[serde(rename = "createdAt")]
    pub created_at_ms: i64,
    #[serde(rename = "updatedAt")]
    pub updated_at_ms: i64,
}
