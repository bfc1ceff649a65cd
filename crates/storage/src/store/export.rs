#![forbid(unsafe_code)]

use super::{SqliteStore, StoreError};
use fc_core::graph::Project;
use fc_core::ids::FrameId;
use serde_json::Value as JsonValue;

/// Serializes a project to the portable export document. Round-trip
/// compatible with [`parse_project_document`].
pub fn export_project(project: &Project) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(project)?)
}

/// Validates and parses an export document. Rejects documents missing the
/// `nodes` or `edges` arrays or carrying unusable ids; never returns a
/// partially-valid project.
pub fn parse_project_document(raw: &str) -> Result<Project, StoreError> {
    let value: JsonValue = serde_json::from_str(raw)?;
    let Some(object) = value.as_object() else {
        return Err(StoreError::InvalidFormat("document must be a JSON object"));
    };

    if !object.get("id").is_some_and(JsonValue::is_string) {
        return Err(StoreError::InvalidFormat("document is missing an id"));
    }
    if !object.get("name").is_some_and(JsonValue::is_string) {
        return Err(StoreError::InvalidFormat("document is missing a name"));
    }
    if !object.get("nodes").is_some_and(JsonValue::is_array) {
        return Err(StoreError::InvalidFormat("document is missing a nodes array"));
    }
    if !object.get("edges").is_some_and(JsonValue::is_array) {
        return Err(StoreError::InvalidFormat("document is missing an edges array"));
    }

    let project: Project = serde_json::from_value(value)
        .map_err(|_| StoreError::InvalidFormat("document does not match the project schema"))?;

    for node in &project.nodes {
        FrameId::try_new(node.id.as_str())
            .map_err(|_| StoreError::InvalidFormat("document contains an invalid node id"))?;
    }

    Ok(project)
}

impl SqliteStore {
    /// Imports an export document, writing the project only after the
    /// whole document validated.
    pub fn import_project(&mut self, raw: &str) -> Result<Project, StoreError> {
        let project = parse_project_document(raw)?;
        self.save_project(&project)?;
        Ok(project)
    }
}
