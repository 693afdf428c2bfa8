//! Flow document model.
//!
//! A flow is an ordered list of typed actions plus display metadata. Flows are
//! persisted as plain documents; their identity is the storage path, not an
//! embedded id.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A complete flow document: metadata plus the ordered action list.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Flow {
    /// Display name; also used (sanitized) for run log file names.
    #[serde(default)]
    pub name: String,
    /// Free-form description shown by editors.
    #[serde(default)]
    pub description: String,
    /// Ordered action sequence; order is significant and preserved on load/save.
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

impl Flow {
    /// Returns the flow name or a placeholder for unnamed documents.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { "unnamed_flow" } else { &self.name }
    }
}

/// One step in a flow: a typed, parameterized unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionDef {
    /// Identifier unique within the flow, assigned at creation and stable
    /// across edits. Step results are recorded under this id.
    pub id: String,
    /// Registry key selecting the action implementation, e.g. `file.copy`.
    #[serde(rename = "type")]
    pub action_type: String,
    /// Display label shown in editors and run logs.
    #[serde(default)]
    pub name: String,
    /// Raw parameters; string values may contain `{{ ... }}` template
    /// references expanded at execution time.
    #[serde(default)]
    pub params: IndexMap<String, Value>,
    /// Disabled actions are recorded as skipped without being dispatched.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ActionDef {
    /// Display label, falling back to the type identifier.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.action_type } else { &self.name }
    }
}
