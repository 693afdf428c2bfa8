//! Declarative action metadata: the contract every action plugin publishes so
//! that editors can render parameter forms without knowing the implementation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input widget kind for a declared parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Single-line text.
    String,
    /// Multi-line text.
    Multiline,
    /// Numeric text.
    Number,
    /// Checkbox.
    Bool,
    /// One of a fixed option list.
    Select,
}

/// One declared parameter of an action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParamSpec {
    /// Key under which the value appears in `ActionDef::params`.
    pub name: String,
    /// Short label shown next to the input.
    pub label: String,
    /// Widget kind.
    pub kind: ParamKind,
    /// Default value used when the parameter is absent.
    #[serde(default)]
    pub default: Value,
    /// Whether the action fails without this parameter.
    #[serde(default)]
    pub required: bool,
    /// Longer help text.
    #[serde(default)]
    pub description: String,
    /// Option list for `ParamKind::Select`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl ParamSpec {
    /// New optional parameter with an empty default.
    pub fn new(name: &str, label: &str, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            default: Value::String(String::new()),
            required: false,
            description: String::new(),
            options: Vec::new(),
        }
    }

    /// Marks the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    /// Sets the help text.
    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the option list (for `ParamKind::Select`).
    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| (*o).to_string()).collect();
        self
    }
}

/// Published metadata of one action type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionSpec {
    /// Unique registry key, e.g. `variable.set`.
    pub action_type: String,
    /// Human label.
    pub label: String,
    /// One-line description.
    pub description: String,
    /// Grouping category for editor palettes.
    pub category: String,
    /// Ordered parameter declarations.
    pub params: Vec<ParamSpec>,
}

impl ActionSpec {
    /// Builds a spec with an empty parameter list.
    pub fn new(action_type: &str, label: &str, description: &str, category: &str) -> Self {
        Self {
            action_type: action_type.into(),
            label: label.into(),
            description: description.into(),
            category: category.into(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter declaration, preserving order.
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Default parameter map derived from the declared defaults.
    pub fn default_params(&self) -> indexmap::IndexMap<String, Value> {
        self.params.iter().map(|p| (p.name.clone(), p.default.clone())).collect()
    }
}
