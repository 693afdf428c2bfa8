//! # Execution Context and Template Expansion
//!
//! One [`ExecutionContext`] is created fresh at the start of each flow run and
//! destroyed when the run ends; it is never shared across runs. It owns two
//! stores:
//!
//! - a **variable map**, pre-seeded with `now.*` time fields at construction
//!   and mutated by `variable.*` actions (and by any action that binds output
//!   to a name), last-write-wins, no scoping;
//! - a **step-result map** keyed by action id, append-only within a run, fed
//!   by the interpreter with the flattened form of each completed result.
//!
//! ## Template syntax
//!
//! String parameters may contain `{{ key }}` references (key trimmed of
//! surrounding whitespace). Resolution order:
//!
//! 1. exact match in the variable map;
//! 2. if the key contains a dot, `{{ step_id.field }}` against a recorded
//!    step result;
//! 3. otherwise the placeholder is left verbatim.
//!
//! The verbatim fallback is deliberate: flows may reference steps that have
//! not executed yet while being authored, and that must never be an error.
//! Literal `{{`/`}}` cannot be escaped; templates therefore cannot contain
//! literal double braces.

use chrono::Local;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

static TEMPLATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").expect("template pattern compiles"));

/// Per-run variable and step-result store with template resolution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    variables: IndexMap<String, Value>,
    step_results: IndexMap<String, Map<String, Value>>,
}

impl ExecutionContext {
    /// Creates a context seeded with the `now.*` built-in variables, all
    /// computed once from a single wall-clock sample.
    pub fn new() -> Self {
        let mut context = Self::default();
        let now = Local::now();
        context.set_variable("now.date", now.format("%Y-%m-%d").to_string());
        context.set_variable("now.time", now.format("%H:%M:%S").to_string());
        context.set_variable("now.datetime", now.format("%Y-%m-%d %H:%M:%S").to_string());
        context.set_variable("now.year", now.format("%Y").to_string());
        context.set_variable("now.month", now.format("%m").to_string());
        context.set_variable("now.day", now.format("%d").to_string());
        context.set_variable("now.hour", now.format("%H").to_string());
        context.set_variable("now.minute", now.format("%M").to_string());
        context.set_variable("now.second", now.format("%S").to_string());
        context.set_variable("now.timestamp", now.format("%Y%m%d_%H%M%S").to_string());
        context
    }

    /// Sets a variable, overwriting any previous value.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Looks up a variable.
    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Looks up a variable as display text, with a fallback.
    pub fn get_variable_string(&self, name: &str, default: &str) -> String {
        self.variables.get(name).map(value_to_string).unwrap_or_else(|| default.to_string())
    }

    /// Records the flattened result of a completed step.
    pub fn set_step_result(&mut self, step_id: impl Into<String>, result: Map<String, Value>) {
        self.step_results.insert(step_id.into(), result);
    }

    /// Looks up a recorded step result.
    pub fn get_step_result(&self, step_id: &str) -> Option<&Map<String, Value>> {
        self.step_results.get(step_id)
    }

    /// Read-only view of all variables, for diagnostics.
    pub fn variables(&self) -> &IndexMap<String, Value> {
        &self.variables
    }

    /// Expands every `{{ key }}` occurrence in `text`.
    ///
    /// Unresolvable references are left verbatim; substitution is purely
    /// textual using the string form of the resolved value.
    pub fn expand_template(&self, text: &str) -> String {
        TEMPLATE_RE
            .replace_all(text, |captures: &Captures<'_>| {
                let key = captures[1].trim();
                if let Some(value) = self.variables.get(key) {
                    return value_to_string(value);
                }
                if let Some((step_id, field)) = key.split_once('.')
                    && let Some(result) = self.step_results.get(step_id)
                    && let Some(value) = result.get(field)
                {
                    return value_to_string(value);
                }
                captures[0].to_string()
            })
            .into_owned()
    }

    /// Deep-maps [`expand_template`](Self::expand_template) over every string
    /// leaf of a parameter map: nested objects recurse, array elements expand
    /// only when they are strings, non-string leaves pass through untouched.
    pub fn expand_params(&self, params: &Map<String, Value>) -> Map<String, Value> {
        params.iter().map(|(key, value)| (key.clone(), self.expand_value(value))).collect()
    }

    fn expand_value(&self, value: &Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.expand_template(text)),
            Value::Object(map) => Value::Object(self.expand_params(map)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(text) => Value::String(self.expand_template(text)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// String form used for substitution: strings bare, null empty, scalars via
/// `to_string`, containers as JSON text.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(boolean) => boolean.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
