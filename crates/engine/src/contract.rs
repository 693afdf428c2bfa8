//! The contract every action plugin implements, plus shared parameter
//! accessors.
//!
//! An action receives its parameters already template-expanded by the
//! dispatcher and must never let a fault escape across the boundary: internal
//! failures are converted to a FAILED [`ActionResult`] with a populated error
//! message. Side effects (filesystem mutation, process spawning, variable
//! writes) are the action's own responsibility; the contract only constrains
//! their result representation.

use flowdeck_types::{ActionResult, ActionSpec};
use serde_json::{Map, Value};

use crate::context::{ExecutionContext, value_to_string};

/// Type identifier of the conditional-branch opener, special-cased by the
/// interpreter: a SUCCESS result means "condition true".
pub const CONDITION_IF: &str = "condition.if";
/// Type identifier of the conditional-branch terminator, processed by the
/// interpreter even while skipping.
pub const CONDITION_ENDIF: &str = "condition.endif";

/// One action type: published metadata plus the execution entry point.
pub trait Action: Send + Sync {
    /// Declarative metadata: type identifier, labels, and parameter schema.
    fn spec(&self) -> ActionSpec;

    /// Executes the action with template-expanded parameters.
    ///
    /// Implementations must catch their own faults and return a FAILED result
    /// instead of panicking; the dispatcher converts escaping panics as a
    /// safety net.
    fn execute(&self, params: &Map<String, Value>, context: &mut ExecutionContext) -> ActionResult;
}

/// String form of a parameter, empty when absent.
pub fn string_param(params: &Map<String, Value>, name: &str) -> String {
    params.get(name).map(value_to_string).unwrap_or_default()
}

/// Trimmed string form of a parameter with a fallback for absent or blank values.
pub fn string_param_or(params: &Map<String, Value>, name: &str, default: &str) -> String {
    let value = string_param(params, name);
    let trimmed = value.trim();
    if trimmed.is_empty() { default.to_string() } else { trimmed.to_string() }
}

/// Boolean form of a parameter. Accepts JSON booleans and the textual forms
/// `true`/`1`/`yes` and `false`/`0`/`no` (case-insensitive); anything else
/// resolves to `default`.
pub fn bool_param(params: &Map<String, Value>, name: &str, default: bool) -> bool {
    match params.get(name) {
        None => default,
        Some(Value::Bool(boolean)) => *boolean,
        Some(value) => match value_to_string(value).trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => default,
        },
    }
}

/// Numeric form of a parameter; JSON numbers and numeric strings both parse.
pub fn number_param(params: &Map<String, Value>, name: &str, default: f64) -> f64 {
    match params.get(name) {
        None => default,
        Some(Value::Number(number)) => number.as_f64().unwrap_or(default),
        Some(value) => value_to_string(value).trim().parse().unwrap_or(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().expect("object literal").clone()
    }

    #[test]
    fn bool_param_parses_textual_forms() {
        let p = params(json!({"a": "Yes", "b": "0", "c": true, "d": "maybe"}));
        assert!(bool_param(&p, "a", false));
        assert!(!bool_param(&p, "b", true));
        assert!(bool_param(&p, "c", false));
        assert!(bool_param(&p, "d", true));
        assert!(!bool_param(&p, "missing", false));
    }

    #[test]
    fn number_param_parses_strings_and_numbers() {
        let p = params(json!({"n": "60", "m": 2.5, "bad": "x"}));
        assert_eq!(number_param(&p, "n", 0.0), 60.0);
        assert_eq!(number_param(&p, "m", 0.0), 2.5);
        assert_eq!(number_param(&p, "bad", 7.0), 7.0);
    }

    #[test]
    fn string_param_or_falls_back_on_blank() {
        let p = params(json!({"v": "  ", "w": " var "}));
        assert_eq!(string_param_or(&p, "v", "default"), "default");
        assert_eq!(string_param_or(&p, "w", "default"), "var");
        assert_eq!(string_param_or(&p, "missing", "default"), "default");
    }
}
