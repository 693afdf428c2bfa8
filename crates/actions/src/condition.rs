//! Conditional branch actions.
//!
//! `condition.if` reports condition truth through its result status: SUCCESS
//! means the condition held, FAILED means it did not. The interpreter reads
//! that status to drive its skip-stack; a FAILED `condition.if` therefore
//! never halts a run.

use std::cmp::Ordering;

use anyhow::Result;
use flowdeck_engine::{Action, ActionRegistry, CONDITION_ENDIF, CONDITION_IF, ExecutionContext, string_param, string_param_or};
use flowdeck_types::{ActionResult, ActionSpec, ActionStatus, ParamKind, ParamSpec};
use serde_json::{Map, Value, json};

const CATEGORY: &str = "condition";

const OPERATORS: &[&str] = &[
    "=",
    "!=",
    ">",
    "<",
    ">=",
    "<=",
    "contains",
    "not_contains",
    "starts_with",
    "ends_with",
    "is_empty",
    "is_not_empty",
];

/// Registers `condition.if` and `condition.endif`.
pub fn register(registry: &mut ActionRegistry) -> Result<()> {
    registry.register(Box::new(IfCondition))?;
    registry.register(Box::new(EndIf))?;
    Ok(())
}

struct IfCondition;

impl Action for IfCondition {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new(CONDITION_IF, "IF", "Skips steps up to the matching ENDIF when the condition is false.", CATEGORY)
            .param(ParamSpec::new("left", "Left operand", ParamKind::String).required())
            .param(
                ParamSpec::new("operator", "Operator", ParamKind::Select)
                    .with_options(OPERATORS)
                    .with_default("=")
                    .required(),
            )
            .param(ParamSpec::new("right", "Right operand", ParamKind::String))
    }

    fn execute(&self, params: &Map<String, Value>, _context: &mut ExecutionContext) -> ActionResult {
        let left = string_param(params, "left");
        let operator = string_param_or(params, "operator", "=");
        let right = string_param(params, "right");

        let condition_met = match evaluate(&left, &operator, &right) {
            Ok(met) => met,
            Err(message) => return ActionResult::failure(message),
        };

        let mut data = Map::new();
        data.insert("condition_met".into(), json!(condition_met));
        let verdict = if condition_met { "TRUE" } else { "FALSE" };
        let status = if condition_met { ActionStatus::Success } else { ActionStatus::Failed };
        ActionResult {
            status,
            output: format!("condition: '{left}' {operator} '{right}' -> {verdict}"),
            ..Default::default()
        }
        .with_data(data)
    }
}

/// Ordering comparisons go numeric when both operands parse as numbers, else
/// lexicographic.
fn compare(left: &str, right: &str) -> Ordering {
    if let (Ok(l), Ok(r)) = (left.trim().parse::<f64>(), right.trim().parse::<f64>())
        && let Some(ordering) = l.partial_cmp(&r)
    {
        return ordering;
    }
    left.cmp(right)
}

fn evaluate(left: &str, operator: &str, right: &str) -> Result<bool, String> {
    let met = match operator {
        "=" => left == right,
        "!=" => left != right,
        ">" => compare(left, right) == Ordering::Greater,
        "<" => compare(left, right) == Ordering::Less,
        ">=" => compare(left, right) != Ordering::Less,
        "<=" => compare(left, right) != Ordering::Greater,
        "contains" => left.contains(right),
        "not_contains" => !left.contains(right),
        "starts_with" => left.starts_with(right),
        "ends_with" => left.ends_with(right),
        "is_empty" => left.trim().is_empty(),
        "is_not_empty" => !left.trim().is_empty(),
        other => return Err(format!("unknown operator: {other}")),
    };
    Ok(met)
}

struct EndIf;

impl Action for EndIf {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new(CONDITION_ENDIF, "END IF", "Marks the end of an IF branch.", CATEGORY)
    }

    fn execute(&self, _params: &Map<String, Value>, _context: &mut ExecutionContext) -> ActionResult {
        ActionResult::success("ENDIF")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_types::ActionStatus;

    fn check(left: &str, operator: &str, right: &str) -> ActionResult {
        let mut context = ExecutionContext::new();
        let params = json!({"left": left, "operator": operator, "right": right});
        IfCondition.execute(params.as_object().expect("object"), &mut context)
    }

    #[test]
    fn equality_is_textual() {
        assert_eq!(check("a", "=", "a").status, ActionStatus::Success);
        assert_eq!(check("a", "=", "b").status, ActionStatus::Failed);
        assert_eq!(check("a", "!=", "b").status, ActionStatus::Success);
        // numeric-looking equality stays textual
        assert_eq!(check("1.0", "=", "1").status, ActionStatus::Failed);
    }

    #[test]
    fn ordering_prefers_numeric_comparison() {
        assert_eq!(check("10", ">", "9").status, ActionStatus::Success);
        assert_eq!(check("2.5", "<=", "2.5").status, ActionStatus::Success);
        // non-numeric operands fall back to lexicographic order
        assert_eq!(check("apple", "<", "banana").status, ActionStatus::Success);
        assert_eq!(check("10x", ">", "9").status, ActionStatus::Failed);
    }

    #[test]
    fn substring_and_affix_operators() {
        assert_eq!(check("hello world", "contains", "lo w").status, ActionStatus::Success);
        assert_eq!(check("hello", "not_contains", "z").status, ActionStatus::Success);
        assert_eq!(check("report.csv", "starts_with", "report").status, ActionStatus::Success);
        assert_eq!(check("report.csv", "ends_with", ".csv").status, ActionStatus::Success);
    }

    #[test]
    fn emptiness_ignores_surrounding_whitespace() {
        assert_eq!(check("   ", "is_empty", "").status, ActionStatus::Success);
        assert_eq!(check(" x ", "is_not_empty", "").status, ActionStatus::Success);
    }

    #[test]
    fn unknown_operator_is_a_failure_with_a_message() {
        let result = check("a", "~~", "b");
        assert_eq!(result.status, ActionStatus::Failed);
        assert!(result.error_message.contains("unknown operator"));
        assert!(result.data.is_empty());
    }

    #[test]
    fn verdict_lands_in_output_and_data() {
        let result = check("x", "=", "x");
        assert!(result.output.ends_with("TRUE"));
        assert_eq!(result.data["condition_met"], json!(true));
    }

    #[test]
    fn endif_always_succeeds() {
        let mut context = ExecutionContext::new();
        let result = EndIf.execute(&Map::new(), &mut context);
        assert_eq!(result.status, ActionStatus::Success);
        assert_eq!(result.output, "ENDIF");
    }
}
