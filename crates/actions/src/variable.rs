//! Variable processing actions: assignment, string manipulation, date
//! formatting, and arithmetic.

use anyhow::Result;
use chrono::Local;
use chrono::format::{Item, StrftimeItems};
use flowdeck_engine::{Action, ActionRegistry, ExecutionContext, bool_param, number_param, string_param, string_param_or};
use flowdeck_types::{ActionResult, ActionSpec, ParamKind, ParamSpec};
use flowdeck_util::truncate_preview;
use serde_json::{Map, Value, json};

use crate::expr;

const CATEGORY: &str = "variable";

/// Registers the five `variable.*` actions.
pub fn register(registry: &mut ActionRegistry) -> Result<()> {
    registry.register(Box::new(SetVariable))?;
    registry.register(Box::new(StringConcat))?;
    registry.register(Box::new(StringReplace))?;
    registry.register(Box::new(GetDate))?;
    registry.register(Box::new(MathCalc))?;
    Ok(())
}

fn bound_result(summary: String, var_name: &str, var_value: &str) -> ActionResult {
    let mut data = Map::new();
    data.insert("var_name".into(), json!(var_name));
    data.insert("var_value".into(), json!(var_value));
    ActionResult::success(summary).with_data(data)
}

struct SetVariable;

impl Action for SetVariable {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("variable.set", "Set variable", "Creates or updates a variable.", CATEGORY)
            .param(ParamSpec::new("name", "Variable name", ParamKind::String).required())
            .param(ParamSpec::new("value", "Value", ParamKind::String).required())
    }

    fn execute(&self, params: &Map<String, Value>, context: &mut ExecutionContext) -> ActionResult {
        let name = string_param(params, "name").trim().to_string();
        let value = string_param(params, "value");
        if name.is_empty() {
            return ActionResult::failure("no variable name given");
        }
        context.set_variable(name.clone(), value.clone());
        bound_result(format!("set variable: {name} = {}", truncate_preview(&value, 100)), &name, &value)
    }
}

struct StringConcat;

impl Action for StringConcat {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("variable.string_concat", "Concatenate strings", "Joins newline-separated parts into a variable.", CATEGORY)
            .param(
                ParamSpec::new("parts", "Parts (one per line)", ParamKind::Multiline)
                    .required()
                    .describe("Lines to join; empty lines are dropped"),
            )
            .param(ParamSpec::new("separator", "Separator", ParamKind::String))
            .param(ParamSpec::new("var_name", "Variable name", ParamKind::String).with_default("result").required())
    }

    fn execute(&self, params: &Map<String, Value>, context: &mut ExecutionContext) -> ActionResult {
        let parts = string_param(params, "parts");
        let separator = string_param(params, "separator");
        let var_name = string_param_or(params, "var_name", "result");

        let joined: String = parts.split('\n').filter(|line| !line.is_empty()).collect::<Vec<_>>().join(&separator);
        context.set_variable(var_name.clone(), joined.clone());
        bound_result(format!("concatenated: {var_name} = {}", truncate_preview(&joined, 100)), &var_name, &joined)
    }
}

struct StringReplace;

impl Action for StringReplace {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("variable.string_replace", "Replace in string", "Replaces text in a string and stores the result.", CATEGORY)
            .param(ParamSpec::new("source", "Source string", ParamKind::String).required())
            .param(ParamSpec::new("find", "Search text", ParamKind::String).required())
            .param(ParamSpec::new("replace", "Replacement", ParamKind::String))
            .param(ParamSpec::new("var_name", "Variable name", ParamKind::String).with_default("result").required())
            .param(
                ParamSpec::new("use_regex", "Use regular expression", ParamKind::Bool)
                    .with_default(false)
                    .describe("Treat the search text as a regular expression"),
            )
    }

    fn execute(&self, params: &Map<String, Value>, context: &mut ExecutionContext) -> ActionResult {
        let source = string_param(params, "source");
        let find = string_param(params, "find");
        let replace = string_param(params, "replace");
        let var_name = string_param_or(params, "var_name", "result");
        let use_regex = bool_param(params, "use_regex", false);

        let replaced = if use_regex {
            match regex::Regex::new(&find) {
                Ok(pattern) => pattern.replace_all(&source, replace.as_str()).into_owned(),
                Err(error) => return ActionResult::failure(format!("invalid pattern: {error}")),
            }
        } else {
            source.replace(&find, &replace)
        };
        context.set_variable(var_name.clone(), replaced.clone());
        bound_result(format!("replaced: {var_name} = {}", truncate_preview(&replaced, 100)), &var_name, &replaced)
    }
}

struct GetDate;

impl Action for GetDate {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("variable.get_date", "Get date", "Formats the current date/time into a variable.", CATEGORY)
            .param(
                ParamSpec::new("format", "Format", ParamKind::String)
                    .with_default("%Y-%m-%d %H:%M:%S")
                    .describe("strftime pattern, e.g. %Y-%m-%d"),
            )
            .param(ParamSpec::new("var_name", "Variable name", ParamKind::String).with_default("current_date").required())
    }

    fn execute(&self, params: &Map<String, Value>, context: &mut ExecutionContext) -> ActionResult {
        let format = string_param_or(params, "format", "%Y-%m-%d %H:%M:%S");
        let var_name = string_param_or(params, "var_name", "current_date");

        // chrono panics on formatting an invalid pattern, so validate first
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return ActionResult::failure(format!("invalid date format: {format}"));
        }
        let formatted = Local::now().format(&format).to_string();
        context.set_variable(var_name.clone(), formatted.clone());
        bound_result(format!("date: {var_name} = {formatted}"), &var_name, &formatted)
    }
}

struct MathCalc;

impl Action for MathCalc {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("variable.math_calc", "Calculate", "Evaluates an arithmetic expression into a variable.", CATEGORY)
            .param(
                ParamSpec::new("expression", "Expression", ParamKind::String)
                    .required()
                    .describe("Arithmetic expression, e.g. 1 + 2 * 3 or {{count}} + 1"),
            )
            .param(ParamSpec::new("var_name", "Variable name", ParamKind::String).with_default("calc_result").required())
            .param(
                ParamSpec::new("decimal_places", "Decimal places", ParamKind::Number)
                    .with_default("-1")
                    .describe("Digits after the decimal point; -1 keeps the natural form"),
            )
    }

    fn execute(&self, params: &Map<String, Value>, context: &mut ExecutionContext) -> ActionResult {
        let expression = string_param(params, "expression").trim().to_string();
        let var_name = string_param_or(params, "var_name", "calc_result");
        let decimal_places = number_param(params, "decimal_places", -1.0) as i32;

        if expression.is_empty() {
            return ActionResult::failure("no expression given");
        }
        let value = match expr::evaluate(&expression) {
            Ok(value) => value,
            Err(error) => return ActionResult::failure(format!("expression error: {error}")),
        };
        let rendered = render_number(value, decimal_places);
        context.set_variable(var_name.clone(), rendered.clone());
        bound_result(format!("calculated: {expression} = {rendered}"), &var_name, &rendered)
    }
}

/// Whole-valued results print as integers; a non-negative precision forces a
/// fixed number of digits (zero digits collapses to an integer).
fn render_number(value: f64, decimal_places: i32) -> String {
    if decimal_places == 0 {
        return format!("{}", value.round() as i64);
    }
    if decimal_places > 0 {
        return format!("{value:.prec$}", prec = decimal_places as usize);
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowdeck_types::ActionStatus;

    fn run(action: &dyn Action, params: Value) -> (ActionResult, ExecutionContext) {
        let mut context = ExecutionContext::new();
        let params = params.as_object().expect("object").clone();
        let result = action.execute(&params, &mut context);
        (result, context)
    }

    #[test]
    fn set_binds_the_variable_and_reports_it_in_data() {
        let (result, context) = run(&SetVariable, json!({"name": "greeting", "value": "hello"}));
        assert_eq!(result.status, ActionStatus::Success);
        assert_eq!(context.get_variable_string("greeting", ""), "hello");
        assert_eq!(result.data["var_value"], json!("hello"));
    }

    #[test]
    fn concat_drops_empty_lines_and_joins_with_separator() {
        let (result, context) = run(
            &StringConcat,
            json!({"parts": "a\n\nb\nc", "separator": ", ", "var_name": "joined"}),
        );
        assert_eq!(result.status, ActionStatus::Success);
        assert_eq!(context.get_variable_string("joined", ""), "a, b, c");
    }

    #[test]
    fn replace_supports_plain_and_regex_modes() {
        let (_, context) = run(
            &StringReplace,
            json!({"source": "a-b-c", "find": "-", "replace": "_", "var_name": "plain"}),
        );
        assert_eq!(context.get_variable_string("plain", ""), "a_b_c");

        let (_, context) = run(
            &StringReplace,
            json!({"source": "item12x", "find": r"\d+", "replace": "#", "var_name": "re", "use_regex": true}),
        );
        assert_eq!(context.get_variable_string("re", ""), "item#x");

        let (result, _) = run(
            &StringReplace,
            json!({"source": "x", "find": "(", "use_regex": true, "var_name": "bad"}),
        );
        assert_eq!(result.status, ActionStatus::Failed);
    }

    #[test]
    fn get_date_validates_the_format_pattern() {
        let (result, context) = run(&GetDate, json!({"format": "%Y-%m-%d", "var_name": "today"}));
        assert_eq!(result.status, ActionStatus::Success);
        assert_eq!(context.get_variable_string("today", "").len(), 10);

        let (result, _) = run(&GetDate, json!({"format": "%Q", "var_name": "bad"}));
        assert_eq!(result.status, ActionStatus::Failed);
        assert!(result.error_message.contains("invalid date format"));
    }

    #[test]
    fn math_calc_formats_per_decimal_places() {
        let (_, context) = run(&MathCalc, json!({"expression": "1 + 2 * 3", "var_name": "n"}));
        assert_eq!(context.get_variable_string("n", ""), "7");

        let (_, context) = run(&MathCalc, json!({"expression": "10 / 4", "var_name": "n"}));
        assert_eq!(context.get_variable_string("n", ""), "2.5");

        let (_, context) = run(
            &MathCalc,
            json!({"expression": "10 / 3", "var_name": "n", "decimal_places": "2"}),
        );
        assert_eq!(context.get_variable_string("n", ""), "3.33");

        let (_, context) = run(
            &MathCalc,
            json!({"expression": "10 / 3", "var_name": "n", "decimal_places": "0"}),
        );
        assert_eq!(context.get_variable_string("n", ""), "3");
    }

    #[test]
    fn math_calc_reports_evaluation_errors() {
        let (result, _) = run(&MathCalc, json!({"expression": "1 / 0", "var_name": "n"}));
        assert_eq!(result.status, ActionStatus::Failed);
        assert!(result.error_message.contains("expression error"));
    }
}
