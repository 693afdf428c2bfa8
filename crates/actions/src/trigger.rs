//! Trigger declaration actions.
//!
//! These steps declare trigger settings inside a flow; the trigger service
//! reads the declarations and does the actual scheduling and watching. At run
//! time they are inert apart from `trigger.folder_watch` republishing the
//! firing file path under a flow-chosen variable name.

use anyhow::Result;
use flowdeck_engine::{Action, ActionRegistry, ExecutionContext, string_param, string_param_or};
use flowdeck_types::{ActionResult, ActionSpec, ParamKind, ParamSpec};
use serde_json::{Map, Value, json};

const CATEGORY: &str = "trigger";

/// Context variable the trigger service seeds with the path of the file that
/// fired a folder-watch trigger.
pub const TRIGGER_NEW_FILE_VAR: &str = "__trigger_new_file__";

/// Registers `trigger.schedule` and `trigger.folder_watch`.
pub fn register(registry: &mut ActionRegistry) -> Result<()> {
    registry.register(Box::new(ScheduleTrigger))?;
    registry.register(Box::new(FolderWatchTrigger))?;
    Ok(())
}

struct ScheduleTrigger;

impl Action for ScheduleTrigger {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("trigger.schedule", "Schedule", "Declares a time-based trigger for this flow.", CATEGORY)
            .param(
                ParamSpec::new("schedule_type", "Schedule kind", ParamKind::Select)
                    .with_options(&["interval", "daily"])
                    .with_default("interval")
                    .required()
                    .describe("interval: fixed period, daily: once per day at a set time"),
            )
            .param(
                ParamSpec::new("interval_seconds", "Interval (seconds)", ParamKind::Number)
                    .with_default("3600")
                    .describe("Period between firings when the kind is interval"),
            )
            .param(
                ParamSpec::new("daily_time", "Time of day", ParamKind::String)
                    .with_default("09:00")
                    .describe("HH:MM firing time when the kind is daily"),
            )
            .param(ParamSpec::new("note", "Note", ParamKind::String))
    }

    fn execute(&self, params: &Map<String, Value>, _context: &mut ExecutionContext) -> ActionResult {
        let schedule_type = string_param_or(params, "schedule_type", "interval");
        let interval = string_param_or(params, "interval_seconds", "3600");
        let daily_time = string_param_or(params, "daily_time", "09:00");

        let mut data = Map::new();
        data.insert("schedule_type".into(), json!(schedule_type));
        data.insert("interval_seconds".into(), json!(interval));
        data.insert("daily_time".into(), json!(daily_time));
        ActionResult::success(format!("schedule trigger: {schedule_type} / {interval}s / {daily_time}")).with_data(data)
    }
}

struct FolderWatchTrigger;

impl Action for FolderWatchTrigger {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("trigger.folder_watch", "Folder watch", "Declares a trigger that fires when a new file appears in a folder.", CATEGORY)
            .param(ParamSpec::new("watch_folder", "Watched folder", ParamKind::String).required())
            .param(
                ParamSpec::new("file_pattern", "File pattern", ParamKind::String)
                    .with_default("*")
                    .describe("Glob pattern matched against new file names, e.g. *.csv"),
            )
            .param(
                ParamSpec::new("new_file_var", "New-file variable", ParamKind::String)
                    .with_default("new_file")
                    .describe("Variable receiving the path of the file that fired the trigger"),
            )
            .param(ParamSpec::new("note", "Note", ParamKind::String))
    }

    fn execute(&self, params: &Map<String, Value>, context: &mut ExecutionContext) -> ActionResult {
        let watch_folder = string_param(params, "watch_folder");
        let file_pattern = string_param_or(params, "file_pattern", "*");
        let new_file_var = string_param_or(params, "new_file_var", "new_file");

        let new_file = context.get_variable_string(TRIGGER_NEW_FILE_VAR, "");
        if !new_file.is_empty() {
            context.set_variable(new_file_var, new_file);
        }

        let mut data = Map::new();
        data.insert("watch_folder".into(), json!(watch_folder));
        data.insert("file_pattern".into(), json!(file_pattern));
        ActionResult::success(format!("folder watch trigger: {watch_folder} / pattern: {file_pattern}")).with_data(data)
    }
}
