//! External command execution.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::Result;
use flowdeck_engine::{Action, ActionRegistry, ExecutionContext, bool_param, number_param, string_param};
use flowdeck_types::{ActionResult, ActionSpec, ParamKind, ParamSpec};
use flowdeck_util::{block_on_future, split_command_line, truncate_preview};
use serde_json::{Map, Value};
use tracing::debug;

const CATEGORY: &str = "command";

/// Registers the `command.run` action.
pub fn register(registry: &mut ActionRegistry) -> Result<()> {
    registry.register(Box::new(RunCommand))
}

struct RunCommand;

impl Action for RunCommand {
    fn spec(&self) -> ActionSpec {
        ActionSpec::new("command.run", "Run command", "Runs an external command and captures its output.", CATEGORY)
            .param(ParamSpec::new("command", "Command", ParamKind::String).required())
            .param(
                ParamSpec::new("working_dir", "Working directory", ParamKind::String)
                    .describe("Directory the command runs in; empty means the current directory"),
            )
            .param(
                ParamSpec::new("timeout", "Timeout (seconds)", ParamKind::Number)
                    .with_default("60")
                    .describe("Seconds before the command is killed; 0 disables the timeout"),
            )
            .param(
                ParamSpec::new("shell", "Run through shell", ParamKind::Bool)
                    .with_default(true)
                    .describe("Pass the command line to the system shell instead of splitting it"),
            )
            .param(
                ParamSpec::new("output_var", "Output variable", ParamKind::String)
                    .describe("Variable receiving trimmed stdout; empty disables the binding"),
            )
    }

    fn execute(&self, params: &Map<String, Value>, context: &mut ExecutionContext) -> ActionResult {
        let command = string_param(params, "command").trim().to_string();
        let working_dir = string_param(params, "working_dir").trim().to_string();
        let timeout_secs = number_param(params, "timeout", 60.0);
        let use_shell = bool_param(params, "shell", true);
        let output_var = string_param(params, "output_var").trim().to_string();

        if command.is_empty() {
            return ActionResult::failure("no command given");
        }
        if !working_dir.is_empty() && !Path::new(&working_dir).exists() {
            return ActionResult::failure(format!("working directory does not exist: {working_dir}"));
        }

        let mut cmd = if use_shell {
            shell_command(&command)
        } else {
            let words = split_command_line(&command);
            let Some((program, args)) = words.split_first() else {
                return ActionResult::failure("no command given");
            };
            let mut cmd = tokio::process::Command::new(program);
            cmd.args(args);
            cmd
        };
        if !working_dir.is_empty() {
            cmd.current_dir(&working_dir);
        }
        cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);

        debug!(command = %command, shell = use_shell, "spawning command");
        let timeout = (timeout_secs > 0.0).then(|| Duration::from_secs_f64(timeout_secs));
        let captured = block_on_future(async move {
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, cmd.output()).await {
                    Ok(output) => Ok(Some(output)),
                    Err(_) => Ok(None),
                },
                None => Ok(Some(cmd.output().await)),
            }
        });

        let output = match captured {
            Ok(Some(Ok(output))) => output,
            Ok(Some(Err(error))) => return ActionResult::failure(format!("command failed to start: {error}")),
            Ok(None) => return ActionResult::failure(format!("command timed out after {timeout_secs}s")),
            Err(error) => return ActionResult::failure(format!("command execution error: {error}")),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = i64::from(output.status.code().unwrap_or(-1));

        if !output_var.is_empty() {
            context.set_variable(output_var, stdout.trim().to_string());
        }

        let mut summary = format!("exit code: {exit_code}");
        if !stdout.is_empty() {
            summary.push_str(&format!("\nstdout: {}", truncate_preview(&stdout, 200)));
        }

        ActionResult {
            status: if output.status.success() {
                flowdeck_types::ActionStatus::Success
            } else {
                flowdeck_types::ActionStatus::Failed
            },
            output: summary,
            stdout,
            stderr,
            exit_code,
            error_message: if output.status.success() { String::new() } else { format!("exit code: {exit_code}") },
            data: Map::new(),
        }
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
