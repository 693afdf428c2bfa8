//! Structured outcome of executing one action.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of an action execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// Not yet executed.
    Pending,
    /// Currently executing.
    Running,
    /// Executed and returned successfully.
    Success,
    /// Attempted but returned an error.
    Failed,
    /// Never dispatched (disabled, or inside a false conditional branch).
    Skipped,
}

impl ActionStatus {
    /// Lowercase wire label, also used in run logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Running => "running",
            ActionStatus::Success => "success",
            ActionStatus::Failed => "failed",
            ActionStatus::Skipped => "skipped",
        }
    }
}

/// Result of executing one action. Immutable once produced; the interpreter
/// records a flattened form into the execution context for later template
/// lookups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionResult {
    /// Final status of the execution.
    pub status: ActionStatus,
    /// Short human-readable summary of what happened.
    #[serde(default)]
    pub output: String,
    /// Captured standard output (command actions).
    #[serde(default)]
    pub stdout: String,
    /// Captured standard error (command actions).
    #[serde(default)]
    pub stderr: String,
    /// Process exit code; zero when not applicable.
    #[serde(default)]
    pub exit_code: i64,
    /// Populated when `status` is `Failed`.
    #[serde(default)]
    pub error_message: String,
    /// Action-specific structured payload, merged into the flattened form.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Default for ActionResult {
    fn default() -> Self {
        Self {
            status: ActionStatus::Pending,
            output: String::new(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            error_message: String::new(),
            data: Map::new(),
        }
    }
}

impl ActionResult {
    /// Successful result with a summary line.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Success,
            output: output.into(),
            ..Default::default()
        }
    }

    /// Failed result with an error message.
    pub fn failure(error_message: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Failed,
            error_message: error_message.into(),
            ..Default::default()
        }
    }

    /// Skipped result with a reason.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: ActionStatus::Skipped,
            output: reason.into(),
            ..Default::default()
        }
    }

    /// Attaches a structured data payload.
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Flattens the result into the shape stored in the execution context:
    /// the fixed fields at the top level with `data` entries merged over them,
    /// so `{{ step_id.field }}` resolves both kinds uniformly.
    pub fn to_flat(&self) -> Map<String, Value> {
        let mut flat = Map::new();
        flat.insert("status".into(), Value::String(self.status.as_str().into()));
        flat.insert("output".into(), Value::String(self.output.clone()));
        flat.insert("stdout".into(), Value::String(self.stdout.clone()));
        flat.insert("stderr".into(), Value::String(self.stderr.clone()));
        flat.insert("exit_code".into(), Value::from(self.exit_code));
        flat.insert("error_message".into(), Value::String(self.error_message.clone()));
        for (key, value) in &self.data {
            flat.insert(key.clone(), value.clone());
        }
        flat
    }
}
