//! Sequential flow interpreter.
//!
//! The run loop walks the ordered action list exactly once, maintaining a
//! boolean skip-stack for nested IF/ENDIF conditionals, a cooperative stop
//! token checked at step boundaries, and a fresh [`ExecutionContext`] per run.
//! A FAILED step halts the run (fail-fast); a SKIPPED step never does. Every
//! processed step is recorded into a per-run log file and reported through
//! the [`RunObserver`] seam.
//!
//! The "condition met" signal of a `condition.if` step is inferred from its
//! own result status: SUCCESS means true, FAILED means false. The value
//! pushed onto the skip-stack is the negation of condition truth, since it
//! answers "should subsequent steps be skipped".

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use flowdeck_types::{ActionDef, ActionResult, ActionStatus, Flow};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use flowdeck_util::{sanitize_file_stem, truncate_preview};

use crate::context::ExecutionContext;
use crate::contract::{CONDITION_ENDIF, CONDITION_IF};
use crate::events::{RunEvent, RunObserver};
use crate::registry::ActionRegistry;

/// Longest stdout/stderr excerpt copied into the run log.
const OUTPUT_PREVIEW_CHARS: usize = 500;

/// Cooperative cancellation signal for a flow run.
///
/// Cloneable; checked by the interpreter only at step boundaries, so an
/// in-flight action finishes naturally before the stop takes effect.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    /// Fresh, unsignalled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the run stop at the next step boundary.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// One processed step: definition plus outcome, in list order.
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// Zero-based position in the action list.
    pub index: usize,
    /// Raw step definition.
    pub action: ActionDef,
    /// Structured outcome.
    pub result: ActionResult,
}

/// Outcome of one flow run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// True only if every recorded result is SUCCESS or SKIPPED. A FAILED
    /// step anywhere makes the run unsuccessful even if later steps never ran.
    pub success: bool,
    /// Per-run log file location.
    pub log_path: PathBuf,
    /// Every processed step, in order; steps after an early termination are absent.
    pub steps: Vec<StepRecord>,
}

/// The flow interpreter: owns the action registry, the log directory, and the
/// stop token shared with hosts.
pub struct FlowRunner {
    registry: ActionRegistry,
    logs_dir: PathBuf,
    stop: StopToken,
}

impl FlowRunner {
    /// Creates a runner writing per-run logs under `logs_dir`.
    pub fn new(registry: ActionRegistry, logs_dir: PathBuf) -> Self {
        Self {
            registry,
            logs_dir,
            stop: StopToken::new(),
        }
    }

    /// Read access to the registry (editor metadata surface).
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Token hosts use to request a cooperative stop.
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    /// Runs a flow with an empty seed set.
    pub fn run(&self, flow: &Flow, observer: &dyn RunObserver) -> Result<RunReport> {
        self.run_with_seed(flow, IndexMap::new(), observer)
    }

    /// Runs a flow, seeding extra variables into the fresh context before the
    /// first step (used by trigger firings, e.g. `__trigger_new_file__`).
    pub fn run_with_seed(
        &self,
        flow: &Flow,
        seed_variables: IndexMap<String, Value>,
        observer: &dyn RunObserver,
    ) -> Result<RunReport> {
        self.stop.reset();

        let mut context = ExecutionContext::new();
        for (name, value) in seed_variables {
            context.set_variable(name, value);
        }

        let flow_name = flow.display_name().to_string();
        let total = flow.actions.len();
        let log_path = self.log_path_for(&flow_name);
        let mut log = RunLog::default();

        info!(flow = %flow_name, actions = total, "flow run started");
        log.write(observer, format!("=== flow start: {flow_name} ==="));
        log.write(observer, format!("actions: {total}"));

        let mut records: Vec<StepRecord> = Vec::with_capacity(total);
        let mut skip_stack: Vec<bool> = Vec::new();

        for (index, action) in flow.actions.iter().enumerate() {
            if self.stop.is_requested() {
                log.write(observer, "--- run stopped by request ---".to_string());
                break;
            }

            let step_id = if action.id.is_empty() { format!("step_{index}") } else { action.id.clone() };
            let step_name = action.display_name().to_string();
            let position = format!("[{}/{}]", index + 1, total);

            // ENDIF pairs with the nearest open IF and is processed even
            // while skipping; popping an empty stack is a tolerated no-op.
            if action.action_type == CONDITION_ENDIF {
                skip_stack.pop();
                let result = ActionResult::success("ENDIF");
                context.set_step_result(&step_id, result.to_flat());
                log.write(observer, format!("{position} ENDIF: {step_name}"));
                record_step(&mut records, observer, index, action, result);
                continue;
            }

            if skip_stack.last().copied().unwrap_or(false) {
                let result = ActionResult::skipped("skipped by conditional branch");
                context.set_step_result(&step_id, result.to_flat());
                log.write(observer, format!("{position} skipped: {step_name}"));
                record_step(&mut records, observer, index, action, result);
                continue;
            }

            if !action.enabled {
                let result = ActionResult::skipped("disabled");
                context.set_step_result(&step_id, result.to_flat());
                log.write(observer, format!("{position} disabled: {step_name}"));
                record_step(&mut records, observer, index, action, result);
                continue;
            }

            observer.on_event(&RunEvent::StepStarted {
                index,
                action: action.clone(),
            });
            log.write(
                observer,
                format!("{position} started: {step_name} (type={})", action.action_type),
            );
            debug!(step = %step_id, action_type = %action.action_type, "step dispatch");
            let started_at = Instant::now();

            let params = action.params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            let result = self.registry.execute(&action.action_type, &params, &mut context);

            let elapsed = started_at.elapsed().as_secs_f64();
            context.set_step_result(&step_id, result.to_flat());

            if action.action_type == CONDITION_IF {
                let condition_met = result.status == ActionStatus::Success;
                // Pushed value answers "skip subsequent steps?", the negation
                // of condition truth.
                skip_stack.push(!condition_met);
                let verdict = if condition_met { "TRUE (run)" } else { "FALSE (skip)" };
                log.write(observer, format!("{position} IF condition: {step_name} -> {verdict} ({elapsed:.3}s)"));
            } else {
                log.write(
                    observer,
                    format!("{position} completed: {step_name} -> {} ({elapsed:.3}s)", result.status.as_str()),
                );
            }

            if !result.stdout.is_empty() {
                log.write(observer, format!("  stdout: {}", truncate_preview(&result.stdout, OUTPUT_PREVIEW_CHARS)));
            }
            if !result.stderr.is_empty() {
                log.write(observer, format!("  stderr: {}", truncate_preview(&result.stderr, OUTPUT_PREVIEW_CHARS)));
            }
            if !result.error_message.is_empty() {
                log.write(observer, format!("  error: {}", result.error_message));
            }

            let failed = result.status == ActionStatus::Failed && action.action_type != CONDITION_IF;
            if result.status == ActionStatus::Failed {
                warn!(step = %step_id, action_type = %action.action_type, "step failed");
            }
            record_step(&mut records, observer, index, action, result);

            if failed {
                log.write(observer, "--- stopping run after failure ---".to_string());
                break;
            }
        }

        log.write(observer, format!("=== flow end: {flow_name} ==="));

        if let Err(error) = self.persist_log(&log, &log_path) {
            warn!(path = %log_path.display(), error = %error, "run log write failed");
            log.write(observer, format!("failed to write run log: {error}"));
        }

        let success = records
            .iter()
            .all(|record| matches!(record.result.status, ActionStatus::Success | ActionStatus::Skipped));
        info!(flow = %flow_name, steps = records.len(), success, "flow run finished");

        observer.on_event(&RunEvent::FlowCompleted {
            success,
            log_path: log_path.clone(),
        });

        Ok(RunReport {
            success,
            log_path,
            steps: records,
        })
    }

    fn log_path_for(&self, flow_name: &str) -> PathBuf {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        self.logs_dir.join(format!("{timestamp}_{}.log", sanitize_file_stem(flow_name)))
    }

    fn persist_log(&self, log: &RunLog, log_path: &PathBuf) -> Result<()> {
        fs::create_dir_all(&self.logs_dir).with_context(|| format!("failed to create log directory {}", self.logs_dir.display()))?;
        fs::write(log_path, log.rendered()).with_context(|| format!("failed to write run log {}", log_path.display()))
    }
}

fn record_step(records: &mut Vec<StepRecord>, observer: &dyn RunObserver, index: usize, action: &ActionDef, result: ActionResult) {
    observer.on_event(&RunEvent::StepCompleted {
        index,
        action: action.clone(),
        result: result.clone(),
    });
    records.push(StepRecord {
        index,
        action: action.clone(),
        result,
    });
}

/// Timestamped line buffer flushed to disk at run end.
#[derive(Default)]
struct RunLog {
    lines: Vec<String>,
}

impl RunLog {
    fn write(&mut self, observer: &dyn RunObserver, message: String) {
        let line = format!("[{}] {message}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        observer.on_event(&RunEvent::LogLine(line.clone()));
        self.lines.push(line);
    }

    fn rendered(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}
