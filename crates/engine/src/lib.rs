//! # Flowdeck Engine
//!
//! The Flowdeck engine loads flow documents and executes their actions
//! sequentially, substituting runtime variables into parameters and branching
//! on conditions.
//!
//! ## Key pieces
//!
//! - **`context`**: per-run variable/step-result store with `{{ ... }}`
//!   template expansion
//! - **`contract`**: the [`Action`](contract::Action) trait every plugin
//!   implements, plus shared parameter accessors
//! - **`registry`**: maps action-type identifiers to implementations and
//!   dispatches calls through the context
//! - **`runner`**: the sequential interpreter with conditional-skip
//!   semantics, fail-fast policy, run logging, and progress events
//! - **`document`**: flow document load/save and invariant validation
//!
//! ## Usage
//!
//! ```rust
//! use flowdeck_engine::{ActionRegistry, FlowRunner, NullObserver, WorkspaceDirs};
//! use flowdeck_types::Flow;
//!
//! let base = tempfile::tempdir()?;
//! let dirs = WorkspaceDirs::ensure(base.path())?;
//! let runner = FlowRunner::new(ActionRegistry::new(), dirs.logs.clone());
//! let report = runner.run(&Flow { name: "empty".into(), ..Default::default() }, &NullObserver)?;
//! assert!(report.success);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod context;
pub mod contract;
pub mod document;
pub mod events;
pub mod registry;
pub mod runner;
pub mod workspace;

pub use context::ExecutionContext;
pub use context::value_to_string;
pub use contract::{Action, CONDITION_ENDIF, CONDITION_IF, bool_param, number_param, string_param, string_param_or};
pub use document::{load_flow, save_flow, validate_flow};
pub use events::{ChannelObserver, NullObserver, RunEvent, RunObserver};
pub use registry::ActionRegistry;
pub use runner::{FlowRunner, RunReport, StepRecord, StopToken};
pub use workspace::WorkspaceDirs;
