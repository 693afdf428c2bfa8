//! Strongly typed flow schema definitions shared across the engine, the
//! built-in actions, the trigger manager, and the CLI.
//!
//! The models defined here intentionally preserve authoring order (via
//! `IndexMap`) so that a flow executes its actions exactly in the sequence the
//! author arranged them, and so that editors can render parameters in a
//! predictable order.

pub mod flow;
pub mod result;
pub mod schema;
pub mod trigger;

pub use flow::{ActionDef, Flow};
pub use result::{ActionResult, ActionStatus};
pub use schema::{ActionSpec, ParamKind, ParamSpec};
pub use trigger::{FolderWatchTriggerConfig, ScheduleKind, ScheduleTriggerConfig, TriggerConfig};
