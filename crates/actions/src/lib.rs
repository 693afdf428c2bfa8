//! # Flowdeck Built-in Actions
//!
//! The twenty built-in action types, grouped by category: file operations,
//! command execution, variable processing, conditional branching, and trigger
//! declarations. [`register_builtin_actions`] installs the full set into a
//! registry; hosts that want a curated subset register modules individually.

pub mod command;
pub mod condition;
mod expr;
pub mod fs;
pub mod trigger;
pub mod variable;

use anyhow::Result;
use flowdeck_engine::ActionRegistry;

/// Registers every built-in action. Fails if any type identifier is already
/// taken in `registry`.
pub fn register_builtin_actions(registry: &mut ActionRegistry) -> Result<()> {
    fs::register(registry)?;
    command::register(registry)?;
    variable::register(registry)?;
    condition::register(registry)?;
    trigger::register(registry)?;
    Ok(())
}

/// Fresh registry holding exactly the built-in set.
pub fn builtin_registry() -> Result<ActionRegistry> {
    let mut registry = ActionRegistry::new();
    register_builtin_actions(&mut registry)?;
    Ok(registry)
}
