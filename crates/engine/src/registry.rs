//! Action registry and dispatch.
//!
//! The registry maps an action-type identifier to its implementation. It is
//! built once at startup; dispatch itself is stateless beyond the table, so
//! concurrent calls using different contexts are independent.

use std::panic::{AssertUnwindSafe, catch_unwind};

use anyhow::{Result, bail};
use flowdeck_types::{ActionResult, ActionSpec};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::context::ExecutionContext;
use crate::contract::Action;

/// Table of registered action implementations keyed by type identifier.
#[derive(Default)]
pub struct ActionRegistry {
    actions: IndexMap<String, Box<dyn Action>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an action implementation.
    ///
    /// Fails when the action publishes an empty type identifier or when the
    /// identifier is already taken. Duplicate registration is an explicit
    /// error rather than a silent override so that a plugin set with clashing
    /// identifiers is caught at startup, not at dispatch time.
    pub fn register(&mut self, action: Box<dyn Action>) -> Result<()> {
        let action_type = action.spec().action_type;
        if action_type.trim().is_empty() {
            bail!("action registration rejected: empty type identifier");
        }
        if self.actions.contains_key(&action_type) {
            bail!("duplicate action type identifier detected: '{action_type}'");
        }
        debug!(action_type = %action_type, "action registered");
        self.actions.insert(action_type, action);
        Ok(())
    }

    /// Looks up an implementation by type identifier.
    pub fn get(&self, action_type: &str) -> Option<&dyn Action> {
        self.actions.get(action_type).map(Box::as_ref)
    }

    /// Published metadata of every registered action, in registration order.
    pub fn specs(&self) -> Vec<ActionSpec> {
        self.actions.values().map(|action| action.spec()).collect()
    }

    /// Registered actions grouped by category, preserving registration order.
    pub fn categories(&self) -> IndexMap<String, Vec<ActionSpec>> {
        let mut categories: IndexMap<String, Vec<ActionSpec>> = IndexMap::new();
        for spec in self.specs() {
            let category = if spec.category.is_empty() { "other".to_string() } else { spec.category.clone() };
            categories.entry(category).or_default().push(spec);
        }
        categories
    }

    /// Expands `params` through the context and invokes the action.
    ///
    /// An unknown action type yields a FAILED result, not an error: the
    /// interpreter handles it like any other failure. A panic escaping the
    /// action is caught and converted to FAILED so a misbehaving plugin can
    /// never crash the run loop.
    pub fn execute(&self, action_type: &str, params: &Map<String, Value>, context: &mut ExecutionContext) -> ActionResult {
        let Some(action) = self.actions.get(action_type) else {
            return ActionResult::failure(format!("unknown action type: '{action_type}'"));
        };

        let expanded = context.expand_params(params);
        catch_unwind(AssertUnwindSafe(|| action.execute(&expanded, context))).unwrap_or_else(|payload| {
            // deref past the Box: coercing `&payload` would downcast the Box
            // itself and always miss the &str/String payload inside
            let detail = panic_message(payload.as_ref());
            warn!(action_type = %action_type, detail = %detail, "action panicked; converted to failed result");
            ActionResult::failure(format!("unexpected fault in action '{action_type}': {detail}"))
        })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "panic".to_string()
    }
}
