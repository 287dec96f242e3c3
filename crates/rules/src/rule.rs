use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RuleContext;

/// Result of a single rule evaluation.
#[derive(Debug, Clone, Default)]
pub struct RuleResult {
    pub passed: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub side_effects: Option<HashMap<String, Value>>,
    /// When true, the engine stops evaluating lower-priority rules.
    pub halt: bool,
}

impl RuleResult {
    pub fn ok() -> Self {
        Self {
            passed: true,
            ..Default::default()
        }
    }

    pub fn ok_with_data(data: Value) -> Self {
        Self {
            passed: true,
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn halting(mut self) -> Self {
        self.halt = true;
        self
    }

    pub fn with_side_effects(mut self, side_effects: HashMap<String, Value>) -> Self {
        self.side_effects = Some(side_effects);
        self
    }
}

/// A single rule: `{ id, priority, enabled, evaluate(context) -> RuleResult }`.
#[async_trait]
pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn priority(&self) -> i32;
    fn enabled(&self) -> bool {
        true
    }
    async fn evaluate(&self, context: &RuleContext) -> RuleResult;
}
