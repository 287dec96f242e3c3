use crate::rule::RuleResult;

/// Events the substrate emits to telemetry/handlers.
#[derive(Debug, Clone)]
pub enum RuleEvent {
    RuleFailed { rule_id: String, error: String },
    RuleHalted { rule_id: String },
    ExecutionCompleted { rules_run: usize, passed: usize },
}

impl RuleEvent {
    pub fn from_failure(rule_id: &str, result: &RuleResult) -> Option<Self> {
        result.error.as_ref().map(|error| RuleEvent::RuleFailed {
            rule_id: rule_id.to_string(),
            error: error.clone(),
        })
    }
}

/// A telemetry sink / event handler. Kept as a plain `Fn` rather than a
/// trait object over a network sink — the network sink itself is an
/// external collaborator (analytics, §1 out of scope).
pub type EventHandler = Box<dyn Fn(&RuleEvent) + Send + Sync>;
