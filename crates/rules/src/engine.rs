use std::sync::Arc;

use crate::context::RuleContext;
use crate::event::{EventHandler, RuleEvent};
use crate::rule::{Rule, RuleResult};

/// Outcome of one `execute` call: every rule's result, in evaluation order,
/// and whether a `halt` rule cut the run short.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub results: Vec<(String, RuleResult)>,
    pub halted: bool,
}

impl ExecutionReport {
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|(_, r)| r.passed)
    }
}

/// An engine owns an ordered set of rules for one engine kind and evaluates
/// them in descending priority order, awaiting each in turn. The substrate
/// is single-threaded cooperative: rules may suspend on I/O, but the engine
/// never assumes two rules run concurrently.
pub struct RuleEngine {
    rules: Vec<Arc<dyn Rule>>,
    handlers: Vec<EventHandler>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            handlers: Vec::new(),
        }
    }

    pub fn register_rule(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
        // Stable sort keeps declaration order among equal priorities — the
        // substrate's documented tie-break for same-priority rules.
        self.rules.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    pub fn on(&mut self, handler: EventHandler) {
        self.handlers.push(handler);
    }

    fn emit(&self, event: RuleEvent) {
        for handler in &self.handlers {
            handler(&event);
        }
    }

    /// Runs all enabled rules (or only those named in `rule_subset`) in
    /// descending priority, awaiting each, collecting results and side
    /// effects, short-circuiting on a rule that reports `halt`.
    pub async fn execute(
        &self,
        context: &mut RuleContext,
        rule_subset: Option<&[&str]>,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let mut passed = 0usize;

        for rule in &self.rules {
            if !rule.enabled() {
                continue;
            }
            if let Some(subset) = rule_subset {
                if !subset.contains(&rule.id()) {
                    continue;
                }
            }

            let result = rule.evaluate(context).await;

            if let Some(side_effects) = &result.side_effects {
                context.merge_side_effects(side_effects);
            }
            if result.passed {
                passed += 1;
            }
            if let Some(event) = RuleEvent::from_failure(rule.id(), &result) {
                self.emit(event);
            }

            let halt = result.halt;
            report.results.push((rule.id().to_string(), result));

            if halt {
                report.halted = true;
                self.emit(RuleEvent::RuleHalted {
                    rule_id: report.results.last().unwrap().0.clone(),
                });
                break;
            }
        }

        self.emit(RuleEvent::ExecutionCompleted {
            rules_run: report.results.len(),
            passed,
        });

        report
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlwaysPasses {
        id: &'static str,
        priority: i32,
    }

    #[async_trait]
    impl Rule for AlwaysPasses {
        fn id(&self) -> &str {
            self.id
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        async fn evaluate(&self, _context: &RuleContext) -> RuleResult {
            RuleResult::ok()
        }
    }

    struct AlwaysThrows;

    #[async_trait]
    impl Rule for AlwaysThrows {
        fn id(&self) -> &str {
            "throws"
        }
        fn priority(&self) -> i32 {
            50
        }
        async fn evaluate(&self, _context: &RuleContext) -> RuleResult {
            RuleResult::failed("boom")
        }
    }

    struct Halts;

    #[async_trait]
    impl Rule for Halts {
        fn id(&self) -> &str {
            "halts"
        }
        fn priority(&self) -> i32 {
            100
        }
        async fn evaluate(&self, _context: &RuleContext) -> RuleResult {
            RuleResult::ok().halting()
        }
    }

    #[tokio::test]
    async fn runs_rules_in_descending_priority_order() {
        let mut engine = RuleEngine::new();
        engine.register_rule(Arc::new(AlwaysPasses { id: "low", priority: 1 }));
        engine.register_rule(Arc::new(AlwaysPasses { id: "high", priority: 10 }));

        let mut ctx = RuleContext::new();
        let report = engine.execute(&mut ctx, None).await;

        assert_eq!(report.results[0].0, "high");
        assert_eq!(report.results[1].0, "low");
        assert!(report.all_passed());
    }

    #[tokio::test]
    async fn a_failing_rule_is_captured_not_propagated() {
        let mut engine = RuleEngine::new();
        engine.register_rule(Arc::new(AlwaysThrows));
        engine.register_rule(Arc::new(AlwaysPasses { id: "after", priority: 1 }));

        let mut ctx = RuleContext::new();
        let report = engine.execute(&mut ctx, None).await;

        // both rules ran: the failure did not halt evaluation
        assert_eq!(report.results.len(), 2);
        assert!(!report.all_passed());
    }

    #[tokio::test]
    async fn a_halting_rule_stops_lower_priority_rules() {
        let mut engine = RuleEngine::new();
        engine.register_rule(Arc::new(Halts));
        engine.register_rule(Arc::new(AlwaysPasses { id: "never-runs", priority: 1 }));

        let mut ctx = RuleContext::new();
        let report = engine.execute(&mut ctx, None).await;

        assert!(report.halted);
        assert_eq!(report.results.len(), 1);
    }

    #[tokio::test]
    async fn emits_rule_failed_event_to_handlers() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();

        let mut engine = RuleEngine::new();
        engine.on(Box::new(move |event| {
            if matches!(event, crate::RuleEvent::RuleFailed { .. }) {
                seen_clone.fetch_add(1, Ordering::SeqCst);
            }
        }));
        engine.register_rule(Arc::new(AlwaysThrows));

        let mut ctx = RuleContext::new();
        engine.execute(&mut ctx, None).await;

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
