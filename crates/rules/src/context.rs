use std::collections::HashMap;

use serde_json::Value;

/// A loosely typed bag of fields passed into rule evaluation. Engine kinds
/// disagree on what a "context" contains (a Learn-engine context carries a
/// skill and career; a Gamification-engine context carries XP deltas), so
/// the substrate itself stays untyped and callers pull out the fields they
/// registered.
#[derive(Debug, Clone, Default)]
pub struct RuleContext {
    fields: HashMap<String, Value>,
}

impl RuleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn merge_side_effects(&mut self, side_effects: &HashMap<String, Value>) {
        for (k, v) in side_effects {
            self.fields.insert(k.clone(), v.clone());
        }
    }
}
