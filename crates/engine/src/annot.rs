//! Annotation — decorates successful matches with static metadata keyed by rule tags.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Hook invoked once per successful match that carries tags, after
/// `event.tags` has been attached to the record.
pub trait Annotator: Send + Sync {
    fn annotate(&self, record: &mut Map<String, Value>, tags: &[Value]);
}

/// Default annotator: a tag → static field table, populated from
/// `annotate=` rulebase lines.
#[derive(Debug, Default)]
pub struct RuleAnnotations {
    by_tag: HashMap<String, Vec<(String, Value)>>,
}

impl RuleAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a static field to add whenever a match carries `tag`.
    pub fn add(&mut self, tag: &str, field: &str, value: Value) {
        self.by_tag
            .entry(tag.to_string())
            .or_default()
            .push((field.to_string(), value));
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

impl Annotator for RuleAnnotations {
    fn annotate(&self, record: &mut Map<String, Value>, tags: &[Value]) {
        for tag in tags {
            let Value::String(tag) = tag else { continue };
            let Some(fields) = self.by_tag.get(tag) else {
                continue;
            };
            for (name, value) in fields {
                record.insert(name.clone(), value.clone());
            }
        }
    }
}
