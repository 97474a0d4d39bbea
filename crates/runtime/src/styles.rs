//! Nested style scopes keyed by component name.

use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Style entries by component key. Values are usually style objects.
pub type StyleMap = BTreeMap<String, JsonValue>;

/// Merges `inner` over `outer`.
///
/// When both sides hold an object for a key the objects are unioned with
/// inner properties winning; otherwise the inner value replaces the outer.
pub fn merge_styles(outer: &StyleMap, inner: &StyleMap) -> StyleMap {
    let mut merged = outer.clone();
    for (key, value) in inner {
        let combined = match (merged.get(key), value) {
            (Some(JsonValue::Object(parent)), JsonValue::Object(child)) => {
                JsonValue::Object(merge_objects(parent, child))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    merged
}

fn merge_objects(
    parent: &Map<String, JsonValue>,
    child: &Map<String, JsonValue>,
) -> Map<String, JsonValue> {
    let mut merged = parent.clone();
    for (key, value) in child {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Stack of style scopes, outermost first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleScopes {
    scopes: Vec<StyleMap>,
}

impl StyleScopes {
    /// No styles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an inner scope.
    pub fn push(&mut self, scope: StyleMap) {
        self.scopes.push(scope);
    }

    /// Closes the innermost scope.
    pub fn pop(&mut self) -> Option<StyleMap> {
        self.scopes.pop()
    }

    /// Effective styles with every scope applied, outermost first.
    pub fn merged(&self) -> StyleMap {
        self.scopes
            .iter()
            .fold(StyleMap::new(), |acc, scope| merge_styles(&acc, scope))
    }
}
