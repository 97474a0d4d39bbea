//! Nested component provider scopes.

use crate::components::{Component, ComponentMap, default_components};
use std::sync::Arc;

/// Merges `inner` over `outer`: inner entries win, unset keys fall through.
pub fn merge_components(outer: &ComponentMap, inner: &ComponentMap) -> ComponentMap {
    let mut merged = outer.clone();
    for (key, component) in inner {
        merged.insert(key.clone(), Arc::clone(component));
    }
    merged
}

/// Stack of component scopes, outermost first.
#[derive(Clone)]
pub struct ComponentScopes {
    scopes: Vec<ComponentMap>,
}

impl ComponentScopes {
    /// Scopes whose outermost layer is [`default_components`].
    pub fn new() -> Self {
        Self::with_base(default_components())
    }

    /// Scopes starting from `base` instead of the defaults.
    pub fn with_base(base: ComponentMap) -> Self {
        Self { scopes: vec![base] }
    }

    /// Opens an inner scope.
    pub fn push(&mut self, scope: ComponentMap) {
        self.scopes.push(scope);
    }

    /// Closes the innermost scope. The base scope is never removed.
    pub fn pop(&mut self) -> Option<ComponentMap> {
        if self.scopes.len() > 1 {
            self.scopes.pop()
        } else {
            None
        }
    }

    /// Innermost component registered under `name`.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
    }

    /// A flat map with every scope applied.
    pub fn merged(&self) -> ComponentMap {
        self.scopes
            .iter()
            .fold(ComponentMap::new(), |acc, scope| merge_components(&acc, scope))
    }
}

impl Default for ComponentScopes {
    fn default() -> Self {
        Self::new()
    }
}
