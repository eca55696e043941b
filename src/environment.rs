use std::collections::HashMap;

use crate::value::Value;

/// A scope of bindings, chained to the scope it was opened in.
///
/// An environment only borrows its parent, so a parent always outlives the
/// scopes opened in it. Bindings are never removed.
#[derive(Debug, Default)]
pub struct Environment<'p> {
    bindings: HashMap<String, Value>,
    parent: Option<&'p Environment<'p>>,
}

impl<'p> Environment<'p> {
    pub fn new(parent: Option<&'p Environment<'p>>) -> Self {
        Self { bindings: HashMap::new(), parent }
    }

    pub fn root() -> Self {
        Self::new(None)
    }

    pub fn from_bindings(bindings: HashMap<String, Value>) -> Self {
        Self { bindings, parent: None }
    }

    /// Opens a new, empty scope whose lookups fall back to `self`.
    pub fn child(&'p self) -> Self {
        Self::new(Some(self))
    }

    /// Binds `name` in this scope only, shadowing any binding in a parent.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        tracing::trace!(%name, kind = %value.kind(), "binding");
        self.bindings.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut scope = Some(self);
        while let Some(environment) = scope {
            if let Some(value) = environment.bindings.get(name) {
                return Some(value);
            }
            scope = environment.parent;
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}
