//! Request-scoped values handed to every hook.

use serde_json::Value;
use std::{collections::HashMap, sync::Arc};

/// A cheap-to-clone bag of request-scoped keys.
///
/// The HTTP layer installs an empty context on every request. Middleware may add keys
/// (an authenticated principal, a tenant id) which hooks then read.
///
/// # Example
///
/// ```ignore
/// let ctx = Context::new().with("user", json!("alice"));
/// assert_eq!(ctx.get_str("user"), Some("alice"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    keys: Arc<HashMap<String, Value>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this context with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        Arc::make_mut(&mut self.keys).insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.keys.get(key)
    }

    /// Returns the value of `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clones_do_not_observe_later_inserts() {
        let base = Context::new().with("user", "alice");
        let mut copy = base.clone();
        copy.insert("role", json!("admin"));

        assert_eq!(base.get_str("user"), Some("alice"));
        assert!(!base.contains("role"));
        assert_eq!(copy.get("role"), Some(&json!("admin")));
    }
}
