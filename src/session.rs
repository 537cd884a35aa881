//! Per-run state shared by the registry scope, the renderer and answer
//! persistence. One `Session` is created per template execution, so nothing
//! leaks between runs in the same process.

use crate::error::Error;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    /// Every value resolved so far, in resolution order
    user_input: IndexMap<String, Value>,
    /// Keys answered from defaults or stored answers
    used_keys: IndexSet<String>,
    /// Keys currently being resolved
    resolving: Vec<String>,
    failure: Option<Error>,
}

/// Accumulators of a single run.
#[derive(Debug, Default)]
pub struct Session {
    state: Mutex<State>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the memoized value of `key`, if it was already resolved.
    pub fn resolved(&self, key: &str) -> Option<Value> {
        self.state().user_input.get(key).cloned()
    }

    /// Memoizes a resolved value.
    pub fn record(&self, key: &str, value: Value) {
        self.state().user_input.insert(key.to_string(), value);
    }

    /// Marks `key` as answered without asking.
    pub fn mark_used(&self, key: &str) {
        self.state().used_keys.insert(key.to_string());
    }

    /// Pushes `key` onto the resolution stack.
    ///
    /// Returns `false` when `key` is already being resolved, which means its
    /// binding (transitively) gates on itself.
    pub fn enter(&self, key: &str) -> bool {
        let mut state = self.state();
        if state.resolving.iter().any(|k| k == key) {
            return false;
        }
        state.resolving.push(key.to_string());
        true
    }

    pub fn leave(&self, key: &str) {
        let mut state = self.state();
        if let Some(position) = state.resolving.iter().rposition(|k| k == key) {
            state.resolving.remove(position);
        }
    }

    /// Stores an error raised where it cannot be propagated directly
    /// (inside a template lookup). The first failure wins.
    pub fn fail(&self, err: Error) {
        let mut state = self.state();
        if state.failure.is_none() {
            state.failure = Some(err);
        }
    }

    pub fn take_failure(&self) -> Option<Error> {
        self.state().failure.take()
    }

    /// Snapshot of every value resolved during the run.
    pub fn user_input(&self) -> IndexMap<String, Value> {
        self.state().user_input.clone()
    }

    /// Snapshot of the keys answered from defaults or stored answers.
    pub fn used_keys(&self) -> IndexSet<String> {
        self.state().used_keys.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_in_resolution_order() {
        let session = Session::new();
        session.record("b", json!(2));
        session.record("a", json!(1));
        let keys: Vec<_> = session.user_input().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(session.resolved("a"), Some(json!(1)));
        assert_eq!(session.resolved("c"), None);
    }

    #[test]
    fn detects_reentrant_resolution() {
        let session = Session::new();
        assert!(session.enter("a"));
        assert!(session.enter("b"));
        assert!(!session.enter("a"));
        session.leave("b");
        session.leave("a");
        assert!(session.enter("a"));
    }

    #[test]
    fn keeps_first_failure() {
        let session = Session::new();
        session.fail(Error::PromptError("first".to_string()));
        session.fail(Error::PromptError("second".to_string()));
        let err = session.take_failure().unwrap();
        assert_eq!(err.to_string(), "Prompt error: first.");
        assert!(session.take_failure().is_none());
    }
}
