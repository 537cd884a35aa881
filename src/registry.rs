//! Variable registry consumed by the template engine.
//!
//! Every variable a template can reference is a [`Binding`] keyed by name.
//! Bindings are evaluated lazily, the first time a template looks the name
//! up, and the result is memoized in the run's [`Session`]. Prompting order
//! therefore follows the order in which the tree walk references variables.
//!
//! Built-in helpers are not stored here; they are minijinja globals (see
//! [`crate::functions`]). Context lookups take precedence over globals, so a
//! variable shadows a helper of the same name.

use crate::error::{Error, Result};
use crate::prompt::Prompter;
use crate::session::Session;
use indexmap::IndexMap;
use minijinja::value::{Object, Value as TemplateValue};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// How a registry entry produces its value.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Fixed value answered without asking. Consulting it records the key as
    /// used, so it can be checked against an answer file afterwards.
    Cached(Value),
    /// Asks the operator, seeded with `default`. When `gate` names a group
    /// toggle that resolves to false, the default choice is returned and the
    /// operator is never asked.
    Prompt { default: Value, gate: Option<String> },
    /// Yes/no switch of a variable group. Resolves to false without asking
    /// unless `ask` is set.
    Toggle { ask: bool },
}

/// Returns the value a variable takes when nobody is asked: the first
/// element of a list, the value itself otherwise.
pub fn default_choice(value: &Value) -> Value {
    match value {
        Value::Array(choices) => choices.first().cloned().unwrap_or(Value::Null),
        other => other.clone(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Name to binding table. Last writer wins.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    bindings: IndexMap<String, Binding>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `key`, returning the binding it replaced.
    pub fn register<K: Into<String>>(&mut self, key: K, binding: Binding) -> Option<Binding> {
        self.bindings.insert(key.into(), binding)
    }

    pub fn resolve(&self, key: &str) -> Option<&Binding> {
        self.bindings.get(key)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Produces the value of `key`.
    ///
    /// # Returns
    /// * `Ok(None)` - `key` is not bound
    /// * `Ok(Some(value))` - the memoized or freshly resolved value
    ///
    /// # Errors
    /// * `Error::PromptError` if asking the operator fails
    /// * `Error::TemplateError` if a binding's gate resolves back to itself
    pub fn evaluate(
        &self,
        key: &str,
        session: &Session,
        prompter: &dyn Prompter,
    ) -> Result<Option<Value>> {
        if let Some(value) = session.resolved(key) {
            return Ok(Some(value));
        }
        let Some(binding) = self.bindings.get(key) else {
            return Ok(None);
        };

        if !session.enter(key) {
            return Err(Error::TemplateError(format!("variable '{key}' is gated on itself")));
        }
        let value = self.evaluate_binding(key, binding, session, prompter);
        session.leave(key);

        let value = value?;
        session.record(key, value.clone());
        Ok(Some(value))
    }

    fn evaluate_binding(
        &self,
        key: &str,
        binding: &Binding,
        session: &Session,
        prompter: &dyn Prompter,
    ) -> Result<Value> {
        match binding {
            Binding::Cached(value) => {
                session.mark_used(key);
                Ok(value.clone())
            }
            Binding::Toggle { ask: false } => Ok(Value::Bool(false)),
            Binding::Toggle { ask: true } => prompter.confirm(key, false).map(Value::Bool),
            Binding::Prompt { default, gate } => {
                let open = match gate {
                    Some(gate) => {
                        self.evaluate(gate, session, prompter)?.is_some_and(|v| is_truthy(&v))
                    }
                    None => true,
                };
                if open {
                    prompter.ask(key, default)
                } else {
                    Ok(default_choice(default))
                }
            }
        }
    }
}

/// Read-only view of a bound registry handed to the template engine as its
/// root context.
pub struct Scope {
    registry: Arc<Registry>,
    session: Arc<Session>,
    prompter: Arc<dyn Prompter>,
}

impl Scope {
    pub fn new(registry: Arc<Registry>, session: Arc<Session>, prompter: Arc<dyn Prompter>) -> Self {
        Self { registry, session, prompter }
    }

    /// Wraps the scope into a template value.
    pub fn into_value(self) -> TemplateValue {
        TemplateValue::from_object(self)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").field("registry", &self.registry).finish_non_exhaustive()
    }
}

impl Object for Scope {
    fn get_value(self: &Arc<Self>, key: &TemplateValue) -> Option<TemplateValue> {
        let key = key.as_str()?;
        match self.registry.evaluate(key, &self.session, self.prompter.as_ref()) {
            Ok(value) => value.map(|v| TemplateValue::from_serialize(&v)),
            Err(err) => {
                // The engine only sees an undefined value; the renderer
                // reports the stored error instead.
                self.session.fail(err);
                None
            }
        }
    }
}
