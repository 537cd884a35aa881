//! User input and interaction handling.
//! The binder only needs an "ask once, return typed value" contract, so the
//! terminal widgets live behind the `Prompter` trait.

use crate::error::{Error, Result};
use dialoguer::{Confirm, Input, Select};
use serde_json::Value;

/// Interactive source of variable values.
pub trait Prompter: Send + Sync {
    /// Asks for the value of `key`.
    ///
    /// The type of `default` picks the widget: a boolean asks yes/no, a list
    /// offers its elements as choices, a number only accepts numbers and
    /// anything else is free text.
    fn ask(&self, key: &str, default: &Value) -> Result<Value>;

    /// Asks a yes/no question.
    fn confirm(&self, question: &str, default: bool) -> Result<bool>;
}

/// Terminal prompter built on dialoguer.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

/// Text shown for a value inside a prompt.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_number(input: &str) -> Option<Value> {
    let input = input.trim();
    if let Ok(n) = input.parse::<i64>() {
        return Some(Value::from(n));
    }
    input.parse::<f64>().ok().and_then(|f| serde_json::Number::from_f64(f).map(Value::Number))
}

fn prompt_error(e: dialoguer::Error) -> Error {
    Error::PromptError(e.to_string())
}

impl Prompter for DialoguerPrompter {
    fn ask(&self, key: &str, default: &Value) -> Result<Value> {
        match default {
            Value::Bool(b) => self.confirm(key, *b).map(Value::Bool),
            Value::Array(choices) => {
                let items: Vec<String> = choices.iter().map(display_value).collect();
                let selection = Select::new()
                    .with_prompt(key)
                    .default(0)
                    .items(&items)
                    .interact()
                    .map_err(prompt_error)?;
                Ok(choices[selection].clone())
            }
            Value::Number(n) => {
                let input: String = Input::new()
                    .with_prompt(key)
                    .default(n.to_string())
                    .validate_with(|input: &String| -> std::result::Result<(), String> {
                        match parse_number(input) {
                            Some(_) => Ok(()),
                            None => Err(format!("'{input}' is not a number")),
                        }
                    })
                    .interact_text()
                    .map_err(prompt_error)?;
                parse_number(&input).ok_or_else(|| {
                    Error::PromptError(format!("'{input}' is not a number"))
                })
            }
            other => {
                let input: String = Input::new()
                    .with_prompt(key)
                    .default(display_value(other))
                    .allow_empty(true)
                    .interact_text()
                    .map_err(prompt_error)?;
                Ok(Value::String(input))
            }
        }
    }

    fn confirm(&self, question: &str, default: bool) -> Result<bool> {
        Confirm::new().with_prompt(question).default(default).interact().map_err(prompt_error)
    }
}
