//! Variable sources for a template run.
//! Handles the inline defaults shipped with a template and the stored answers
//! an operator can supply from a previous run.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use std::path::Path;

/// Ordered mapping from variable name to its default (scalar, list or group).
pub type Variables = IndexMap<String, serde_json::Value>;

/// The two layers the binder merges, in binding order.
#[derive(Debug, Default, Clone)]
pub struct ContextLayers {
    /// Inline defaults loaded from the template's own context file
    pub defaults: Option<Variables>,
    /// Stored answers loaded from an operator supplied answer file
    pub stored: Option<Variables>,
}

impl ContextLayers {
    pub fn new(defaults: Option<Variables>, stored: Option<Variables>) -> Self {
        Self { defaults, stored }
    }

    /// Iterates the present layers, defaults first.
    pub fn iter(&self) -> impl Iterator<Item = &Variables> {
        [self.defaults.as_ref(), self.stored.as_ref()].into_iter().flatten()
    }
}

/// Parses a variables record, trying JSON first and YAML second.
///
/// # Arguments
/// * `content` - Raw file content
///
/// # Returns
/// * `std::result::Result<Variables, String>` - Parsed variables or the parser message
pub fn parse_variables(content: &str) -> std::result::Result<Variables, String> {
    match serde_json::from_str(content) {
        Ok(variables) => Ok(variables),
        Err(json_err) => serde_yaml::from_str(content)
            .map_err(|yaml_err| format!("not valid JSON ({json_err}) or YAML ({yaml_err})")),
    }
}

/// Loads the template's inline defaults.
///
/// A missing file means the template has no defaults. An unreadable or
/// malformed file is a configuration error.
pub fn load_context_file<P: AsRef<Path>>(path: P) -> Result<Option<Variables>> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("No context file at '{}'.", path.display());
        return Ok(None);
    }

    debug!("Loading context from '{}'.", path.display());
    let content = std::fs::read_to_string(path)?;
    parse_variables(&content).map(Some).map_err(|reason| {
        Error::ContextError(format!("invalid context file '{}': {}", path.display(), reason))
    })
}

/// Loads an answer file explicitly supplied by the operator.
///
/// Unlike the context file, a missing answer file is fatal.
pub fn load_answer_file<P: AsRef<Path>>(path: P) -> Result<Variables> {
    let path = path.as_ref();
    let answer_file = path.display().to_string();

    debug!("Loading stored answers from '{answer_file}'.");
    let content = std::fs::read_to_string(path).map_err(|e| Error::AnswerFileError {
        answer_file: answer_file.clone(),
        reason: e.to_string(),
    })?;

    parse_variables(&content).map_err(|reason| Error::AnswerFileError { answer_file, reason })
}
