//! Persistence and validation of answers.
//! The values resolved during a run can be written out and fed back with
//! `--use-file`; an answer file is then checked for every key the run took
//! from defaults.

use crate::context::Variables;
use crate::error::{Error, Result};
use crate::session::Session;
use indexmap::IndexSet;
use log::debug;
use std::path::Path;

/// Returns the used keys absent from `answers`, in the order they were used.
pub fn missing_keys(used_keys: &IndexSet<String>, answers: &Variables) -> Vec<String> {
    used_keys.iter().filter(|key| !answers.contains_key(*key)).cloned().collect()
}

/// Fails with every used key that the answer file does not define.
///
/// # Errors
/// * `Error::MissingAnswersError` listing all missing keys
pub fn validate_answers<P: AsRef<Path>>(
    answer_file: P,
    answers: &Variables,
    session: &Session,
) -> Result<()> {
    let keys = missing_keys(&session.used_keys(), answers);
    if keys.is_empty() {
        return Ok(());
    }
    Err(Error::MissingAnswersError { answer_file: answer_file.as_ref().display().to_string(), keys })
}

/// Writes every value resolved during the run as a JSON answer file.
pub fn write_answers<P: AsRef<Path>>(path: P, session: &Session) -> Result<()> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(&session.user_input())?;
    debug!("Writing answers to '{}'", path.display());
    std::fs::write(path, content + "\n")?;
    Ok(())
}
