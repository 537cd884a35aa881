//! Error handling for the Stencil application.
//! Defines custom error types and results used throughout the application.

use std::io;
use thiserror::Error;

/// Custom error types for Stencil operations.
///
/// This enum represents all possible errors that can occur while binding,
/// rendering and committing a template.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Represents failures while walking the template tree
    #[error("Failed to walk template directory: {0}.")]
    WalkError(#[from] walkdir::Error),

    /// Represents errors raised by the template engine (syntax errors,
    /// undefined placeholders, failing helper calls)
    #[error("Template rendering error: {0}.")]
    MinijinjaError(#[from] minijinja::Error),

    /// Represents errors that occur during template processing
    #[error("Template error: {0}.")]
    TemplateError(String),

    #[error("Template '{template_dir}' does not exist.")]
    TemplateDoesNotExistsError { template_dir: String },

    /// Represents malformed context, metadata or answer files
    #[error("Configuration error: {0}.")]
    ContextError(String),

    /// An explicitly supplied answer file could not be loaded
    #[error("Could not read answer file '{answer_file}': {reason}.")]
    AnswerFileError { answer_file: String, reason: String },

    /// The directory that should contain the target does not exist
    #[error("Parent directory '{parent_dir}' doesn't exist.")]
    ParentDirectoryMissing { parent_dir: String },

    /// Represents failures of the interactive prompt
    #[error("Prompt error: {0}.")]
    PromptError(String),

    /// Keys consulted during rendering that the answer file does not define
    #[error(
        "Missing values in '{answer_file}', please define: {}.",
        keys.join(", ")
    )]
    MissingAnswersError { answer_file: String, keys: Vec<String> },

    #[error("Failed to serialize answers: {0}.")]
    SerializationError(#[from] serde_json::Error),
}

/// Convenience type alias for Results with Error as the error type.
///
/// # Type Parameters
/// * `T` - The type of the success value
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
