//! Stencil is a project scaffolding engine.
//! It renders a template directory, both path names and file contents, into
//! a target directory, taking variable values from the template's defaults,
//! a stored answer file or interactive prompts.

/// Persistence and validation of answers
pub mod answers;

/// Binding of context layers into the variable registry
pub mod binder;

/// Command-line interface module for the Stencil application
pub mod cli;

/// Well-known file names and locations
pub mod constants;

/// Context layers: inline defaults and stored answers
pub mod context;

/// Error types and handling for the Stencil application
pub mod error;

/// Built-in helper functions and filters
pub mod functions;

/// Template lookup by path or registry tag
pub mod loader;

/// Rendering of a template tree
pub mod processor;

/// User input and interaction handling
pub mod prompt;

/// Variable registry exposed to the template engine
pub mod registry;

/// MiniJinja-based renderer
pub mod renderer;

/// Orchestration of a complete run
pub mod runner;

/// Per-run state
pub mod session;

/// Template loading and metadata
pub mod template;

/// Scratch-space staging and commit into the target
pub mod transaction;
