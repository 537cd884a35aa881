//! Common constants used throughout the Stencil application.

/// Default variable values, stored at the template root
pub const CONTEXT_FILE: &str = "project.json";

/// Template identity record, stored at the template root
pub const METADATA_FILE: &str = "__metadata.json";

/// Directory holding the files that get rendered
pub const CONTENT_DIR: &str = "template";

/// Prefix of the scratch directory a template is staged into
pub const SCRATCH_PREFIX: &str = "stencil-use-template";

/// Environment variable overriding the template registry location
pub const TEMPLATE_DIR_ENV: &str = "STENCIL_TEMPLATE_DIR";

/// Registry location relative to the home directory
pub const DEFAULT_TEMPLATE_DIR: &str = ".stencil/templates";
