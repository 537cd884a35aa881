//! Template directory handling.
//! A template is a directory holding the tree to render plus two optional
//! records: default variable values and identity metadata.

use crate::constants::{CONTENT_DIR, CONTEXT_FILE, METADATA_FILE};
use crate::context::{load_context_file, Variables};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identity of a template, passed through untouched.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Any other fields the metadata file carries
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

/// A template resolved from disk.
#[derive(Debug, Clone)]
pub struct Template {
    /// Template root directory
    pub root: PathBuf,
    /// Directory whose entries are rendered into the target
    pub content_dir: PathBuf,
    pub metadata: Metadata,
    /// Inline defaults, `None` when the template ships no context file
    pub context: Option<Variables>,
}

impl Template {
    /// Loads a template from its root directory.
    ///
    /// # Arguments
    /// * `root` - Template root holding `project.json`, `__metadata.json` and `template/`
    ///
    /// # Returns
    /// * `Result<Template>` - The loaded template
    ///
    /// # Errors
    /// * `Error::TemplateDoesNotExistsError` if the root is missing
    /// * `Error::TemplateError` if the root has no content directory
    /// * `Error::ContextError` if the context or metadata file is malformed
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Error::TemplateDoesNotExistsError {
                template_dir: root.display().to_string(),
            });
        }
        let root = root.canonicalize()?;

        let content_dir = root.join(CONTENT_DIR);
        if !content_dir.is_dir() {
            return Err(Error::TemplateError(format!(
                "'{}' has no '{}' directory",
                root.display(),
                CONTENT_DIR
            )));
        }

        let context = load_context_file(root.join(CONTEXT_FILE))?;
        let metadata = load_metadata(root.join(METADATA_FILE))?;

        debug!("Loaded template '{}'.", root.display());

        Ok(Self { root, content_dir, metadata, context })
    }

    /// Human readable name: the metadata name, else the root directory name.
    pub fn name(&self) -> String {
        self.metadata.name.clone().unwrap_or_else(|| {
            self.root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.root.display().to_string())
        })
    }
}

fn load_metadata(path: PathBuf) -> Result<Metadata> {
    if !path.exists() {
        return Ok(Metadata::default());
    }
    let content = std::fs::read_to_string(&path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::ContextError(format!("invalid metadata file '{}': {}", path.display(), e))
    })
}
