//! Template lookup.
//! A template argument is either a path to a template directory or the tag
//! of a template installed in the local template registry.
use crate::constants::{DEFAULT_TEMPLATE_DIR, TEMPLATE_DIR_ENV};
use crate::error::{Error, Result};
use log::debug;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Represents the source location of a template.
#[derive(Debug, PartialEq)]
pub enum TemplateSource {
    /// Local filesystem template path
    FileSystem(PathBuf),
    /// Tag of a template in the registry directory
    Registry(String),
}

impl std::fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateSource::FileSystem(path) => {
                write!(f, "local path: '{}'", path.display())
            }
            TemplateSource::Registry(tag) => write!(f, "template registry: '{tag}'"),
        }
    }
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("template tag pattern is valid")
    })
}

/// Returns true if `s` can name a template in the registry.
pub fn is_template_tag(s: &str) -> bool {
    tag_pattern().is_match(s)
}

impl TemplateSource {
    /// Creates a TemplateSource from a path or tag.
    ///
    /// Existing paths win over tags, so `./docs` and `docs` both load a local
    /// `docs` directory when one exists.
    pub fn from_string(s: &str) -> Self {
        if !Path::new(s).exists() && is_template_tag(s) {
            Self::Registry(s.to_string())
        } else {
            Self::FileSystem(PathBuf::from(s))
        }
    }
}

/// Trait for loading templates from different sources.
pub trait TemplateLoader {
    /// Returns the root directory of the template.
    fn load(&self) -> Result<PathBuf>;
}

/// Loader for templates from the local filesystem.
pub struct LocalLoader<P: AsRef<Path>> {
    path: P,
}

impl<P: AsRef<Path>> LocalLoader<P> {
    /// Creates a new LocalLoader instance.
    pub fn new(path: P) -> Self {
        Self { path }
    }
}

impl<P: AsRef<Path>> TemplateLoader for LocalLoader<P> {
    /// # Errors
    /// * `Error::TemplateDoesNotExistsError` if path doesn't exist
    fn load(&self) -> Result<PathBuf> {
        let path = self.path.as_ref();
        if !path.is_dir() {
            return Err(Error::TemplateDoesNotExistsError {
                template_dir: path.display().to_string(),
            });
        }

        Ok(path.to_path_buf())
    }
}

/// Loader for templates installed in the registry directory.
pub struct RegistryLoader<S: AsRef<str>> {
    registry_dir: PathBuf,
    tag: S,
}

impl<S: AsRef<str>> RegistryLoader<S> {
    pub fn new(registry_dir: PathBuf, tag: S) -> Self {
        Self { registry_dir, tag }
    }
}

impl<S: AsRef<str>> TemplateLoader for RegistryLoader<S> {
    /// # Errors
    /// * `Error::TemplateDoesNotExistsError` if no template has this tag
    fn load(&self) -> Result<PathBuf> {
        let path = self.registry_dir.join(self.tag.as_ref());
        debug!("Looking up '{}' in '{}'.", self.tag.as_ref(), self.registry_dir.display());
        if !path.is_dir() {
            return Err(Error::TemplateDoesNotExistsError { template_dir: path.display().to_string() });
        }
        Ok(path)
    }
}

/// Location of the template registry: `$STENCIL_TEMPLATE_DIR`, else
/// `$HOME/.stencil/templates`.
pub fn registry_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(TEMPLATE_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
    home.join(DEFAULT_TEMPLATE_DIR)
}

/// Returns the template directory for a template argument.
pub fn load_template<S: AsRef<str>>(template: S) -> Result<PathBuf> {
    let source = TemplateSource::from_string(template.as_ref());
    debug!("Using template from the {source}");

    let loader: Box<dyn TemplateLoader> = match source {
        TemplateSource::Registry(tag) => Box::new(RegistryLoader::new(registry_dir(), tag)),
        TemplateSource::FileSystem(path) => Box::new(LocalLoader::new(path)),
    };

    loader.load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_template_source_display() {
        let fs_source = TemplateSource::FileSystem(PathBuf::from("/path/to/template"));
        assert_eq!(format!("{}", fs_source), "local path: '/path/to/template'");

        let registry_source = TemplateSource::Registry("rust-cli".to_string());
        assert_eq!(format!("{}", registry_source), "template registry: 'rust-cli'");
    }

    #[test]
    fn test_template_source_from_string() {
        assert_eq!(
            TemplateSource::from_string("no-such-template-here"),
            TemplateSource::Registry("no-such-template-here".to_string())
        );
        assert_eq!(
            TemplateSource::from_string("./local/path"),
            TemplateSource::FileSystem(PathBuf::from("./local/path"))
        );

        let dir = TempDir::new().unwrap();
        let existing = dir.path().to_str().unwrap();
        assert_eq!(
            TemplateSource::from_string(existing),
            TemplateSource::FileSystem(PathBuf::from(existing))
        );
    }

    #[test]
    fn test_tags() {
        assert!(is_template_tag("rust-cli"));
        assert!(is_template_tag("v1.2_web"));
        assert!(!is_template_tag("../escape"));
        assert!(!is_template_tag("a/b"));
        assert!(!is_template_tag(""));
    }

    #[test]
    fn test_registry_loader() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("web")).unwrap();

        let loaded = RegistryLoader::new(dir.path().to_path_buf(), "web").load().unwrap();
        assert_eq!(loaded, dir.path().join("web"));

        let err = RegistryLoader::new(dir.path().to_path_buf(), "api").load().unwrap_err();
        assert!(matches!(err, Error::TemplateDoesNotExistsError { .. }));
    }

    #[test]
    fn test_local_loader() {
        let dir = TempDir::new().unwrap();
        assert_eq!(LocalLoader::new(dir.path()).load().unwrap(), dir.path());
        assert!(LocalLoader::new(dir.path().join("missing")).load().is_err());
    }
}
