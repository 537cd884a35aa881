//! Renders a template tree into an output directory.
//! Every entry's relative path is rendered to get its destination; files
//! additionally have their contents rendered. Nothing is written until the
//! rendered result has been inspected.

use log::debug;
use std::fs::{self, Permissions};
use std::io;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use walkdir::WalkDir;

use crate::{
    error::{Error, Result},
    renderer::TemplateRenderer,
    session::Session,
};
use minijinja::value::Value;

/// Represents the type of operation to be performed on a file or directory
#[derive(Debug, PartialEq)]
pub enum FileOperation {
    /// Create the destination directory
    CreateDirectory { target: PathBuf },
    /// Replace the destination file with rendered content
    Write { target: PathBuf, content: Vec<u8>, permissions: Permissions },
    /// Content rendered to whitespace only, no file is emitted
    Discard { target: PathBuf },
}

/// Outcome of processing one template entry
#[derive(Debug)]
pub struct ProcessResult {
    /// Rendered destination path relative to the output root
    pub rendered: PathBuf,
    pub operation: FileOperation,
}

/// Turns a rendered name into a path relative to the output root.
///
/// Empty and `.` components are dropped and `..` removes the previous
/// component, so `"/README.md"` and `"a//b"` land at `README.md` and `a/b`.
/// An empty result stands for the output root itself.
///
/// # Errors
/// * `Error::TemplateError` if the path climbs above the output root
pub fn normalize_rendered_path(rendered_path: &str) -> Result<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in rendered_path.split(['/', MAIN_SEPARATOR]) {
        match component {
            "" | "." => {}
            ".." => {
                if !normalized.pop() {
                    return Err(Error::TemplateError(format!(
                        "'{rendered_path}' points outside of the output directory"
                    )));
                }
            }
            name => normalized.push(name),
        }
    }
    // Components such as `C:` on Windows.
    if normalized.components().any(|c| !matches!(c, Component::Normal(_))) {
        return Err(Error::TemplateError(format!(
            "'{rendered_path}' is not a relative path"
        )));
    }
    Ok(normalized)
}

/// Returns true for empty content or content made of ASCII whitespace only
/// (space, tab, newline, carriage return, form feed).
pub fn is_whitespace_only(content: &[u8]) -> bool {
    content.iter().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c'))
}

fn create_directory(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(path)
}

fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Main processor for handling template files and directories
pub struct Processor<'a> {
    /// Template engine for rendering
    engine: &'a dyn TemplateRenderer,
    /// Run state, consulted for failures raised inside variable lookups
    session: &'a Session,
    /// Root context handed to the engine
    context: &'a Value,
    /// Root directory containing template files
    template_root: &'a Path,
    /// Root directory for output files
    output_root: &'a Path,
}

impl<'a> Processor<'a> {
    pub fn new(
        engine: &'a dyn TemplateRenderer,
        session: &'a Session,
        context: &'a Value,
        template_root: &'a Path,
        output_root: &'a Path,
    ) -> Self {
        Self { engine, session, context, template_root, output_root }
    }

    pub fn template_root(&self) -> &Path {
        self.template_root
    }

    /// Renders through the engine, preferring a failure recorded during a
    /// variable lookup (e.g. an aborted prompt) over whatever the engine
    /// reported for the resulting undefined value.
    fn render(&self, name: &str, source: &str) -> Result<String> {
        let rendered = self.engine.render(name, source, self.context);
        match self.session.take_failure() {
            Some(failure) => Err(failure),
            None => rendered,
        }
    }

    /// Works out what to do with one template entry.
    ///
    /// # Arguments
    /// * `source` - Path of the entry inside the template root
    /// * `is_dir` - Whether the entry is a directory
    ///
    /// # Errors
    /// * `Error::TemplateError` for paths outside the template root or not valid UTF-8,
    ///   and for file names that render to nothing or climb out of the output root
    /// * `Error::MinijinjaError` if the path or content fails to render
    pub fn process(&self, source: &Path, is_dir: bool) -> Result<ProcessResult> {
        let relative_path = source.strip_prefix(self.template_root).map_err(|_| {
            Error::TemplateError(format!(
                "'{}' is outside of '{}'",
                source.display(),
                self.template_root.display()
            ))
        })?;
        let relative_path = relative_path.to_str().ok_or_else(|| {
            Error::TemplateError(format!("'{}' is not a valid UTF-8 path", source.display()))
        })?;

        debug!("Processing source file: {relative_path}");

        let rendered_path = self.render(relative_path, relative_path)?;
        let rendered = normalize_rendered_path(&rendered_path)?;
        if !is_dir && rendered.as_os_str().is_empty() {
            return Err(Error::TemplateError(format!(
                "file name of '{relative_path}' rendered to '{rendered_path}'"
            )));
        }

        debug!("Processed target file: {}", rendered.display());

        let target = self.output_root.join(&rendered);

        let operation = if is_dir {
            FileOperation::CreateDirectory { target }
        } else {
            let raw = fs::read(source)?;
            let content = match String::from_utf8(raw) {
                Ok(text) => self.render(relative_path, &text)?.into_bytes(),
                Err(binary) => {
                    debug!("'{relative_path}' is not UTF-8, copying verbatim");
                    binary.into_bytes()
                }
            };

            if is_whitespace_only(&content) {
                FileOperation::Discard { target }
            } else {
                let permissions = fs::metadata(source)?.permissions();
                FileOperation::Write { target, content, permissions }
            }
        };

        Ok(ProcessResult { rendered, operation })
    }

    /// Carries out a file operation under the output root.
    pub fn apply(&self, operation: FileOperation) -> Result<()> {
        match operation {
            FileOperation::CreateDirectory { target } => create_directory(&target)?,
            FileOperation::Write { target, content, permissions } => {
                if let Some(parent) = target.parent() {
                    create_directory(parent)?;
                }
                remove_file_if_exists(&target)?;
                fs::write(&target, content)?;
                fs::set_permissions(&target, permissions)?;
            }
            FileOperation::Discard { target } => {
                debug!("Discarding '{}' as it rendered to whitespace only", target.display());
                if target.is_file() {
                    remove_file_if_exists(&target)?;
                }
            }
        }
        Ok(())
    }
}

/// Walks the template root depth first, parents before children and
/// siblings by name, processing and applying every entry.
///
/// # Returns
/// * `Result<Vec<PathBuf>>` - Rendered relative paths of the written files
///
/// # Errors
/// The first failing entry aborts the walk.
pub fn render_tree(processor: &Processor) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for entry in WalkDir::new(processor.template_root()).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let result = processor.process(entry.path(), entry.file_type().is_dir())?;

        let is_write = matches!(result.operation, FileOperation::Write { .. });
        let is_discard = matches!(result.operation, FileOperation::Discard { .. });
        processor.apply(result.operation)?;

        let rendered = result.rendered;
        if is_discard {
            written.retain(|path| path != &rendered);
        } else if is_write && !written.contains(&rendered) {
            written.push(rendered);
        }
    }

    Ok(written)
}
