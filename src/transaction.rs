//! All-or-nothing execution of a template.
//!
//! The tree is rendered into a scratch directory first and only copied into
//! the target once every entry rendered. A failure during that final copy can
//! still leave the target partially populated; the copy itself is not atomic.

use crate::constants::SCRATCH_PREFIX;
use crate::error::{Error, Result};
use crate::processor::{render_tree, Processor};
use crate::renderer::TemplateRenderer;
use crate::session::Session;
use crate::template::Template;
use log::debug;
use minijinja::value::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Checks that the directory the target lives in exists. The target itself
/// may or may not exist; its ancestors are never created.
///
/// # Errors
/// * `Error::ParentDirectoryMissing` if the parent is absent or not a directory
pub fn ensure_parent_exists<P: AsRef<Path>>(target: P) -> Result<()> {
    let parent = match target.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(Error::ParentDirectoryMissing { parent_dir: parent.display().to_string() });
    }
    Ok(())
}

/// Copies the tree under `from` into `to`, creating directories as needed
/// and overwriting existing files.
pub fn copy_recursively<P: AsRef<Path>, Q: AsRef<Path>>(from: P, to: Q) -> Result<()> {
    let (from, to) = (from.as_ref(), to.as_ref());

    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry?;
        let relative = entry.path().strip_prefix(from).map_err(|_| {
            Error::TemplateError(format!("'{}' is outside of '{}'", entry.path().display(), from.display()))
        })?;
        let destination = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            debug!("Copying '{}' to '{}'", entry.path().display(), destination.display());
            fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}

/// Renders `template` into `target`, staging the output in the system
/// temporary directory.
///
/// # Arguments
/// * `template` - Template to render
/// * `engine` - Renderer for names and contents
/// * `session` - State of the current run
/// * `context` - Root context built from the bound registry
/// * `target` - Directory receiving the generated project
///
/// # Returns
/// * `Result<Vec<PathBuf>>` - Written files, relative to `target`
///
/// # Errors
/// * `Error::ParentDirectoryMissing` before anything is rendered
/// * Any rendering error, in which case `target` is left untouched
/// * IO errors of the final copy
pub fn execute<P: AsRef<Path>>(
    template: &Template,
    engine: &dyn TemplateRenderer,
    session: &Session,
    context: &Value,
    target: P,
) -> Result<Vec<PathBuf>> {
    execute_in(template, engine, session, context, target, std::env::temp_dir())
}

/// Same as [`execute`], with the scratch directory created under
/// `scratch_parent`. The scratch directory is removed on every exit path.
pub fn execute_in<P: AsRef<Path>, Q: AsRef<Path>>(
    template: &Template,
    engine: &dyn TemplateRenderer,
    session: &Session,
    context: &Value,
    target: P,
    scratch_parent: Q,
) -> Result<Vec<PathBuf>> {
    let target = target.as_ref();
    ensure_parent_exists(target)?;

    // Removed on drop, whichever way this function returns.
    let scratch = tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir_in(scratch_parent)?;
    debug!("Rendering '{}' into '{}'", template.content_dir.display(), scratch.path().display());

    let processor = Processor::new(engine, session, context, &template.content_dir, scratch.path());
    let written = render_tree(&processor)?;

    copy_recursively(scratch.path(), target)?;
    scratch.close()?;

    Ok(written)
}
