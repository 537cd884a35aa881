//! Orchestration of a template run: load, bind, render, persist, validate.

use crate::answers::{validate_answers, write_answers};
use crate::binder::bind;
use crate::cli::Args;
use crate::context::{load_answer_file, ContextLayers};
use crate::error::Result;
use crate::loader::load_template;
use crate::prompt::Prompter;
use crate::registry::{Registry, Scope};
use crate::renderer::MiniJinjaRenderer;
use crate::session::Session;
use crate::template::Template;
use crate::transaction::execute;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of a successful run.
#[derive(Debug)]
pub struct Outcome {
    /// Template name, from its metadata when available
    pub template: String,
    /// Absolute target directory
    pub target: PathBuf,
    /// Written files relative to `target`
    pub written: Vec<PathBuf>,
}

/// Binds `layers` and renders `template` into `target`.
///
/// # Arguments
/// * `template` - Loaded template
/// * `layers` - Inline defaults and stored answers
/// * `use_defaults` - Answer every variable with its default instead of prompting
/// * `prompter` - Source of interactive answers
/// * `session` - State of this run, read afterwards for persistence and validation
/// * `target` - Directory receiving the generated project
pub fn generate<P: AsRef<Path>>(
    template: &Template,
    layers: &ContextLayers,
    use_defaults: bool,
    prompter: Arc<dyn Prompter>,
    session: Arc<Session>,
    target: P,
) -> Result<Vec<PathBuf>> {
    let mut registry = Registry::new();
    bind(&mut registry, layers, use_defaults)?;
    if registry.is_empty() {
        debug!("Template defines no variables.");
    } else {
        debug!("Bound {} variable(s).", registry.len());
    }

    let context = Scope::new(Arc::new(registry), session.clone(), prompter).into_value();
    let engine = MiniJinjaRenderer::new();

    execute(template, &engine, &session, &context, target)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Resolves and loads the template
/// 2. Loads the answer file, if one was given
/// 3. Binds variables and renders into the target directory
/// 4. Writes the answers of this run, if requested
/// 5. Checks the answer file covered every value the run used
pub fn run(args: &Args, prompter: Arc<dyn Prompter>) -> Result<Outcome> {
    let template = Template::load(load_template(&args.template)?)?;
    let target = absolute(&args.target_dir)?;

    let stored = args.use_file.as_ref().map(load_answer_file).transpose()?;
    let layers = ContextLayers::new(template.context.clone(), stored);

    let session = Arc::new(Session::new());
    let written = generate(
        &template,
        &layers,
        args.should_use_defaults(),
        prompter,
        session.clone(),
        &target,
    )?;

    if let Some(json_file) = &args.json_file {
        write_answers(json_file, &session)?;
    }

    if let (Some(answer_file), Some(answers)) = (&args.use_file, &layers.stored) {
        validate_answers(answer_file, answers, &session)?;
    }

    Ok(Outcome { template: template.name(), target, written })
}
