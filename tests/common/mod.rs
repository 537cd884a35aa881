#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use stencil::context::ContextLayers;
use stencil::error::{Error, Result};
use stencil::prompt::Prompter;
use stencil::runner::generate;
use stencil::session::Session;
use stencil::template::Template;

/// Writes a template under `root`: an optional `project.json` and the given
/// files below `template/`.
pub fn write_template(root: &Path, context: Option<&str>, files: &[(&str, &str)]) -> PathBuf {
    fs::create_dir_all(root.join("template")).unwrap();
    if let Some(context) = context {
        fs::write(root.join("project.json"), context).unwrap();
    }
    for (path, content) in files {
        let path = root.join("template").join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    root.to_path_buf()
}

/// Answers from a fixed script and records every question in order.
#[derive(Default)]
pub struct Scripted {
    pub answers: HashMap<String, Value>,
    pub toggles: HashMap<String, bool>,
    pub asked: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn new(answers: &[(&str, Value)], toggles: &[(&str, bool)]) -> Self {
        Self {
            answers: answers.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            toggles: toggles.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl Prompter for Scripted {
    fn ask(&self, key: &str, _default: &Value) -> Result<Value> {
        self.asked.lock().unwrap().push(key.to_string());
        self.answers
            .get(key)
            .cloned()
            .ok_or_else(|| Error::PromptError(format!("no scripted answer for '{key}'")))
    }

    fn confirm(&self, question: &str, _default: bool) -> Result<bool> {
        self.asked.lock().unwrap().push(question.to_string());
        self.toggles
            .get(question)
            .copied()
            .ok_or_else(|| Error::PromptError(format!("no scripted toggle for '{question}'")))
    }
}

/// Fails the test if anything is asked.
pub struct NoPrompt;

impl Prompter for NoPrompt {
    fn ask(&self, key: &str, _default: &Value) -> Result<Value> {
        panic!("unexpected prompt for '{key}'")
    }

    fn confirm(&self, question: &str, _default: bool) -> Result<bool> {
        panic!("unexpected confirmation '{question}'")
    }
}

/// Renders the template at `root` into `target` using its own defaults.
pub fn generate_defaults(root: &Path, target: &Path) -> Result<Vec<PathBuf>> {
    let template = Template::load(root)?;
    let layers = ContextLayers::new(template.context.clone(), None);
    generate(&template, &layers, true, Arc::new(NoPrompt), Arc::new(Session::new()), target)
}
