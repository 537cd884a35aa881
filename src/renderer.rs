//! Template rendering functionality for Stencil.
//! Both path names and file contents go through the same MiniJinja
//! environment, configured so that an unresolved placeholder is an error.
use crate::error::{Error, Result};
use crate::functions;
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `name` - Name reported in errors, usually the template relative path
    /// * `source` - Template string to render
    /// * `context` - Root context the template looks variables up in
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, name: &str, source: &str, context: &Value) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a new renderer with strict undefined handling and the
    /// built-in helpers registered.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        // Output must match the source byte for byte outside of tags.
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        functions::register(&mut env);
        Self { env }
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template string using MiniJinja.
    ///
    /// # Errors
    /// * `Error::MinijinjaError` on syntax errors, undefined variables and
    ///   failing helper calls
    fn render(&self, name: &str, source: &str, context: &Value) -> Result<String> {
        self.env.render_named_str(name, source, context).map_err(Error::MinijinjaError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn renders_variables() {
        let renderer = MiniJinjaRenderer::new();
        let result = renderer
            .render("greeting", "Hello {{ name }}!", &context! { name => "Acme" })
            .unwrap();
        assert_eq!(result, "Hello Acme!");
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let renderer = MiniJinjaRenderer::new();
        let err = renderer.render("greeting", "Hello {{ name }}!", &context! {}).unwrap_err();
        assert!(matches!(err, Error::MinijinjaError(_)));
    }

    #[test]
    fn keeps_source_verbatim() {
        let renderer = MiniJinjaRenderer::new();
        let rendered = renderer
            .render("index.html", "<p>{{ v }}</p>\n\n", &context! { v => "a & b" })
            .unwrap();
        assert_eq!(rendered, "<p>a & b</p>\n\n");
    }

    #[test]
    fn syntax_error_is_an_error() {
        let renderer = MiniJinjaRenderer::new();
        assert!(renderer.render("broken", "{% if %}", &context! {}).is_err());
    }
}
