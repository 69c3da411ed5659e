//! Template engines turn a component reference into markdown.
//!
//! Metadata extraction lives behind the [`TemplateEngine`] seam; the
//! bundled [`HandlebarsEngine`] renders whatever the reference itself tells
//! us (display name, source path) plus the supplementary markdown.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use docgen_config::Config;
use handlebars::{no_escape, Handlebars};
use serde::Serialize;
use thiserror::Error;

const COMPONENT_TEMPLATE: &str = "component";

const DEFAULT_COMPONENT_TEMPLATE: &str = "\
# {{display_name}}

Source: `{{component_path}}`
{{#if extra_content}}

{{extra_content}}
{{/if}}
";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("invalid template: {0}")]
    Parse(#[from] Box<handlebars::TemplateError>),

    #[error("render failed: {0}")]
    Render(#[from] Box<handlebars::RenderError>),

    #[error("failed to read template {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("{0}")]
    Other(String),
}

/// Renders the documentation for one component.
///
/// `absolute_path` is the components root joined with `component_path`;
/// `extra_content` is the supplementary markdown, when one was found.
pub trait TemplateEngine: Send + Sync {
    fn compile_templates(
        &self,
        absolute_path: &Path,
        config: &Config,
        component_path: &str,
        extra_content: Option<&str>,
    ) -> Result<String, TemplateError>;
}

impl<F> TemplateEngine for F
where
    F: Fn(&Path, &Config, &str, Option<&str>) -> Result<String, TemplateError> + Send + Sync,
{
    fn compile_templates(
        &self,
        absolute_path: &Path,
        config: &Config,
        component_path: &str,
        extra_content: Option<&str>,
    ) -> Result<String, TemplateError> {
        self(absolute_path, config, component_path, extra_content)
    }
}

#[derive(Debug, Serialize)]
struct ComponentContext<'a> {
    display_name: String,
    component_path: &'a str,
    source_path: String,
    extra_content: Option<&'a str>,
}

/// Handlebars-backed engine with a built-in component template.
pub struct HandlebarsEngine {
    registry: Handlebars<'static>,
}

impl HandlebarsEngine {
    /// Engine using the built-in component template.
    pub fn new() -> Self {
        Self::with_template(DEFAULT_COMPONENT_TEMPLATE)
            .unwrap_or_else(|err| panic!("built-in component template is invalid: {err}"))
    }

    /// Engine rendering `source` as the component template.
    pub fn with_template(source: &str) -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(no_escape);
        registry
            .register_template_string(COMPONENT_TEMPLATE, source)
            .map_err(Box::new)?;
        Ok(Self { registry })
    }

    /// Engine honouring `config.templates.component` when set.
    pub fn from_config(config: &Config) -> Result<Self, TemplateError> {
        match &config.templates.component {
            Some(path) => {
                let source = fs::read_to_string(path).map_err(|source| TemplateError::Io {
                    path: path.clone(),
                    source,
                })?;
                Self::with_template(&source)
            }
            None => Ok(Self::new()),
        }
    }
}

impl Default for HandlebarsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for HandlebarsEngine {
    fn compile_templates(
        &self,
        absolute_path: &Path,
        _config: &Config,
        component_path: &str,
        extra_content: Option<&str>,
    ) -> Result<String, TemplateError> {
        let context = ComponentContext {
            display_name: display_name(component_path),
            component_path,
            source_path: absolute_path.display().to_string(),
            extra_content,
        };
        self.registry
            .render(COMPONENT_TEMPLATE, &context)
            .map_err(|err| TemplateError::Render(Box::new(err)))
    }
}

/// File stem of the component; `index` files take their directory's name.
fn display_name(component_path: &str) -> String {
    let path = Path::new(component_path);
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem.eq_ignore_ascii_case("index") {
        if let Some(dir) = path.parent().and_then(Path::file_name) {
            return dir.to_string_lossy().into_owned();
        }
    }
    stem
}
