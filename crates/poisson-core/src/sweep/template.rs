use crate::domain::{SweepError, SweepResult};
use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Input-deck template rendered once per sweep point.
///
/// Uses Jinja syntax with strict undefined handling: referencing a name that
/// is neither a constant nor a variable fails the render.
#[derive(Debug, Clone)]
pub struct InputTemplate {
    name: String,
    source: String,
}

impl InputTemplate {
    pub fn from_file(path: &Path) -> SweepResult<Self> {
        let source = fs::read_to_string(path)
            .map_err(|source| SweepError::io_at("IO.TEMPLATE_READ", "read template", path, source))?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("template")
            .to_string();
        Self::new(name, source)
    }

    pub fn new(name: impl Into<String>, source: impl Into<String>) -> SweepResult<Self> {
        let template = Self {
            name: name.into(),
            source: source.into(),
        };
        {
            let environment = template.environment();
            environment
                .template_from_named_str(&template.name, &template.source)
                .map_err(|error| template_error("TEMPLATE.SYNTAX", &template.name, &error))?;
        }
        Ok(template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render<C: Serialize>(&self, context: &C) -> SweepResult<String> {
        let environment = self.environment();
        let template = environment
            .template_from_named_str(&self.name, &self.source)
            .map_err(|error| template_error("TEMPLATE.SYNTAX", &self.name, &error))?;
        template
            .render(context)
            .map_err(|error| template_error("TEMPLATE.RENDER", &self.name, &error))
    }

    fn environment(&self) -> Environment<'_> {
        let mut environment = Environment::new();
        environment.set_undefined_behavior(UndefinedBehavior::Strict);
        environment.set_keep_trailing_newline(true);
        environment
    }
}

fn template_error(placeholder: &'static str, name: &str, error: &minijinja::Error) -> SweepError {
    SweepError::template(
        placeholder,
        format!("template '{}': {:#}", name, error),
    )
}
