//! Renders message and query templates with minijinja.

use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

/// A service for rendering templates using the minijinja templating engine.
#[derive(Debug)]
pub struct TemplateService {
    env: Environment<'static>,
}

/// Error type for the TemplateService.
#[derive(Debug, Error)]
pub enum TemplateServiceError {
    #[error("Failed to render template: {0}")]
    RenderError(#[from] minijinja::Error),
}

impl TemplateService {
    /// Creates a template service that fails on undefined variables.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);

        Self { env }
    }

    /// Checks that a template compiles, without rendering it.
    pub fn validate(&self, template_str: &str) -> Result<(), TemplateServiceError> {
        self.env.template_from_str(template_str)?;
        Ok(())
    }

    /// Renders a template with the given context.
    pub fn render<C: Serialize>(
        &self,
        template_str: &str,
        context: C,
    ) -> Result<String, TemplateServiceError> {
        match self.env.render_str(template_str, context) {
            Ok(rendered_string) => Ok(rendered_string),
            Err(e) => {
                tracing::warn!("Failed to render template '{}': {}", template_str, e);
                Err(TemplateServiceError::RenderError(e))
            }
        }
    }
}

impl Default for TemplateService {
    fn default() -> Self {
        Self::new()
    }
}
