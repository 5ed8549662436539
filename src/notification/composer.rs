//! Message composer
//!
//! Renders a decision into ordered text blocks: a header followed by one line
//! per listed substance. Composition reads the registry but never changes it,
//! so composing the same decision twice yields the same blocks.

use serde_json::json;

use super::error::ComposeError;
use crate::{
    config::{ConfigurationError, MessageTemplates},
    models::{Decision, LIMIT_PCT, SubstanceId, SubstanceRegistry},
    template::TemplateService,
};

/// Turns decisions into notification text.
#[derive(Debug)]
pub struct MessageComposer {
    templates: MessageTemplates,
    renderer: TemplateService,
}

impl MessageComposer {
    /// Creates a composer, checking that every template compiles.
    pub fn new(templates: MessageTemplates) -> Result<Self, ConfigurationError> {
        let renderer = TemplateService::new();
        let named = [
            ("appeared", &templates.appeared),
            ("continues", &templates.continues),
            ("cleared", &templates.cleared),
            ("cleared_peaks", &templates.cleared_peaks),
            ("line", &templates.line),
        ];
        for (name, template) in named {
            renderer.validate(template).map_err(|e| ConfigurationError::Template {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(Self { templates, renderer })
    }

    /// Renders `decision` into text blocks. A suppressed decision has none.
    ///
    /// Exceeded and follow-up messages list the current value of each named
    /// substance. The all-clear message lists the peak value of every
    /// substance that went over the limit during the episode.
    pub fn compose(
        &self,
        decision: &Decision,
        registry: &SubstanceRegistry,
    ) -> Result<Vec<String>, ComposeError> {
        let blocks = match decision {
            Decision::Suppress => Vec::new(),
            Decision::Appeared(ids) => {
                self.with_current_values(&self.templates.appeared, ids, registry)?
            }
            Decision::Continues(ids) => {
                self.with_current_values(&self.templates.continues, ids, registry)?
            }
            Decision::Cleared => {
                let mut blocks = vec![self.header(&self.templates.cleared)?];
                let peaks: Vec<_> = registry
                    .substances()
                    .iter()
                    .filter(|s| s.max_pct_since_clear >= LIMIT_PCT)
                    .collect();
                if !peaks.is_empty() {
                    blocks.push(self.header(&self.templates.cleared_peaks)?);
                    for substance in peaks {
                        blocks.push(self.line(&substance.name, substance.max_pct_since_clear)?);
                    }
                }
                blocks
            }
        };
        Ok(blocks)
    }

    fn with_current_values(
        &self,
        header: &str,
        ids: &[SubstanceId],
        registry: &SubstanceRegistry,
    ) -> Result<Vec<String>, ComposeError> {
        let mut blocks = Vec::with_capacity(ids.len() + 1);
        blocks.push(self.header(header)?);
        for id in ids {
            let substance = registry.get(*id).ok_or(ComposeError::UnknownSubstance(*id))?;
            blocks.push(self.line(&substance.name, substance.current_pct)?);
        }
        Ok(blocks)
    }

    fn header(&self, template: &str) -> Result<String, ComposeError> {
        Ok(self.renderer.render(template, json!({}))?)
    }

    fn line(&self, name: &str, pct: i64) -> Result<String, ComposeError> {
        Ok(self.renderer.render(&self.templates.line, json!({ "name": name, "pct": pct }))?)
    }
}
