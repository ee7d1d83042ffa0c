//! Moderator - synthesizes a structure's run into one final response.
//!
//! A moderator is a specialized turn executor whose view is the whole (or
//! window-limited) shared history. Its operating instructions come from
//! one of two sources: fixed at construction (raw text or a persona
//! template rendered with the task), or "auto" - proposed by the model
//! itself through an extra provider call.

use crate::error::DeliberationError;
use crate::ports::{CompletionGateway, GatewayError};
use colloquy_domain::{
    ensure_placeholder, render, role, CompletionOptions, ConfigError, Model, ResponseRecord,
    TemplateRegistry, TemplateValues,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// How many times auto-generation retries an empty proposal before failing.
const MAX_GENERATION_TRIES: usize = 3;

/// Agent variant that synthesizes the accumulated deliberation.
pub struct Moderator {
    persona_template: Option<String>,
    system_instructions: Option<String>,
    generated_instructions: Option<String>,
    combination_template: String,
    auto_template: String,
    auto: bool,
    model: Model,
    options: CompletionOptions,
    gateway: Arc<dyn CompletionGateway>,
    records: Vec<ResponseRecord>,
}

impl std::fmt::Debug for Moderator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Moderator")
            .field("model", &self.model)
            .field("auto", &self.auto)
            .field("system_instructions", &self.system_instructions)
            .finish_non_exhaustive()
    }
}

/// Read-only snapshot of a moderator's state.
#[derive(Debug, Clone, Serialize)]
pub struct ModeratorInfo {
    pub model: Model,
    pub auto: bool,
    pub system_instructions: Option<String>,
    pub records: Vec<ResponseRecord>,
}

/// Builder for [`Moderator`], with construction-time validation.
#[derive(Debug, Clone, Default)]
pub struct ModeratorBuilder {
    persona: Option<String>,
    system_instructions: Option<String>,
    combination_instructions: Option<String>,
    auto: bool,
    model: Option<Model>,
    options: CompletionOptions,
}

impl ModeratorBuilder {
    /// Registered moderator-persona name or literal template containing
    /// `${task}`.
    pub fn persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    /// Raw system instructions, used as-is.
    pub fn system_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.system_instructions = Some(instructions.into());
        self
    }

    /// Registered name or literal template containing `${previous_responses}`.
    pub fn combination_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.combination_instructions = Some(instructions.into());
        self
    }

    /// Let the moderator propose its own system instructions from the task.
    pub fn auto(mut self) -> Self {
        self.auto = true;
        self
    }

    pub fn model(mut self, model: impl Into<Model>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(
        self,
        registry: &TemplateRegistry,
        gateway: Arc<dyn CompletionGateway>,
    ) -> Result<Moderator, ConfigError> {
        if self.auto && (self.persona.is_some() || self.system_instructions.is_some()) {
            return Err(ConfigError::ConflictingInstructions);
        }
        if self.persona.is_some() && self.system_instructions.is_some() {
            return Err(ConfigError::ConflictingInstructions);
        }

        let persona_template = if self.auto || self.system_instructions.is_some() {
            None
        } else {
            let name = self.persona.as_deref().unwrap_or("default");
            let template = registry.resolve(role::MODERATOR_PERSONA, name);
            ensure_placeholder(template, "task", "moderator persona template")?;
            Some(template.to_string())
        };

        let combination_name = self.combination_instructions.as_deref().unwrap_or("default");
        let combination_template = registry
            .resolve(role::MODERATOR_COMBINATION, combination_name)
            .to_string();
        ensure_placeholder(
            &combination_template,
            "previous_responses",
            "moderator combination instructions",
        )?;

        let auto_template = registry
            .resolve(role::MODERATOR_AUTO, "default")
            .to_string();
        ensure_placeholder(&auto_template, "task", "auto-moderation template")?;

        Ok(Moderator {
            persona_template,
            system_instructions: self.system_instructions,
            generated_instructions: None,
            combination_template,
            auto_template,
            auto: self.auto,
            model: self.model.unwrap_or_default(),
            options: self.options,
            gateway,
            records: Vec::new(),
        })
    }
}

impl Moderator {
    pub fn builder() -> ModeratorBuilder {
        ModeratorBuilder::default()
    }

    pub fn is_auto(&self) -> bool {
        self.auto
    }

    /// The moderator's records, one per synthesis turn.
    pub fn history(&self) -> &[ResponseRecord] {
        &self.records
    }

    /// The latest synthesis, if any turn has completed.
    pub fn final_response(&self) -> Option<&str> {
        self.records.last().map(|r| r.response.as_str())
    }

    pub fn info(&self) -> ModeratorInfo {
        ModeratorInfo {
            model: self.model.clone(),
            auto: self.auto,
            system_instructions: self.current_instructions(),
            records: self.records.clone(),
        }
    }

    /// The system instructions a synthesis turn would use right now, when
    /// they can be resolved without a task (generated or raw sources).
    fn current_instructions(&self) -> Option<String> {
        self.generated_instructions
            .clone()
            .or_else(|| self.system_instructions.clone())
            .or_else(|| self.persona_template.clone())
    }

    /// Ask the model to propose synthesis instructions for `task`.
    ///
    /// Does not change the moderator's state: callers can inspect the
    /// proposal and decide whether to set it. Retries empty proposals up
    /// to three times, then reports the provider failure.
    pub async fn generate_system_instructions(
        &self,
        task: &str,
    ) -> Result<String, DeliberationError> {
        let values = TemplateValues::new().set("task", task);
        let prompt = render(&self.auto_template, &values)?;

        for attempt in 1..=MAX_GENERATION_TRIES {
            let proposal = self
                .gateway
                .complete(&self.model, None, &prompt, &self.options)
                .await?;
            let proposal = proposal.trim();
            if !proposal.is_empty() {
                debug!(attempt, "auto-moderation instructions generated");
                return Ok(proposal.to_string());
            }
        }
        Err(GatewayError::EmptyResponse.into())
    }

    /// Generate instructions for `task` and install them in one call.
    ///
    /// Always overwrites any previously generated or configured
    /// instructions with the (non-empty) proposal.
    pub async fn generate_and_set_system_instructions(
        &mut self,
        task: &str,
    ) -> Result<String, DeliberationError> {
        let instructions = self.generate_system_instructions(task).await?;
        self.generated_instructions = Some(instructions.clone());
        Ok(instructions)
    }

    /// Run one synthesis turn over a history view.
    ///
    /// An auto moderator with no generated instructions yet generates and
    /// installs them first.
    pub async fn synthesize(
        &mut self,
        task: &str,
        view: &str,
    ) -> Result<ResponseRecord, DeliberationError> {
        if self.auto && self.generated_instructions.is_none() {
            self.generate_and_set_system_instructions(task).await?;
        }

        let system_prompt = match (&self.generated_instructions, &self.system_instructions) {
            (Some(generated), _) => Some(generated.clone()),
            (None, Some(raw)) => Some(raw.clone()),
            (None, None) => match &self.persona_template {
                Some(template) => {
                    let values = TemplateValues::new().set("task", task);
                    Some(render(template, &values)?)
                }
                None => None,
            },
        };

        let user_prompt = if view.is_empty() {
            task.to_string()
        } else {
            let values = TemplateValues::new()
                .set("previous_responses", view)
                .set("task", task);
            format!("{task}\n{}", render(&self.combination_template, &values)?)
        };

        info!(model = %self.model, "moderator synthesizing");
        let response = self
            .gateway
            .complete(
                &self.model,
                system_prompt.as_deref(),
                &user_prompt,
                &self.options,
            )
            .await?;

        let record = ResponseRecord::new("moderator", system_prompt, user_prompt, response);
        self.records.push(record.clone());
        Ok(record)
    }
}
