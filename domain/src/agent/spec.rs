//! Agent configuration.
//!
//! An [`AgentSpec`] is an explicit configuration record with named optional
//! fields, validated when it is built. System instructions are resolved at
//! build time: either supplied directly, or produced by rendering the
//! persona through a persona template, or absent entirely.

use crate::core::{CompletionOptions, ConfigError, Model};
use crate::template::{ensure_placeholder, render, role, TemplateRegistry, TemplateValues};
use serde::Serialize;

use super::selector::ResponseSelector;

/// Validated, immutable configuration of one agent.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    /// Agent identity; structures assign `agent_<index>` when unset
    pub name: Option<String>,
    /// Task override; structures propagate their own task when unset
    pub task: Option<String>,
    /// Persona text, kept for inspection (already folded into
    /// `system_instructions`)
    pub persona: Option<String>,
    /// Resolved system instructions, if any
    pub system_instructions: Option<String>,
    /// Resolved combination-instructions template (still contains
    /// `${previous_responses}`); `None` inherits the structure's template
    pub combination_template: Option<String>,
    /// Target model identifier
    pub model: Model,
    /// Provider call options, forwarded verbatim
    pub options: CompletionOptions,
    /// Number of candidate responses to draw per turn
    pub num_responses: usize,
    /// Best-of-N selection strategy; required when `num_responses > 1`
    pub selector: Option<ResponseSelector>,
}

impl AgentSpec {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::default()
    }
}

/// Read-only snapshot of an agent's configuration, for `info` surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSpecInfo {
    pub name: Option<String>,
    pub task: Option<String>,
    pub persona: Option<String>,
    pub system_instructions: Option<String>,
    pub model: Model,
    pub options: CompletionOptions,
    pub num_responses: usize,
    pub selector: Option<String>,
}

impl From<&AgentSpec> for AgentSpecInfo {
    fn from(spec: &AgentSpec) -> Self {
        Self {
            name: spec.name.clone(),
            task: spec.task.clone(),
            persona: spec.persona.clone(),
            system_instructions: spec.system_instructions.clone(),
            model: spec.model.clone(),
            options: spec.options.clone(),
            num_responses: spec.num_responses,
            selector: spec.selector.as_ref().map(|s| s.name().to_string()),
        }
    }
}

/// Builder for [`AgentSpec`], with construction-time validation.
#[derive(Debug, Clone, Default)]
pub struct AgentBuilder {
    name: Option<String>,
    task: Option<String>,
    persona: Option<String>,
    persona_template: Option<String>,
    system_instructions: Option<String>,
    combination_instructions: Option<String>,
    model: Option<Model>,
    options: CompletionOptions,
    num_responses: usize,
    selector: Option<ResponseSelector>,
}

impl AgentBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Persona text the agent adopts. Mutually exclusive with
    /// [`system_instructions`](Self::system_instructions).
    pub fn persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    /// Registered template name or literal template containing `${persona}`.
    pub fn persona_template(mut self, template: impl Into<String>) -> Self {
        self.persona_template = Some(template.into());
        self
    }

    /// Raw system instructions, used as-is.
    pub fn system_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.system_instructions = Some(instructions.into());
        self
    }

    /// Registered template name or literal template containing
    /// `${previous_responses}`.
    pub fn combination_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.combination_instructions = Some(instructions.into());
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

    pub fn num_responses(mut self, num_responses: usize) -> Self {
        self.num_responses = num_responses;
        self
    }

    pub fn selector(mut self, selector: ResponseSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Validate the configuration and resolve templates through `registry`.
    pub fn build(self, registry: &TemplateRegistry) -> Result<AgentSpec, ConfigError> {
        let num_responses = if self.num_responses == 0 {
            1 // unset
        } else {
            self.num_responses
        };
        if num_responses > 1 && self.selector.is_none() {
            return Err(ConfigError::MissingSelector(num_responses));
        }

        if self.system_instructions.is_some()
            && (self.persona.is_some() || self.persona_template.is_some())
        {
            return Err(ConfigError::ConflictingInstructions);
        }

        let system_instructions = match (&self.system_instructions, &self.persona) {
            (Some(instructions), _) => Some(instructions.clone()),
            (None, Some(persona)) => {
                let template_name = self.persona_template.as_deref().unwrap_or("default");
                let template = registry.resolve(role::PERSONA, template_name);
                ensure_placeholder(template, "persona", "persona template")?;
                let values = TemplateValues::new().set("persona", persona);
                Some(render(template, &values)?.trim().to_string())
            }
            (None, None) => None,
        };

        let combination_template = match &self.combination_instructions {
            Some(instructions) => {
                let template = registry.resolve(role::COMBINATION, instructions);
                ensure_placeholder(
                    template,
                    "previous_responses",
                    "combination instructions",
                )?;
                Some(template.to_string())
            }
            None => None,
        };

        Ok(AgentSpec {
            name: self.name,
            task: self.task,
            persona: self.persona,
            system_instructions,
            combination_template,
            model: self.model.unwrap_or_default(),
            options: self.options,
            num_responses,
            selector: self.selector,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TemplateRegistry {
        TemplateRegistry::builtin()
    }

    #[test]
    fn test_raw_system_instructions_used_verbatim() {
        let spec = AgentSpec::builder()
            .system_instructions("You are a pirate.")
            .model("gpt-4o")
            .build(&registry())
            .unwrap();
        assert_eq!(spec.system_instructions.as_deref(), Some("You are a pirate."));
        assert!(spec.persona.is_none());
    }

    #[test]
    fn test_persona_rendered_through_default_template() {
        let spec = AgentSpec::builder()
            .persona("a moderate voter from Ohio")
            .build(&registry())
            .unwrap();
        let instructions = spec.system_instructions.unwrap();
        assert!(instructions.contains("a moderate voter from Ohio"));
        assert!(!instructions.contains("${persona}"));
    }

    #[test]
    fn test_persona_with_custom_template() {
        let spec = AgentSpec::builder()
            .persona("a skeptic")
            .persona_template("When drafting feedback, adopt this persona: ${persona}")
            .build(&registry())
            .unwrap();
        assert_eq!(
            spec.system_instructions.as_deref(),
            Some("When drafting feedback, adopt this persona: a skeptic")
        );
    }

    #[test]
    fn test_custom_persona_template_without_placeholder_fails() {
        let err = AgentSpec::builder()
            .persona("a skeptic")
            .persona_template("no placeholder here")
            .build(&registry())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingPlaceholder { .. }));
    }

    #[test]
    fn test_no_persona_no_instructions_means_no_system_prompt() {
        let spec = AgentSpec::builder().build(&registry()).unwrap();
        assert!(spec.system_instructions.is_none());
    }

    #[test]
    fn test_system_instructions_conflict_with_persona() {
        let err = AgentSpec::builder()
            .system_instructions("raw")
            .persona("someone")
            .build(&registry())
            .unwrap_err();
        assert_eq!(err, ConfigError::ConflictingInstructions);
    }

    #[test]
    fn test_combination_instructions_resolved_from_registry() {
        let spec = AgentSpec::builder()
            .combination_instructions("voting")
            .build(&registry())
            .unwrap();
        assert!(spec
            .combination_template
            .unwrap()
            .contains("${previous_responses}"));
    }

    #[test]
    fn test_custom_combination_without_placeholder_fails() {
        let err = AgentSpec::builder()
            .combination_instructions("just do better")
            .build(&registry())
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingPlaceholder {
                placeholder: "previous_responses",
                ..
            }
        ));
    }

    #[test]
    fn test_best_of_n_requires_selector() {
        let err = AgentSpec::builder()
            .num_responses(3)
            .build(&registry())
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingSelector(3));

        let spec = AgentSpec::builder()
            .num_responses(3)
            .selector(ResponseSelector::first())
            .build(&registry())
            .unwrap();
        assert_eq!(spec.num_responses, 3);
    }

    #[test]
    fn test_unset_num_responses_defaults_to_one() {
        let spec = AgentSpec::builder().build(&registry()).unwrap();
        assert_eq!(spec.num_responses, 1);
    }

    #[test]
    fn test_info_snapshot_exposes_selector_name() {
        let spec = AgentSpec::builder()
            .name("critic")
            .num_responses(2)
            .selector(ResponseSelector::longest())
            .build(&registry())
            .unwrap();
        let info = AgentSpecInfo::from(&spec);
        assert_eq!(info.name.as_deref(), Some("critic"));
        assert_eq!(info.selector.as_deref(), Some("longest"));
    }
}
