//! Read-only registry of named instruction templates.
//!
//! The registry is built once at startup and injected into structures and
//! agents; nothing in the core reads it as ambient global state. Lookup is
//! role-scoped: `"default"` as a persona template and `"default"` as
//! combination instructions are different entries. A name that is not
//! registered under the requested role is treated as a literal template
//! string, so callers can pass either a registered name or their own text.

use std::collections::BTreeMap;

/// Role prefixes under which templates are registered.
pub mod role {
    pub const PERSONA: &str = "persona";
    pub const COMBINATION: &str = "combination";
    pub const MODERATOR_PERSONA: &str = "moderator.persona";
    pub const MODERATOR_COMBINATION: &str = "moderator.combination";
    pub const MODERATOR_AUTO: &str = "moderator.auto";
}

/// Name → template mapping with role-scoped resolution.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, String>,
}

impl TemplateRegistry {
    /// An empty registry with no entries at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The registry of built-in templates.
    pub fn builtin() -> Self {
        let mut registry = Self::default();

        registry.insert(
            format!("{}.default", role::PERSONA),
            "INSTRUCTIONS\nWhen answering questions or performing tasks, always adopt the following persona.\n\nPERSONA:\n${persona}\n\nCONSTRAINTS\n- When answering, do not disclose your partisan or demographic identity in any way.\n- Think, talk, and write like your persona.\n- Use plain language.\n- Adopt the characteristics of your persona.",
        );
        registry.insert(
            format!("{}.empathetic", role::PERSONA),
            "INSTRUCTIONS\nAdopt the following persona and try to empathize with other points of view.\n\nPERSONA:\n${persona}\n\nCONSTRAINTS\n- Be willing to acknowledge the merits of positions you disagree with.\n- Think, talk, and write like your persona.\n- Use plain language.",
        );

        registry.insert(
            format!("{}.default", role::COMBINATION),
            "USE PREVIOUS RESPONSES\nHere are the previous responses:\n<start>\n${previous_responses}\n<end>\n\nIncorporate the best points from the previous responses into your own answer. Do not mention that you are drawing on other responses; present one coherent answer.",
        );
        registry.insert(
            format!("{}.chain", role::COMBINATION),
            "BUILD ON PRIOR WORK\nHere is what has been produced so far:\n<start>\n${previous_responses}\n<end>\n\nTreat the prior work as a draft. Keep what is strong, fix what is weak, and extend it where it is incomplete.",
        );
        registry.insert(
            format!("{}.debate", role::COMBINATION),
            "DEBATE\nHere is what your opponent has argued:\n<start>\n${previous_responses}\n<end>\n\nRespond to the strongest version of your opponent's argument. Begin your answer with [Debater] and defend your own position while directly rebutting theirs.",
        );
        registry.insert(
            format!("{}.voting", role::COMBINATION),
            "VOTE\nHere are the previous responses:\n<start>\n${previous_responses}\n<end>\n\nState which previous response you find most convincing and why, then give your own final answer.",
        );

        registry.insert(
            format!("{}.default", role::MODERATOR_PERSONA),
            "You are a neutral moderator overseeing a deliberation whose goal is: ${task}. You give equal weight to every participant and you care only about the quality of the final answer.",
        );
        registry.insert(
            format!("{}.voting", role::MODERATOR_PERSONA),
            "You are a returning officer tallying positions from a deliberation whose goal is: ${task}. You report what the participants concluded, including disagreement, without adding your own position.",
        );
        registry.insert(
            format!("{}.default", role::MODERATOR_COMBINATION),
            "SYNTHESIZE\nHere are the responses from all participants:\n<start>\n${previous_responses}\n<end>\n\nCombine them into a single final answer to the original task. Resolve disagreements by favoring the better-supported position, and do not refer to the participants or the process.",
        );
        registry.insert(
            format!("{}.default", role::MODERATOR_AUTO),
            "You are about to moderate a deliberation between several assistants working on the following task:\n\n${task}\n\nWrite the system instructions you should follow when synthesizing their responses into one final answer. Reply with the instructions only.",
        );

        registry
    }

    /// Register a template under a fully qualified key (e.g. `persona.pirate`).
    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.templates.insert(key.into(), template.into());
    }

    /// Look up a fully qualified key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    /// Resolve a name within a role, falling back to treating the argument
    /// as a literal template when no such name is registered.
    pub fn resolve<'a>(&'a self, role: &str, name_or_literal: &'a str) -> &'a str {
        self.get(&format!("{role}.{name_or_literal}"))
            .unwrap_or(name_or_literal)
    }

    /// Merge another set of templates over this one (later entries win).
    pub fn merge(&mut self, templates: impl IntoIterator<Item = (String, String)>) {
        self.templates.extend(templates);
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::render::placeholders;

    #[test]
    fn test_builtin_persona_templates_carry_persona_placeholder() {
        let registry = TemplateRegistry::builtin();
        for key in ["persona.default", "persona.empathetic"] {
            let template = registry.get(key).unwrap();
            assert!(
                placeholders(template).iter().any(|p| p == "persona"),
                "{key} lacks ${{persona}}"
            );
        }
    }

    #[test]
    fn test_builtin_combination_templates_carry_previous_responses() {
        let registry = TemplateRegistry::builtin();
        for key in [
            "combination.default",
            "combination.chain",
            "combination.debate",
            "combination.voting",
            "moderator.combination.default",
        ] {
            let template = registry.get(key).unwrap();
            assert!(
                placeholders(template).iter().any(|p| p == "previous_responses"),
                "{key} lacks ${{previous_responses}}"
            );
        }
    }

    #[test]
    fn test_builtin_moderator_personas_carry_task() {
        let registry = TemplateRegistry::builtin();
        for key in ["moderator.persona.default", "moderator.persona.voting"] {
            let template = registry.get(key).unwrap();
            assert!(placeholders(template).iter().any(|p| p == "task"));
        }
    }

    #[test]
    fn test_resolve_registered_name() {
        let registry = TemplateRegistry::builtin();
        let resolved = registry.resolve(role::COMBINATION, "default");
        assert!(resolved.contains("${previous_responses}"));
    }

    #[test]
    fn test_resolve_literal_passthrough() {
        let registry = TemplateRegistry::builtin();
        let literal = "My custom template: ${previous_responses}";
        assert_eq!(registry.resolve(role::COMBINATION, literal), literal);
    }

    #[test]
    fn test_resolve_is_role_scoped() {
        let registry = TemplateRegistry::builtin();
        let persona = registry.resolve(role::PERSONA, "default");
        let combination = registry.resolve(role::COMBINATION, "default");
        assert_ne!(persona, combination);
    }

    #[test]
    fn test_merge_overrides() {
        let mut registry = TemplateRegistry::builtin();
        registry.merge(vec![(
            "combination.default".to_string(),
            "override ${previous_responses}".to_string(),
        )]);
        assert_eq!(
            registry.resolve(role::COMBINATION, "default"),
            "override ${previous_responses}"
        );
    }
}
