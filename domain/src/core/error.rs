//! Domain error types

use thiserror::Error;

/// Construction-time configuration errors.
///
/// Every variant is raised before any provider call is made, so a failed
/// construction never leaves partial side effects behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No agents configured for structure")]
    NoAgents,

    #[error("No task specified for structure or agents")]
    NoTask,

    #[error("Debate requires exactly 2 agents, got {0}")]
    DebateArity(usize),

    #[error("Graph edges contain a cycle")]
    CyclicGraph,

    #[error("Graph edge references unknown agent '{0}'")]
    UnknownAgent(String),

    #[error("Graph edge index {0} is out of bounds for {1} agents")]
    EdgeOutOfBounds(usize, usize),

    #[error("Graph edge ({0} -> {0}) is a self-loop")]
    SelfLoop(String),

    #[error("Duplicate agent name '{0}' in graph")]
    DuplicateAgent(String),

    #[error("Template for {role} is missing required placeholder '${{{placeholder}}}'")]
    MissingPlaceholder {
        role: &'static str,
        placeholder: &'static str,
    },

    #[error("Template references unbound placeholder '${{{0}}}'")]
    UnboundPlaceholder(String),

    #[error("num_responses is {0} but no response selector was provided")]
    MissingSelector(usize),

    #[error("Cannot set both system instructions and a persona")]
    ConflictingInstructions,

    #[error("cycles must be at least 1")]
    ZeroCycles,
}

impl ConfigError {
    /// Whether this error concerns the topology rather than an individual agent.
    pub fn is_topology(&self) -> bool {
        matches!(
            self,
            ConfigError::CyclicGraph
                | ConfigError::DebateArity(_)
                | ConfigError::UnknownAgent(_)
                | ConfigError::EdgeOutOfBounds(_, _)
                | ConfigError::SelfLoop(_)
                | ConfigError::DuplicateAgent(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ConfigError::DebateArity(3).to_string(),
            "Debate requires exactly 2 agents, got 3"
        );
        assert_eq!(
            ConfigError::CyclicGraph.to_string(),
            "Graph edges contain a cycle"
        );
    }

    #[test]
    fn test_missing_placeholder_message_names_role() {
        let err = ConfigError::MissingPlaceholder {
            role: "persona template",
            placeholder: "persona",
        };
        let msg = err.to_string();
        assert!(msg.contains("persona template"));
        assert!(msg.contains("${persona}"));
    }

    #[test]
    fn test_is_topology() {
        assert!(ConfigError::CyclicGraph.is_topology());
        assert!(ConfigError::DebateArity(1).is_topology());
        assert!(!ConfigError::NoTask.is_topology());
        assert!(!ConfigError::ZeroCycles.is_topology());
    }
}
