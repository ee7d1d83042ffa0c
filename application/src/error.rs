//! Run-time error taxonomy for deliberations.

use crate::ports::GatewayError;
use colloquy_domain::ConfigError;
use thiserror::Error;

/// A response selector broke its contract by returning nothing usable.
#[derive(Error, Debug, Clone)]
#[error("Selector '{selector}' returned no usable response from {candidates} candidates")]
pub struct SelectionError {
    /// Name of the selector strategy
    pub selector: String,
    /// How many candidates it was given
    pub candidates: usize,
}

/// Any failure a deliberation run can surface.
///
/// All three kinds propagate to the caller unmodified; none are swallowed.
/// Configuration errors occur before any provider call; provider and
/// selection errors abort the current run, leaving the history in whatever
/// state preceded the failing turn.
#[derive(Error, Debug)]
pub enum DeliberationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] GatewayError),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),
}

impl DeliberationError {
    /// Whether the error was raised before any provider call.
    pub fn is_configuration(&self) -> bool {
        matches!(self, DeliberationError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: DeliberationError = ConfigError::CyclicGraph.into();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_provider_error_converts() {
        let err: DeliberationError = GatewayError::Timeout.into();
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_selection_error_message() {
        let err = SelectionError {
            selector: "first".to_string(),
            candidates: 5,
        };
        assert!(err.to_string().contains("first"));
        assert!(err.to_string().contains('5'));
    }
}
