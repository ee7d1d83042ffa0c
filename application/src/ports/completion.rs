//! Completion provider port
//!
//! Defines the interface for obtaining one model completion. The core
//! treats the provider as opaque and stateless per call; retry and backoff
//! policy belong to the adapter, not to this port's callers.

use async_trait::async_trait;
use colloquy_domain::{CompletionOptions, Model};
use thiserror::Error;

/// Errors surfaced by a completion provider.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Gateway for model completions
///
/// This port defines how the application layer obtains completions.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Request a single completion for the given prompts.
    async fn complete(
        &self,
        model: &Model,
        system_prompt: Option<&str>,
        user_prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, GatewayError>;
}
