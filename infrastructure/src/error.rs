//! Infrastructure error taxonomy.

use colloquy_domain::ConfigError;
use thiserror::Error;

/// Failures raised while loading configuration or wiring adapters.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Failed to load config file: {0}")]
    ConfigFile(#[from] Box<figment::Error>),

    #[error("Unknown topology '{0}' (expected ensemble, chain, debate or graph)")]
    UnknownTopology(String),

    #[error("Unknown selector '{0}' (expected first or longest)")]
    UnknownSelector(String),

    #[error("No API key: set the {0} environment variable or [provider] api_key")]
    MissingApiKey(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
