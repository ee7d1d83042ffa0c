//! Infrastructure layer: provider adapters and configuration loading.
//!
//! Everything here implements ports defined by `colloquy-application` or
//! turns external data (TOML config files) into validated domain types.

pub mod config;
pub mod error;
pub mod providers;

pub use config::{ConfigLoader, FileConfig};
pub use error::InfraError;
pub use providers::OpenAiGateway;
