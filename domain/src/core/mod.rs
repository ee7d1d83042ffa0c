//! Core value objects and errors shared across the domain.

pub mod error;
pub mod model;

pub use error::ConfigError;
pub use model::{CompletionOptions, Model};
