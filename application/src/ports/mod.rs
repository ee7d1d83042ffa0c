//! Ports - interfaces the application layer depends on.

pub mod completion;

pub use completion::{CompletionGateway, GatewayError};
