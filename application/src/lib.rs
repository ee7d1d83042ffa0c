//! Application layer: agents, structures and the moderator.
//!
//! This crate drives deliberations. It depends on `colloquy-domain` for
//! the pure configuration and history types and on the
//! [`CompletionGateway`] port for provider access; infrastructure adapters
//! implement that port.

pub mod agent;
pub mod error;
pub mod moderator;
pub mod ports;
pub mod structure;

#[cfg(test)]
mod testing;

pub use agent::{Agent, AgentInfo};
pub use error::{DeliberationError, SelectionError};
pub use moderator::{Moderator, ModeratorBuilder, ModeratorInfo};
pub use ports::{CompletionGateway, GatewayError};
pub use structure::{Structure, StructureBuilder, StructureInfo};
