//! Domain layer for colloquy
//!
//! This crate contains the deliberation core: instruction templates, the
//! shared deliberation history, agent configuration, and interaction
//! topologies. It has no dependencies on infrastructure concerns - no
//! async, no I/O, no provider knowledge.
//!
//! # Core Concepts
//!
//! - **Agent**: a persona-and-instructions-bound unit that turns a task
//!   plus visible context into one response via an external model call.
//! - **Topology**: who runs when and what they see - Ensemble, Chain,
//!   Debate, or an arbitrary dependency Graph.
//! - **Deliberation History**: the shared, append-only, ordered log of
//!   turns within one structure run.

pub mod agent;
pub mod core;
pub mod history;
pub mod template;
pub mod topology;

// Re-export commonly used types
pub use agent::{AgentBuilder, AgentSpec, AgentSpecInfo, ResponseSelector};
pub use core::{CompletionOptions, ConfigError, Model};
pub use history::{format_records, DeliberationHistory, Labeling, ResponseRecord};
pub use template::{ensure_placeholder, placeholders, render, role, TemplateRegistry, TemplateValues};
pub use topology::{GraphEdge, GraphPlan, NodeRef, Topology};
