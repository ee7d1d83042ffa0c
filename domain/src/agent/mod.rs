//! Agent configuration and best-of-N selection.

pub mod selector;
pub mod spec;

pub use selector::ResponseSelector;
pub use spec::{AgentBuilder, AgentSpec, AgentSpecInfo};
