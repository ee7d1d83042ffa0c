//! Instruction templates: strict rendering and the named-template registry.

pub mod registry;
pub mod render;

pub use registry::{role, TemplateRegistry};
pub use render::{ensure_placeholder, placeholders, render, TemplateValues};
