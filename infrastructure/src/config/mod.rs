//! Configuration loading: TOML file shapes and the multi-source loader.

mod file_config;
mod loader;

pub use file_config::{
    FileAgentConfig, FileConfig, FileDeliberationConfig, FileGraphEdge, FileModeratorConfig,
    FileProviderConfig,
};
pub use loader::ConfigLoader;
