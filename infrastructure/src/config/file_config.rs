//! Raw TOML configuration data types.
//!
//! These structs mirror the exact shape of the config file; conversion
//! into validated domain and application types happens in the `to_*`
//! methods so that a bad file fails loudly before any provider call.

use crate::error::InfraError;
use colloquy_application::{Moderator, ModeratorBuilder};
use colloquy_domain::{
    AgentSpec, CompletionOptions, GraphEdge, Model, NodeRef, ResponseSelector, TemplateRegistry,
    Topology,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete file configuration (raw TOML structure).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Provider endpoint settings
    pub provider: FileProviderConfig,
    /// Structure-level deliberation settings
    pub deliberation: FileDeliberationConfig,
    /// Agents taking part, in declaration order
    pub agents: Vec<FileAgentConfig>,
    /// Optional moderator
    pub moderator: FileModeratorConfig,
    /// Extra prompt templates, keyed `role.name`
    /// (e.g. `"persona.skeptic"`, `"combination.consensus"`)
    pub templates: BTreeMap<String, String>,
}

/// `[provider]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline API key; wins over `api_key_env` when set
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

impl FileProviderConfig {
    /// Resolve the API key from the file or the environment.
    pub fn resolve_api_key(&self) -> Result<String, InfraError> {
        if let Some(key) = &self.api_key {
            if !key.trim().is_empty() {
                return Ok(key.clone());
            }
        }
        std::env::var(&self.api_key_env)
            .map_err(|_| InfraError::MissingApiKey(self.api_key_env.clone()))
    }
}

/// One `from -> to` visibility edge in a `[deliberation]` graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileGraphEdge {
    pub from: String,
    pub to: String,
}

/// `[deliberation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDeliberationConfig {
    /// `ensemble`, `chain`, `debate` or `graph`
    pub topology: String,
    pub cycles: usize,
    pub last_n: Option<usize>,
    pub shuffle: bool,
    /// Shared task; per-agent tasks win over it
    pub task: Option<String>,
    /// Registered name or literal combination template; overrides agents'
    pub combination_instructions: Option<String>,
    /// Visibility edges, graph topology only
    pub edges: Vec<FileGraphEdge>,
}

impl Default for FileDeliberationConfig {
    fn default() -> Self {
        Self {
            topology: "ensemble".to_string(),
            cycles: 1,
            last_n: None,
            shuffle: false,
            task: None,
            combination_instructions: None,
            edges: Vec::new(),
        }
    }
}

impl FileDeliberationConfig {
    pub fn to_topology(&self) -> Result<Topology, InfraError> {
        match self.topology.as_str() {
            "ensemble" => Ok(Topology::Ensemble),
            "chain" => Ok(Topology::Chain),
            "debate" => Ok(Topology::Debate),
            "graph" => Ok(Topology::Graph {
                edges: self
                    .edges
                    .iter()
                    .map(|e| GraphEdge {
                        from: NodeRef::Name(e.from.clone()),
                        to: NodeRef::Name(e.to.clone()),
                    })
                    .collect(),
            }),
            other => Err(InfraError::UnknownTopology(other.to_string())),
        }
    }
}

/// One `[[agents]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    pub name: Option<String>,
    pub task: Option<String>,
    pub persona: Option<String>,
    pub persona_template: Option<String>,
    pub system_instructions: Option<String>,
    pub combination_instructions: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub num_responses: Option<usize>,
    /// `first` or `longest`; required when `num_responses > 1`
    pub selector: Option<String>,
}

fn parse_selector(name: &str) -> Result<ResponseSelector, InfraError> {
    match name {
        "first" => Ok(ResponseSelector::first()),
        "longest" => Ok(ResponseSelector::longest()),
        other => Err(InfraError::UnknownSelector(other.to_string())),
    }
}

impl FileAgentConfig {
    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
        }
    }

    pub fn to_spec(&self, registry: &TemplateRegistry) -> Result<AgentSpec, InfraError> {
        let mut builder = AgentSpec::builder().options(self.options());
        if let Some(name) = &self.name {
            builder = builder.name(name);
        }
        if let Some(task) = &self.task {
            builder = builder.task(task);
        }
        if let Some(persona) = &self.persona {
            builder = builder.persona(persona);
        }
        if let Some(template) = &self.persona_template {
            builder = builder.persona_template(template);
        }
        if let Some(instructions) = &self.system_instructions {
            builder = builder.system_instructions(instructions);
        }
        if let Some(instructions) = &self.combination_instructions {
            builder = builder.combination_instructions(instructions);
        }
        if let Some(model) = &self.model {
            builder = builder.model(Model::from(model.clone()));
        }
        if let Some(num_responses) = self.num_responses {
            builder = builder.num_responses(num_responses);
        }
        if let Some(selector) = &self.selector {
            builder = builder.selector(parse_selector(selector)?);
        }
        Ok(builder.build(registry)?)
    }
}

/// `[moderator]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModeratorConfig {
    pub enabled: bool,
    /// Let the moderator draft its own system instructions from the task
    pub auto: bool,
    pub persona: Option<String>,
    pub system_instructions: Option<String>,
    pub combination_instructions: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl FileModeratorConfig {
    /// Builder for the configured moderator, or `None` when disabled.
    pub fn to_builder(&self) -> Result<Option<ModeratorBuilder>, InfraError> {
        if !self.enabled {
            return Ok(None);
        }
        let mut builder = Moderator::builder();
        if self.auto {
            builder = builder.auto();
        }
        if let Some(persona) = &self.persona {
            builder = builder.persona(persona);
        }
        if let Some(instructions) = &self.system_instructions {
            builder = builder.system_instructions(instructions);
        }
        if let Some(instructions) = &self.combination_instructions {
            builder = builder.combination_instructions(instructions);
        }
        if let Some(model) = &self.model {
            builder = builder.model(Model::from(model.clone()));
        }
        let options = CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: None,
        };
        Ok(Some(builder.options(options)))
    }
}

impl FileConfig {
    /// The builtin template registry extended with the file's `[templates]`.
    pub fn registry(&self) -> TemplateRegistry {
        let mut registry = TemplateRegistry::builtin();
        registry.merge(
            self.templates
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        registry
    }
}
