//! Structure - the topology-driven deliberation scheduler.
//!
//! A [`Structure`] owns a set of agents, a topology, and the shared
//! [`DeliberationHistory`]. `process()` runs the topology's cycles,
//! deciding for every turn which agent runs and what portion of the
//! history it may see, and finally hands the accumulated history to the
//! moderator when one is configured.
//!
//! Independent turns (an Ensemble wave) execute concurrently against the
//! provider, but their results are merged into the history in
//! agent-declaration order at the wave barrier, so downstream visibility
//! is reproducible for a fixed agent list.

use crate::agent::{run_turn, Agent, AgentInfo};
use crate::error::DeliberationError;
use crate::moderator::{Moderator, ModeratorInfo};
use crate::ports::{CompletionGateway, GatewayError};
use colloquy_domain::{
    format_records, role, AgentSpec, ConfigError, DeliberationHistory, GraphPlan, Labeling,
    ResponseRecord, TemplateRegistry, Topology,
};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Builder for [`Structure`], with construction-time topology validation.
pub struct StructureBuilder {
    topology: Topology,
    agents: Vec<AgentSpec>,
    task: Option<String>,
    cycles: Option<usize>,
    last_n: Option<usize>,
    shuffle: bool,
    combination_instructions: Option<String>,
    moderator: Option<Moderator>,
}

impl StructureBuilder {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            agents: Vec::new(),
            task: None,
            cycles: None,
            last_n: None,
            shuffle: false,
            combination_instructions: None,
            moderator: None,
        }
    }

    pub fn agent(mut self, spec: AgentSpec) -> Self {
        self.agents.push(spec);
        self
    }

    pub fn agents(mut self, specs: impl IntoIterator<Item = AgentSpec>) -> Self {
        self.agents.extend(specs);
        self
    }

    /// Task shared by the structure; fills in for agents without their own.
    pub fn task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Number of full passes over the topology per `process()` call.
    pub fn cycles(mut self, cycles: usize) -> Self {
        self.cycles = Some(cycles);
        self
    }

    /// Maximum number of most-recent records a turn may see.
    pub fn last_n(mut self, last_n: usize) -> Self {
        self.last_n = Some(last_n);
        self
    }

    /// Randomize Chain visitation order each cycle.
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Registered name or literal template containing
    /// `${previous_responses}`; overrides every agent's own.
    pub fn combination_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.combination_instructions = Some(instructions.into());
        self
    }

    pub fn moderator(mut self, moderator: Moderator) -> Self {
        self.moderator = Some(moderator);
        self
    }

    /// Validate the whole configuration and assemble the structure.
    ///
    /// Fails fast with a [`ConfigError`] before any provider call.
    pub fn build(
        mut self,
        registry: &TemplateRegistry,
        gateway: Arc<dyn CompletionGateway>,
    ) -> Result<Structure, ConfigError> {
        if self.agents.is_empty() {
            return Err(ConfigError::NoAgents);
        }
        let cycles = match self.cycles {
            Some(0) => return Err(ConfigError::ZeroCycles),
            Some(n) => n,
            None => 1,
        };
        if matches!(self.topology, Topology::Debate) && self.agents.len() != 2 {
            return Err(ConfigError::DebateArity(self.agents.len()));
        }

        // Assign stable names; Graph labeling and edge resolution need them.
        for (index, spec) in self.agents.iter_mut().enumerate() {
            if spec.name.is_none() {
                spec.name = Some(format!("agent_{index}"));
            }
        }
        let names: Vec<String> = self
            .agents
            .iter()
            .map(|spec| spec.name.clone().unwrap_or_default())
            .collect();

        let graph_plan = match &self.topology {
            Topology::Graph { edges } => {
                for (i, name) in names.iter().enumerate() {
                    if names[..i].contains(name) {
                        return Err(ConfigError::DuplicateAgent(name.clone()));
                    }
                }
                Some(GraphPlan::new(&names, edges)?)
            }
            _ => None,
        };

        // Task: per-agent tasks win; the structure's task fills the gaps.
        for spec in &mut self.agents {
            if spec.task.is_none() {
                match &self.task {
                    Some(task) => spec.task = Some(task.clone()),
                    None => return Err(ConfigError::NoTask),
                }
            }
        }
        let primary_task = self
            .task
            .clone()
            .or_else(|| self.agents[0].task.clone())
            .unwrap_or_default();

        // Combination instructions: an explicit structure-level template
        // overrides agents' own; otherwise agents keep theirs, with the
        // topology default filling the gaps.
        let structure_template = match &self.combination_instructions {
            Some(name_or_literal) => {
                let template = registry.resolve(role::COMBINATION, name_or_literal);
                colloquy_domain::ensure_placeholder(
                    template,
                    "previous_responses",
                    "combination instructions",
                )?;
                Some(template.to_string())
            }
            None => None,
        };
        let default_name = match self.topology {
            Topology::Debate => "debate",
            _ => "default",
        };
        for spec in &mut self.agents {
            match &structure_template {
                Some(template) => {
                    if spec.combination_template.is_some() {
                        warn!(
                            agent = spec.name.as_deref().unwrap_or(""),
                            "structure combination instructions override the agent's own"
                        );
                    }
                    spec.combination_template = Some(template.clone());
                }
                None => {
                    if spec.combination_template.is_none() {
                        spec.combination_template =
                            Some(registry.resolve(role::COMBINATION, default_name).to_string());
                    }
                }
            }
        }

        let agents = self
            .agents
            .into_iter()
            .map(|spec| Agent::new(spec, Arc::clone(&gateway)))
            .collect();

        Ok(Structure {
            topology: self.topology,
            graph_plan,
            agents,
            task: self.task,
            primary_task,
            cycles,
            completed_cycles: 0,
            last_n: self.last_n,
            shuffle: self.shuffle,
            moderator: self.moderator,
            history: DeliberationHistory::new(),
            final_response: None,
        })
    }
}

/// A deliberation in progress: agents, topology, and the shared history.
pub struct Structure {
    topology: Topology,
    graph_plan: Option<GraphPlan>,
    agents: Vec<Agent>,
    task: Option<String>,
    primary_task: String,
    cycles: usize,
    completed_cycles: usize,
    last_n: Option<usize>,
    shuffle: bool,
    moderator: Option<Moderator>,
    history: DeliberationHistory,
    final_response: Option<String>,
}

impl std::fmt::Debug for Structure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Structure")
            .field("topology", &self.topology)
            .field("task", &self.task)
            .field("cycles", &self.cycles)
            .field("completed_cycles", &self.completed_cycles)
            .finish_non_exhaustive()
    }
}

/// Read-only snapshot of a structure.
#[derive(Debug, Clone, Serialize)]
pub struct StructureInfo {
    pub topology: String,
    pub task: Option<String>,
    pub cycles: usize,
    pub completed_cycles: usize,
    pub last_n: Option<usize>,
    pub shuffle: bool,
    pub history_len: usize,
    pub agents: Vec<AgentInfo>,
    pub moderator: Option<ModeratorInfo>,
}

impl Structure {
    pub fn builder(topology: Topology) -> StructureBuilder {
        StructureBuilder::new(topology)
    }

    /// Run `cycles` full passes over the topology, then the moderator.
    ///
    /// Re-invocation continues the deliberation: further cycles append to
    /// the existing history, which is never reset. On the first provider
    /// or selection failure the run aborts; turns merged before the
    /// failure stay visible.
    pub async fn process(&mut self) -> Result<(), DeliberationError> {
        info!(
            topology = self.topology.kind(),
            cycles = self.cycles,
            agents = self.agents.len(),
            "starting deliberation run"
        );

        for _ in 0..self.cycles {
            match self.topology.clone() {
                Topology::Ensemble => self.run_ensemble_cycle().await?,
                Topology::Chain => {
                    let mut order: Vec<usize> = (0..self.agents.len()).collect();
                    if self.shuffle {
                        order.shuffle(&mut rand::thread_rng());
                    }
                    self.run_sequential_cycle(order).await?;
                }
                Topology::Debate => {
                    self.run_sequential_cycle(vec![0, 1]).await?;
                }
                Topology::Graph { .. } => self.run_graph_cycle().await?,
            }
            self.completed_cycles += 1;
        }

        if let Some(mut moderator) = self.moderator.take() {
            let view = self.history.view(self.last_n, Labeling::Indexed);
            let task = self.primary_task.clone();
            let result = moderator.synthesize(&task, &view).await;
            // Keep the moderator (and its records) even when the turn failed
            self.moderator = Some(moderator);
            let record = result?;
            self.final_response = Some(record.response);
        }

        info!(history_len = self.history.len(), "deliberation run complete");
        Ok(())
    }

    /// One Ensemble wave: mutually independent turns over a pre-wave
    /// snapshot of the history, merged in declaration order.
    async fn run_ensemble_cycle(&mut self) -> Result<(), DeliberationError> {
        let view = self.history.view(self.last_n, Labeling::Indexed);
        let mut join_set = JoinSet::new();

        for (index, agent) in self.agents.iter().enumerate() {
            let spec = agent.spec().clone();
            let gateway = agent.gateway();
            let name = agent.name().to_string();
            let view = view.clone();
            join_set.spawn(async move { (index, run_turn(spec, gateway, name, view).await) });
        }

        let mut results: Vec<Option<Result<ResponseRecord, DeliberationError>>> =
            (0..self.agents.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => {
                    return Err(GatewayError::Other(format!("turn task failed: {e}")).into())
                }
            }
        }

        for (index, slot) in results.into_iter().enumerate() {
            match slot {
                Some(Ok(record)) => self.merge(index, record),
                Some(Err(e)) => {
                    warn!(agent = self.agents[index].name(), "turn failed, aborting run");
                    return Err(e);
                }
                None => {
                    return Err(GatewayError::Other("missing wave result".to_string()).into())
                }
            }
        }
        Ok(())
    }

    /// One pass visiting agents in `order`, each seeing the `last_n` most
    /// recent records at the moment its turn starts.
    async fn run_sequential_cycle(
        &mut self,
        order: Vec<usize>,
    ) -> Result<(), DeliberationError> {
        for index in order {
            let view = self.history.view(self.last_n, Labeling::Indexed);
            let record = self.agents[index].execute_turn(&view).await?;
            self.merge(index, record);
        }
        Ok(())
    }

    /// One pass over the DAG in topological order; each node sees the
    /// name-labeled latest record of its direct predecessors.
    async fn run_graph_cycle(&mut self) -> Result<(), DeliberationError> {
        let plan = match &self.graph_plan {
            Some(plan) => plan.clone(),
            None => return Err(ConfigError::CyclicGraph.into()),
        };
        for &index in plan.order() {
            let view = {
                let predecessor_records = plan
                    .predecessors(index)
                    .iter()
                    .filter_map(|&p| self.history.latest_by(self.agents[p].name()));
                format_records(predecessor_records, Labeling::Named)
            };
            let record = self.agents[index].execute_turn(&view).await?;
            self.merge(index, record);
        }
        Ok(())
    }

    fn merge(&mut self, index: usize, record: ResponseRecord) {
        debug!(agent = record.agent.as_str(), "merging turn into history");
        self.agents[index].commit(record.clone());
        self.history.append(record);
    }

    /// Every primary agent turn's selected text, in history order.
    pub fn responses(&self) -> Vec<String> {
        self.history
            .records()
            .iter()
            .map(|r| r.response.clone())
            .collect()
    }

    /// The moderator's synthesis, when one was configured and its turn ran.
    pub fn final_response(&self) -> Option<&str> {
        self.final_response.as_deref()
    }

    pub fn history(&self) -> &DeliberationHistory {
        &self.history
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn moderator(&self) -> Option<&Moderator> {
        self.moderator.as_ref()
    }

    pub fn info(&self) -> StructureInfo {
        StructureInfo {
            topology: self.topology.kind().to_string(),
            task: self.task.clone(),
            cycles: self.cycles,
            completed_cycles: self.completed_cycles,
            last_n: self.last_n,
            shuffle: self.shuffle,
            history_len: self.history.len(),
            agents: self.agents.iter().map(Agent::info).collect(),
            moderator: self.moderator.as_ref().map(Moderator::info),
        }
    }
}
