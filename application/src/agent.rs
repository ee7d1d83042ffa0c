//! Agent turn executor.
//!
//! An [`Agent`] binds a validated [`AgentSpec`] to a completion gateway and
//! owns the private, growing record of every turn it has taken. The turn
//! itself - prompt resolution, the provider call (or best-of-N fan-out),
//! selection, and record construction - lives in [`run_turn`] so that
//! schedulers can execute independent turns concurrently and merge the
//! results deterministically afterwards.

use crate::error::{DeliberationError, SelectionError};
use crate::ports::CompletionGateway;
use colloquy_domain::{
    render, AgentSpec, AgentSpecInfo, ConfigError, ResponseRecord, TemplateValues,
};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// A persona-and-instructions-bound unit that turns a task plus visible
/// context into one response per turn.
pub struct Agent {
    spec: AgentSpec,
    gateway: Arc<dyn CompletionGateway>,
    records: Vec<ResponseRecord>,
}

/// Read-only snapshot of an agent: configuration plus its turn records.
#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    #[serde(flatten)]
    pub spec: AgentSpecInfo,
    pub records: Vec<ResponseRecord>,
}

impl Agent {
    pub fn new(spec: AgentSpec, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            spec,
            gateway,
            records: Vec::new(),
        }
    }

    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    pub(crate) fn gateway(&self) -> Arc<dyn CompletionGateway> {
        Arc::clone(&self.gateway)
    }

    /// Agent identity as it appears in history records.
    pub fn name(&self) -> &str {
        self.spec.name.as_deref().unwrap_or("agent")
    }

    /// Ordered record of every turn this agent has taken.
    pub fn history(&self) -> &[ResponseRecord] {
        &self.records
    }

    /// Selected response texts only, in turn order.
    pub fn responses(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.response.as_str()).collect()
    }

    pub fn info(&self) -> AgentInfo {
        AgentInfo {
            spec: AgentSpecInfo::from(&self.spec),
            records: self.records.clone(),
        }
    }

    /// Single-turn entry point for an agent used outside a structure.
    ///
    /// The agent sees no prior context. Passing a task overrides the
    /// configured one for this and subsequent calls.
    pub async fn process(&mut self, task: Option<&str>) -> Result<String, DeliberationError> {
        if let Some(task) = task {
            self.spec.task = Some(task.to_string());
        }
        let record = self.execute_turn("").await?;
        let response = record.response.clone();
        self.commit(record);
        Ok(response)
    }

    /// Execute one turn against the given history view without committing it.
    pub(crate) async fn execute_turn(
        &self,
        view: &str,
    ) -> Result<ResponseRecord, DeliberationError> {
        run_turn(
            self.spec.clone(),
            Arc::clone(&self.gateway),
            self.name().to_string(),
            view.to_string(),
        )
        .await
    }

    /// Record a completed turn in the agent's private history.
    pub(crate) fn commit(&mut self, record: ResponseRecord) {
        self.records.push(record);
    }
}

/// Execute one agent turn: resolve prompts, call the provider (fanning out
/// for best-of-N), apply selection, and build the record.
///
/// Owns its inputs so schedulers can spawn it onto a task set.
pub(crate) async fn run_turn(
    spec: AgentSpec,
    gateway: Arc<dyn CompletionGateway>,
    agent_name: String,
    view: String,
) -> Result<ResponseRecord, DeliberationError> {
    let task = spec
        .task
        .as_deref()
        .ok_or(ConfigError::NoTask)?
        .to_string();

    // Combination instructions are only in play when there is visible
    // context; a first turn gets the plain task.
    let user_prompt = if view.is_empty() {
        task
    } else {
        let template = spec
            .combination_template
            .as_deref()
            .unwrap_or("${previous_responses}");
        let values = TemplateValues::new().set("previous_responses", view);
        let combination = render(template, &values)?;
        format!("{task}\n{combination}")
    };
    let system_prompt = spec.system_instructions.clone();

    debug!(
        agent = %agent_name,
        model = %spec.model,
        num_responses = spec.num_responses,
        "executing turn"
    );

    if spec.num_responses == 1 {
        let response = gateway
            .complete(
                &spec.model,
                system_prompt.as_deref(),
                &user_prompt,
                &spec.options,
            )
            .await?;
        return Ok(ResponseRecord::new(
            agent_name,
            system_prompt,
            user_prompt,
            response,
        ));
    }

    // Best-of-N: identical prompts, independent calls, all-or-nothing.
    let calls = (0..spec.num_responses).map(|_| {
        gateway.complete(
            &spec.model,
            system_prompt.as_deref(),
            &user_prompt,
            &spec.options,
        )
    });
    let candidates = try_join_all(calls).await?;

    let selector = spec
        .selector
        .as_ref()
        .ok_or(ConfigError::MissingSelector(spec.num_responses))?;
    let selected = selector.select(&candidates).ok_or_else(|| SelectionError {
        selector: selector.name().to_string(),
        candidates: candidates.len(),
    })?;

    Ok(
        ResponseRecord::new(agent_name, system_prompt, user_prompt, selected)
            .with_candidates(candidates),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockGateway;
    use colloquy_domain::{ResponseSelector, TemplateRegistry};

    fn registry() -> TemplateRegistry {
        TemplateRegistry::builtin()
    }

    fn agent_with(spec: AgentSpec, gateway: &Arc<MockGateway>) -> Agent {
        Agent::new(spec, Arc::clone(gateway) as Arc<dyn CompletionGateway>)
    }

    #[tokio::test]
    async fn test_process_uses_configured_task() {
        let gateway = Arc::new(MockGateway::new());
        let spec = AgentSpec::builder()
            .name("solo")
            .task("Name a color.")
            .build(&registry())
            .unwrap();
        let mut agent = agent_with(spec, &gateway);

        let response = agent.process(None).await.unwrap();
        assert_eq!(response, "reply-0");
        assert_eq!(agent.responses(), vec!["reply-0"]);

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].user_prompt, "Name a color.");
        assert!(calls[0].system_prompt.is_none());
    }

    #[tokio::test]
    async fn test_process_task_override() {
        let gateway = Arc::new(MockGateway::new());
        let spec = AgentSpec::builder()
            .task("original")
            .build(&registry())
            .unwrap();
        let mut agent = agent_with(spec, &gateway);

        agent.process(Some("replacement task")).await.unwrap();
        assert_eq!(gateway.calls()[0].user_prompt, "replacement task");
        assert_eq!(agent.spec().task.as_deref(), Some("replacement task"));
    }

    #[tokio::test]
    async fn test_process_without_any_task_fails() {
        let gateway = Arc::new(MockGateway::new());
        let spec = AgentSpec::builder().build(&registry()).unwrap();
        let mut agent = agent_with(spec, &gateway);

        let err = agent.process(None).await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(gateway.calls().len(), 0);
    }

    #[tokio::test]
    async fn test_persona_becomes_system_prompt() {
        let gateway = Arc::new(MockGateway::new());
        let spec = AgentSpec::builder()
            .task("t")
            .persona("a cautious actuary")
            .build(&registry())
            .unwrap();
        let mut agent = agent_with(spec, &gateway);

        agent.process(None).await.unwrap();
        let system = gateway.calls()[0].system_prompt.clone().unwrap();
        assert!(system.contains("a cautious actuary"));
    }

    #[tokio::test]
    async fn test_nonempty_view_appends_combination_block() {
        let gateway = Arc::new(MockGateway::new());
        let spec = AgentSpec::builder()
            .name("b")
            .task("t")
            .combination_instructions("default")
            .build(&registry())
            .unwrap();
        let agent = agent_with(spec, &gateway);

        let record = agent.execute_turn("Response 0: X").await.unwrap();
        assert!(record.user_prompt.contains("Response 0: X"));
        assert!(record.user_prompt.starts_with("t\n"));
    }

    #[tokio::test]
    async fn test_empty_view_means_plain_task_prompt() {
        let gateway = Arc::new(MockGateway::new());
        let spec = AgentSpec::builder()
            .task("t")
            .combination_instructions("default")
            .build(&registry())
            .unwrap();
        let agent = agent_with(spec, &gateway);

        let record = agent.execute_turn("").await.unwrap();
        assert_eq!(record.user_prompt, "t");
    }

    #[tokio::test]
    async fn test_best_of_n_collects_all_candidates() {
        let gateway = Arc::new(MockGateway::new());
        let spec = AgentSpec::builder()
            .task("t")
            .num_responses(5)
            .selector(ResponseSelector::new("synth", |_| {
                Some("a synthesized pick".to_string())
            }))
            .build(&registry())
            .unwrap();
        let agent = agent_with(spec, &gateway);

        let record = agent.execute_turn("").await.unwrap();
        assert_eq!(record.candidates.len(), 5);
        // The selector's return value is trusted verbatim
        assert_eq!(record.response, "a synthesized pick");
        assert_eq!(gateway.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_selector_returning_none_is_selection_error() {
        let gateway = Arc::new(MockGateway::new());
        let spec = AgentSpec::builder()
            .task("t")
            .num_responses(2)
            .selector(ResponseSelector::new("refuses", |_| None))
            .build(&registry())
            .unwrap();
        let agent = agent_with(spec, &gateway);

        let err = agent.execute_turn("").await.unwrap_err();
        assert!(matches!(err, DeliberationError::Selection(_)));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let gateway = Arc::new(MockGateway::failing_after(0));
        let spec = AgentSpec::builder()
            .task("t")
            .build(&registry())
            .unwrap();
        let mut agent = agent_with(spec, &gateway);

        let err = agent.process(None).await.unwrap_err();
        assert!(matches!(err, DeliberationError::Provider(_)));
        assert!(agent.history().is_empty());
    }
}
