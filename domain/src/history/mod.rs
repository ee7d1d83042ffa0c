//! Deliberation history - the shared, append-only log of agent turns.
//!
//! Every turn an agent takes produces a [`ResponseRecord`]; records are
//! appended in completion-merge order and never reordered or mutated.
//! Consumers read the history through [`DeliberationHistory::view`], which
//! renders a visibility-limited window as a single formatted string.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One agent turn: the prompts that were sent, the selected response, and
/// (for best-of-N turns) the full candidate list.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseRecord {
    /// Name of the agent that produced this turn
    pub agent: String,
    /// Rendered system prompt, if the agent had one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Rendered user prompt
    pub user_prompt: String,
    /// The selected response text
    pub response: String,
    /// All candidate drafts when the turn was best-of-N (empty otherwise)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub candidates: Vec<String>,
    /// When the turn completed
    pub created_at: DateTime<Utc>,
}

impl ResponseRecord {
    /// Creates a record for an ordinary single-response turn.
    pub fn new(
        agent: impl Into<String>,
        system_prompt: Option<String>,
        user_prompt: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            agent: agent.into(),
            system_prompt,
            user_prompt: user_prompt.into(),
            response: response.into(),
            candidates: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Attaches the full candidate list of a best-of-N turn.
    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Whether this record came from a best-of-N turn.
    pub fn is_best_of_n(&self) -> bool {
        !self.candidates.is_empty()
    }
}

/// How records are labeled when rendered into a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Labeling {
    /// `Response 0: <text>` - position in the window, zero-based
    #[default]
    Indexed,
    /// `<agent>: <text>` - producer identity, used by Graph topologies
    /// where predecessor attribution matters
    Named,
}

/// Append-only, ordered log of all turns within one structure run.
#[derive(Debug, Clone, Default)]
pub struct DeliberationHistory {
    records: Vec<ResponseRecord>,
}

impl DeliberationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed turn. Records are never reordered after insertion.
    pub fn append(&mut self, record: ResponseRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ResponseRecord] {
        &self.records
    }

    /// The most recent record produced by `agent`, if any.
    pub fn latest_by(&self, agent: &str) -> Option<&ResponseRecord> {
        self.records.iter().rev().find(|r| r.agent == agent)
    }

    /// Render the most recent `last_n` records (all when `None`) as a
    /// single string, oldest first.
    ///
    /// `Some(0)` yields an empty view; a window larger than the history
    /// yields the entire history.
    pub fn view(&self, last_n: Option<usize>, labeling: Labeling) -> String {
        let window = match last_n {
            Some(n) => &self.records[self.records.len().saturating_sub(n)..],
            None => &self.records[..],
        };
        format_records(window.iter(), labeling)
    }
}

/// Format a sequence of records the way [`DeliberationHistory::view`] does.
///
/// Exposed separately so schedulers can render views over record subsets
/// that are not contiguous windows (e.g. a Graph node's predecessors).
pub fn format_records<'a>(
    records: impl Iterator<Item = &'a ResponseRecord>,
    labeling: Labeling,
) -> String {
    records
        .enumerate()
        .map(|(i, record)| match labeling {
            Labeling::Indexed => format!("Response {}: {}", i, record.response),
            Labeling::Named => format!("{}: {}", record.agent, record.response),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(agent: &str, response: &str) -> ResponseRecord {
        ResponseRecord::new(agent, None, "prompt", response)
    }

    fn history_of(entries: &[(&str, &str)]) -> DeliberationHistory {
        let mut history = DeliberationHistory::new();
        for (agent, response) in entries {
            history.append(record(agent, response));
        }
        history
    }

    #[test]
    fn test_view_all_indexed() {
        let history = history_of(&[("a", "first"), ("b", "second")]);
        let view = history.view(None, Labeling::Indexed);
        assert_eq!(view, "Response 0: first\nResponse 1: second");
    }

    #[test]
    fn test_view_named_labels_use_agent() {
        let history = history_of(&[("alice", "first"), ("bob", "second")]);
        let view = history.view(None, Labeling::Named);
        assert_eq!(view, "alice: first\nbob: second");
    }

    #[test]
    fn test_view_last_n_takes_most_recent_oldest_first() {
        let history = history_of(&[("a", "one"), ("b", "two"), ("c", "three")]);
        let view = history.view(Some(2), Labeling::Indexed);
        assert_eq!(view, "Response 0: two\nResponse 1: three");
    }

    #[test]
    fn test_view_last_n_zero_is_empty() {
        let history = history_of(&[("a", "one")]);
        assert_eq!(history.view(Some(0), Labeling::Indexed), "");
    }

    #[test]
    fn test_view_last_n_beyond_len_is_everything() {
        let history = history_of(&[("a", "one"), ("b", "two")]);
        let view = history.view(Some(10), Labeling::Indexed);
        assert_eq!(view, "Response 0: one\nResponse 1: two");
    }

    #[test]
    fn test_view_empty_history() {
        let history = DeliberationHistory::new();
        assert_eq!(history.view(None, Labeling::Indexed), "");
        assert!(history.is_empty());
    }

    #[test]
    fn test_latest_by_finds_most_recent() {
        let history = history_of(&[("a", "old"), ("b", "other"), ("a", "new")]);
        assert_eq!(history.latest_by("a").unwrap().response, "new");
        assert!(history.latest_by("missing").is_none());
    }

    #[test]
    fn test_record_best_of_n() {
        let rec = record("a", "picked")
            .with_candidates(vec!["one".into(), "two".into(), "picked".into()]);
        assert!(rec.is_best_of_n());
        assert_eq!(rec.candidates.len(), 3);
        assert!(!record("a", "solo").is_best_of_n());
    }

    #[test]
    fn test_record_serializes_without_empty_candidates() {
        let json = serde_json::to_string(&record("a", "text")).unwrap();
        assert!(!json.contains("candidates"));
        assert!(!json.contains("system_prompt"));
    }
}
