//! Best-of-N response selection strategy.

use std::fmt;
use std::sync::Arc;

/// Injected strategy that picks one response from a best-of-N candidate list.
///
/// The contract is: given the full candidate list, return a non-empty
/// string. The output is trusted verbatim and need not be a member of the
/// list, which allows synthesized or rewritten picks. Returning `None` (or
/// an empty string) is reported by the turn executor as a selection error.
#[derive(Clone)]
pub struct ResponseSelector {
    name: String,
    select: Arc<dyn Fn(&[String]) -> Option<String> + Send + Sync>,
}

impl ResponseSelector {
    pub fn new(
        name: impl Into<String>,
        select: impl Fn(&[String]) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            select: Arc::new(select),
        }
    }

    /// Selects the first candidate. Useful as a baseline and in tests.
    pub fn first() -> Self {
        Self::new("first", |candidates| candidates.first().cloned())
    }

    /// Selects the longest candidate, a crude proxy for thoroughness.
    pub fn longest() -> Self {
        Self::new("longest", |candidates| {
            candidates.iter().max_by_key(|c| c.len()).cloned()
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the strategy to a candidate list.
    pub fn select(&self, candidates: &[String]) -> Option<String> {
        (self.select)(candidates).filter(|s| !s.is_empty())
    }
}

impl fmt::Debug for ResponseSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSelector")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_selector() {
        let selector = ResponseSelector::first();
        assert_eq!(
            selector.select(&candidates(&["a", "b"])),
            Some("a".to_string())
        );
        assert_eq!(selector.select(&[]), None);
    }

    #[test]
    fn test_longest_selector() {
        let selector = ResponseSelector::longest();
        assert_eq!(
            selector.select(&candidates(&["hi", "longest one", "mid"])),
            Some("longest one".to_string())
        );
    }

    #[test]
    fn test_custom_selector_may_synthesize() {
        let selector = ResponseSelector::new("join", |c| Some(c.join(" | ")));
        assert_eq!(
            selector.select(&candidates(&["x", "y"])),
            Some("x | y".to_string())
        );
    }

    #[test]
    fn test_empty_output_treated_as_none() {
        let selector = ResponseSelector::new("empty", |_| Some(String::new()));
        assert_eq!(selector.select(&candidates(&["a"])), None);
    }

    #[test]
    fn test_debug_shows_name_not_closure() {
        let selector = ResponseSelector::first();
        let debug = format!("{:?}", selector);
        assert!(debug.contains("first"));
    }
}
