//! Shared test double for the completion port.

use crate::ports::{CompletionGateway, GatewayError};
use async_trait::async_trait;
use colloquy_domain::{CompletionOptions, Model};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One recorded call to the mock gateway.
#[derive(Debug, Clone)]
pub(crate) struct CompletionCall {
    pub model: Model,
    pub system_prompt: Option<String>,
    pub user_prompt: String,
}

/// Mock gateway that records every call and replies with scripted text,
/// falling back to `reply-<n>` counters.
pub(crate) struct MockGateway {
    calls: Mutex<Vec<CompletionCall>>,
    scripted: Mutex<VecDeque<String>>,
    fail_from: Option<usize>,
}

impl MockGateway {
    /// Every call succeeds, replying `reply-0`, `reply-1`, ...
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
            fail_from: None,
        }
    }

    /// Replies are drawn from `replies` first, then fall back to counters.
    pub fn scripted(replies: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scripted: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            fail_from: None,
        }
    }

    /// The first `successes` calls succeed; every later call fails.
    pub fn failing_after(successes: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
            fail_from: Some(successes),
        }
    }

    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionGateway for MockGateway {
    async fn complete(
        &self,
        model: &Model,
        system_prompt: Option<&str>,
        user_prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, GatewayError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(CompletionCall {
                model: model.clone(),
                system_prompt: system_prompt.map(str::to_string),
                user_prompt: user_prompt.to_string(),
            });
            calls.len() - 1
        };

        if let Some(fail_from) = self.fail_from {
            if index >= fail_from {
                return Err(GatewayError::RequestFailed(format!(
                    "scripted failure at call {index}"
                )));
            }
        }

        if let Some(reply) = self.scripted.lock().unwrap().pop_front() {
            return Ok(reply);
        }
        Ok(format!("reply-{index}"))
    }
}
