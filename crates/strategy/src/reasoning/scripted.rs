use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use common::error::ReasoningError;

use crate::reasoning::{ReasoningRequest, ReasoningService};

/// Deterministic reasoning service that replays queued answers in order.
///
/// Used by dry runs and tests; every request it receives is kept so callers
/// can inspect the prompts that were sent.
#[derive(Default)]
pub struct ScriptedReasoning {
    answers: Mutex<VecDeque<Result<Value, String>>>,
    requests: Mutex<Vec<ReasoningRequest>>,
}

impl ScriptedReasoning {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, answer: Value) -> Self {
        self.push(Ok(answer));
        self
    }

    pub fn fail(self, reason: impl Into<String>) -> Self {
        self.push(Err(reason.into()));
        self
    }

    fn push(&self, answer: Result<Value, String>) {
        if let Ok(mut answers) = self.answers.lock() {
            answers.push_back(answer);
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<ReasoningRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ReasoningService for ScriptedReasoning {
    async fn generate(&self, request: &ReasoningRequest) -> Result<Value, ReasoningError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let next = self
            .answers
            .lock()
            .map_err(|e| ReasoningError::Request(e.to_string()))?
            .pop_front();

        match next {
            Some(Ok(value)) => Ok(value),
            Some(Err(reason)) => Err(ReasoningError::Request(reason)),
            None => Err(ReasoningError::Exhausted),
        }
    }
}
