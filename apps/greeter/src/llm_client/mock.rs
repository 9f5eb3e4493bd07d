use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmClient, LlmError};

/// In-memory LLM double. Replies are served in order; the last reply is
/// repeated once the queue is down to one. Every prompt is recorded.
pub struct MockLlmClient {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<(String, f64)>>,
}

impl MockLlmClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_responses([response.into()])
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Prompts and temperatures received so far, in call order.
    pub fn calls(&self) -> Vec<(String, f64)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate_text(&self, prompt: &str, temperature: f64) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((prompt.to_string(), temperature));
        }

        let mut responses = self
            .responses
            .lock()
            .map_err(|_| LlmError::EmptyContent)?;
        let reply = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        reply.ok_or(LlmError::EmptyContent)
    }
}
