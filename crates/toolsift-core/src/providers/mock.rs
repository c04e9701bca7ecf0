//! Mock provider for testing
//!
//! Provides deterministic, scripted responses without network dependencies.
//! Every request is recorded so tests can assert on what the model was shown.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, ModelResponse, Provider};
use crate::logging::Logger;
use crate::types::{CancellationToken, ChatMessage, ContentPart, MessageRole, ToolCall};

/// One scripted model reply
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Answer with text
    Text(String),
    /// Answer with the last user message
    Echo,
    /// Request tool calls; empty call ids are filled in as `call_<n>`
    Call(Vec<ToolCall>),
    /// Answer with the tool results of the latest round, `Result: <content>`
    ReportToolResults,
    /// Fail the request
    Fail(String),
}

impl MockStep {
    pub fn text(text: impl Into<String>) -> Self {
        MockStep::Text(text.into())
    }

    /// A single tool call
    pub fn call(name: impl Into<String>, input: Value) -> Self {
        MockStep::Call(vec![ToolCall::new("", name, input)])
    }
}

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return a fixed response
    Fixed(String),
    /// Play the steps in order, failing once they run out
    Script(Vec<MockStep>),
    /// Play the same step forever
    Repeat(MockStep),
}

/// A request as the mock received it
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub messages: Vec<ChatMessage>,
    pub options: ChatOptions,
}

/// Mock LLM provider for testing
pub struct MockProvider {
    mode: MockMode,
    script: Mutex<VecDeque<MockStep>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<MockRequest>>,
    call_counter: AtomicUsize,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    pub fn new(mode: MockMode, logger: Arc<dyn Logger>) -> Self {
        let script = match &mode {
            MockMode::Script(steps) => steps.iter().cloned().collect(),
            _ => VecDeque::new(),
        };
        Self {
            mode,
            script: Mutex::new(script),
            delay: None,
            requests: Mutex::new(Vec::new()),
            call_counter: AtomicUsize::new(0),
            logger,
        }
    }

    /// Create an echo provider (echoes back user message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Echo, logger)
    }

    /// Create a fixed response provider
    pub fn fixed(response: impl Into<String>, logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Fixed(response.into()), logger)
    }

    /// Create a provider that plays `steps` in order
    pub fn scripted(steps: Vec<MockStep>, logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Script(steps), logger)
    }

    /// Create a provider that answers every request with `step`
    pub fn repeating(step: MockStep, logger: Arc<dyn Logger>) -> Self {
        Self::new(MockMode::Repeat(step), logger)
    }

    /// Wait this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Steps of a script that have not been played yet
    pub fn remaining_steps(&self) -> usize {
        self.script.lock().len()
    }

    fn next_step(&self) -> ProviderResult<MockStep> {
        match &self.mode {
            MockMode::Echo => Ok(MockStep::Echo),
            MockMode::Fixed(text) => Ok(MockStep::Text(text.clone())),
            MockMode::Repeat(step) => Ok(step.clone()),
            MockMode::Script(_) => self
                .script
                .lock()
                .pop_front()
                .ok_or_else(|| ProviderError::Other("mock script exhausted".to_string())),
        }
    }

    fn respond(&self, step: MockStep, messages: &[ChatMessage]) -> ProviderResult<ModelResponse> {
        match step {
            MockStep::Text(text) => Ok(ModelResponse::Text(text)),
            MockStep::Echo => Ok(ModelResponse::Text(last_user_text(messages))),
            MockStep::Call(calls) => {
                let calls = calls
                    .into_iter()
                    .map(|mut call| {
                        if call.id.is_empty() {
                            let n = self.call_counter.fetch_add(1, Ordering::SeqCst) + 1;
                            call.id = format!("call_{}", n);
                        }
                        call
                    })
                    .collect();
                Ok(ModelResponse::ToolCalls { text: None, calls })
            }
            MockStep::ReportToolResults => Ok(ModelResponse::Text(report_tool_results(messages))),
            MockStep::Fail(message) => Err(ProviderError::api_error("mock", 500, message)),
        }
    }
}

fn last_user_text(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .rev()
        .filter(|m| m.role == MessageRole::User)
        .find_map(|m| m.text().filter(|t| !t.is_empty()))
        .unwrap_or("Hello from MockProvider!")
        .to_string()
}

fn report_tool_results(messages: &[ChatMessage]) -> String {
    let results: Vec<String> = messages
        .iter()
        .rev()
        .map(|m| {
            m.parts()
                .iter()
                .filter_map(|p| match p {
                    ContentPart::ToolResult { content, .. } => Some(format!("Result: {}", content)),
                    _ => None,
                })
                .collect::<Vec<_>>()
        })
        .find(|r| !r.is_empty())
        .unwrap_or_default();

    if results.is_empty() {
        "No tool results".to_string()
    } else {
        results.join("\n")
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
        cancel: CancellationToken,
    ) -> ProviderResult<ModelResponse> {
        self.logger.debug(&format!(
            "[MockProvider] chat: {} messages, tools={:?}",
            messages.len(),
            options.tool_names()
        ));
        self.requests.lock().push(MockRequest {
            messages: messages.clone(),
            options,
        });

        if let Some(delay) = self.delay {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            }
        }
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let step = self.next_step()?;
        self.respond(step, &messages)
    }
}
