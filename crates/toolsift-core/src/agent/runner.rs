//! The function-calling agent loop

use std::collections::HashMap;
use std::sync::Arc;

use super::error::{AgentError, AgentResult};
use super::executor::ToolExecutor;
use super::history::ConversationHistory;
use super::turn::{ConversationTurn, ExecutionRecord, TurnOutcome};
use crate::config::{AgentConfig, ToolsiftConfig};
use crate::index::{create_backend, ObjectIndex};
use crate::logging::Logger;
use crate::{log_debug, log_error, log_info, log_warn};
use crate::providers::{create_provider, ChatOptions, ModelResponse, Provider, ProviderError};
use crate::secrets::SecretStore;
use crate::tools::{Tool, ToolRegistry};
use crate::types::{CancellationToken, ChatMessage, ToolResult};

/// Result of one `chat` call
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub turn: ConversationTurn,
    /// The caller's history with `turn` appended
    pub history: ConversationHistory,
}

impl TurnOutput {
    pub fn response(&self) -> &str {
        &self.turn.response
    }
}

/// Answers user messages by retrieving the relevant tools for each message
/// and letting the model call only those.
///
/// A turn moves through retrieval, presentation of the retrieved tool
/// schemas, model calls and tool-execution rounds until the model answers
/// in text or the round limit is reached. The agent keeps no per-turn state,
/// so one instance can serve concurrent turns.
pub struct FunctionCallingAgent {
    index: Arc<ObjectIndex>,
    provider: Arc<dyn Provider>,
    config: AgentConfig,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    executor: ToolExecutor,
    logger: Arc<dyn Logger>,
}

impl FunctionCallingAgent {
    pub fn new(
        index: Arc<ObjectIndex>,
        provider: Arc<dyn Provider>,
        config: AgentConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let executor = ToolExecutor::new(Arc::clone(index.registry()), Arc::clone(&logger));
        Self {
            index,
            provider,
            config,
            temperature: None,
            max_tokens: None,
            executor,
            logger,
        }
    }

    /// Wire up index, backend and provider from a loaded configuration, then
    /// index every tool in `registry`
    pub async fn from_config(
        config: &ToolsiftConfig,
        registry: Arc<ToolRegistry>,
        secrets: Arc<dyn SecretStore>,
        logger: Arc<dyn Logger>,
    ) -> AgentResult<Self> {
        config.validate()?;

        let backend = create_backend(&config.embedding, Arc::clone(&secrets), Arc::clone(&logger));
        let index = Arc::new(ObjectIndex::new(registry, backend, Arc::clone(&logger)));
        index.build().await.map_err(AgentError::Retrieval)?;

        let provider = create_provider(&config.model, secrets, Arc::clone(&logger))
            .map_err(AgentError::Model)?;

        let mut agent = Self::new(index, provider, config.agent.clone(), logger);
        agent.temperature = config.model.temperature;
        agent.max_tokens = config.model.max_tokens;
        Ok(agent)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<ObjectIndex> {
        &self.index
    }

    /// Answer `message` in the context of `history`
    pub async fn chat(
        &self,
        history: &ConversationHistory,
        message: &str,
    ) -> AgentResult<TurnOutput> {
        self.chat_with_cancel(history, message, &CancellationToken::new())
            .await
    }

    /// `chat` that stops waiting on retrieval or the model once `cancel` fires
    ///
    /// Tool calls already dispatched run to completion; no further round starts.
    pub async fn chat_with_cancel(
        &self,
        history: &ConversationHistory,
        message: &str,
        cancel: &CancellationToken,
    ) -> AgentResult<TurnOutput> {
        let cancel = cancel.child_token();
        log_info!(self.logger, "[Agent] New turn: {}", message);

        let tools = self
            .index
            .retrieve_within(message, self.config.top_k, self.config.retrieval_timeout(), &cancel)
            .await?;

        let offered_tools: Vec<String> = tools.iter().map(|t| t.name().to_string()).collect();
        log_info!(self.logger, "[Agent] Offering tools: {:?}", offered_tools);

        let mut options = ChatOptions::new()
            .with_tools(tools.iter().map(|t| t.spec().definition()).collect());
        if let Some(temperature) = self.temperature {
            options = options.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }
        let offered: HashMap<String, Tool> = tools
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();

        let mut messages = Vec::new();
        if let Some(prompt) = &self.config.system_prompt {
            messages.push(ChatMessage::system(prompt));
        }
        messages.extend(history.to_messages(self.config.history_window));
        messages.push(ChatMessage::user(message));

        let mut records: Vec<ExecutionRecord> = Vec::new();
        let mut rounds = 0;

        let (response, outcome) = loop {
            let (text, calls) = match self.call_model(&messages, &options, &cancel).await? {
                ModelResponse::Text(text) => break (text, TurnOutcome::Answered),
                ModelResponse::ToolCalls { text, calls } if calls.is_empty() => {
                    break (text.unwrap_or_default(), TurnOutcome::Answered)
                }
                ModelResponse::ToolCalls { text, calls } => (text, calls),
            };

            if rounds >= self.config.max_rounds {
                log_warn!(
                    self.logger,
                    "[Agent] Round limit ({}) reached, returning fallback response",
                    self.config.max_rounds
                );
                break (self.config.fallback_response.clone(), TurnOutcome::RoundLimitReached);
            }

            rounds += 1;
            log_debug!(
                self.logger,
                "[Agent] Round {}: executing {} tool calls",
                rounds,
                calls.len()
            );
            let round_records = self
                .executor
                .execute_all(&calls, &offered, rounds, self.config.parallel_tool_calls)
                .await;

            let results: Vec<ToolResult> = round_records.iter().map(|r| r.to_tool_result()).collect();
            messages.push(ChatMessage::assistant_tool_calls(text, &calls));
            messages.push(ChatMessage::tool_results(&results));
            records.extend(round_records);

            if cancel.is_cancelled() {
                self.logger.info("[Agent] Turn cancelled after tool execution");
                return Err(AgentError::Cancelled);
            }
        };

        log_info!(
            self.logger,
            "[Agent] Turn finished: {:?} after {} rounds",
            outcome,
            rounds
        );

        let turn = ConversationTurn {
            user_message: message.to_string(),
            offered_tools,
            records,
            response,
            outcome,
            rounds,
        };
        let history = history.with_turn(turn.clone());
        Ok(TurnOutput { turn, history })
    }

    async fn call_model(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> AgentResult<ModelResponse> {
        let request = self
            .provider
            .chat(messages.to_vec(), options.clone(), cancel.clone());

        let bounded = async {
            match self.config.model_timeout() {
                Some(limit) => match tokio::time::timeout(limit, request).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout(limit)),
                },
                None => request.await,
            }
        };

        let result = tokio::select! {
            result = bounded => result,
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
        };

        result.map_err(|e| {
            log_error!(self.logger, "[Agent] Model call failed: {}", e);
            AgentError::from(e)
        })
    }
}
