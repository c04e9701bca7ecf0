//! End-to-end turns against the lexical index and the scripted mock provider

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use super::*;
use crate::config::{AgentConfig, ModelSettings, ToolsiftConfig};
use crate::index::{InMemoryVectorBackend, LexicalEmbedder, ObjectIndex};
use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
use crate::providers::{MockProvider, MockStep, Provider};
use crate::secrets::MemorySecretStore;
use crate::tools::{ParamSpec, Tool, ToolError, ToolRegistry, ToolSpec};
use crate::types::{CancellationToken, ContentPart, MessageRole};

const USELESS_TOOLS: usize = 28;

fn multiply() -> Tool {
    Tool::from_sync(
        ToolSpec::new("multiply", "Multiply two integers and return the result")
            .with_param(ParamSpec::integer("a"))
            .with_param(ParamSpec::integer("b")),
        |args| {
            let a = args.get_i64("a").unwrap_or_default();
            let b = args.get_i64("b").unwrap_or_default();
            Ok(json!(a * b))
        },
    )
}

fn add() -> Tool {
    Tool::from_sync(
        ToolSpec::new("add", "Add two integers and return the result")
            .with_param(ParamSpec::integer("a"))
            .with_param(ParamSpec::integer("b")),
        |args| {
            let a = args.get_i64("a").unwrap_or_default();
            let b = args.get_i64("b").unwrap_or_default();
            Ok(json!(a + b))
        },
    )
}

fn useless(n: usize) -> Tool {
    Tool::from_sync(
        ToolSpec::new(format!("useless_{}", n), "Toy useless function"),
        |_| Ok(Value::Null),
    )
}

fn registry() -> Arc<ToolRegistry> {
    let registry = Arc::new(ToolRegistry::new(NoOpLogger::shared()));
    registry.register(multiply()).unwrap();
    registry.register(add()).unwrap();
    registry
        .register_all((0..USELESS_TOOLS).map(useless))
        .unwrap();
    registry
}

async fn index_for(registry: Arc<ToolRegistry>) -> Arc<ObjectIndex> {
    let backend = Arc::new(InMemoryVectorBackend::new(LexicalEmbedder::new()));
    let index = Arc::new(ObjectIndex::new(registry, backend, NoOpLogger::shared()));
    index.build().await.unwrap();
    index
}

async fn agent_with(provider: Arc<MockProvider>, config: AgentConfig) -> FunctionCallingAgent {
    let index = index_for(registry()).await;
    FunctionCallingAgent::new(index, provider, config, NoOpLogger::shared())
}

fn offered_names(provider: &MockProvider, request: usize) -> Vec<String> {
    provider.requests()[request]
        .options
        .tool_names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_multiply_question() {
    let provider = Arc::new(MockProvider::scripted(
        vec![
            MockStep::call("multiply", json!({ "a": 212, "b": 122 })),
            MockStep::ReportToolResults,
        ],
        NoOpLogger::shared(),
    ));
    let agent = agent_with(provider.clone(), AgentConfig::default()).await;

    let output = agent
        .chat(&ConversationHistory::new(), "What's 212 multiplied by 122?")
        .await
        .unwrap();

    assert_eq!(output.turn.offered_tools.len(), 3);
    assert_eq!(output.turn.offered_tools[0], "multiply");
    assert_eq!(output.turn.records.len(), 1);
    assert_eq!(output.turn.records[0].outcome, ToolOutcome::Success(json!(25864)));
    assert_eq!(output.response(), "Result: 25864");
    assert_eq!(output.turn.outcome, TurnOutcome::Answered);
    assert_eq!(output.history.len(), 1);
}

#[tokio::test]
async fn test_add_question() {
    let provider = Arc::new(MockProvider::scripted(
        vec![
            MockStep::call("add", json!({ "a": 212, "b": 122 })),
            MockStep::ReportToolResults,
        ],
        NoOpLogger::shared(),
    ));
    let agent = agent_with(provider.clone(), AgentConfig::default()).await;

    let output = agent
        .chat(&ConversationHistory::new(), "What's 212 added to 122?")
        .await
        .unwrap();

    assert_eq!(output.turn.offered_tools[0], "add");
    assert_eq!(output.turn.records[0].outcome, ToolOutcome::Success(json!(334)));
    assert_eq!(output.response(), "Result: 334");
}

#[tokio::test]
async fn test_failing_useless_tool_still_answers() {
    let provider = Arc::new(MockProvider::scripted(
        vec![
            MockStep::call("useless_0", json!({})),
            MockStep::text("The tool did not help."),
        ],
        NoOpLogger::shared(),
    ));
    let agent = agent_with(provider.clone(), AgentConfig::default()).await;

    let output = agent
        .chat(&ConversationHistory::new(), "Run the toy useless function")
        .await
        .unwrap();

    assert_eq!(output.turn.outcome, TurnOutcome::Answered);
    assert_eq!(output.response(), "The tool did not help.");
    let failure = output.turn.records[0].outcome.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::EmptyResult);

    // the failure went back to the model as an error result
    let requests = provider.requests();
    let fed_back = requests[1].messages.last().unwrap();
    assert_eq!(fed_back.role, MessageRole::User);
    assert!(matches!(
        &fed_back.parts()[0],
        ContentPart::ToolResult { is_error: true, .. }
    ));
}

#[tokio::test]
async fn test_round_limit_returns_fallback() {
    let provider = Arc::new(MockProvider::repeating(
        MockStep::call("multiply", json!({ "a": 2, "b": 3 })),
        NoOpLogger::shared(),
    ));
    let config = AgentConfig::default().with_max_rounds(2);
    let agent = agent_with(provider.clone(), config.clone()).await;

    let output = agent
        .chat(&ConversationHistory::new(), "What's 2 multiplied by 3?")
        .await
        .unwrap();

    assert_eq!(output.turn.outcome, TurnOutcome::RoundLimitReached);
    assert_eq!(output.response(), config.fallback_response);
    assert_eq!(output.turn.rounds, 2);
    assert_eq!(output.turn.records.len(), 2);
    assert_eq!(output.turn.records[1].round, 2);
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test]
async fn test_call_outside_offered_subset_is_fed_back() {
    let provider = Arc::new(MockProvider::scripted(
        vec![
            MockStep::call("add", json!({ "a": 1, "b": 2 })),
            MockStep::ReportToolResults,
        ],
        NoOpLogger::shared(),
    ));
    let agent = agent_with(provider.clone(), AgentConfig::default().with_top_k(1)).await;

    let output = agent
        .chat(&ConversationHistory::new(), "What's 212 multiplied by 122?")
        .await
        .unwrap();

    assert_eq!(output.turn.offered_tools, vec!["multiply"]);
    let failure = output.turn.records[0].outcome.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::UnknownTool);
    assert!(output.response().starts_with("Result: Error:"));
}

#[tokio::test]
async fn test_only_retrieved_tools_are_presented() {
    let provider = Arc::new(MockProvider::fixed("ok", NoOpLogger::shared()));
    let agent = agent_with(provider.clone(), AgentConfig::default()).await;

    let output = agent
        .chat(&ConversationHistory::new(), "What's 212 added to 122?")
        .await
        .unwrap();

    assert_eq!(offered_names(&provider, 0), output.turn.offered_tools);
    assert_eq!(output.turn.offered_tools.len(), 3);
    assert!(output.turn.records.is_empty());
    assert_eq!(output.turn.rounds, 0);
}

#[tokio::test]
async fn test_history_and_system_prompt_are_replayed() {
    let provider = Arc::new(MockProvider::echo(NoOpLogger::shared()));
    let config = AgentConfig::default()
        .with_system_prompt("You are a calculator.")
        .with_history_window(1);
    let agent = agent_with(provider.clone(), config).await;

    let first = agent.chat(&ConversationHistory::new(), "first").await.unwrap();
    let second = agent.chat(&first.history, "second").await.unwrap();
    let third = agent.chat(&second.history, "third").await.unwrap();

    assert_eq!(third.history.len(), 3);
    assert_eq!(first.history.len(), 1);

    let requests = provider.requests();
    let texts: Vec<Option<&str>> = requests[2].messages.iter().map(|m| m.text()).collect();
    assert_eq!(
        texts,
        vec![
            Some("You are a calculator."),
            Some("second"),
            Some("second"),
            Some("third"),
        ]
    );
}

#[tokio::test]
async fn test_zero_top_k_is_a_retrieval_error() {
    let provider = Arc::new(MockProvider::fixed("unused", NoOpLogger::shared()));
    let agent = agent_with(provider.clone(), AgentConfig::default().with_top_k(0)).await;

    let err = agent.chat(&ConversationHistory::new(), "hi").await.unwrap_err();
    assert!(matches!(err, AgentError::Retrieval(_)));
    assert_eq!(provider.request_count(), 0);
}

#[tokio::test]
async fn test_model_failure_aborts_turn() {
    let provider = Arc::new(MockProvider::repeating(
        MockStep::Fail("overloaded".to_string()),
        NoOpLogger::shared(),
    ));
    let agent = agent_with(provider, AgentConfig::default()).await;

    let err = agent.chat(&ConversationHistory::new(), "hi").await.unwrap_err();
    assert!(matches!(err, AgentError::Model(_)));
}

#[tokio::test]
async fn test_model_timeout() {
    let provider = Arc::new(
        MockProvider::fixed("late", NoOpLogger::shared()).with_delay(Duration::from_millis(500)),
    );
    let config = AgentConfig::default().with_model_timeout(Duration::from_millis(20));
    let agent = agent_with(provider, config).await;

    let err = agent.chat(&ConversationHistory::new(), "hi").await.unwrap_err();
    assert!(matches!(err, AgentError::Timeout { stage: Stage::Model, .. }));
}

#[tokio::test]
async fn test_cancellation_during_tool_round() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    let registry = Arc::new(ToolRegistry::new(NoOpLogger::shared()));
    registry
        .register(Tool::from_fn(
            ToolSpec::new("slow_lookup", "Slow lookup of a value"),
            move |_| {
                let trigger = trigger.clone();
                async move {
                    trigger.cancel();
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Ok(json!("value"))
                }
            },
        ))
        .unwrap();
    let index = index_for(registry).await;

    let provider = Arc::new(MockProvider::repeating(
        MockStep::call("slow_lookup", json!({})),
        NoOpLogger::shared(),
    ));
    let agent = FunctionCallingAgent::new(
        index,
        provider.clone(),
        AgentConfig::default(),
        NoOpLogger::shared(),
    );

    let err = agent
        .chat_with_cancel(&ConversationHistory::new(), "slow lookup", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Cancelled));
    // the dispatched call finished and no second model request was made
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_concurrent_turns_share_one_agent() {
    let provider = Arc::new(MockProvider::echo(NoOpLogger::shared()));
    let agent = agent_with(provider.clone(), AgentConfig::default()).await;

    let history = ConversationHistory::new();
    let turns = ["one", "two", "three"].map(|msg| agent.chat(&history, msg));

    let mut responses: Vec<String> = futures::future::join_all(turns)
        .await
        .into_iter()
        .map(|result| result.unwrap().turn.response)
        .collect();
    responses.sort();
    assert_eq!(responses, vec!["one", "three", "two"]);
}

#[tokio::test]
async fn test_from_config_with_mock_provider() {
    let config = ToolsiftConfig {
        model: ModelSettings {
            provider: "mock".to_string(),
            ..ModelSettings::default()
        },
        ..ToolsiftConfig::default()
    };
    let logger = Arc::new(MemoryLogger::new());

    let agent = FunctionCallingAgent::from_config(
        &config,
        registry(),
        Arc::new(MemorySecretStore::new()),
        logger.clone(),
    )
    .await
    .unwrap();

    assert_eq!(agent.index().len().await, 2 + USELESS_TOOLS);
    let output = agent.chat(&ConversationHistory::new(), "echo me").await.unwrap();
    assert_eq!(output.response(), "echo me");
    assert!(logger.contains(LogLevel::Info, "[Agent] Offering tools"));
}

#[tokio::test]
async fn test_from_config_rejects_invalid_config() {
    let mut config = ToolsiftConfig::default();
    config.agent.max_rounds = 0;

    let result = FunctionCallingAgent::from_config(
        &config,
        registry(),
        Arc::new(MemorySecretStore::new()),
        NoOpLogger::shared(),
    )
    .await;
    assert!(matches!(result, Err(AgentError::Config(_))));
}

#[tokio::test]
async fn test_tool_error_is_recorded() {
    let registry = Arc::new(ToolRegistry::new(NoOpLogger::shared()));
    registry
        .register(Tool::from_sync(
            ToolSpec::new("divide", "Divide two integers")
                .with_param(ParamSpec::integer("a"))
                .with_param(ParamSpec::integer("b")),
            |args| match args.get_i64("b") {
                Some(0) => Err(ToolError::execution("division by zero")),
                b => Ok(json!(args.get_i64("a").unwrap_or_default() / b.unwrap_or(1))),
            },
        ))
        .unwrap();
    let index = index_for(registry).await;
    let provider = Arc::new(MockProvider::scripted(
        vec![
            MockStep::call("divide", json!({ "a": 1, "b": 0 })),
            MockStep::ReportToolResults,
        ],
        NoOpLogger::shared(),
    ));
    let agent: FunctionCallingAgent = FunctionCallingAgent::new(
        index,
        provider as Arc<dyn Provider>,
        AgentConfig::default(),
        NoOpLogger::shared(),
    );

    let output = agent.chat(&ConversationHistory::new(), "divide 1 by 0").await.unwrap();
    assert_eq!(output.response(), "Result: Error: division by zero");
    assert_eq!(output.turn.failures().count(), 1);
}
