//! Adapter between toolsift types and genai types
//!
//! Auth flows through a `SecretStore`, not genai's default env var lookup, so
//! keys come from the same chain (keychain, environment, memory) everywhere.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatRole as GenaiRole,
    MessageContent as GenaiContent, Tool as GenaiTool, ToolCall as GenaiToolCall,
    ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};
use serde_json::json;

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, ProviderModelConfig};
use crate::secrets::SecretStore;
use crate::types::{ChatMessage, ContentPart, MessageContent, MessageRole, ToolCall, ToolDefinition};

// ============================================================================
// Message Conversion: toolsift -> genai
// ============================================================================

/// Convert MessageRole to genai ChatRole
pub fn to_genai_role(role: MessageRole) -> GenaiRole {
    match role {
        MessageRole::System => GenaiRole::System,
        MessageRole::User => GenaiRole::User,
        MessageRole::Assistant => GenaiRole::Assistant,
    }
}

/// Convert a toolsift ToolCall to a genai ToolCall
///
/// Built through serde so provider-specific fields (thought signatures and
/// the like) stay unset.
pub fn to_genai_tool_call(call: &ToolCall) -> Option<GenaiToolCall> {
    serde_json::from_value(json!({
        "call_id": call.id,
        "fn_name": call.name,
        "fn_arguments": call.input,
    }))
    .ok()
}

pub fn to_genai_tool_response(tool_use_id: &str, content: &str) -> GenaiToolResponse {
    GenaiToolResponse::new(tool_use_id.to_string(), content.to_string())
}

/// Text of the parts that are neither tool calls nor tool results
fn text_of(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .filter_map(|p| match p {
            ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn text_message(role: MessageRole, text: String) -> GenaiMessage {
    let content = GenaiContent::from(text);
    match role {
        MessageRole::System => GenaiMessage::system(content),
        MessageRole::User => GenaiMessage::user(content),
        MessageRole::Assistant => GenaiMessage::assistant(content),
    }
}

/// Convert one ChatMessage to the genai messages that carry it
///
/// Tool calls become one native assistant tool-call message and each tool
/// result its own tool-response message, so the backend sees every call
/// paired with its response by call id. Accompanying text is sent first.
pub fn to_genai_message(msg: ChatMessage) -> Vec<GenaiMessage> {
    let parts = match msg.content {
        MessageContent::Text(text) => return vec![text_message(msg.role, text)],
        MessageContent::Parts(parts) => parts,
    };

    let mut messages = Vec::new();
    let text = text_of(&parts);
    if !text.is_empty() {
        messages.push(text_message(msg.role, text));
    }

    let calls: Vec<GenaiToolCall> = parts
        .iter()
        .filter_map(|p| match p {
            ContentPart::ToolUse { id, name, input } => {
                to_genai_tool_call(&ToolCall::new(id.clone(), name.clone(), input.clone()))
            }
            _ => None,
        })
        .collect();
    if !calls.is_empty() {
        messages.push(GenaiMessage::from(calls));
    }

    messages.extend(parts.iter().filter_map(|p| match p {
        ContentPart::ToolResult {
            tool_use_id,
            content,
            ..
        } => Some(GenaiMessage::from(to_genai_tool_response(tool_use_id, content))),
        _ => None,
    }));

    messages
}

pub fn to_genai_messages(messages: Vec<ChatMessage>) -> Vec<GenaiMessage> {
    messages.into_iter().flat_map(to_genai_message).collect()
}

// ============================================================================
// Tool and Options Conversion
// ============================================================================

pub fn to_genai_tool(tool: &ToolDefinition) -> GenaiTool {
    GenaiTool::new(&tool.name)
        .with_description(&tool.description)
        .with_schema(tool.parameters.clone())
}

pub fn to_genai_tools(tools: &[ToolDefinition]) -> Vec<GenaiTool> {
    tools.iter().map(to_genai_tool).collect()
}

pub fn to_genai_options(options: &ChatOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    // Capture tool calls in the stream so they can be returned at End
    genai_opts.with_capture_tool_calls(true)
}

// ============================================================================
// Response Conversion: genai -> toolsift
// ============================================================================

pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall::new(tc.call_id.clone(), tc.fn_name.clone(), tc.fn_arguments.clone())
}

// ============================================================================
// Provider Resolution
// ============================================================================

/// Providers genai speaks natively
pub fn is_genai_native(provider: &str) -> bool {
    matches!(
        provider.to_lowercase().as_str(),
        "openai"
            | "anthropic"
            | "gemini"
            | "ollama"
            | "groq"
            | "xai"
            | "deepseek"
            | "cohere"
            | "fireworks"
            | "together"
    )
}

/// Providers reached through genai's OpenAI adapter at a fixed or configured endpoint
pub fn is_openai_compatible(provider: &str) -> bool {
    matches!(
        provider.to_lowercase().as_str(),
        "azure" | "openrouter" | "mistral" | "openai_compat"
    )
}

pub fn is_genai_supported(provider: &str) -> bool {
    is_genai_native(provider) || is_openai_compatible(provider)
}

/// Providers that can run without an API key
pub fn requires_api_key(provider: &str) -> bool {
    !matches!(provider.to_lowercase().as_str(), "ollama" | "openai_compat")
}

/// Secret store key for a provider
pub fn provider_secret_key(provider: &str) -> String {
    match provider.to_lowercase().as_str() {
        "google" => "gemini".to_string(),
        other => other.to_string(),
    }
}

/// Secret store key for a genai adapter, used when no provider id is configured
pub fn adapter_kind_secret_key(adapter: AdapterKind) -> String {
    match adapter {
        AdapterKind::OpenAI => "openai".to_string(),
        AdapterKind::Anthropic => "anthropic".to_string(),
        AdapterKind::Gemini => "gemini".to_string(),
        AdapterKind::Ollama => "ollama".to_string(),
        AdapterKind::Groq => "groq".to_string(),
        _ => format!("{:?}", adapter).to_lowercase(),
    }
}

fn fixed_endpoint(provider: &str) -> Option<&'static str> {
    match provider {
        "openrouter" => Some("https://openrouter.ai/api/v1/"),
        "mistral" => Some("https://api.mistral.ai/v1/"),
        _ => None,
    }
}

/// Check the config before a client is built
pub fn validate_config(config: &ProviderModelConfig) -> ProviderResult<()> {
    let needs_base = matches!(config.provider.as_str(), "azure" | "openai_compat");
    if needs_base && config.api_base.is_none() {
        return Err(ProviderError::config(&config.provider, "api_base is required"));
    }
    if !is_genai_supported(&config.provider) {
        return Err(ProviderError::config(
            &config.provider,
            "unsupported provider",
        ));
    }
    Ok(())
}

// ============================================================================
// Client Creation with Custom Auth
// ============================================================================

/// Create a genai Client with secret-store auth and endpoint resolution
pub fn create_client(
    config: &ProviderModelConfig,
    secrets: Arc<dyn SecretStore>,
) -> ProviderResult<Client> {
    validate_config(config)?;

    let auth_provider = config.provider.clone();
    let auth_explicit_key = config.api_key.clone();

    let auth_resolver = AuthResolver::from_resolver_async_fn(
        move |model_iden: ModelIden| -> Pin<Box<dyn Future<Output = genai::resolver::Result<Option<AuthData>>> + Send>> {
            let provider = auth_provider.clone();
            let explicit_key = auth_explicit_key.clone();
            let secrets = Arc::clone(&secrets);
            let adapter_kind = model_iden.adapter_kind;

            Box::pin(async move {
                if let Some(key) = explicit_key {
                    return Ok(Some(AuthData::from_single(key)));
                }

                let secret_key = if provider.is_empty() {
                    adapter_kind_secret_key(adapter_kind)
                } else {
                    provider_secret_key(&provider)
                };

                // None lets genai handle the keyless case (e.g. Ollama)
                Ok(secrets.get(&secret_key).map(AuthData::from_single))
            })
        },
    );

    let target_provider = config.provider.clone();
    let target_api_base = config.api_base.clone();

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let endpoint = match target_api_base.as_ref() {
                Some(base) => Endpoint::from_owned(base.clone()),
                None => match fixed_endpoint(&target_provider) {
                    Some(url) => Endpoint::from_static(url),
                    None => return Ok(target),
                },
            };

            let adapter_kind = if is_openai_compatible(&target_provider) {
                AdapterKind::OpenAI
            } else {
                target.model.adapter_kind
            };
            let model = ModelIden::new(adapter_kind, target.model.model_name.clone());

            Ok(ServiceTarget {
                endpoint,
                auth: target.auth,
                model,
            })
        },
    );

    Ok(Client::builder()
        .with_auth_resolver(auth_resolver)
        .with_service_target_resolver(target_resolver)
        .build())
}
