//! LLM Provider implementations
//!
//! ## Architecture
//!
//! All real providers go through the `genai` crate, which handles:
//! - Streaming SSE parsing
//! - Provider-specific protocols (OpenAI, Anthropic, Gemini, etc.)
//! - Tool calling
//!
//! Providers not native to genai (Azure, OpenRouter, Mistral, generic
//! OpenAI-compatible servers) are routed via genai's `ServiceTargetResolver`.
//! Auth flows through a `SecretStore`, not genai's env var lookup.
//!
//! The `MockProvider` plays scripted responses for tests.

mod error;
mod genai_adapter;
mod genai_provider;
mod mock;
mod traits;

pub use error::{ProviderError, ProviderResult};
pub use genai_adapter::{is_genai_native, is_genai_supported};
pub use genai_provider::GenaiProvider;
pub use mock::{MockMode, MockProvider, MockRequest, MockStep};
pub use traits::{ChatOptions, ModelResponse, Provider, ProviderModelConfig};

use std::sync::Arc;

use crate::config::ModelSettings;
use crate::logging::Logger;
use crate::secrets::SecretStore;

/// Create the provider described by `settings`
///
/// `mock` yields an echoing `MockProvider`; everything genai can reach yields
/// a `GenaiProvider`.
pub fn create_provider(
    settings: &ModelSettings,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
) -> ProviderResult<Arc<dyn Provider>> {
    let provider_id = settings.provider.to_lowercase();
    if provider_id == "mock" {
        return Ok(Arc::new(MockProvider::echo(logger)));
    }
    if !GenaiProvider::supports(&provider_id) {
        return Err(ProviderError::config(provider_id, "unsupported provider"));
    }

    let mut config = ProviderModelConfig::new(&provider_id, &settings.model);
    if let Some(base) = &settings.api_base {
        config = config.with_api_base(base);
    }
    logger.debug(&format!(
        "[providers] Created {} provider for model {}",
        config.provider, config.model
    ));
    Ok(Arc::new(GenaiProvider::new(config, secrets, logger)))
}

/// List all supported provider IDs
pub fn supported_providers() -> Vec<&'static str> {
    vec![
        // Native genai providers
        "openai",
        "anthropic",
        "gemini",
        "ollama",
        "groq",
        "xai",
        "deepseek",
        "cohere",
        "fireworks",
        "together",
        // OpenAI-compatible providers via resolver
        "azure",
        "openrouter",
        "mistral",
        "openai_compat",
        // Testing
        "mock",
    ]
}
