//! LLM integration for trades-intake.
//!
//! The completion service is reached through the `LlmProvider` trait so the
//! orchestrator can be driven by a stub in tests. The only concrete backend
//! is an OpenAI-compatible chat-completions client.

mod openai;
pub mod provider;

pub use openai::OpenAiProvider;
pub use provider::*;

use std::sync::Arc;

use crate::config::LlmSettings;

/// Create the completion provider from configuration.
pub fn create_provider(settings: &LlmSettings) -> Arc<dyn LlmProvider> {
    tracing::info!(
        model = %settings.model,
        base_url = %settings.base_url,
        "Using OpenAI-compatible completion service"
    );
    Arc::new(OpenAiProvider::new(
        settings.api_key.clone(),
        settings.base_url.clone(),
        settings.model.clone(),
    ))
}
