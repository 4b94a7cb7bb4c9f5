//! Completion service implementations for Foreman.
//!
//! All providers implement the `foreman_core::Provider` trait.

pub mod anthropic;

pub use anthropic::AnthropicProvider;

use foreman_core::error::ProviderError;
use foreman_core::provider::Provider;
use std::sync::Arc;

/// Build the completion service described by the configuration.
pub fn build_from_config(
    config: &foreman_config::AppConfig,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            ProviderError::NotConfigured(
                "no API key: set ANTHROPIC_API_KEY or api_key in ~/.foreman/config.toml".into(),
            )
        })?;

    let mut provider = AnthropicProvider::new(api_key);
    if let Some(ref url) = config.api_url {
        provider = provider.with_base_url(url);
    }
    tracing::debug!(model = %config.model, "Anthropic provider configured");
    Ok(Arc::new(provider))
}
