//! Provider router — builds the configured provider.

use std::sync::Arc;
use std::time::Duration;

use docent_config::AppConfig;
use docent_core::error::ProviderError;
use docent_core::provider::Provider;
use tracing::debug;

use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider named by `config.provider`.
///
/// Every supported backend speaks the OpenAI wire format; `api_url`
/// overrides the well-known base URL.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.provider.as_str();
    let base_url = match &config.api_url {
        Some(url) => url.clone(),
        None => default_base_url(name)?,
    };
    let api_key = match (config.api_key.as_deref(), name) {
        (Some(key), _) => key.to_string(),
        // Local servers accept any key
        (None, "ollama" | "vllm" | "llamacpp" | "llama.cpp") => name.to_string(),
        (None, _) => {
            return Err(ProviderError::NotConfigured(format!(
                "No API key for provider '{name}'. Set DOCENT_API_KEY or api_key in config.toml"
            )));
        }
    };
    let timeout = Duration::from_secs(config.request_timeout_secs);

    debug!(provider = name, base_url = %base_url, "Building provider");
    let provider = OpenAiCompatProvider::new(name, base_url, api_key, timeout)?;
    Ok(Arc::new(provider))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Result<String, ProviderError> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        other => {
            return Err(ProviderError::NotConfigured(format!(
                "Unknown provider '{other}'; set api_url to use a custom endpoint"
            )));
        }
    };
    Ok(url.to_string())
}
