use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::client::ProviderClient;
use crate::core::error::Result;

use super::ProviderId;
use super::anthropic::AnthropicProvider;
use super::gemini::GeminiProvider;
use super::http::{AuthStrategy, HttpClient, HttpConfig};
use super::openai_compat::{OpenAICompatConfig, OpenAICompatProvider};
use super::types::{ApiKey, BaseUrl, ModelId};

/// Everything needed to construct one vendor client.
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub api_key: ApiKey,
    pub api_key_env: Option<String>,
    pub base_url: Option<BaseUrl>,
    pub model: Option<ModelId>,
    pub http: HttpConfig,
}

impl ProviderSettings {
    #[must_use]
    pub fn new(api_key: impl Into<ApiKey>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Resolves settings from `[providers.<id>]` and the process environment.
    /// A missing key is not an error here; it surfaces as an authentication
    /// failure when a request is sent.
    #[must_use]
    pub fn from_config(id: ProviderId, config: &AppConfig) -> Self {
        let overrides = config.provider_overrides(id);
        let api_key_env = overrides
            .and_then(|o| o.api_key_env.clone())
            .or_else(|| id.api_key_env().map(str::to_string));
        let api_key = api_key_env
            .as_deref()
            .map(ApiKey::from_env_or_empty)
            .unwrap_or_default();

        Self {
            api_key,
            api_key_env,
            base_url: overrides.and_then(|o| o.base_url.clone()).map(BaseUrl::from),
            model: overrides.and_then(|o| o.model.clone()).map(ModelId::from),
            http: config.http_config(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<BaseUrl>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<ModelId>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_http(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }
}

/// Builds a client with its own connection pool from `settings.http`.
pub fn create_provider(id: ProviderId, settings: &ProviderSettings) -> Result<Arc<dyn ProviderClient>> {
    let http = HttpClient::with_config(settings.http.clone())?;
    Ok(create_provider_with_client(id, settings, &http))
}

/// Builds a client that sends through `http`. `settings.http` is ignored.
#[must_use]
pub fn create_provider_with_client(
    id: ProviderId,
    settings: &ProviderSettings,
    http: &HttpClient,
) -> Arc<dyn ProviderClient> {
    match id {
        ProviderId::Anthropic => {
            let mut provider = AnthropicProvider::with_http_client(settings.api_key.clone(), http.clone());
            if let Some(env) = &settings.api_key_env {
                provider = provider.with_api_key_env(env.as_str());
            }
            if let Some(model) = &settings.model {
                provider = provider.with_model(model.clone());
            }
            if let Some(base_url) = &settings.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
        ProviderId::Gemini => {
            let mut provider = GeminiProvider::with_http_client(settings.api_key.clone(), http.clone());
            if let Some(env) = &settings.api_key_env {
                provider = provider.with_api_key_env(env.as_str());
            }
            if let Some(model) = &settings.model {
                provider = provider.with_model(model.clone());
            }
            if let Some(base_url) = &settings.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Arc::new(provider)
        }
        _ => Arc::new(OpenAICompatProvider::with_http_client(
            openai_compat_config(id, settings),
            http.clone(),
        )),
    }
}

fn openai_compat_config(id: ProviderId, settings: &ProviderSettings) -> OpenAICompatConfig {
    let mut config = OpenAICompatConfig::for_provider(id, settings.api_key.clone())
        .unwrap_or_else(|| OpenAICompatConfig::openai(settings.api_key.clone()));

    // a keyless local server may still be given a key, e.g. behind a proxy
    if id == ProviderId::Ollama && !settings.api_key.is_empty() {
        config.auth = AuthStrategy::bearer(settings.api_key.clone());
    }
    if let Some(env) = &settings.api_key_env {
        config.api_key_env_var.clone_from(env);
    }
    if let Some(base_url) = &settings.base_url {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(model) = &settings.model {
        config = config.with_default_model(model.clone());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderOverrides;
    use crate::core::types::ChatMessage;

    fn built_endpoint(client: &Arc<dyn ProviderClient>) -> String {
        client
            .create_builder()
            .message(ChatMessage::user("hi"))
            .build()
            .unwrap()
            .endpoint()
            .to_string()
    }

    #[test]
    fn test_every_provider_constructs_without_key() {
        for id in ProviderId::ALL {
            let client = create_provider(id, &ProviderSettings::default()).unwrap();
            assert_eq!(client.id(), id);
        }
    }

    #[test]
    fn test_settings_override_model_and_base_url() {
        let settings = ProviderSettings::new("k")
            .with_model("llama-3.1-8b-instant")
            .with_base_url("http://localhost:9000");
        let client = create_provider(ProviderId::Groq, &settings).unwrap();

        let descriptor = client
            .create_builder()
            .message(ChatMessage::user("hi"))
            .build()
            .unwrap();
        assert_eq!(descriptor.model(), "llama-3.1-8b-instant");
        assert_eq!(descriptor.endpoint(), "http://localhost:9000/v1/chat/completions");
    }

    #[test]
    fn test_from_config_reads_overrides() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "google".to_string(),
            ProviderOverrides {
                base_url: Some("https://gemini.proxy".to_string()),
                model: Some("gemini-1.5-flash".to_string()),
                api_key_env: Some("LLMUX_TEST_UNSET_GEMINI_KEY".to_string()),
            },
        );

        let settings = ProviderSettings::from_config(ProviderId::Gemini, &config);
        assert!(settings.api_key.is_empty());
        assert_eq!(settings.api_key_env.as_deref(), Some("LLMUX_TEST_UNSET_GEMINI_KEY"));

        let client = create_provider(ProviderId::Gemini, &settings).unwrap();
        assert_eq!(
            built_endpoint(&client),
            "https://gemini.proxy/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_shared_client_builds_every_provider() {
        let http = HttpClient::with_config(HttpConfig::default().without_retries()).unwrap();
        for id in ProviderId::ALL {
            let client = create_provider_with_client(id, &ProviderSettings::default(), &http);
            assert_eq!(client.id(), id);
        }
    }

    #[test]
    fn test_ollama_needs_no_key_env() {
        let settings = ProviderSettings::from_config(ProviderId::Ollama, &AppConfig::default());
        assert!(settings.api_key_env.is_none());
        let client = create_provider(ProviderId::Ollama, &settings).unwrap();
        assert_eq!(built_endpoint(&client), "http://localhost:11434/v1/chat/completions");
    }
}
