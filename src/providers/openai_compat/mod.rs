pub mod config;
pub mod convert;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::client::ProviderClient;
use crate::core::error::Result;
use crate::core::request::{RequestBuilder, RequestDescriptor};
use crate::core::types::NormalizedResponse;
use crate::providers::ProviderId;
use crate::providers::error::ProviderError;
use crate::providers::http::{HttpClient, HttpConfig};
use crate::providers::types::{BaseUrl, ModelId};

pub use config::OpenAICompatConfig;

/// Client for every vendor that accepts OpenAI-style chat completions.
#[derive(Clone)]
pub struct OpenAICompatProvider {
    http: HttpClient,
    config: OpenAICompatConfig,
}

impl std::fmt::Debug for OpenAICompatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAICompatProvider")
            .field("provider", &self.config.id)
            .field("model", &self.config.default_model)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAICompatProvider {
    pub fn new(config: OpenAICompatConfig) -> std::result::Result<Self, ProviderError> {
        Self::with_http_config(config, HttpConfig::default())
    }

    pub fn with_http_config(
        config: OpenAICompatConfig,
        http_config: HttpConfig,
    ) -> std::result::Result<Self, ProviderError> {
        Ok(Self::with_http_client(config, HttpClient::with_config(http_config)?))
    }

    #[must_use]
    pub const fn with_http_client(config: OpenAICompatConfig, http: HttpClient) -> Self {
        Self { http, config }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<ModelId>) -> Self {
        self.config.default_model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<BaseUrl>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.config.default_model.as_str()
    }
}

#[async_trait]
impl ProviderClient for OpenAICompatProvider {
    fn id(&self) -> ProviderId {
        self.config.id
    }

    fn create_builder(&self) -> RequestBuilder {
        self.config.extra_headers.iter().fold(
            RequestBuilder::new()
                .endpoint(self.config.endpoint())
                .auth(self.config.auth.clone())
                .model(self.config.default_model.clone()),
            |builder, (name, value)| builder.header(name, value),
        )
    }

    async fn send_request(&self, descriptor: &RequestDescriptor) -> Result<Value> {
        let body = serde_json::to_value(convert::to_api_request(descriptor))?;
        Ok(self
            .http
            .post_json(descriptor, &body, &self.config.api_key_env_var)
            .await?)
    }

    fn parse_response(&self, raw: Value) -> Result<NormalizedResponse> {
        Ok(convert::from_api_value(self.config.id, raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ChatMessage;
    use crate::providers::types::ApiKey;

    #[test]
    fn test_builder_is_seeded_from_config() {
        let provider =
            OpenAICompatProvider::new(OpenAICompatConfig::openrouter(ApiKey::new("test-key")))
                .expect("create provider");

        let descriptor = provider
            .create_builder()
            .message(ChatMessage::user("hi"))
            .build()
            .unwrap();

        assert_eq!(
            descriptor.endpoint(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert_eq!(descriptor.model(), "openai/gpt-4o");
        assert_eq!(descriptor.auth().kind(), "bearer");
        assert_eq!(
            descriptor.headers().get("X-Title").map(String::as_str),
            Some("llmux")
        );
    }

    #[test]
    fn test_with_model_and_base_url() {
        let provider = OpenAICompatProvider::new(OpenAICompatConfig::ollama())
            .expect("create provider")
            .with_model("qwen2.5")
            .with_base_url("http://gpu-box:11434");

        assert_eq!(provider.id(), ProviderId::Ollama);
        assert_eq!(provider.model(), "qwen2.5");
        let descriptor = provider
            .create_builder()
            .message(ChatMessage::user("hi"))
            .build()
            .unwrap();
        assert_eq!(
            descriptor.endpoint(),
            "http://gpu-box:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let provider =
            OpenAICompatProvider::new(OpenAICompatConfig::groq(ApiKey::new("gsk-secret-12345")))
                .expect("create provider");

        let debug = format!("{provider:?}");
        assert!(debug.contains("Groq"));
        assert!(!debug.contains("secret-12345"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let provider = OpenAICompatProvider::new(OpenAICompatConfig::fireworks(ApiKey::default()))
            .expect("create provider");
        let descriptor = provider
            .create_builder()
            .message(ChatMessage::user("hi"))
            .build()
            .unwrap();

        let err = provider.send_request(&descriptor).await.unwrap_err();
        assert_eq!(err.hint(), Some("Set the FIREWORKS_API_KEY environment variable"));
    }
}
