use std::collections::BTreeMap;

use crate::providers::ProviderId;
use crate::providers::http::AuthStrategy;
use crate::providers::types::{ApiKey, BaseUrl, ModelId};

pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Everything that differs between vendors speaking the OpenAI chat
/// completions dialect.
#[derive(Debug, Clone)]
pub struct OpenAICompatConfig {
    pub id: ProviderId,
    pub base_url: BaseUrl,
    pub auth: AuthStrategy,
    pub default_model: ModelId,
    pub api_key_env_var: String,
    pub extra_headers: BTreeMap<String, String>,
}

impl OpenAICompatConfig {
    /// Preset for `id`, or `None` when the vendor speaks another dialect.
    #[must_use]
    pub fn for_provider(id: ProviderId, api_key: ApiKey) -> Option<Self> {
        match id {
            ProviderId::OpenAI
            | ProviderId::Groq
            | ProviderId::Together
            | ProviderId::Fireworks => Some(Self::bearer_preset(id, api_key)),
            ProviderId::OpenRouter => Some(Self::openrouter(api_key)),
            ProviderId::Ollama => Some(Self::ollama()),
            ProviderId::Anthropic | ProviderId::Gemini => None,
        }
    }

    fn bearer_preset(id: ProviderId, api_key: ApiKey) -> Self {
        Self {
            id,
            base_url: BaseUrl::new(id.default_base_url()),
            auth: AuthStrategy::bearer(api_key),
            default_model: ModelId::new(id.default_model()),
            api_key_env_var: id.api_key_env().unwrap_or_default().to_string(),
            extra_headers: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn openai(api_key: ApiKey) -> Self {
        Self::bearer_preset(ProviderId::OpenAI, api_key)
    }

    #[must_use]
    pub fn groq(api_key: ApiKey) -> Self {
        Self::bearer_preset(ProviderId::Groq, api_key)
    }

    #[must_use]
    pub fn together(api_key: ApiKey) -> Self {
        Self::bearer_preset(ProviderId::Together, api_key)
    }

    #[must_use]
    pub fn fireworks(api_key: ApiKey) -> Self {
        Self::bearer_preset(ProviderId::Fireworks, api_key)
    }

    #[must_use]
    pub fn openrouter(api_key: ApiKey) -> Self {
        Self::bearer_preset(ProviderId::OpenRouter, api_key)
            .with_extra_header("HTTP-Referer", "https://github.com/llmux/llmux")
            .with_extra_header("X-Title", "llmux")
    }

    #[must_use]
    pub fn ollama() -> Self {
        let mut config = Self::bearer_preset(ProviderId::Ollama, ApiKey::default());
        config.auth = AuthStrategy::None;
        config
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<BaseUrl>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<ModelId>) -> Self {
        self.default_model = model.into();
        self
    }

    #[must_use]
    pub fn with_extra_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        self.base_url.join(CHAT_COMPLETIONS_PATH)
    }
}
