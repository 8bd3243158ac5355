mod convert;
mod types;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::client::ProviderClient;
use crate::core::error::Result;
use crate::core::request::{MODEL_PLACEHOLDER, RequestBuilder, RequestDescriptor};
use crate::core::types::NormalizedResponse;
use crate::providers::ProviderId;
use crate::providers::error::ProviderError;
use crate::providers::http::{AuthStrategy, HttpClient, HttpConfig};
use crate::providers::types::{ApiKey, BaseUrl, ModelId};

const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Clone)]
pub struct GeminiProvider {
    http: HttpClient,
    auth: AuthStrategy,
    model: ModelId,
    base_url: BaseUrl,
    api_key_env: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    pub fn new(api_key: ApiKey) -> std::result::Result<Self, ProviderError> {
        Self::with_http_config(api_key, HttpConfig::default())
    }

    pub fn with_http_config(
        api_key: ApiKey,
        http_config: HttpConfig,
    ) -> std::result::Result<Self, ProviderError> {
        Ok(Self::with_http_client(api_key, HttpClient::with_config(http_config)?))
    }

    /// Sends through an existing client, sharing its connection pool.
    #[must_use]
    pub fn with_http_client(api_key: ApiKey, http: HttpClient) -> Self {
        Self {
            http,
            auth: AuthStrategy::gemini(api_key),
            model: ModelId::new(ProviderId::Gemini.default_model()),
            api_key_env: API_KEY_ENV.to_string(),
            base_url: BaseUrl::new(ProviderId::Gemini.default_base_url()),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<ModelId>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<BaseUrl>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Names the variable quoted in the missing-key hint.
    #[must_use]
    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = var.into();
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.model.as_str()
    }

    /// The model is part of the path, so the endpoint keeps a placeholder
    /// until the builder knows which model was chosen.
    fn endpoint_template(&self) -> String {
        self.base_url
            .join(&format!("/v1beta/models/{MODEL_PLACEHOLDER}:generateContent"))
    }
}

#[async_trait]
impl ProviderClient for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn create_builder(&self) -> RequestBuilder {
        RequestBuilder::new()
            .endpoint(self.endpoint_template())
            .auth(self.auth.clone())
            .model(self.model.clone())
    }

    async fn send_request(&self, descriptor: &RequestDescriptor) -> Result<Value> {
        let body = serde_json::to_value(convert::to_api_request(descriptor))?;
        Ok(self.http.post_json(descriptor, &body, &self.api_key_env).await?)
    }

    fn parse_response(&self, raw: Value) -> Result<NormalizedResponse> {
        Ok(convert::from_api_value(raw)?)
    }
}
