pub mod auth;

pub use auth::AuthStrategy;

use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryError, RetryTransientMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::request::RequestDescriptor;
use crate::providers::error::ProviderError;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_min_delay: Duration,
    pub retry_max_delay: Duration,
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_retries: 3,
            retry_min_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(30),
            user_agent: Some(concat!("llmux/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub const fn without_retries(mut self) -> Self {
        self.max_retries = 0;
        self
    }
}

/// Shared transport for every vendor client: one connection pool, transient
/// retries with exponential backoff, and a per-request timeout.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientWithMiddleware>,
    config: HttpConfig,
}

impl HttpClient {
    pub fn with_config(config: HttpConfig) -> Result<Self, ProviderError> {
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(config.retry_min_delay, config.retry_max_delay)
            .build_with_max_retries(config.max_retries);

        let mut builder = Client::builder().timeout(config.timeout);

        if let Some(ref ua) = config.user_agent {
            builder = builder.user_agent(ua);
        }

        let client = builder.build().map_err(|e| {
            ProviderError::Configuration(format!("Failed to build HTTP client: {e}"))
        })?;

        let client_with_middleware = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            inner: Arc::new(client_with_middleware),
            config,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// True when both handles send through the same connection pool.
    #[must_use]
    pub fn shares_pool_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// POSTs `body` to the descriptor's endpoint with its auth, content type
    /// and headers, returning the decoded JSON reply.
    pub async fn post_json(
        &self,
        descriptor: &RequestDescriptor,
        body: &Value,
        api_key_env_var: &str,
    ) -> Result<Value, ProviderError> {
        if !descriptor.auth().is_configured() {
            let hint = if api_key_env_var.is_empty() {
                "Configure an API key for this provider".to_string()
            } else {
                format!("Set the {api_key_env_var} environment variable")
            };
            return Err(ProviderError::auth_with_hint("No API key configured", hint));
        }

        let request_id = Uuid::new_v4();
        debug!(
            %request_id,
            endpoint = descriptor.endpoint(),
            model = descriptor.model(),
            turns = descriptor.messages().len(),
            "sending completion request"
        );

        let payload = serde_json::to_vec(body)
            .map_err(|e| ProviderError::InvalidRequest(format!("Unserializable body: {e}")))?;

        let mut request = descriptor
            .auth()
            .apply(self.inner.post(descriptor.endpoint()))
            .header(CONTENT_TYPE, descriptor.content_type());
        for (name, value) in descriptor.headers() {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .body(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let error_body = response.text().await.unwrap_or_default();
            warn!(%request_id, status = status.as_u16(), "provider returned an error status");

            return Err(
                match ProviderError::from_status(status.as_u16(), &error_body, api_key_env_var) {
                    ProviderError::RateLimit { message, .. } if retry_after.is_some() => {
                        ProviderError::RateLimit {
                            message,
                            retry_after,
                        }
                    }
                    other => other,
                },
            );
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.body_error(e))?;
        debug!(%request_id, status = status.as_u16(), bytes = text.len(), "received response");

        serde_json::from_str(&text)
            .map_err(|e| ProviderError::malformed(format!("response body is not JSON: {e}")))
    }

    /// Classifies a failed send by its root cause. The retry middleware
    /// wraps every transport failure, even when retries are disabled.
    fn transport_error(&self, err: reqwest_middleware::Error) -> ProviderError {
        match root_cause(&err) {
            reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => {
                ProviderError::Timeout(self.config.timeout)
            }
            reqwest_middleware::Error::Reqwest(e) => ProviderError::Network(error_chain(e)),
            other => ProviderError::Network(error_chain(other)),
        }
    }

    fn body_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.config.timeout)
        } else {
            ProviderError::Network(format!("Failed to read response body: {}", error_chain(&err)))
        }
    }
}

fn root_cause(err: &reqwest_middleware::Error) -> &reqwest_middleware::Error {
    match err {
        reqwest_middleware::Error::Middleware(inner) => match inner.downcast_ref::<RetryError>() {
            Some(RetryError::WithRetries { err, .. } | RetryError::Error(err)) => root_cause(err),
            None => err,
        },
        reqwest_middleware::Error::Reqwest(_) => err,
    }
}

// "error sending request: client error (Connect): tcp connect error: ..."
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
