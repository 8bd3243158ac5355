use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::core::client::ProviderClient;
use crate::core::error::Result;
use crate::core::request::{RequestBuilder, RequestDescriptor};
use crate::core::types::{NormalizedResponse, Usage};
use crate::providers::ProviderId;
use crate::providers::error::ProviderError;
use crate::providers::openai_compat::convert;

pub const MOCK_MODEL: &str = "mock-model";

/// A canned vendor payload, shaped like an OpenAI chat completion.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub content: String,
    pub finish_reason: String,
    pub usage: Usage,
}

impl MockResponse {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: text.into(),
            finish_reason: "stop".to_string(),
            usage: Usage::new(10, 5),
        }
    }

    #[must_use]
    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = reason.into();
        self
    }

    #[must_use]
    pub const fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            "id": "mock-completion",
            "object": "chat.completion",
            "model": MOCK_MODEL,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": self.content},
                "finish_reason": self.finish_reason,
            }],
            "usage": {
                "prompt_tokens": self.usage.input_tokens,
                "completion_tokens": self.usage.output_tokens,
                "total_tokens": self.usage.total_tokens,
            },
        })
    }
}

/// In-memory client that replays queued payloads and records every
/// descriptor it was asked to send.
#[derive(Clone)]
pub struct MockProvider {
    id: ProviderId,
    responses: Arc<Mutex<VecDeque<Value>>>,
    request_history: Arc<Mutex<Vec<RequestDescriptor>>>,
}

impl MockProvider {
    #[must_use]
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            responses: Arc::new(Mutex::new(VecDeque::new())),
            request_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn with_response(self, response: MockResponse) -> Self {
        self.with_raw_response(response.to_value())
    }

    /// Queues an arbitrary payload, including ones the parser rejects.
    #[must_use]
    pub fn with_raw_response(self, raw: Value) -> Self {
        self.responses.lock().push_back(raw);
        self
    }

    #[must_use]
    pub fn request_history(&self) -> Vec<RequestDescriptor> {
        self.request_history.lock().clone()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_history.lock().len()
    }

    pub fn clear_history(&self) {
        self.request_history.lock().clear();
    }
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("id", &self.id)
            .field("queued", &self.responses.lock().len())
            .finish()
    }
}

#[async_trait]
impl ProviderClient for MockProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn create_builder(&self) -> RequestBuilder {
        RequestBuilder::new()
            .endpoint(format!("mock://{}/v1/chat/completions", self.id))
            .model(MOCK_MODEL)
    }

    async fn send_request(&self, descriptor: &RequestDescriptor) -> Result<Value> {
        self.request_history.lock().push(descriptor.clone());
        let next = self.responses.lock().pop_front();
        next.ok_or_else(|| {
            ProviderError::Network(format!("mock {}: no responses queued", self.id)).into()
        })
    }

    fn parse_response(&self, raw: Value) -> Result<NormalizedResponse> {
        Ok(convert::from_api_value(self.id, raw)?)
    }
}
