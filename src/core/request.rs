//! Fluent request construction.
//!
//! A [`RequestBuilder`] accumulates fields and is cheap to clone, so a
//! provider can hand out a pre-seeded builder that callers extend. Calling
//! [`RequestBuilder::build`] validates the accumulated fields and produces a
//! fresh, immutable [`RequestDescriptor`] every time.

use std::collections::BTreeMap;

use super::error::{LlmuxError, Result};
use super::types::ChatMessage;
use crate::providers::http::AuthStrategy;
use crate::providers::types::ModelId;

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Replaced with the model name when the request is built.
pub const MODEL_PLACEHOLDER: &str = "{model}";

const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;

#[derive(Debug, Clone, Default)]
#[must_use]
pub struct RequestBuilder {
    endpoint: Option<String>,
    auth: AuthStrategy,
    content_type: Option<String>,
    model: Option<ModelId>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    messages: Vec<ChatMessage>,
    headers: BTreeMap<String, String>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn auth(mut self, auth: AuthStrategy) -> Self {
        self.auth = auth;
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn model(mut self, model: impl Into<ModelId>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Replaces the whole conversation.
    pub fn messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.messages = messages.into_iter().collect();
        self
    }

    /// Appends one turn.
    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets the system prompt, replacing any system turns already present.
    pub fn system(mut self, prompt: impl Into<String>) -> Self {
        self.messages.retain(|m| !m.is_system());
        self.messages.insert(0, ChatMessage::system(prompt));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn build(&self) -> Result<RequestDescriptor> {
        let endpoint = self
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(LlmuxError::IncompleteRequest("endpoint"))?;
        let model = self
            .model
            .as_ref()
            .filter(|m| !m.is_empty())
            .ok_or(LlmuxError::IncompleteRequest("model"))?;
        if self.messages.is_empty() {
            return Err(LlmuxError::IncompleteRequest("messages"));
        }

        if let Some(temperature) = self.temperature {
            if !TEMPERATURE_RANGE.contains(&temperature) {
                return Err(LlmuxError::InvalidParameter {
                    name: "temperature",
                    reason: format!("{temperature} is outside 0.0..=2.0"),
                });
            }
        }
        if self.max_tokens == Some(0) {
            return Err(LlmuxError::InvalidParameter {
                name: "max_tokens",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(RequestDescriptor {
            endpoint: endpoint.replace(MODEL_PLACEHOLDER, model.as_str()),
            auth: self.auth.clone(),
            content_type: self
                .content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            model: model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: self.messages.clone(),
            headers: self.headers.clone(),
        })
    }
}

/// A finalized outbound request. Fields are only readable.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    endpoint: String,
    auth: AuthStrategy,
    content_type: String,
    model: ModelId,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    messages: Vec<ChatMessage>,
    headers: BTreeMap<String, String>,
}

impl RequestDescriptor {
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthStrategy {
        &self.auth
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.model.as_str()
    }

    #[must_use]
    pub const fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    #[must_use]
    pub const fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// System turns joined in order, for vendors that take the system
    /// prompt outside the conversation.
    #[must_use]
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.is_system())
            .map(|m| m.content.as_str())
            .collect();
        (!parts.is_empty()).then(|| parts.join("\n\n"))
    }

    pub fn conversation(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| !m.is_system())
    }
}
