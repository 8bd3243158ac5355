use serde::Deserialize;
use serde_json::Value;

use crate::core::request::RequestDescriptor;
use crate::core::types::{FinishReason, NormalizedResponse, ResponseMetadata, Role, Usage};
use crate::providers::ProviderId;
use crate::providers::error::ProviderError;

use super::types::{ApiContentBlock, ApiMessage, ApiRequest, ApiResponse};

/// The messages API requires a token limit on every request.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

pub fn to_api_request(descriptor: &RequestDescriptor) -> ApiRequest<'_> {
    let messages = descriptor
        .conversation()
        .map(|m| ApiMessage {
            role: match m.role {
                Role::Assistant => "assistant",
                Role::User | Role::System => "user",
            },
            content: &m.content,
        })
        .collect();

    ApiRequest {
        model: descriptor.model(),
        messages,
        max_tokens: descriptor.max_tokens().unwrap_or(DEFAULT_MAX_TOKENS),
        system: descriptor.system_prompt(),
        temperature: descriptor.temperature(),
    }
}

pub fn from_api_value(raw: Value) -> Result<NormalizedResponse, ProviderError> {
    let response = ApiResponse::deserialize(&raw)
        .map_err(|e| ProviderError::malformed(format!("anthropic message: {e}")))?;

    let content: String = response
        .content
        .iter()
        .filter_map(|block| match block {
            ApiContentBlock::Text { text } => Some(text.as_str()),
            ApiContentBlock::Other => None,
        })
        .collect();
    if content.is_empty() {
        return Err(ProviderError::malformed(
            "anthropic response has no text content",
        ));
    }

    let mut metadata = ResponseMetadata {
        id: response.id.clone(),
        model: response.model.clone(),
        finish_reason: response
            .stop_reason
            .as_deref()
            .map(FinishReason::from_vendor),
        usage: Some(Usage::new(
            response.usage.input_tokens,
            response.usage.output_tokens,
        )),
        ..Default::default()
    };
    if let Some(sequence) = &response.stop_sequence {
        metadata = metadata.with_extra("stop_sequence", sequence.as_str());
    }

    Ok(NormalizedResponse::new(
        ProviderId::Anthropic,
        content,
        metadata,
        raw,
    ))
}
