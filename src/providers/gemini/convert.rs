use serde::Deserialize;
use serde_json::Value;

use crate::core::request::RequestDescriptor;
use crate::core::types::{FinishReason, NormalizedResponse, ResponseMetadata, Role, Usage};
use crate::providers::ProviderId;
use crate::providers::error::ProviderError;

use super::types::{
    ApiRequest, ApiResponse, Content, GenerationConfig, OutboundPart, SystemInstruction,
    SystemPart, UsageMetadata,
};

pub fn to_api_request(descriptor: &RequestDescriptor) -> ApiRequest<'_> {
    let contents = descriptor
        .conversation()
        .map(|m| Content {
            role: match m.role {
                Role::Assistant => "model",
                Role::User | Role::System => "user",
            },
            parts: vec![OutboundPart { text: &m.content }],
        })
        .collect();

    let system_instruction = descriptor.system_prompt().map(|text| SystemInstruction {
        parts: vec![SystemPart { text }],
    });

    let generation_config = (descriptor.temperature().is_some()
        || descriptor.max_tokens().is_some())
    .then(|| GenerationConfig {
        temperature: descriptor.temperature(),
        max_output_tokens: descriptor.max_tokens(),
    });

    ApiRequest {
        contents,
        system_instruction,
        generation_config,
    }
}

pub fn from_api_value(raw: Value) -> Result<NormalizedResponse, ProviderError> {
    let response = ApiResponse::deserialize(&raw)
        .map_err(|e| ProviderError::malformed(format!("gemini response: {e}")))?;

    let Some(candidate) = response
        .candidates
        .as_deref()
        .and_then(|c| c.iter().min_by_key(|c| c.index))
    else {
        let reason = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref());
        return Err(ProviderError::malformed(match reason {
            Some(reason) => format!("gemini response has no candidates (prompt blocked: {reason})"),
            None => "gemini response has no candidates".to_string(),
        }));
    };

    let content: String = candidate
        .content
        .iter()
        .flat_map(|c| &c.parts)
        .filter(|p| !p.thought)
        .filter_map(|p| p.text.as_deref())
        .collect();
    if content.is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(ProviderError::malformed(format!(
            "gemini candidate has no text content (finish reason: {reason})"
        )));
    }

    let metadata = ResponseMetadata {
        id: response.response_id.clone(),
        model: response.model_version.clone(),
        finish_reason: candidate
            .finish_reason
            .as_deref()
            .map(FinishReason::from_vendor),
        usage: response.usage_metadata.as_ref().map(from_api_usage),
        ..Default::default()
    };

    Ok(NormalizedResponse::new(
        ProviderId::Gemini,
        content,
        metadata,
        raw,
    ))
}

fn from_api_usage(usage: &UsageMetadata) -> Usage {
    let normalized = Usage::new(usage.prompt_token_count, usage.candidates_token_count);
    match usage.total_token_count {
        Some(total) => normalized.with_total(total),
        None => normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::request::RequestBuilder;
    use crate::core::types::ChatMessage;
    use serde_json::json;

    fn descriptor() -> RequestDescriptor {
        RequestBuilder::new()
            .endpoint("https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent")
            .model("gemini-2.0-flash")
            .messages([
                ChatMessage::system("Answer in French."),
                ChatMessage::user("Hello"),
                ChatMessage::assistant("Bonjour"),
                ChatMessage::user("Thanks"),
            ])
            .max_tokens(64)
            .build()
            .unwrap()
    }

    #[test]
    fn test_to_api_request_maps_roles() {
        let json = serde_json::to_value(to_api_request(&descriptor())).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Answer in French.");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["contents"][1]["parts"][0]["text"], "Bonjour");
        assert_eq!(json["contents"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 64);
        assert!(json["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn test_generation_config_omitted_when_unset() {
        let descriptor = RequestBuilder::new()
            .endpoint("https://example.test/{model}")
            .model("gemini-pro")
            .message(ChatMessage::user("hi"))
            .build()
            .unwrap();
        let json = serde_json::to_value(to_api_request(&descriptor)).unwrap();
        assert!(json.get("generationConfig").is_none());
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn test_from_api_value_well_formed() {
        let raw = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "Hello "},
                    {"text": "there"}
                ]},
                "finishReason": "MAX_TOKENS",
                "index": 0
            }],
            "usageMetadata": {
                "promptTokenCount": 5,
                "candidatesTokenCount": 7,
                "totalTokenCount": 20
            },
            "modelVersion": "gemini-2.0-flash-001",
            "responseId": "resp-9"
        });

        let response = from_api_value(raw).unwrap();
        assert_eq!(response.content(), "Hello there");
        assert_eq!(response.provider(), ProviderId::Gemini);
        assert_eq!(response.finish_reason(), Some(&FinishReason::Length));
        assert_eq!(response.usage(), Some(&Usage::new(5, 7).with_total(20)));
        assert_eq!(response.metadata().model.as_deref(), Some("gemini-2.0-flash-001"));
        assert_eq!(response.metadata().id.as_deref(), Some("resp-9"));
    }

    #[test]
    fn test_blocked_prompt_is_malformed() {
        let raw = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = from_api_value(raw).unwrap_err();
        assert!(err.to_string().contains("SAFETY"), "{err}");
    }

    #[test]
    fn test_from_api_value_missing_keys() {
        for raw in [
            json!({}),
            json!({"candidates": []}),
            json!({"candidates": [{"finishReason": "SAFETY"}]}),
            json!({"candidates": [{"content": {"parts": [{"functionCall": {"name": "f", "args": {}}}]}}]}),
            json!([1, 2, 3]),
        ] {
            let err = from_api_value(raw).unwrap_err();
            assert!(matches!(err, ProviderError::MalformedResponse(_)), "{err:?}");
        }
    }
}
