use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::core::request::RequestDescriptor;
use crate::core::types::{FinishReason, NormalizedResponse, ResponseMetadata, Usage};
use crate::providers::ProviderId;
use crate::providers::error::ProviderError;

use super::types::{ApiUsage, ChatCompletionRequest, ChatCompletionResponse};

pub fn to_api_request(descriptor: &RequestDescriptor) -> ChatCompletionRequest<'_> {
    ChatCompletionRequest {
        model: descriptor.model(),
        messages: descriptor.messages(),
        temperature: descriptor.temperature(),
        max_tokens: descriptor.max_tokens(),
    }
}

pub fn from_api_value(id: ProviderId, raw: Value) -> Result<NormalizedResponse, ProviderError> {
    let response = ChatCompletionResponse::deserialize(&raw)
        .map_err(|e| ProviderError::malformed(format!("{id} chat completion: {e}")))?;

    let choice = response
        .choices
        .iter()
        .min_by_key(|c| c.index)
        .ok_or_else(|| ProviderError::malformed(format!("{id} response has no choices")))?;

    let text = choice.message.content.as_deref().filter(|c| !c.is_empty());
    let refusal = choice.message.refusal.as_deref().filter(|c| !c.is_empty());
    let from_refusal = text.is_none() && refusal.is_some();
    let content = text
        .or(refusal)
        .ok_or_else(|| ProviderError::malformed(format!("{id} response has no text content")))?
        .to_string();

    let mut metadata = ResponseMetadata {
        id: response.id.clone(),
        model: response.model.clone(),
        finish_reason: choice.finish_reason.as_deref().map(FinishReason::from_vendor),
        usage: response.usage.as_ref().map(from_api_usage),
        created_at: response
            .created
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        ..Default::default()
    };
    if let Some(fingerprint) = &response.system_fingerprint {
        metadata = metadata.with_extra("system_fingerprint", fingerprint.as_str());
    }
    if from_refusal {
        metadata = metadata.with_extra("refusal", true);
    }
    if response.choices.len() > 1 {
        metadata = metadata.with_extra("choices", response.choices.len());
    }

    Ok(NormalizedResponse::new(id, content, metadata, raw))
}

fn from_api_usage(usage: &ApiUsage) -> Usage {
    let normalized = Usage::new(usage.prompt_tokens, usage.completion_tokens);
    match usage.total_tokens {
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

    fn completion(content: Value) -> Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": "gpt-4o-2024-08-06",
            "system_fingerprint": "fp_abc",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 12, "total_tokens": 21}
        })
    }

    #[test]
    fn test_to_api_request_carries_descriptor_fields() {
        let descriptor = RequestBuilder::new()
            .endpoint("https://api.openai.com/v1/chat/completions")
            .model("gpt-4o")
            .system("be terse")
            .message(ChatMessage::user("hi"))
            .temperature(0.2)
            .build()
            .unwrap();

        let json = serde_json::to_value(to_api_request(&descriptor)).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert!((json["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_from_api_value_well_formed() {
        let raw = completion(json!("Hello there!"));
        let response = from_api_value(ProviderId::OpenAI, raw.clone()).unwrap();

        assert_eq!(response.content(), "Hello there!");
        assert_eq!(response.provider(), ProviderId::OpenAI);
        assert_eq!(response.finish_reason(), Some(&FinishReason::Stop));
        assert_eq!(response.usage(), Some(&Usage::new(9, 12)));

        let metadata = response.metadata();
        assert_eq!(metadata.id.as_deref(), Some("chatcmpl-123"));
        assert_eq!(metadata.model.as_deref(), Some("gpt-4o-2024-08-06"));
        assert_eq!(
            metadata.created_at.map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
        assert_eq!(metadata.extra["system_fingerprint"], "fp_abc");
        assert_eq!(response.raw(), &raw);
    }

    #[test]
    fn test_from_api_value_minimal_payload() {
        let raw = json!({"choices": [{"message": {"content": "ok"}}]});
        let response = from_api_value(ProviderId::Ollama, raw).unwrap();
        assert_eq!(response.content(), "ok");
        assert!(response.usage().is_none());
        assert!(response.metadata().extra.is_empty());
    }

    #[test]
    fn test_from_api_value_refusal_is_content() {
        let raw = json!({
            "choices": [{"message": {"content": null, "refusal": "I can't help with that."}}]
        });
        let response = from_api_value(ProviderId::OpenAI, raw).unwrap();
        assert_eq!(response.content(), "I can't help with that.");
        assert_eq!(response.metadata().extra["refusal"], true);
    }

    #[test]
    fn test_from_api_value_text_wins_over_refusal() {
        let raw = json!({
            "choices": [{"message": {"content": "Here you go.", "refusal": "partial"}}]
        });
        let response = from_api_value(ProviderId::OpenAI, raw).unwrap();
        assert_eq!(response.content(), "Here you go.");
        assert!(!response.metadata().extra.contains_key("refusal"));

        let raw = json!({
            "choices": [{"message": {"content": "Here you go.", "refusal": ""}}]
        });
        let response = from_api_value(ProviderId::OpenAI, raw).unwrap();
        assert!(!response.metadata().extra.contains_key("refusal"));
    }

    #[test]
    fn test_from_api_value_missing_keys() {
        for raw in [
            json!({"id": "x"}),
            json!({"choices": []}),
            json!({"choices": [{"finish_reason": "stop"}]}),
            completion(Value::Null),
            completion(json!("")),
            json!("not an object"),
        ] {
            let err = from_api_value(ProviderId::Groq, raw).unwrap_err();
            assert!(matches!(err, ProviderError::MalformedResponse(_)), "{err:?}");
        }
    }

    #[test]
    fn test_first_choice_by_index() {
        let raw = json!({
            "choices": [
                {"index": 1, "message": {"content": "second"}},
                {"index": 0, "message": {"content": "first"}}
            ]
        });
        let response = from_api_value(ProviderId::Together, raw).unwrap();
        assert_eq!(response.content(), "first");
        assert_eq!(response.metadata().extra["choices"], 2);
    }
}
