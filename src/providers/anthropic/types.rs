use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ApiRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ApiMessage<'a>>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct ApiMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub content: Vec<ApiContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub stop_sequence: Option<String>,
    pub usage: ApiUsage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiContentBlock {
    Text {
        text: String,
    },
    // thinking, tool_use and future block types carry no plain text
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct ApiUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_request_serialization() {
        let request = ApiRequest {
            model: "claude-sonnet-4",
            messages: vec![ApiMessage {
                role: "user",
                content: "Hello",
            }],
            max_tokens: 4096,
            system: Some("You are helpful".to_string()),
            temperature: None,
        };

        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json["messages"][0]["content"], "Hello");
        assert_eq!(json["system"], "You are helpful");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_unknown_blocks_are_tolerated() {
        let json = r#"{
            "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "sig"},
                {"type": "text", "text": "Hello!"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;

        let response: ApiResponse = serde_json::from_str(json).expect("deserialize");
        assert!(matches!(response.content[0], ApiContentBlock::Other));
        assert!(matches!(&response.content[1], ApiContentBlock::Text { text } if text == "Hello!"));
        assert_eq!(response.usage.output_tokens, 5);
    }
}
