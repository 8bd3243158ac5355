use async_trait::async_trait;
use serde_json::Value;

use super::error::Result;
use super::request::{RequestBuilder, RequestDescriptor};
use super::types::NormalizedResponse;
use crate::providers::ProviderId;

/// The capability set every vendor client implements.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn id(&self) -> ProviderId;

    /// A builder seeded with this vendor's endpoint, auth, headers and
    /// default model. Callers add the conversation and any overrides.
    fn create_builder(&self) -> RequestBuilder;

    /// Performs the network call and returns the vendor's JSON untouched.
    async fn send_request(&self, descriptor: &RequestDescriptor) -> Result<Value>;

    fn parse_response(&self, raw: Value) -> Result<NormalizedResponse>;

    async fn complete(&self, descriptor: &RequestDescriptor) -> Result<NormalizedResponse> {
        let raw = self.send_request(descriptor).await?;
        self.parse_response(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ChatMessage, ResponseMetadata};

    struct EchoClient;

    #[async_trait]
    impl ProviderClient for EchoClient {
        fn id(&self) -> ProviderId {
            ProviderId::Ollama
        }

        fn create_builder(&self) -> RequestBuilder {
            RequestBuilder::new().endpoint("echo://local").model("echo")
        }

        async fn send_request(&self, descriptor: &RequestDescriptor) -> Result<Value> {
            let last = descriptor
                .messages()
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(serde_json::json!({ "echo": last }))
        }

        fn parse_response(&self, raw: Value) -> Result<NormalizedResponse> {
            let content = raw["echo"].as_str().unwrap_or_default().to_string();
            Ok(NormalizedResponse::new(
                self.id(),
                content,
                ResponseMetadata::default(),
                raw,
            ))
        }
    }

    #[tokio::test]
    async fn test_client_is_object_safe_and_completes() {
        let client: Box<dyn ProviderClient> = Box::new(EchoClient);
        let descriptor = client
            .create_builder()
            .message(ChatMessage::user("ping"))
            .build()
            .unwrap();

        let response = client.complete(&descriptor).await.unwrap();
        assert_eq!(response.content(), "ping");
        assert_eq!(response.raw()["echo"], "ping");
    }
}
