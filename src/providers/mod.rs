pub mod error;
pub mod factory;
pub mod http;
pub mod id;
pub mod types;

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod openai_compat;

pub use error::ProviderError;
pub use factory::{ProviderSettings, create_provider, create_provider_with_client};
pub use id::ProviderId;
pub use types::{ApiKey, BaseUrl, ModelId};

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use mock::{MockProvider, MockResponse};
pub use openai_compat::{OpenAICompatConfig, OpenAICompatProvider};
