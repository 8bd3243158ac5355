pub mod client;
pub mod error;
pub mod registry;
pub mod request;
pub mod types;

pub use client::ProviderClient;
pub use error::{LlmuxError, Result};
pub use registry::{ProviderFactory, ProviderRegistry};
pub use request::{RequestBuilder, RequestDescriptor};
pub use types::{ChatMessage, FinishReason, NormalizedResponse, ResponseMetadata, Role, Usage};
