pub mod cli;
pub mod config;
pub mod core;
pub mod logging;
pub mod providers;

pub use crate::core::{
    ChatMessage, LlmuxError, NormalizedResponse, ProviderClient, ProviderRegistry,
    RequestBuilder, RequestDescriptor, Result,
};
pub use crate::providers::ProviderId;
