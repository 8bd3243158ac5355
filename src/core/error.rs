use thiserror::Error;

use crate::providers::ProviderId;
use crate::providers::error::ProviderError;

#[derive(Error, Debug)]
pub enum LlmuxError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider already registered: {0}")]
    DuplicateProvider(ProviderId),

    #[error("Incomplete request: missing {0}")]
    IncompleteRequest(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LlmuxError>;

impl LlmuxError {
    /// The actionable hint attached to authentication failures, if any.
    #[must_use]
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Provider(ProviderError::Authentication { hint, .. }) => hint.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            LlmuxError::IncompleteRequest("model").to_string(),
            "Incomplete request: missing model"
        );
        assert_eq!(
            LlmuxError::DuplicateProvider(ProviderId::Anthropic).to_string(),
            "Provider already registered: anthropic"
        );
    }

    #[test]
    fn test_provider_error_is_transparent() {
        let err: LlmuxError = ProviderError::malformed("no content").into();
        assert_eq!(err.to_string(), "Malformed response: no content");
    }

    #[test]
    fn test_hint_only_for_auth() {
        let err: LlmuxError = ProviderError::auth_with_hint("denied", "Set KEY").into();
        assert_eq!(err.hint(), Some("Set KEY"));
        assert!(LlmuxError::Config("bad".into()).hint().is_none());
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(LlmuxError::from(json_err), LlmuxError::Json(_)));
    }
}
