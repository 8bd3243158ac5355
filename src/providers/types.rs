use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use super::error::ProviderError;

/// A provider credential. Never printed in full.
#[derive(Clone, Default)]
pub struct ApiKey(Cow<'static, str>);

impl ApiKey {
    #[must_use]
    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self(key.into())
    }

    pub fn from_env(var_name: &str) -> Result<Self, ProviderError> {
        match std::env::var(var_name) {
            Ok(value) if !value.trim().is_empty() => Ok(Self(Cow::Owned(value))),
            _ => Err(ProviderError::Configuration(format!(
                "Environment variable {var_name} not set"
            ))),
        }
    }

    /// Missing variables yield an empty key; requests made with it fail
    /// authentication before reaching the network.
    #[must_use]
    pub fn from_env_or_empty(var_name: &str) -> Self {
        Self::from_env(var_name).unwrap_or_default()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn redacted(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        match chars.len() {
            0 => "<empty>".to_string(),
            1..=8 => "***".to_string(),
            n => {
                let head: String = chars[..4].iter().collect();
                let tail: String = chars[n - 3..].iter().collect();
                format!("{head}...{tail}")
            }
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self.redacted())
    }
}

impl From<&str> for ApiKey {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl From<String> for ApiKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(Cow<'static, str>);

impl ModelId {
    #[must_use]
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for ModelId {
    fn from(s: &String) -> Self {
        Self::new(s.clone())
    }
}

/// Vendor base URL, stored without trailing slashes so paths can be appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseUrl(Cow<'static, str>);

impl BaseUrl {
    #[must_use]
    pub fn new(url: impl Into<Cow<'static, str>>) -> Self {
        let url = url.into();
        if url.ends_with('/') {
            Self(Cow::Owned(url.trim_end_matches('/').to_string()))
        } else {
            Self(url)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.0)
        } else {
            format!("{}/{path}", self.0)
        }
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BaseUrl {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

impl From<String> for BaseUrl {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
