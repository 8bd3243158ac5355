use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::core::error::LlmuxError;

/// Supported completion vendors.
///
/// Ordering follows declaration order and is what registry listings use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAI,
    Anthropic,
    Gemini,
    Groq,
    Together,
    OpenRouter,
    Fireworks,
    Ollama,
}

impl ProviderId {
    pub const ALL: [Self; 8] = [
        Self::OpenAI,
        Self::Anthropic,
        Self::Gemini,
        Self::Groq,
        Self::Together,
        Self::OpenRouter,
        Self::Fireworks,
        Self::Ollama,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Groq => "groq",
            Self::Together => "together",
            Self::OpenRouter => "openrouter",
            Self::Fireworks => "fireworks",
            Self::Ollama => "ollama",
        }
    }

    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Gemini => "Google Gemini",
            Self::Groq => "Groq",
            Self::Together => "Together AI",
            Self::OpenRouter => "OpenRouter",
            Self::Fireworks => "Fireworks AI",
            Self::Ollama => "Ollama",
        }
    }

    #[must_use]
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAI => "https://api.openai.com",
            Self::Anthropic => "https://api.anthropic.com",
            Self::Gemini => "https://generativelanguage.googleapis.com",
            Self::Groq => "https://api.groq.com/openai",
            Self::Together => "https://api.together.xyz",
            Self::OpenRouter => "https://openrouter.ai/api",
            Self::Fireworks => "https://api.fireworks.ai/inference",
            Self::Ollama => "http://localhost:11434",
        }
    }

    #[must_use]
    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o",
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::Gemini => "gemini-2.0-flash",
            Self::Groq => "llama-3.3-70b-versatile",
            Self::Together => "meta-llama/Llama-3.3-70B-Instruct-Turbo",
            Self::OpenRouter => "openai/gpt-4o",
            Self::Fireworks => "accounts/fireworks/models/llama-v3p1-70b-instruct",
            Self::Ollama => "llama3.2",
        }
    }

    /// Ollama runs locally without credentials.
    #[must_use]
    pub const fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Gemini => Some("GEMINI_API_KEY"),
            Self::Groq => Some("GROQ_API_KEY"),
            Self::Together => Some("TOGETHER_API_KEY"),
            Self::OpenRouter => Some("OPENROUTER_API_KEY"),
            Self::Fireworks => Some("FIREWORKS_API_KEY"),
            Self::Ollama => None,
        }
    }

    #[must_use]
    pub const fn is_openai_compatible(&self) -> bool {
        !matches!(self, Self::Anthropic | Self::Gemini)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = LlmuxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "gemini" | "google" => Ok(Self::Gemini),
            "groq" => Ok(Self::Groq),
            "together" | "together_ai" | "togetherai" => Ok(Self::Together),
            "openrouter" => Ok(Self::OpenRouter),
            "fireworks" => Ok(Self::Fireworks),
            "ollama" => Ok(Self::Ollama),
            _ => Err(LlmuxError::UnknownProvider(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive_with_aliases() {
        assert_eq!("OPENAI".parse::<ProviderId>().unwrap(), ProviderId::OpenAI);
        assert_eq!("CLAUDE".parse::<ProviderId>().unwrap(), ProviderId::Anthropic);
        assert_eq!("google".parse::<ProviderId>().unwrap(), ProviderId::Gemini);
        assert_eq!(
            " together_ai ".parse::<ProviderId>().unwrap(),
            ProviderId::Together
        );
    }

    #[test]
    fn test_parse_unknown() {
        let err = "watsonx".parse::<ProviderId>().unwrap_err();
        assert!(matches!(err, LlmuxError::UnknownProvider(ref name) if name == "watsonx"));
    }

    #[test]
    fn test_as_str_round_trips_through_parse() {
        for id in ProviderId::ALL {
            assert_eq!(id.as_str().parse::<ProviderId>().unwrap(), id);
        }
    }

    #[test]
    fn test_only_ollama_has_no_key() {
        let keyless: Vec<_> = ProviderId::ALL
            .into_iter()
            .filter(|id| id.api_key_env().is_none())
            .collect();
        assert_eq!(keyless, vec![ProviderId::Ollama]);
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&ProviderId::OpenRouter).unwrap();
        assert_eq!(json, "\"openrouter\"");
    }
}
