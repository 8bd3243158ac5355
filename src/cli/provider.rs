use crate::config::AppConfig;
use crate::core::error::Result;
use crate::providers::ProviderId;

use super::CompleteArgs;

/// Guesses the vendor from a model name's family prefix.
#[must_use]
pub fn infer_provider(model: &str) -> Option<ProviderId> {
    let model = model.to_ascii_lowercase();
    if model.starts_with("claude") {
        Some(ProviderId::Anthropic)
    } else if ["gpt", "chatgpt", "o1", "o3", "o4"]
        .iter()
        .any(|prefix| model.starts_with(prefix))
    {
        Some(ProviderId::OpenAI)
    } else if model.starts_with("gemini") {
        Some(ProviderId::Gemini)
    } else {
        None
    }
}

/// Picks the provider and model for `complete`.
///
/// An explicit `--provider` wins and only pairs with an explicit `--model`.
/// Otherwise the model (flag, then config) is used to infer the vendor, and
/// the configured provider is the fallback before OpenAI.
pub fn select_provider(
    args: &CompleteArgs,
    config: &AppConfig,
) -> Result<(ProviderId, Option<String>)> {
    if let Some(name) = &args.provider {
        return Ok((name.parse()?, args.model.clone()));
    }

    if let Some(model) = &args.model {
        let id = match infer_provider(model) {
            Some(id) => id,
            None => configured_or_default(config)?,
        };
        return Ok((id, Some(model.clone())));
    }

    let id = match &config.provider {
        Some(name) => name.parse()?,
        None => config
            .model
            .as_deref()
            .and_then(infer_provider)
            .unwrap_or(ProviderId::OpenAI),
    };
    Ok((id, config.model.clone()))
}

fn configured_or_default(config: &AppConfig) -> Result<ProviderId> {
    config
        .provider
        .as_deref()
        .map_or(Ok(ProviderId::OpenAI), str::parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LlmuxError;

    fn args(provider: Option<&str>, model: Option<&str>) -> CompleteArgs {
        CompleteArgs {
            provider: provider.map(str::to_string),
            model: model.map(str::to_string),
            prompt: vec!["hi".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_infer_provider() {
        assert_eq!(infer_provider("claude-3-opus"), Some(ProviderId::Anthropic));
        assert_eq!(infer_provider("GPT-4o"), Some(ProviderId::OpenAI));
        assert_eq!(infer_provider("o3-mini"), Some(ProviderId::OpenAI));
        assert_eq!(infer_provider("gemini-2.0-flash"), Some(ProviderId::Gemini));
        assert_eq!(infer_provider("llama3.2"), None);
    }

    #[test]
    fn test_explicit_provider_wins() {
        let config = AppConfig {
            provider: Some("gemini".to_string()),
            model: Some("gemini-1.5-pro".to_string()),
            ..Default::default()
        };
        let (id, model) = select_provider(&args(Some("groq"), None), &config).unwrap();
        assert_eq!(id, ProviderId::Groq);
        assert_eq!(model, None);
    }

    #[test]
    fn test_model_flag_infers_provider() {
        let (id, model) =
            select_provider(&args(None, Some("claude-3-5-haiku-latest")), &AppConfig::default())
                .unwrap();
        assert_eq!(id, ProviderId::Anthropic);
        assert_eq!(model.as_deref(), Some("claude-3-5-haiku-latest"));
    }

    #[test]
    fn test_unknown_model_falls_back_to_config() {
        let config = AppConfig {
            provider: Some("ollama".to_string()),
            ..Default::default()
        };
        let (id, _) = select_provider(&args(None, Some("qwen2.5")), &config).unwrap();
        assert_eq!(id, ProviderId::Ollama);
    }

    #[test]
    fn test_config_defaults() {
        let (id, model) = select_provider(&args(None, None), &AppConfig::default()).unwrap();
        assert_eq!(id, ProviderId::OpenAI);
        assert!(model.is_none());
    }

    #[test]
    fn test_unknown_provider_name() {
        let err = select_provider(&args(Some("acme"), None), &AppConfig::default()).unwrap_err();
        assert!(matches!(err, LlmuxError::UnknownProvider(name) if name == "acme"));
    }
}
