use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::config::AppConfig;
use crate::core::error::{LlmuxError, Result};
use crate::core::registry::ProviderRegistry;
use crate::core::types::{ChatMessage, NormalizedResponse};
use crate::providers::{ProviderId, ProviderSettings};

use super::provider::select_provider;
use super::{CompleteArgs, ConfigSubcommands};

pub async fn complete(args: &CompleteArgs, config: &AppConfig, verbose: bool) -> Result<String> {
    let (id, model) = select_provider(args, config)?;
    let registry = ProviderRegistry::with_builtins(config)?;
    let client = registry.resolve(id)?;

    let mut builder = client.create_builder();
    if let Some(model) = model {
        builder = builder.model(model);
    }
    if let Some(system) = args.system.as_ref().or(config.system_prompt.as_ref()) {
        builder = builder.system(system.as_str());
    }
    if let Some(temperature) = args.temperature.or(config.temperature) {
        builder = builder.temperature(temperature);
    }
    if let Some(max_tokens) = args.max_tokens.or(config.max_tokens) {
        builder = builder.max_tokens(max_tokens);
    }
    let descriptor = builder
        .message(ChatMessage::user(args.prompt.join(" ")))
        .build()?;
    info!(provider = %id, model = descriptor.model(), "completing");

    if args.raw {
        let raw = client.send_request(&descriptor).await?;
        return Ok(serde_json::to_string_pretty(&raw)?);
    }

    let response = client.complete(&descriptor).await?;
    if verbose {
        eprintln!("{}", describe(&response));
    }
    Ok(response.content().to_string())
}

/// One line of metadata for stderr.
fn describe(response: &NormalizedResponse) -> String {
    let metadata = response.metadata();
    let mut line = format!("[{}", response.provider());
    if let Some(model) = &metadata.model {
        let _ = write!(line, " {model}");
    }
    if let Some(reason) = &metadata.finish_reason {
        let _ = write!(line, " finish={reason}");
    }
    if let Some(usage) = &metadata.usage {
        let _ = write!(
            line,
            " tokens={}+{}={}",
            usage.input_tokens, usage.output_tokens, usage.total_tokens
        );
    }
    line.push(']');
    line
}

pub fn providers(config: &AppConfig) -> Result<String> {
    let registry = ProviderRegistry::with_builtins(config)?;
    let mut out = String::new();
    for id in registry.ids() {
        let settings = ProviderSettings::from_config(id, config);
        let model = settings
            .model
            .as_ref()
            .map_or(id.default_model(), |m| m.as_str());
        let base_url = settings
            .base_url
            .as_ref()
            .map_or(id.default_base_url(), |u| u.as_str());
        let key = match &settings.api_key_env {
            None => "no key needed".to_string(),
            Some(env) if settings.api_key.is_empty() => format!("{env} not set"),
            Some(env) => format!("{env} set"),
        };
        let _ = writeln!(
            out,
            "{:<11} {:<14} {:<45} {base_url} ({key})",
            id.as_str(),
            id.display_name(),
            model
        );
    }
    Ok(out.trim_end().to_string())
}

pub fn normalize(provider: &str, file: &Path, config: &AppConfig) -> Result<String> {
    let id: ProviderId = provider.parse()?;
    let body = fs::read_to_string(file)?;
    let raw: serde_json::Value = serde_json::from_str(&body)?;

    let client = ProviderRegistry::with_builtins(config)?.resolve(id)?;
    let response = client.parse_response(raw)?;
    Ok(serde_json::to_string_pretty(&response)?)
}

pub fn config(command: &ConfigSubcommands, config: &AppConfig) -> Result<String> {
    match command {
        ConfigSubcommands::Init => {
            let path = AppConfig::init_default()?;
            Ok(format!("Created config file at {}", path.display()))
        }
        ConfigSubcommands::Where => AppConfig::get_config_path()
            .map(|path| path.display().to_string())
            .ok_or_else(|| LlmuxError::Config("Could not determine config path".to_string())),
        ConfigSubcommands::Show => config.to_toml(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ResponseMetadata, Usage};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_describe() {
        let metadata = ResponseMetadata {
            model: Some("gpt-4o".to_string()),
            usage: Some(Usage::new(3, 4)),
            ..Default::default()
        };
        let response =
            NormalizedResponse::new(ProviderId::OpenAI, "hi".to_string(), metadata, json!({}));
        assert_eq!(describe(&response), "[openai gpt-4o tokens=3+4=7]");
    }

    #[test]
    fn test_providers_lists_all() {
        let listing = providers(&AppConfig::default()).unwrap();
        for id in ProviderId::ALL {
            assert!(listing.contains(id.as_str()), "{listing}");
        }
        assert!(listing.contains("no key needed"));
    }

    #[test]
    fn test_normalize_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("reply.json");
        fs::write(
            &path,
            json!({
                "content": [{"type": "text", "text": "Bonjour"}],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 2, "output_tokens": 1}
            })
            .to_string(),
        )
        .unwrap();

        let out = normalize("claude", &path, &AppConfig::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["provider"], "anthropic");
        assert_eq!(value["content"], "Bonjour");
        assert_eq!(value["metadata"]["finish_reason"], "stop");
    }

    #[test]
    fn test_normalize_rejects_non_json() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("reply.json");
        fs::write(&path, "<html>").unwrap();
        let err = normalize("openai", &path, &AppConfig::default()).unwrap_err();
        assert!(matches!(err, LlmuxError::Json(_)));
    }
}
