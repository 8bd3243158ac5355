use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};
use tracing::warn;

use crate::core::error::{LlmuxError, Result};
use crate::providers::ProviderId;
use crate::providers::http::HttpConfig;

const APP_DIR: &str = "llmux";
const ENV_PREFIX: &str = "LLMUX";

pub fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .map(|h| h.join("Library/Application Support").join(APP_DIR))
    }

    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_CONFIG_HOME")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
            .map(|c| c.join(APP_DIR))
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .map(|a| a.join(APP_DIR))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .map(|h| h.join(".config").join(APP_DIR))
    }
}

/// Per-vendor overrides from a `[providers.<id>]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub providers: BTreeMap<String, ProviderOverrides>,
}

impl AppConfig {
    /// Reads the user config file and `LLMUX_*` variables. A broken file is
    /// reported and replaced by defaults so the CLI stays usable.
    #[must_use]
    pub fn load() -> Self {
        Self::build(Self::get_config_path().as_deref()).unwrap_or_else(|e| {
            warn!(error = %e, "failed to load config, using defaults");
            Self::default()
        })
    }

    /// Strict variant of [`AppConfig::load`] for an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LlmuxError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Self::build(Some(path))
    }

    fn build(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| LlmuxError::Config(e.to_string()))
    }

    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        get_config_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn init_default() -> std::result::Result<PathBuf, io::Error> {
        let path = Self::get_config_path().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "Could not determine config directory",
            )
        })?;
        Self::write_template(&path)?;
        Ok(path)
    }

    pub fn write_template(path: &Path) -> std::result::Result<(), io::Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        if path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("Config file already exists at {}", path.display()),
            ));
        }

        fs::write(path, include_str!("config.template.toml"))
    }

    /// Overrides for `id`, matched on the canonical id or any alias.
    #[must_use]
    pub fn provider_overrides(&self, id: ProviderId) -> Option<&ProviderOverrides> {
        self.providers
            .iter()
            .find(|(name, _)| name.parse::<ProviderId>().is_ok_and(|parsed| parsed == id))
            .map(|(_, overrides)| overrides)
    }

    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        let mut http = HttpConfig::default();
        if let Some(secs) = self.timeout_secs {
            http = http.with_timeout(Duration::from_secs(secs));
        }
        if let Some(retries) = self.max_retries {
            http = http.with_max_retries(retries);
        }
        http
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LlmuxError::Config(e.to_string()))
    }
}
