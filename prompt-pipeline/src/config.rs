use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::{PipelineError, Result};

/// Environment variable consulted when the config file carries no key
pub const API_KEY_ENV: &str = "LLM_API_KEY";

const PLACEHOLDER_KEYS: &[&str] = &["YOUR_GEMINI_API_KEY_HERE", "YOUR_OPENAI_API_KEY_HERE"];

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

/// Hosted text-generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Provider {
    /// Gemini `generateContent`
    Google,
    /// OpenAI chat completions
    OpenAi,
    /// Local Ollama through its OpenAI-compatible endpoint
    Ollama,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Google | Self::OpenAi)
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Google => GEMINI_BASE_URL,
            Self::OpenAi => OPENAI_BASE_URL,
            Self::Ollama => OLLAMA_BASE_URL,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" | "gemini" => Ok(Self::Google),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(PipelineError::Config(format!("Unknown provider: {}", other))),
        }
    }
}

impl TryFrom<String> for Provider {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Provider> for String {
    fn from(provider: Provider) -> Self {
        provider.as_str().to_string()
    }
}

/// LLM connection settings, in the `api_info.json` layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: Provider,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_provider() -> Provider {
    Provider::Ollama
}

fn default_model() -> String {
    "llama3".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

impl LlmConfig {
    /// Load and validate a config file, falling back to `LLM_API_KEY` for the key
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?.with_env_key();
        config.validate()?;
        info!(
            "Loaded LLM config from {} (provider: {}, model: {})",
            path.display(),
            config.provider,
            config.model
        );
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| PipelineError::Config(format!("invalid LLM configuration: {}", e)))
    }

    pub fn with_env_key(mut self) -> Self {
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                self.api_key = Some(key);
            }
        }
        self
    }

    /// Reject configurations that can never produce a working client
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(PipelineError::Config("model must not be empty".to_string()));
        }
        if self.provider.requires_api_key() {
            match self.api_key.as_deref().map(str::trim) {
                None | Some("") => {
                    return Err(PipelineError::Config(format!(
                        "provider '{}' requires an api_key (or {} in the environment)",
                        self.provider, API_KEY_ENV
                    )))
                }
                Some(key) if PLACEHOLDER_KEYS.contains(&key) => {
                    return Err(PipelineError::Config(format!(
                        "please set your {} API key; found placeholder value",
                        self.provider
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .unwrap_or_else(|| self.provider.default_base_url())
    }
}
