use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::keys::KeyRing;
use crate::error::ConfigError;

/// The LLM services this tool knows how to talk to. Serialized in
/// lowercase, both as `llm_services` map keys and as the active/previous
/// selection values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceId {
    Ollama,
    Gemini,
}

impl ServiceId {
    pub const ALL: [ServiceId; 2] = [ServiceId::Ollama, ServiceId::Gemini];

    /// Capitalized name for user-facing output.
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceId::Ollama => "Ollama",
            ServiceId::Gemini => "Gemini",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceId::Ollama => "ollama",
            ServiceId::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings for a local or remote Ollama server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub server_address: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_render_markdown")]
    pub render_markdown: bool,
}

/// Settings for the hosted Gemini API. The key ring is flattened so the
/// file keeps its `api_keys` / `active_api_key_nickname` fields at the
/// service level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(flatten)]
    pub keys: KeyRing,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_render_markdown")]
    pub render_markdown: bool,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            keys: KeyRing::default(),
            model: None,
            render_markdown: true,
        }
    }
}

fn default_render_markdown() -> bool {
    true
}

/// Per-service configuration. Untagged: the variant is recognized by its
/// required fields (`server_address` for Ollama, `api_keys` for Gemini),
/// so the file needs no discriminator of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceConfig {
    Ollama(OllamaConfig),
    Gemini(GeminiConfig),
}

impl ServiceConfig {
    pub fn kind(&self) -> ServiceId {
        match self {
            ServiceConfig::Ollama(_) => ServiceId::Ollama,
            ServiceConfig::Gemini(_) => ServiceId::Gemini,
        }
    }

    pub fn model(&self) -> Option<&str> {
        match self {
            ServiceConfig::Ollama(config) => config.model.as_deref(),
            ServiceConfig::Gemini(config) => config.model.as_deref(),
        }
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        match self {
            ServiceConfig::Ollama(config) => config.model = Some(model.into()),
            ServiceConfig::Gemini(config) => config.model = Some(model.into()),
        }
    }

    pub fn render_markdown(&self) -> bool {
        match self {
            ServiceConfig::Ollama(config) => config.render_markdown,
            ServiceConfig::Gemini(config) => config.render_markdown,
        }
    }

    /// Internal consistency of one service entry. Returns the reason on
    /// failure so callers can wrap it with context.
    pub(crate) fn check(&self) -> Result<(), String> {
        match self {
            ServiceConfig::Ollama(config) => {
                if config.server_address.trim().is_empty() {
                    return Err("the Ollama server address is empty".to_string());
                }
                Ok(())
            }
            ServiceConfig::Gemini(config) => config.keys.check(),
        }
    }
}

/// The whole persisted configuration file. Field names are the on-disk
/// JSON names; every field tolerates being absent so older files load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub active_llm_service: Option<ServiceId>,
    #[serde(default)]
    pub previous_active_llm_service: Option<ServiceId>,
    #[serde(default)]
    pub llm_services: BTreeMap<ServiceId, ServiceConfig>,
}

impl Document {
    /// Cross-field consistency: the active selection must point at a
    /// configured service, every entry must sit under the key matching
    /// its variant, and each entry must pass its own checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(active) = self.active_llm_service {
            if !self.llm_services.contains_key(&active) {
                return Err(ConfigError::Invalid(format!(
                    "active service '{active}' has no entry in llm_services"
                )));
            }
        }
        for (id, config) in &self.llm_services {
            if config.kind() != *id {
                return Err(ConfigError::Invalid(format!(
                    "the '{id}' entry holds a {} configuration",
                    config.kind()
                )));
            }
            config
                .check()
                .map_err(|reason| ConfigError::Invalid(format!("service '{id}': {reason}")))?;
        }
        Ok(())
    }
}
