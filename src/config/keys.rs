use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One stored Gemini API key with its user-chosen nickname.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyEntry {
    pub nickname: String,
    pub key: String,
}

impl ApiKeyEntry {
    /// Masked form of the key for any display outside --show-key.
    pub fn masked_key(&self) -> String {
        mask(&self.key)
    }
}

/// Masks a secret for display: first and last four characters with the
/// middle elided, or fully starred when the secret is too short for that
/// to hide anything.
pub fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "********".to_string()
    }
}

/// Named API keys for the Gemini service plus which one is active.
/// Entries keep their insertion order; nicknames are unique and matched
/// case-sensitively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyRing {
    #[serde(rename = "api_keys", default)]
    entries: Vec<ApiKeyEntry>,
    #[serde(rename = "active_api_key_nickname", default)]
    active: Option<String>,
}

impl KeyRing {
    pub fn with_entries(entries: Vec<ApiKeyEntry>, active: Option<String>) -> Self {
        Self { entries, active }
    }

    /// Appends a key. Fails without touching the ring when the nickname
    /// is already taken.
    pub fn add(
        &mut self,
        nickname: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<(), ConfigError> {
        let nickname = nickname.into();
        if self.find(&nickname).is_some() {
            return Err(ConfigError::DuplicateNickname(nickname));
        }
        self.entries.push(ApiKeyEntry {
            nickname,
            key: key.into(),
        });
        Ok(())
    }

    /// Removes a key by nickname. Removing the active key leaves the ring
    /// with no active selection.
    pub fn remove(&mut self, nickname: &str) -> Result<ApiKeyEntry, ConfigError> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.nickname == nickname)
            .ok_or_else(|| ConfigError::KeyNotFound(nickname.to_string()))?;
        let removed = self.entries.remove(position);
        if self.active.as_deref() == Some(nickname) {
            self.active = None;
        }
        Ok(removed)
    }

    pub fn set_active(&mut self, nickname: &str) -> Result<(), ConfigError> {
        if self.find(nickname).is_none() {
            return Err(ConfigError::KeyNotFound(nickname.to_string()));
        }
        self.active = Some(nickname.to_string());
        Ok(())
    }

    pub fn active(&self) -> Option<&ApiKeyEntry> {
        self.active.as_deref().and_then(|nickname| self.find(nickname))
    }

    pub fn active_nickname(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn find(&self, nickname: &str) -> Option<&ApiKeyEntry> {
        self.entries.iter().find(|entry| entry.nickname == nickname)
    }

    pub fn entries(&self) -> &[ApiKeyEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Ring-level consistency, used by document validation. Returns the
    /// reason on failure.
    pub(crate) fn check(&self) -> Result<(), String> {
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.nickname.is_empty() {
                return Err("an API key entry has an empty nickname".to_string());
            }
            if self.entries[..i].iter().any(|e| e.nickname == entry.nickname) {
                return Err(format!("duplicate API key nickname '{}'", entry.nickname));
            }
        }
        if let Some(active) = &self.active {
            if !self.entries.iter().any(|e| &e.nickname == active) {
                return Err(format!(
                    "active API key '{active}' is not among the stored keys"
                ));
            }
        }
        Ok(())
    }
}
