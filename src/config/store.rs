use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::document::Document;
use crate::error::ConfigError;

pub const CONFIG_DIR_NAME: &str = ".qlm";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Owns the configuration file on disk. Loading a missing file yields an
/// empty document; loading a malformed or inconsistent one is an error.
/// Saves go through a sibling temp file and a rename, so a crash mid-write
/// leaves the previous file intact.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.qlm/config.json`, falling back to the current
    /// directory when HOME is unset.
    pub fn default() -> Self {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Self::new(PathBuf::from(home).join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<Document> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration at {}, starting empty", self.path.display());
                return Ok(Document::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        let doc: Document = serde_json::from_str(&raw).map_err(|e| {
            ConfigError::Invalid(format!(
                "{} is not a valid configuration file: {e}",
                self.path.display()
            ))
        })?;
        doc.validate()?;
        debug!("Loaded configuration from {}", self.path.display());
        Ok(doc)
    }

    pub fn save(&self, doc: &Document) -> Result<()> {
        doc.validate()?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to move {} into place", tmp.display()))?;
        debug!("Configuration saved to {}", self.path.display());
        Ok(())
    }

    /// Deletes the file. Already deleted counts as success.
    pub fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Deleted configuration at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to delete {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::document::{OllamaConfig, ServiceConfig, ServiceId};
    use crate::config::registry::ServiceRegistry;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    fn ollama(model: &str) -> ServiceConfig {
        ServiceConfig::Ollama(OllamaConfig {
            server_address: "http://localhost:11434".to_string(),
            model: Some(model.to_string()),
            render_markdown: true,
        })
    }

    #[test]
    fn missing_file_loads_as_an_empty_document() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let doc = store.load().unwrap();
        assert_eq!(doc, Document::default());
        assert!(!store.exists());
    }

    #[test]
    fn save_creates_parent_directories_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut doc = Document::default();
        doc.llm_services.insert(ServiceId::Ollama, ollama("llama3"));
        doc.active_llm_service = Some(ServiceId::Ollama);

        store.save(&doc).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), doc);
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&Document::default()).unwrap();

        let entries: Vec<String> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec![CONFIG_FILE_NAME.to_string()]);
    }

    #[test]
    fn corrupt_json_is_reported_as_invalid() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn save_refuses_an_inconsistent_document() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let doc = Document {
            active_llm_service: Some(ServiceId::Gemini),
            ..Document::default()
        };
        assert!(store.save(&doc).is_err());
        assert!(!store.exists());
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&Document::default()).unwrap();
        store.delete().unwrap();
        assert!(!store.exists());
        store.delete().unwrap();
    }

    #[test]
    fn configure_activate_save_and_reload_sees_the_same_state() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut registry = ServiceRegistry::from_document(store.load().unwrap()).unwrap();
        registry.upsert(ServiceId::Ollama, ollama("mistral")).unwrap();
        registry.set_active(ServiceId::Ollama).unwrap();
        store.save(&registry.document()).unwrap();

        let reloaded = ServiceRegistry::from_document(store.load().unwrap()).unwrap();
        assert_eq!(reloaded.active(), Some(ServiceId::Ollama));
        assert_eq!(
            reloaded.get(ServiceId::Ollama).and_then(|c| c.model()),
            Some("mistral")
        );
    }
}
