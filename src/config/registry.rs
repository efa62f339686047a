use std::collections::BTreeMap;

use tracing::debug;

use super::document::{Document, ServiceConfig, ServiceId};
use crate::error::ConfigError;

/// The active/previous service pair. `set_active` records the outgoing
/// service as previous only when the selection actually changes, so a
/// re-selection never erases the jump target.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActiveSelection {
    active: Option<ServiceId>,
    previous: Option<ServiceId>,
}

impl ActiveSelection {
    pub fn new(active: Option<ServiceId>, previous: Option<ServiceId>) -> Self {
        Self { active, previous }
    }

    pub fn current(&self) -> Option<ServiceId> {
        self.active
    }

    pub fn previous(&self) -> Option<ServiceId> {
        self.previous
    }

    pub fn set_active(&mut self, id: ServiceId) {
        if self.active != Some(id) {
            self.previous = self.active;
            self.active = Some(id);
        }
    }

    /// Swaps active and previous. Self-inverse: jumping twice restores
    /// the starting selection.
    pub fn jump_to_previous(&mut self) -> Result<ServiceId, ConfigError> {
        let target = self.previous.ok_or(ConfigError::NoPreviousService)?;
        self.previous = self.active;
        self.active = Some(target);
        Ok(target)
    }

    pub fn clear_previous(&mut self) {
        self.previous = None;
    }

    /// Drops any reference to a service that no longer exists.
    pub fn forget(&mut self, id: ServiceId) {
        if self.active == Some(id) {
            self.active = None;
        }
        if self.previous == Some(id) {
            self.previous = None;
        }
    }
}

/// In-memory authority over the configured services and the selection
/// between them. Every mutation keeps the document invariants, so a
/// registry can always be written back out.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<ServiceId, ServiceConfig>,
    selection: ActiveSelection,
}

impl ServiceRegistry {
    pub fn from_document(doc: Document) -> Result<Self, ConfigError> {
        doc.validate()?;
        Ok(Self {
            selection: ActiveSelection::new(doc.active_llm_service, doc.previous_active_llm_service),
            services: doc.llm_services,
        })
    }

    /// Snapshot of the registry in its on-disk shape.
    pub fn document(&self) -> Document {
        Document {
            active_llm_service: self.selection.current(),
            previous_active_llm_service: self.selection.previous(),
            llm_services: self.services.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn ids(&self) -> Vec<ServiceId> {
        self.services.keys().copied().collect()
    }

    pub fn get(&self, id: ServiceId) -> Option<&ServiceConfig> {
        self.services.get(&id)
    }

    pub fn active(&self) -> Option<ServiceId> {
        self.selection.current()
    }

    pub fn previous(&self) -> Option<ServiceId> {
        self.selection.previous()
    }

    /// Inserts or replaces a service entry. The payload must match the
    /// key and pass its own consistency checks.
    pub fn upsert(&mut self, id: ServiceId, config: ServiceConfig) -> Result<(), ConfigError> {
        if config.kind() != id {
            return Err(ConfigError::InvalidReference(format!(
                "cannot store a {} configuration under '{id}'",
                config.kind()
            )));
        }
        config.check().map_err(ConfigError::InvalidReference)?;
        debug!("Storing configuration for service '{id}'");
        self.services.insert(id, config);
        Ok(())
    }

    /// Removes a service and clears any active/previous reference to it.
    pub fn remove(&mut self, id: ServiceId) {
        self.services.remove(&id);
        self.selection.forget(id);
    }

    pub fn set_active(&mut self, id: ServiceId) -> Result<(), ConfigError> {
        if !self.services.contains_key(&id) {
            return Err(ConfigError::ServiceNotConfigured(id));
        }
        self.selection.set_active(id);
        Ok(())
    }

    /// Jump target must still be configured; a stale reference is cleared
    /// (the caller decides whether to persist that) before the error is
    /// returned.
    pub fn jump_to_previous(&mut self) -> Result<ServiceId, ConfigError> {
        let Some(previous) = self.selection.previous() else {
            return Err(ConfigError::NoPreviousService);
        };
        if !self.services.contains_key(&previous) {
            self.selection.clear_previous();
            return Err(ConfigError::ServiceNotConfigured(previous));
        }
        self.selection.jump_to_previous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::document::{GeminiConfig, OllamaConfig};
    use crate::config::keys::KeyRing;

    fn ollama() -> ServiceConfig {
        ServiceConfig::Ollama(OllamaConfig {
            server_address: "http://localhost:11434".to_string(),
            model: Some("llama3".to_string()),
            render_markdown: true,
        })
    }

    fn gemini() -> ServiceConfig {
        let mut keys = KeyRing::default();
        keys.add("work", "AIzaSyTestKey").unwrap();
        keys.set_active("work").unwrap();
        ServiceConfig::Gemini(GeminiConfig {
            keys,
            model: Some("models/gemini-pro".to_string()),
            render_markdown: true,
        })
    }

    fn registry_with_both() -> ServiceRegistry {
        let mut registry = ServiceRegistry::default();
        registry.upsert(ServiceId::Ollama, ollama()).unwrap();
        registry.upsert(ServiceId::Gemini, gemini()).unwrap();
        registry
    }

    #[test]
    fn set_active_requires_a_configured_service() {
        let mut registry = ServiceRegistry::default();
        let err = registry.set_active(ServiceId::Ollama).unwrap_err();
        assert!(matches!(err, ConfigError::ServiceNotConfigured(ServiceId::Ollama)));
    }

    #[test]
    fn switching_records_the_outgoing_service_as_previous() {
        let mut registry = registry_with_both();
        registry.set_active(ServiceId::Ollama).unwrap();
        assert_eq!(registry.previous(), None);
        registry.set_active(ServiceId::Gemini).unwrap();
        assert_eq!(registry.active(), Some(ServiceId::Gemini));
        assert_eq!(registry.previous(), Some(ServiceId::Ollama));
    }

    #[test]
    fn reselecting_the_active_service_keeps_previous() {
        let mut registry = registry_with_both();
        registry.set_active(ServiceId::Ollama).unwrap();
        registry.set_active(ServiceId::Gemini).unwrap();
        registry.set_active(ServiceId::Gemini).unwrap();
        assert_eq!(registry.previous(), Some(ServiceId::Ollama));
    }

    #[test]
    fn jumping_twice_restores_the_original_selection() {
        let mut registry = registry_with_both();
        registry.set_active(ServiceId::Ollama).unwrap();
        registry.set_active(ServiceId::Gemini).unwrap();

        assert_eq!(registry.jump_to_previous().unwrap(), ServiceId::Ollama);
        assert_eq!(registry.active(), Some(ServiceId::Ollama));
        assert_eq!(registry.previous(), Some(ServiceId::Gemini));

        assert_eq!(registry.jump_to_previous().unwrap(), ServiceId::Gemini);
        assert_eq!(registry.active(), Some(ServiceId::Gemini));
        assert_eq!(registry.previous(), Some(ServiceId::Ollama));
    }

    #[test]
    fn jump_without_a_previous_service_fails() {
        let mut registry = registry_with_both();
        registry.set_active(ServiceId::Ollama).unwrap();
        let err = registry.jump_to_previous().unwrap_err();
        assert!(matches!(err, ConfigError::NoPreviousService));
    }

    #[test]
    fn jump_to_a_deleted_service_clears_the_stale_reference() {
        let mut registry = registry_with_both();
        registry.set_active(ServiceId::Ollama).unwrap();
        registry.set_active(ServiceId::Gemini).unwrap();
        registry.services.remove(&ServiceId::Ollama);

        let err = registry.jump_to_previous().unwrap_err();
        assert!(matches!(err, ConfigError::ServiceNotConfigured(ServiceId::Ollama)));
        assert_eq!(registry.previous(), None);
        assert_eq!(registry.active(), Some(ServiceId::Gemini));
    }

    #[test]
    fn remove_clears_active_and_previous_references() {
        let mut registry = registry_with_both();
        registry.set_active(ServiceId::Ollama).unwrap();
        registry.set_active(ServiceId::Gemini).unwrap();

        registry.remove(ServiceId::Gemini);
        assert_eq!(registry.active(), None);
        assert_eq!(registry.previous(), Some(ServiceId::Ollama));

        registry.remove(ServiceId::Ollama);
        assert_eq!(registry.previous(), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn upsert_rejects_a_payload_under_the_wrong_key() {
        let mut registry = ServiceRegistry::default();
        let err = registry.upsert(ServiceId::Gemini, ollama()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidReference(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn upsert_rejects_a_gemini_entry_with_a_dangling_active_key() {
        let mut registry = ServiceRegistry::default();
        let config = ServiceConfig::Gemini(GeminiConfig {
            keys: KeyRing::with_entries(Vec::new(), Some("ghost".to_string())),
            model: None,
            render_markdown: true,
        });
        let err = registry.upsert(ServiceId::Gemini, config).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn document_round_trip_preserves_selection_and_services() {
        let mut registry = registry_with_both();
        registry.set_active(ServiceId::Ollama).unwrap();
        registry.set_active(ServiceId::Gemini).unwrap();

        let doc = registry.document();
        assert_eq!(doc.active_llm_service, Some(ServiceId::Gemini));
        assert_eq!(doc.previous_active_llm_service, Some(ServiceId::Ollama));

        let restored = ServiceRegistry::from_document(doc).unwrap();
        assert_eq!(restored.active(), Some(ServiceId::Gemini));
        assert_eq!(restored.previous(), Some(ServiceId::Ollama));
        assert_eq!(restored.get(ServiceId::Ollama), registry.get(ServiceId::Ollama));
    }

    #[test]
    fn from_document_rejects_an_invalid_document() {
        let doc = Document {
            active_llm_service: Some(ServiceId::Ollama),
            ..Document::default()
        };
        assert!(ServiceRegistry::from_document(doc).is_err());
    }
}
