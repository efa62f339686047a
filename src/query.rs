use std::future::Future;
use std::io;

use anyhow::Result;
use colored::Colorize;
use tracing::{info, warn};

use crate::config::{ServiceConfig, ServiceId, ServiceRegistry};
use crate::error::ConfigError;
use crate::llm::{short_model_name, GeminiClient, LlmClient, Message, OllamaClient};
use crate::progress::ProgressIndicator;

/// Everything needed to run queries against the active service: the
/// resolved model, display settings, the announcement line, and a ready
/// client.
pub struct QueryTarget {
    pub(crate) service: ServiceId,
    pub(crate) model: String,
    pub(crate) render_markdown: bool,
    pub(crate) status_line: String,
    pub(crate) client: Box<dyn LlmClient>,
}

impl std::fmt::Debug for QueryTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryTarget")
            .field("service", &self.service)
            .field("model", &self.model)
            .field("render_markdown", &self.render_markdown)
            .field("status_line", &self.status_line)
            .finish_non_exhaustive()
    }
}

impl QueryTarget {
    pub fn service(&self) -> ServiceId {
        self.service
    }

    /// Model name as shown to the user (Gemini ids shortened).
    pub fn display_model(&self) -> &str {
        match self.service {
            ServiceId::Gemini => short_model_name(&self.model),
            ServiceId::Ollama => &self.model,
        }
    }

    pub fn render_markdown(&self) -> bool {
        self.render_markdown
    }
}

/// Resolves the active service into a ready-to-run target. Every missing
/// piece maps to its own error so the caller's message names the fix.
pub fn resolve_target(registry: &ServiceRegistry) -> Result<QueryTarget, ConfigError> {
    let id = registry.active().ok_or(ConfigError::NoActiveService)?;
    let config = registry.get(id).ok_or(ConfigError::ServiceNotConfigured(id))?;

    match config {
        ServiceConfig::Ollama(ollama) => {
            let model = ollama.model.clone().ok_or(ConfigError::NoModelSelected(id))?;
            let status_line = format!(
                "Using active LLM service: Ollama. Sending query to {} (Model: {})...",
                ollama.server_address, model
            );
            Ok(QueryTarget {
                service: id,
                client: Box::new(OllamaClient::new(ollama.server_address.clone())),
                model,
                render_markdown: ollama.render_markdown,
                status_line,
            })
        }
        ServiceConfig::Gemini(gemini) => {
            let model = gemini.model.clone().ok_or(ConfigError::NoModelSelected(id))?;
            let entry = gemini.keys.active().ok_or(ConfigError::NoActiveKey)?;
            let status_line = format!(
                "Using active LLM service: Gemini (API Key: '{}'). Sending query (Model: {})...",
                entry.nickname,
                short_model_name(&model)
            );
            Ok(QueryTarget {
                service: id,
                client: Box::new(GeminiClient::new(entry.key.clone())),
                model,
                render_markdown: gemini.render_markdown,
                status_line,
            })
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum QueryOutcome {
    Answer(String),
    Interrupted,
}

/// Runs one conversation payload against the target, racing the request
/// against a cancellation future (Ctrl-C in production). The progress
/// indicator is torn down before anything else is printed.
pub async fn run<C>(target: &QueryTarget, messages: Vec<Message>, cancel: C) -> Result<QueryOutcome>
where
    C: Future<Output = io::Result<()>>,
{
    println!("{}", target.status_line.blue());
    let progress = ProgressIndicator::start(target.status_line.chars().count());

    let result = tokio::select! {
        response = target.client.chat(&target.model, messages) => Some(response),
        _ = cancel => None,
    };
    progress.finish().await;

    match result {
        Some(Ok(answer)) => {
            info!("Received response from {}", target.service);
            Ok(QueryOutcome::Answer(answer))
        }
        Some(Err(e)) => Err(e),
        None => {
            warn!("Query to {} cancelled before the response arrived", target.service);
            Ok(QueryOutcome::Interrupted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeminiConfig, KeyRing, OllamaConfig};
    use async_trait::async_trait;
    use std::future::{pending, ready};
    use std::time::Duration;

    struct InstantClient(&'static str);

    #[async_trait]
    impl LlmClient for InstantClient {
        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn chat(&self, _model: &str, _messages: Vec<Message>) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn chat(&self, _model: &str, _messages: Vec<Message>) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".to_string())
        }
    }

    fn target_with(client: Box<dyn LlmClient>) -> QueryTarget {
        QueryTarget {
            service: ServiceId::Ollama,
            model: "llama3".to_string(),
            render_markdown: true,
            status_line: "Using active LLM service: Ollama. Sending query...".to_string(),
            client,
        }
    }

    fn registry_with_ollama(model: Option<&str>) -> ServiceRegistry {
        let mut registry = ServiceRegistry::default();
        registry
            .upsert(
                ServiceId::Ollama,
                ServiceConfig::Ollama(OllamaConfig {
                    server_address: "http://localhost:11434".to_string(),
                    model: model.map(str::to_string),
                    render_markdown: false,
                }),
            )
            .unwrap();
        registry.set_active(ServiceId::Ollama).unwrap();
        registry
    }

    #[test]
    fn resolve_fails_without_an_active_service() {
        let registry = ServiceRegistry::default();
        let err = resolve_target(&registry).unwrap_err();
        assert!(matches!(err, ConfigError::NoActiveService));
    }

    #[test]
    fn resolve_fails_without_a_model() {
        let registry = registry_with_ollama(None);
        let err = resolve_target(&registry).unwrap_err();
        assert!(matches!(err, ConfigError::NoModelSelected(ServiceId::Ollama)));
    }

    #[test]
    fn resolve_fails_without_an_active_gemini_key() {
        let mut registry = ServiceRegistry::default();
        let mut keys = KeyRing::default();
        keys.add("work", "AIzaSyTestKey").unwrap();
        registry
            .upsert(
                ServiceId::Gemini,
                ServiceConfig::Gemini(GeminiConfig {
                    keys,
                    model: Some("models/gemini-pro".to_string()),
                    render_markdown: true,
                }),
            )
            .unwrap();
        registry.set_active(ServiceId::Gemini).unwrap();

        let err = resolve_target(&registry).unwrap_err();
        assert!(matches!(err, ConfigError::NoActiveKey));
    }

    #[test]
    fn resolve_builds_the_ollama_status_line() {
        let registry = registry_with_ollama(Some("mistral"));
        let target = resolve_target(&registry).unwrap();
        assert_eq!(
            target.status_line,
            "Using active LLM service: Ollama. Sending query to http://localhost:11434 (Model: mistral)..."
        );
        assert!(!target.render_markdown());
        assert_eq!(target.display_model(), "mistral");
    }

    #[test]
    fn gemini_display_model_is_shortened() {
        let target = QueryTarget {
            service: ServiceId::Gemini,
            model: "models/gemini-1.5-pro".to_string(),
            render_markdown: true,
            status_line: String::new(),
            client: Box::new(InstantClient("unused")),
        };
        assert_eq!(target.display_model(), "gemini-1.5-pro");
    }

    #[tokio::test]
    async fn a_response_wins_the_race() {
        let target = target_with(Box::new(InstantClient("hello")));
        let outcome = run(&target, vec![Message::user("hi")], pending())
            .await
            .unwrap();
        assert_eq!(outcome, QueryOutcome::Answer("hello".to_string()));
    }

    #[tokio::test]
    async fn cancellation_wins_the_race() {
        let target = target_with(Box::new(SlowClient));
        let outcome = run(&target, vec![Message::user("hi")], ready(Ok(())))
            .await
            .unwrap();
        assert_eq!(outcome, QueryOutcome::Interrupted);
    }
}
