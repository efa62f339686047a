use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error};

use super::types::{
    ChatRequest, ChatResponse, GeminiContent, GeminiModel, GeminiModelsResponse, GeminiRequest,
    GeminiResponse, Message, TagsResponse,
};

pub const DEFAULT_OLLAMA_PORT: u16 = 11434;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_API_KEYS_URL: &str = "https://aistudio.google.com/app/apikey";
pub const GEMINI_USAGE_URL: &str = "https://aistudio.google.com/app/usage";

const QUERY_TIMEOUT: Duration = Duration::from_secs(120);
const OLLAMA_TAGS_TIMEOUT: Duration = Duration::from_secs(10);
const GEMINI_MODELS_TIMEOUT: Duration = Duration::from_secs(20);

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Names of the models this backend can serve.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Sends a conversation and returns the reply text.
    async fn chat(&self, model: &str, messages: Vec<Message>) -> Result<String>;
}

pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        debug!("Fetching Ollama models from {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(OLLAMA_TAGS_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("could not connect to {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            error!("Ollama API error {}: {}", status, error_text);
            anyhow::bail!("Ollama API error: {} - {}", status, error_text);
        }

        let tags: TagsResponse = response.json().await.with_context(|| {
            format!(
                "could not parse the model list from {}; is this an Ollama server?",
                self.base_url
            )
        })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn chat(&self, model: &str, messages: Vec<Message>) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest::new(model, messages);
        debug!("Sending chat request to Ollama model {}", request.model);

        let response = self
            .client
            .post(&url)
            .timeout(QUERY_TIMEOUT)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("could not reach {}", self.base_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            error!("Ollama API error {}: {}", status, error_text);
            anyhow::bail!("Ollama API error: {} - {}", status, error_text);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("could not parse the Ollama chat response")?;
        Ok(chat.message.content.trim().to_string())
    }
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    // The key rides in the query string; these URLs must never be logged.
    fn models_url(&self) -> String {
        format!("{}/models?key={}", self.base_url, self.api_key)
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url,
            qualified_model_name(model),
            self.api_key
        )
    }

    /// Verifies the key by listing models and points at the usage
    /// dashboard; Google exposes no quota endpoint.
    pub async fn quota_status(&self) -> Result<String> {
        let models = self.list_models().await?;
        Ok(format!(
            "API key is valid; {} generation-capable model(s) available.\nTo check your Gemini API usage, please visit:\n{}",
            models.len(),
            GEMINI_USAGE_URL
        ))
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn list_models(&self) -> Result<Vec<String>> {
        debug!("Fetching Gemini models");

        let response = self
            .client
            .get(self.models_url())
            .timeout(GEMINI_MODELS_TIMEOUT)
            .send()
            .await
            .context("could not connect to the Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            error!("Gemini API error {}: {}", status, error_text);
            anyhow::bail!("Gemini API error: {} - {}", status, error_text);
        }

        let listing: GeminiModelsResponse = response
            .json()
            .await
            .context("could not parse the Gemini model list")?;
        Ok(listing
            .models
            .into_iter()
            .filter(generation_capable)
            .map(|m| m.name)
            .collect())
    }

    async fn chat(&self, model: &str, messages: Vec<Message>) -> Result<String> {
        let request = GeminiRequest {
            contents: messages.iter().map(GeminiContent::from_message).collect(),
        };
        debug!("Sending chat request to Gemini model {}", model);

        let response = self
            .client
            .post(self.generate_url(model))
            .timeout(QUERY_TIMEOUT)
            .json(&request)
            .send()
            .await
            .context("could not reach the Gemini API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            error!("Gemini API error {}: {}", status, error_text);
            anyhow::bail!("Gemini API error: {} - {}", status, error_text);
        }

        let body: GeminiResponse = response
            .json()
            .await
            .context("could not parse the Gemini response")?;
        body.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.first())
            .map(|part| part.text.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("Gemini returned no response candidates"))
    }
}

/// Chat-capable models only: they must support content generation, and
/// the legacy chat/tts variants answer this endpoint with errors.
fn generation_capable(model: &GeminiModel) -> bool {
    let name = model.name.to_lowercase();
    let supported = model
        .supported_generation_methods
        .iter()
        .any(|method| method == "generateContent" || method == "generateAnswer");
    supported && !name.contains("chat") && !name.contains("tts")
}

/// Gemini model ids are fully qualified (`models/gemini-...`); accept the
/// bare name from older configs or hand edits.
pub fn qualified_model_name(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

/// Short display form of a Gemini model id.
pub fn short_model_name(model: &str) -> &str {
    model.rsplit('/').next().unwrap_or(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new("http://localhost:11434");
        assert_eq!(client.base_url, "http://localhost:11434");

        let client = GeminiClient::new("test_key");
        assert_eq!(client.base_url, GEMINI_API_BASE);
    }

    #[test]
    fn generate_url_qualifies_bare_model_names() {
        let client = GeminiClient::new("test_key");
        let url = client.generate_url("gemini-pro");
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent?key=test_key"
        );
        assert_eq!(url, client.generate_url("models/gemini-pro"));
    }

    #[test]
    fn models_url_carries_the_key() {
        let client = GeminiClient::new("test_key");
        assert_eq!(
            client.models_url(),
            "https://generativelanguage.googleapis.com/v1beta/models?key=test_key"
        );
    }

    #[test]
    fn model_name_shortening() {
        assert_eq!(short_model_name("models/gemini-1.5-pro"), "gemini-1.5-pro");
        assert_eq!(short_model_name("gemini-pro"), "gemini-pro");
        assert_eq!(qualified_model_name("gemini-pro"), "models/gemini-pro");
    }

    #[test]
    fn generation_capable_filters_by_method_and_name() {
        let usable = GeminiModel {
            name: "models/gemini-1.5-flash".to_string(),
            supported_generation_methods: vec!["generateContent".to_string()],
        };
        let embedding = GeminiModel {
            name: "models/embedding-001".to_string(),
            supported_generation_methods: vec!["embedContent".to_string()],
        };
        let legacy_chat = GeminiModel {
            name: "models/chat-bison-001".to_string(),
            supported_generation_methods: vec!["generateAnswer".to_string()],
        };
        let tts = GeminiModel {
            name: "models/gemini-tts".to_string(),
            supported_generation_methods: vec!["generateContent".to_string()],
        };
        assert!(generation_capable(&usable));
        assert!(!generation_capable(&embedding));
        assert!(!generation_capable(&legacy_chat));
        assert!(!generation_capable(&tts));
    }
}
