use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One conversation turn. This is also the Ollama wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request body for Ollama's /api/chat endpoint.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub message: Message,
}

/// Response body for Ollama's /api/tags endpoint.
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
pub struct ModelTag {
    pub name: String,
}

/// Request body for Gemini's generateContent endpoint.
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    pub role: String,
    pub parts: Vec<GeminiPart>,
}

impl GeminiContent {
    /// Gemini calls the assistant role "model".
    pub fn from_message(message: &Message) -> Self {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "model",
        };
        Self {
            role: role.to_string(),
            parts: vec![GeminiPart {
                text: message.content.clone(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: Option<GeminiContent>,
}

/// Response body for Gemini's model listing endpoint.
#[derive(Debug, Deserialize)]
pub struct GeminiModelsResponse {
    #[serde(default)]
    pub models: Vec<GeminiModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiModel {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        let message = Message::user("hello");
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hello"}"#);
    }

    #[test]
    fn chat_request_pins_stream_off() {
        let request = ChatRequest::new("llama3", vec![Message::user("hi")]);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""stream":false"#));
        assert!(json.contains(r#""model":"llama3""#));
    }

    #[test]
    fn assistant_turns_become_gemini_model_role() {
        let content = GeminiContent::from_message(&Message::assistant("answer"));
        assert_eq!(content.role, "model");
        assert_eq!(content.parts[0].text, "answer");

        let content = GeminiContent::from_message(&Message::user("question"));
        assert_eq!(content.role, "user");
    }

    #[test]
    fn gemini_response_parses_the_candidate_text() {
        let json = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "42"}]}}
            ]
        }"#;
        let response: GeminiResponse = serde_json::from_str(json).unwrap();
        let text = response.candidates[0]
            .content
            .as_ref()
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str());
        assert_eq!(text, Some("42"));
    }

    #[test]
    fn gemini_model_listing_parses_generation_methods() {
        let json = r#"{
            "models": [
                {"name": "models/gemini-pro", "supportedGenerationMethods": ["generateContent"]},
                {"name": "models/embedding-001"}
            ]
        }"#;
        let listing: GeminiModelsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(listing.models.len(), 2);
        assert_eq!(listing.models[0].supported_generation_methods, vec!["generateContent"]);
        assert!(listing.models[1].supported_generation_methods.is_empty());
    }
}
