pub mod client;
pub mod types;

pub use client::{
    short_model_name, GeminiClient, LlmClient, OllamaClient, DEFAULT_OLLAMA_PORT,
    GEMINI_API_KEYS_URL,
};
pub use types::{Message, Role};
