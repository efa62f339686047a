use thiserror::Error;

use crate::config::ServiceId;

/// Errors arising from the persisted configuration and the references
/// inside it. Messages are user-facing and name the flag that fixes the
/// problem.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("no active LLM service is set; run --setup or --llm to select one")]
    NoActiveService,

    #[error("no active Gemini API key is set; run --set-key to add or activate one")]
    NoActiveKey,

    #[error("no default model is configured for '{0}'; run --model-change or re-run --setup")]
    NoModelSelected(ServiceId),

    #[error("an API key named '{0}' already exists; pick another nickname")]
    DuplicateNickname(String),

    #[error("no API key named '{0}' is configured")]
    KeyNotFound(String),

    #[error("the '{0}' service is not configured; run --setup or --llm to configure it")]
    ServiceNotConfigured(ServiceId),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("no previously active LLM service is recorded; switch services at least once before jumping")]
    NoPreviousService,
}
