pub mod document;
pub mod keys;
pub mod registry;
pub mod store;

pub use document::{Document, GeminiConfig, OllamaConfig, ServiceConfig, ServiceId};
pub use keys::{ApiKeyEntry, KeyRing};
pub use registry::{ActiveSelection, ServiceRegistry};
pub use store::ConfigStore;
