pub mod interactive;
pub mod memory;

pub use memory::ConversationMemory;
