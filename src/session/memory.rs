use crate::llm::{Message, Role};

pub const MAX_EXCHANGES: usize = 10;

/// Sliding window over the conversation in interactive mode. Keeps the
/// most recent exchanges (a user turn plus the assistant reply) up to
/// `MAX_EXCHANGES`; evicts whole pairs from the front. Never persisted.
#[derive(Debug, Default)]
pub struct ConversationMemory {
    turns: Vec<Message>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one turn. Eviction only runs once an assistant turn closes
    /// the exchange, so a pending user turn is never split from its reply.
    pub fn append(&mut self, turn: Message) {
        let closes_exchange = turn.role == Role::Assistant;
        self.turns.push(turn);
        if closes_exchange {
            while self.turns.len() > MAX_EXCHANGES * 2 {
                self.turns.remove(0);
                if !self.turns.is_empty() {
                    self.turns.remove(0);
                }
            }
        }
    }

    /// Records a completed query/response pair.
    pub fn record_exchange(&mut self, query: impl Into<String>, response: impl Into<String>) {
        self.append(Message::user(query));
        self.append(Message::assistant(response));
    }

    /// Retained turns, oldest first.
    pub fn snapshot(&self) -> &[Message] {
        &self.turns
    }

    pub fn exchanges(&self) -> usize {
        self.turns.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
