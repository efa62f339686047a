use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, info};

use crate::config::ServiceRegistry;
use crate::llm::Message;
use crate::query::{self, QueryOutcome, QueryTarget};
use crate::render;
use crate::session::memory::ConversationMemory;

fn history_path() -> String {
    std::env::var("HOME")
        .map(|home| format!("{}/.qlm/history.txt", home))
        .unwrap_or_else(|_| ".qlm-history.txt".to_string())
}

/// Interactive conversation loop against the active service. The
/// conversation window lives only as long as this call; line history is
/// the one thing persisted.
pub async fn run(registry: &ServiceRegistry) -> Result<()> {
    let target = query::resolve_target(registry)?;
    let mut memory = ConversationMemory::new();

    println!("Interactive mode - type 'exit' to quit");
    println!("Use arrow keys to navigate history, Ctrl+C or Ctrl+D to leave");
    println!(
        "{}",
        format!(
            "Conversing with {} (Model: {})",
            target.service().display_name(),
            target.display_model()
        )
        .blue()
    );

    let mut rl = DefaultEditor::new()?;
    let history_path = history_path();
    let _ = rl.load_history(&history_path);

    loop {
        let readline = rl.readline("\n> ");
        match readline {
            Ok(line) => {
                let prompt = line.trim();
                if prompt.is_empty() {
                    continue;
                }
                if prompt == "exit" || prompt == "quit" {
                    println!("Goodbye!");
                    break;
                }
                let _ = rl.add_history_entry(prompt);

                match ask(&target, &mut memory, prompt, tokio::signal::ctrl_c()).await {
                    Ok(QueryOutcome::Answer(text)) => {
                        render::print_response(target.service(), &text, target.render_markdown());
                        debug!("Window now holds {} exchange(s)", memory.exchanges());
                    }
                    Ok(QueryOutcome::Interrupted) => {
                        println!("{}", "\nQuery interrupted.".yellow());
                    }
                    Err(e) => {
                        eprintln!("\n{}", format!("Error: {e:#}").red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error reading input: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    info!("Interactive session ended");
    memory.clear();
    Ok(())
}

/// Sends one prompt with the retained conversation as context. The
/// exchange is recorded only after a successful response, so failed or
/// interrupted queries leave the window untouched.
pub async fn ask<C>(
    target: &QueryTarget,
    memory: &mut ConversationMemory,
    prompt: &str,
    cancel: C,
) -> Result<QueryOutcome>
where
    C: std::future::Future<Output = std::io::Result<()>>,
{
    let mut messages = memory.snapshot().to_vec();
    messages.push(Message::user(prompt));

    let outcome = query::run(target, messages, cancel).await?;
    if let QueryOutcome::Answer(text) = &outcome {
        memory.record_exchange(prompt, text.clone());
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigStore, Document, OllamaConfig, ServiceConfig, ServiceId};
    use anyhow::Result;
    use async_trait::async_trait;
    use crate::llm::LlmClient;
    use std::future::{pending, ready};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    struct CapturingClient {
        seen: Arc<Mutex<Vec<Vec<Message>>>>,
        reply: &'static str,
    }

    #[async_trait]
    impl LlmClient for CapturingClient {
        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        async fn chat(&self, _model: &str, messages: Vec<Message>) -> Result<String> {
            self.seen.lock().unwrap().push(messages);
            Ok(self.reply.to_string())
        }
    }

    struct HangingClient;

    #[async_trait]
    impl LlmClient for HangingClient {
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
            render_markdown: false,
            status_line: "testing".to_string(),
            client,
        }
    }

    #[tokio::test]
    async fn a_successful_exchange_is_recorded_and_context_is_sent() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let target = target_with(Box::new(CapturingClient {
            seen: seen.clone(),
            reply: "four",
        }));
        let mut memory = ConversationMemory::new();
        memory.record_exchange("what is 2+2?", "four-ish");

        let outcome = ask(&target, &mut memory, "are you sure?", pending())
            .await
            .unwrap();
        assert_eq!(outcome, QueryOutcome::Answer("four".to_string()));
        assert_eq!(memory.exchanges(), 2);

        let sent = seen.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].len(), 3);
        assert_eq!(sent[0][0].content, "what is 2+2?");
        assert_eq!(sent[0][2].content, "are you sure?");
    }

    #[tokio::test]
    async fn an_interrupted_query_leaves_memory_and_config_untouched() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        let mut doc = Document::default();
        doc.llm_services.insert(
            ServiceId::Ollama,
            ServiceConfig::Ollama(OllamaConfig {
                server_address: "http://localhost:11434".to_string(),
                model: Some("llama3".to_string()),
                render_markdown: true,
            }),
        );
        doc.active_llm_service = Some(ServiceId::Ollama);
        store.save(&doc).unwrap();
        let bytes_before = std::fs::read(store.path()).unwrap();

        let target = target_with(Box::new(HangingClient));
        let mut memory = ConversationMemory::new();

        let outcome = ask(&target, &mut memory, "never answered", ready(Ok(())))
            .await
            .unwrap();
        assert_eq!(outcome, QueryOutcome::Interrupted);
        assert!(memory.is_empty());
        assert_eq!(std::fs::read(store.path()).unwrap(), bytes_before);
    }
}
