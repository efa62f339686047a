mod config;
mod error;
mod llm;
mod progress;
mod query;
mod render;
mod session;
mod setup;

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing::{info, Level};

use config::{ConfigStore, ServiceConfig, ServiceId, ServiceRegistry};
use error::ConfigError;
use llm::{GeminiClient, Message};
use query::QueryOutcome;
use setup::{SetupWizard, StdinPrompter, WizardScreen};

#[derive(Parser)]
#[command(name = "qlm")]
#[command(version)]
#[command(about = "Query LLM services (Ollama, Gemini) from the command line", long_about = None)]
struct Cli {
    #[arg(short, long, num_args = 1.., value_name = "TEXT", help = "Send a one-shot query")]
    query: Option<Vec<String>>,

    #[arg(short, long, help = "Interactive conversation mode")]
    interactive: bool,

    #[arg(short, long, help = "Open the settings menu")]
    setup: bool,

    #[arg(short, long, help = "Configure or switch LLM services")]
    llm: bool,

    #[arg(short = 'j', long = "jump", help = "Jump back to the previously active LLM service")]
    jump: bool,

    #[arg(short = 'm', long = "model-change", help = "Change the model of the active service")]
    model_change: bool,

    #[arg(long, help = "Manage Gemini API keys")]
    set_key: bool,

    #[arg(long, help = "Show the active Gemini API key (full value)")]
    show_key: bool,

    #[arg(short = 'g', long = "gemini-quota", help = "Check the active Gemini API key and quota")]
    gemini_quota: bool,

    #[arg(long, help = "Display the active configuration")]
    show_config: bool,

    #[arg(short = 'd', long, help = "Delete the configuration file")]
    delete_config: bool,

    #[arg(long, help = "Enable debug logging")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    use tracing_subscriber::EnvFilter;

    // Filter out noisy rustyline debug logs even in verbose mode
    let filter = if cli.verbose {
        EnvFilter::new("qlm=debug,warn") // Our app DEBUG, others WARN
    } else {
        EnvFilter::new("qlm=info,warn") // Our app INFO, others WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(filter)
        .init();

    let store = ConfigStore::default();

    if cli.setup {
        return run_wizard(&store, WizardScreen::MainMenu).await;
    }
    if cli.llm {
        return run_wizard(&store, WizardScreen::ServiceMenu).await;
    }
    if cli.model_change {
        return run_wizard(&store, WizardScreen::ModelChange).await;
    }
    if cli.set_key {
        return run_wizard(&store, WizardScreen::KeyManage).await;
    }
    if cli.show_config {
        return run_wizard(&store, WizardScreen::ShowConfig).await;
    }
    if cli.delete_config {
        return run_wizard(&store, WizardScreen::DeleteConfig).await;
    }
    if cli.jump {
        return jump_to_previous(&store);
    }
    if cli.gemini_quota {
        return check_gemini_quota(&store).await;
    }
    if cli.show_key {
        return show_active_key(&store);
    }

    let registry = ServiceRegistry::from_document(store.load()?)?;

    if cli.interactive {
        return session::interactive::run(&registry).await;
    }

    match cli.query {
        Some(words) => {
            let prompt = words.join(" ");
            run_query(&registry, &prompt).await
        }
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

async fn run_wizard(store: &ConfigStore, start: WizardScreen) -> Result<()> {
    let mut registry = ServiceRegistry::from_document(store.load()?)?;
    let mut prompter = StdinPrompter;
    SetupWizard::new(store, &mut registry, &mut prompter)
        .run(start)
        .await
}

async fn run_query(registry: &ServiceRegistry, prompt: &str) -> Result<()> {
    let target = query::resolve_target(registry)?;
    let messages = vec![Message::user(prompt)];

    match query::run(&target, messages, tokio::signal::ctrl_c()).await? {
        QueryOutcome::Answer(answer) => {
            render::print_response(target.service(), &answer, target.render_markdown());
            Ok(())
        }
        QueryOutcome::Interrupted => {
            println!("{}", "\nProgram interrupted by user. Exiting gracefully.".yellow());
            Ok(())
        }
    }
}

/// Swaps back to the previously active service and persists the swap. A
/// stale previous reference is cleared on disk before the error surfaces.
fn jump_to_previous(store: &ConfigStore) -> Result<()> {
    if !store.exists() {
        bail!(
            "configuration not found at {}; run --setup first",
            store.path().display()
        );
    }
    let mut registry = ServiceRegistry::from_document(store.load()?)?;

    let before = registry.active();
    match registry.jump_to_previous() {
        Ok(target) => {
            if before == Some(target) {
                println!(
                    "{}",
                    format!("Already using '{}'. No jump performed.", target.display_name()).yellow()
                );
                return Ok(());
            }
            store.save(&registry.document())?;
            info!("Jumped from {:?} to {}", before, target);
            println!(
                "{}",
                format!("Jumped to LLM service: {}", target.display_name()).green()
            );
            Ok(())
        }
        Err(e @ ConfigError::ServiceNotConfigured(_)) => {
            store.save(&registry.document())?;
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// The only place the full secret is printed.
fn show_active_key(store: &ConfigStore) -> Result<()> {
    let registry = ServiceRegistry::from_document(store.load()?)?;
    let Some(ServiceConfig::Gemini(gemini)) = registry.get(ServiceId::Gemini) else {
        return Err(ConfigError::ServiceNotConfigured(ServiceId::Gemini).into());
    };
    let entry = gemini.keys.active().ok_or(ConfigError::NoActiveKey)?;
    println!(
        "{}",
        format!("Active Gemini API key nickname: {}", entry.nickname).blue()
    );
    println!("Key: {}", entry.key);
    Ok(())
}

async fn check_gemini_quota(store: &ConfigStore) -> Result<()> {
    let registry = ServiceRegistry::from_document(store.load()?)?;
    if registry.active() != Some(ServiceId::Gemini) {
        println!(
            "{}",
            "The active LLM service is not Gemini. Switch with --llm to check its quota.".yellow()
        );
        return Ok(());
    }
    let Some(ServiceConfig::Gemini(gemini)) = registry.get(ServiceId::Gemini) else {
        bail!("the active Gemini service has no configuration entry");
    };
    let Some(entry) = gemini.keys.active() else {
        return Err(ConfigError::NoActiveKey.into());
    };

    println!(
        "{}",
        format!(
            "Checking quota for API key '{}' ({})...",
            entry.nickname,
            entry.masked_key()
        )
        .blue()
    );
    let client = GeminiClient::new(entry.key.clone());
    let report = client.quota_status().await?;
    println!("{report}");
    Ok(())
}
