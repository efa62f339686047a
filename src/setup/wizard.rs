use anyhow::Result;
use colored::Colorize;
use tracing::debug;

use crate::config::{
    ConfigStore, GeminiConfig, KeyRing, OllamaConfig, ServiceConfig, ServiceId, ServiceRegistry,
};
use crate::llm::{
    short_model_name, GeminiClient, LlmClient, OllamaClient, DEFAULT_OLLAMA_PORT,
    GEMINI_API_KEYS_URL,
};
use crate::setup::prompt::{confirm, parse_index, Prompter};

/// Screens of the settings wizard. CLI flags enter at different screens;
/// a leaf returns to `MainMenu` when the wizard was started there and
/// exits otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WizardScreen {
    MainMenu,
    ServiceMenu,
    ServiceSelect,
    Configure(ServiceId),
    SwitchService,
    KeyManage,
    ModelChange,
    ShowConfig,
    DeleteConfig,
    Exit,
}

/// Interactive configuration flows. Borrows the registry and store from
/// the caller; every completed unit of work saves the document exactly
/// once, and aborted flows leave both untouched.
pub struct SetupWizard<'a, P: Prompter> {
    store: &'a ConfigStore,
    registry: &'a mut ServiceRegistry,
    prompter: &'a mut P,
}

impl<'a, P: Prompter> SetupWizard<'a, P> {
    pub fn new(store: &'a ConfigStore, registry: &'a mut ServiceRegistry, prompter: &'a mut P) -> Self {
        Self {
            store,
            registry,
            prompter,
        }
    }

    pub async fn run(&mut self, start: WizardScreen) -> Result<()> {
        let menu_mode = start == WizardScreen::MainMenu;

        if self.registry.is_empty() && start != WizardScreen::DeleteConfig {
            println!("{}", "\n--- Initial Configuration ---".green());
            println!(
                "{}",
                "No services are configured yet. Let's set up your first one.".yellow()
            );
            if !self.select_and_configure().await? {
                println!(
                    "{}",
                    "Initial setup was not completed. At least one service must be configured.".yellow()
                );
                return Ok(());
            }
            if menu_mode {
                println!("{}", "\nInitial setup complete. Entering the settings menu...".blue());
            }
        }

        let mut screen = start;
        loop {
            screen = match screen {
                WizardScreen::MainMenu => self.main_menu()?,
                WizardScreen::ServiceMenu => {
                    self.service_menu().await?;
                    self.next(menu_mode)
                }
                WizardScreen::ServiceSelect => match self.select_service()? {
                    Some(id) => WizardScreen::Configure(id),
                    None => self.next(menu_mode),
                },
                WizardScreen::Configure(id) => {
                    self.configure_service(id).await?;
                    self.next(menu_mode)
                }
                WizardScreen::SwitchService => {
                    self.switch_service()?;
                    self.next(menu_mode)
                }
                WizardScreen::KeyManage => {
                    self.manage_keys().await?;
                    self.next(menu_mode)
                }
                WizardScreen::ModelChange => {
                    self.change_model().await?;
                    self.next(menu_mode)
                }
                WizardScreen::ShowConfig => {
                    self.show_config();
                    self.next(menu_mode)
                }
                WizardScreen::DeleteConfig => {
                    if self.delete_config()? {
                        WizardScreen::Exit
                    } else {
                        self.next(menu_mode)
                    }
                }
                WizardScreen::Exit => break,
            };
        }
        Ok(())
    }

    fn next(&self, menu_mode: bool) -> WizardScreen {
        if menu_mode {
            WizardScreen::MainMenu
        } else {
            WizardScreen::Exit
        }
    }

    fn main_menu(&mut self) -> Result<WizardScreen> {
        println!("\nSettings Menu:");
        let mut options: Vec<(&str, WizardScreen)> = vec![
            ("Manage LLM Services (Add/Reconfigure)", WizardScreen::ServiceSelect),
            ("Switch Active LLM Service", WizardScreen::SwitchService),
        ];
        if self.registry.get(ServiceId::Gemini).is_some() {
            options.push(("Manage Gemini API Keys", WizardScreen::KeyManage));
        }
        options.push(("Change Model for Active Service", WizardScreen::ModelChange));
        options.push(("View Active Configuration", WizardScreen::ShowConfig));
        options.push(("Delete Entire Configuration", WizardScreen::DeleteConfig));

        for (i, (text, _)) in options.iter().enumerate() {
            println!("  {}. {}", i + 1, text);
        }
        println!("  X. Exit Settings");

        let choice = self.prompter.ask("Enter your choice: ")?.to_lowercase();
        if choice == "x" {
            println!("{}", "Exiting settings.".blue());
            return Ok(WizardScreen::Exit);
        }
        match parse_index(&choice, options.len()) {
            Some(idx) => Ok(options[idx].1),
            None => {
                println!("{}", "Invalid choice. Please try again.".red());
                Ok(WizardScreen::MainMenu)
            }
        }
    }

    /// The configure-or-switch submenu behind -l.
    async fn service_menu(&mut self) -> Result<()> {
        println!("{}", "\n--- LLM Service Management ---".green());
        println!("  1. Configure/Reconfigure an LLM service");
        println!("  2. Switch the active LLM service");
        println!("  B. Back/Cancel");
        let choice = self.prompter.ask("Your choice: ")?.to_lowercase();
        match choice.as_str() {
            "1" => {
                self.select_and_configure().await?;
            }
            "2" => self.switch_service()?,
            "b" => {}
            _ => println!("{}", "Invalid choice.".red()),
        }
        Ok(())
    }

    async fn select_and_configure(&mut self) -> Result<bool> {
        match self.select_service()? {
            Some(id) => self.configure_service(id).await,
            None => Ok(false),
        }
    }

    fn select_service(&mut self) -> Result<Option<ServiceId>> {
        println!("{}", "\nWhich LLM service would you like to configure?".blue());
        for (i, id) in ServiceId::ALL.iter().enumerate() {
            let marker = if self.registry.get(*id).is_some() {
                " (already configured)"
            } else {
                ""
            };
            println!("  {}. {}{}", i + 1, id.display_name(), marker);
        }
        println!("  {}. Cancel / Back", ServiceId::ALL.len() + 1);

        loop {
            let choice = self.prompter.ask("Enter your choice (number): ")?;
            if let Some(idx) = parse_index(&choice, ServiceId::ALL.len() + 1) {
                if idx == ServiceId::ALL.len() {
                    return Ok(None);
                }
                return Ok(Some(ServiceId::ALL[idx]));
            }
            println!("{}", "Invalid choice. Please select a number from the list.".red());
        }
    }

    /// Collects a full configuration for the service, then commits and
    /// activates it. Returns false when the flow was cancelled.
    async fn configure_service(&mut self, id: ServiceId) -> Result<bool> {
        let collected = match id {
            ServiceId::Ollama => self.configure_ollama().await?,
            ServiceId::Gemini => self.configure_gemini().await?,
        };
        match collected {
            Some(config) => {
                self.commit_service(id, config)?;
                Ok(true)
            }
            None => {
                println!(
                    "{}",
                    format!("{} setup was not completed or was cancelled.", id.display_name()).yellow()
                );
                Ok(false)
            }
        }
    }

    /// Stores a collected config, makes its service active, and saves.
    /// Announces "no changes" instead of rewriting an identical document.
    fn commit_service(&mut self, id: ServiceId, config: ServiceConfig) -> Result<()> {
        let config_changed = self.registry.get(id) != Some(&config);
        self.registry.upsert(id, config)?;

        let activation_changed = self.registry.active() != Some(id);
        if activation_changed {
            self.registry.set_active(id)?;
            println!(
                "{}",
                format!("\nSet {} as the active LLM service.", id.display_name()).blue()
            );
        }

        if config_changed || activation_changed {
            self.persist()?;
        } else {
            println!(
                "{}",
                format!("No changes made to the {} configuration.", id.display_name()).yellow()
            );
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(&self.registry.document())?;
        println!(
            "{}",
            format!("Configuration saved to {}", self.store.path().display()).green()
        );
        Ok(())
    }

    async fn configure_ollama(&mut self) -> Result<Option<ServiceConfig>> {
        println!("{}", "\n--- Ollama Service Setup ---".green());
        let existing = match self.registry.get(ServiceId::Ollama) {
            Some(ServiceConfig::Ollama(config)) => Some(config.clone()),
            _ => None,
        };
        let current_address = existing.as_ref().map(|c| c.server_address.clone());

        let (server_address, models) = loop {
            let address = self.ask_server_address(current_address.as_deref())?;
            println!("{}", format!("Attempting to fetch models from {address}...").blue());
            let client = OllamaClient::new(address.clone());
            match client.list_models().await {
                Ok(models) if models.is_empty() => {
                    println!(
                        "{}",
                        format!("No models found at {address}. Ensure models are installed on the server.").yellow()
                    );
                    if !confirm(self.prompter, "Try again with a different address? (Y/n): ")? {
                        return Ok(None);
                    }
                }
                Ok(models) => break (address, models),
                Err(e) => {
                    println!("{}", format!("{e:#}").red());
                    if !confirm(
                        self.prompter,
                        "Failed to connect or fetch models. Try again with a different address? (Y/n): ",
                    )? {
                        return Ok(None);
                    }
                }
            }
        };

        println!("{}", "\nAvailable Ollama Models:".green());
        let current_model = existing.and_then(|c| c.model);
        let Some(model) = self.pick_model(ServiceId::Ollama, &models, current_model.as_deref())? else {
            return Ok(None);
        };

        println!("{}", format!("Ollama service configured with model: {model}").green());
        Ok(Some(ServiceConfig::Ollama(OllamaConfig {
            server_address,
            model: Some(model),
            render_markdown: true,
        })))
    }

    /// Prompts for the Ollama server address: empty input keeps the
    /// current value, a missing scheme gets `http://`, a missing port
    /// offers the default, and the result must parse as a URL.
    fn ask_server_address(&mut self, current: Option<&str>) -> Result<String> {
        loop {
            let default_hint = current.map(|c| format!(" (current: {c})")).unwrap_or_default();
            let question =
                format!("Enter Ollama server address (e.g., localhost or 192.168.1.100){default_hint}: ");
            let mut input = self.prompter.ask(&question)?;
            if input.is_empty() {
                match current {
                    Some(c) => input = c.to_string(),
                    None => {
                        println!("{}", "Server address cannot be empty. Please try again.".red());
                        continue;
                    }
                }
            }

            let mut address = if input.starts_with("http://") || input.starts_with("https://") {
                input
            } else {
                format!("http://{input}")
            };
            let url = match reqwest::Url::parse(&address) {
                Ok(url) => url,
                Err(e) => {
                    println!("{}", format!("'{address}' is not a valid URL: {e}").red());
                    continue;
                }
            };

            if url.port().is_none() {
                let use_default = confirm(
                    self.prompter,
                    &format!("No port specified for '{address}'. Use default port {DEFAULT_OLLAMA_PORT}? (Y/n): "),
                )?;
                if !use_default {
                    println!("{}", "Please re-enter the server address including the port.".yellow());
                    continue;
                }
                address = format!("{}:{DEFAULT_OLLAMA_PORT}", address.trim_end_matches('/'));
                if reqwest::Url::parse(&address).is_err() {
                    println!("{}", format!("'{address}' is not a valid URL.").red());
                    continue;
                }
            }
            return Ok(address);
        }
    }

    async fn configure_gemini(&mut self) -> Result<Option<ServiceConfig>> {
        println!("{}", "\n--- Gemini Service Setup ---".green());
        println!("{}", "You'll need a Gemini API key.".yellow());
        println!(
            "{}",
            format!("You can obtain one from Google AI Studio: {GEMINI_API_KEYS_URL}").blue()
        );

        let mut config = match self.registry.get(ServiceId::Gemini) {
            Some(ServiceConfig::Gemini(config)) => config.clone(),
            _ => GeminiConfig::default(),
        };

        if !self.key_menu(&mut config.keys)? {
            println!(
                "{}",
                "No active Gemini API key was selected. Cannot proceed with model selection.".yellow()
            );
            return Ok(None);
        }
        let Some(entry) = config.keys.active() else {
            return Ok(None);
        };
        let nickname = entry.nickname.clone();
        let client = GeminiClient::new(entry.key.clone());

        println!(
            "{}",
            format!("\nFetching models using the active API key: '{nickname}'").blue()
        );
        let models = loop {
            match client.list_models().await {
                Ok(models) if models.is_empty() => {
                    println!(
                        "{}",
                        format!("No suitable models were found for API key '{nickname}'.").yellow()
                    );
                    return Ok(None);
                }
                Ok(models) => break models,
                Err(e) => {
                    println!("{}", format!("{e:#}").red());
                    if !confirm(
                        self.prompter,
                        "Failed to fetch Gemini models. Check the API key and connection. Try again? (Y/n): ",
                    )? {
                        return Ok(None);
                    }
                }
            }
        };

        println!("{}", "\nAvailable Gemini Models:".green());
        let current_model = config.model.clone();
        let Some(model) = self.pick_model(ServiceId::Gemini, &models, current_model.as_deref())? else {
            return Ok(None);
        };

        println!(
            "{}",
            format!("Gemini service configured with model: {}", short_model_name(&model)).green()
        );
        config.model = Some(model);
        config.render_markdown = true;
        Ok(Some(ServiceConfig::Gemini(config)))
    }

    /// Numbered model selection. Empty input keeps the current model when
    /// it is still offered; 'c' cancels.
    fn pick_model(
        &mut self,
        id: ServiceId,
        models: &[String],
        current: Option<&str>,
    ) -> Result<Option<String>> {
        for (i, name) in models.iter().enumerate() {
            let marker = if Some(name.as_str()) == current {
                " (current default)"
            } else {
                ""
            };
            match id {
                ServiceId::Gemini => println!(
                    "  {}. {} (Full ID: {}){}",
                    i + 1,
                    short_model_name(name),
                    name,
                    marker
                ),
                ServiceId::Ollama => println!("  {}. {}{}", i + 1, name, marker),
            }
        }

        let retained = current.filter(|c| models.iter().any(|m| m == c));
        let default_hint = retained
            .map(|c| format!(" (Enter keeps: {})", display_model_name(id, c)))
            .unwrap_or_default();

        loop {
            let question = format!(
                "Enter the number of the model to use (1-{}){default_hint}, or 'c' to cancel: ",
                models.len()
            );
            let choice = self.prompter.ask(&question)?;
            if choice.to_lowercase() == "c" {
                println!("{}", "Model selection cancelled.".yellow());
                return Ok(None);
            }
            if choice.is_empty() {
                if let Some(kept) = retained {
                    println!(
                        "{}",
                        format!("Keeping current default model: {}", display_model_name(id, kept)).blue()
                    );
                    return Ok(Some(kept.to_string()));
                }
            } else if let Some(idx) = parse_index(&choice, models.len()) {
                return Ok(Some(models[idx].clone()));
            }
            println!("{}", "Invalid model number. Please enter a number from the list.".red());
        }
    }

    /// Key management loop over the given ring. Callers hand in a scratch
    /// copy and commit afterwards. Returns true when an active key is set
    /// on exit.
    fn key_menu(&mut self, ring: &mut KeyRing) -> Result<bool> {
        loop {
            println!("{}", "\n--- Gemini API Key Management ---".blue());
            if ring.is_empty() {
                println!("{}", "No Gemini API keys configured yet.".yellow());
            } else {
                println!("{}", "Configured Gemini API keys:".yellow());
                let width = ring
                    .entries()
                    .iter()
                    .map(|e| e.nickname.chars().count())
                    .max()
                    .unwrap_or(0);
                for (i, entry) in ring.entries().iter().enumerate() {
                    let marker = if Some(entry.nickname.as_str()) == ring.active_nickname() {
                        " (active)"
                    } else {
                        ""
                    };
                    println!(
                        "  {}. {:<width$} - Key: {}{}",
                        i + 1,
                        entry.nickname,
                        entry.masked_key(),
                        marker,
                        width = width
                    );
                }
            }

            println!("\nOptions:");
            println!("  1. Add a new API key");
            if !ring.is_empty() {
                println!("  2. Set an API key as active");
                println!("  3. Remove an API key");
            }
            if ring.active().is_some() {
                println!("  C. Continue with the active key");
            }
            println!("  X. Cancel / Exit key management");

            let choice = self.prompter.ask("Enter your choice: ")?.to_lowercase();
            match choice.as_str() {
                "1" => self.add_key(ring)?,
                "2" if !ring.is_empty() => self.activate_key(ring)?,
                "3" if !ring.is_empty() => self.remove_key(ring)?,
                "c" if ring.active().is_some() => return Ok(true),
                "x" => {
                    println!("{}", "Exiting key management.".yellow());
                    return Ok(ring.active().is_some());
                }
                _ => println!("{}", "Invalid choice. Please try again.".red()),
            }
        }
    }

    fn add_key(&mut self, ring: &mut KeyRing) -> Result<()> {
        let nickname = loop {
            let nickname = self.prompter.ask("Enter a unique nickname for this API key: ")?;
            if nickname.is_empty() {
                println!("{}", "Nickname cannot be empty.".red());
            } else if ring.find(&nickname).is_some() {
                println!(
                    "{}",
                    format!("Nickname '{nickname}' already exists. Please choose another.").red()
                );
            } else {
                break nickname;
            }
        };

        let key = self.prompter.ask("Enter the new Gemini API key: ")?;
        if key.is_empty() {
            println!("{}", "API key value cannot be empty. Aborting add.".red());
            return Ok(());
        }
        ring.add(nickname.clone(), key)?;
        println!("{}", format!("API key '{nickname}' added.").green());

        if confirm(self.prompter, &format!("Make '{nickname}' the active API key? (Y/n): "))? {
            ring.set_active(&nickname)?;
            println!("{}", format!("'{nickname}' is now the active API key.").blue());
        }
        Ok(())
    }

    fn activate_key(&mut self, ring: &mut KeyRing) -> Result<()> {
        println!("{}", "Select an API key to set as active:".yellow());
        for (i, entry) in ring.entries().iter().enumerate() {
            println!("  {}. {}", i + 1, entry.nickname);
        }
        let choice = self.prompter.ask("Enter the number of the key to activate: ")?;
        match parse_index(&choice, ring.len()) {
            Some(idx) => {
                let nickname = ring.entries()[idx].nickname.clone();
                ring.set_active(&nickname)?;
                println!("{}", format!("API key '{nickname}' is now active.").green());
            }
            None => println!("{}", "Invalid selection.".red()),
        }
        Ok(())
    }

    fn remove_key(&mut self, ring: &mut KeyRing) -> Result<()> {
        println!("{}", "Select an API key to remove:".yellow());
        for (i, entry) in ring.entries().iter().enumerate() {
            println!("  {}. {}", i + 1, entry.nickname);
        }
        println!("  {}. Cancel removal", ring.len() + 1);

        let choice = self.prompter.ask("Enter the number of the key to remove: ")?;
        match parse_index(&choice, ring.len() + 1) {
            Some(idx) if idx == ring.len() => {
                println!("{}", "Removal cancelled.".yellow());
            }
            Some(idx) => {
                let nickname = ring.entries()[idx].nickname.clone();
                let was_active = ring.active_nickname() == Some(nickname.as_str());
                ring.remove(&nickname)?;
                println!("{}", format!("API key '{nickname}' has been removed.").green());

                if ring.len() == 1 {
                    let sole = ring.entries()[0].nickname.clone();
                    if ring.active_nickname() != Some(sole.as_str()) {
                        ring.set_active(&sole)?;
                        println!(
                            "{}",
                            format!("'{sole}' is now the active API key as the only one remaining.").blue()
                        );
                    }
                } else if ring.is_empty() {
                    println!("{}", "All API keys have been removed. No active key is set.".yellow());
                } else if was_active {
                    println!(
                        "{}",
                        format!(
                            "The active API key ('{nickname}') was removed. Please set a new active key."
                        )
                        .yellow()
                    );
                }
            }
            None => println!("{}", "Invalid selection for removal.".red()),
        }
        Ok(())
    }

    /// Standalone key management behind --set-key: scratch copy, one save,
    /// only when something changed.
    async fn manage_keys(&mut self) -> Result<()> {
        let before = match self.registry.get(ServiceId::Gemini) {
            Some(ServiceConfig::Gemini(config)) => config.clone(),
            _ => {
                println!(
                    "{}",
                    "The Gemini service is not configured yet; keys belong to it.".yellow()
                );
                if confirm(self.prompter, "Configure the Gemini service now? (Y/n): ")? {
                    self.configure_service(ServiceId::Gemini).await?;
                }
                return Ok(());
            }
        };

        let mut scratch = before.clone();
        self.key_menu(&mut scratch.keys)?;

        if scratch != before {
            self.registry.upsert(ServiceId::Gemini, ServiceConfig::Gemini(scratch))?;
            self.persist()?;
        } else {
            println!("{}", "No changes made to Gemini API keys.".yellow());
        }
        Ok(())
    }

    fn switch_service(&mut self) -> Result<()> {
        let services = self.registry.ids();
        if services.is_empty() {
            println!("{}", "No LLM services are configured yet. Configure one first.".yellow());
            return Ok(());
        }

        println!("{}", "\n--- Switch Active LLM Service ---".green());
        let active = self.registry.active();
        for (i, id) in services.iter().enumerate() {
            let marker = if Some(*id) == active { " (currently active)" } else { "" };
            println!("  {}. {}{}", i + 1, id.display_name(), marker);
        }
        println!("  {}. Cancel / Back", services.len() + 1);

        let choice = self.prompter.ask("Select the service to make active (number): ")?;
        match parse_index(&choice, services.len() + 1) {
            Some(idx) if idx == services.len() => {
                println!("{}", "Switch cancelled.".yellow());
            }
            Some(idx) => {
                let chosen = services[idx];
                if active == Some(chosen) {
                    println!(
                        "{}",
                        format!("{} is already the active LLM service.", chosen.display_name()).yellow()
                    );
                } else {
                    self.registry.set_active(chosen)?;
                    println!(
                        "{}",
                        format!("{} is now the active LLM service.", chosen.display_name()).green()
                    );
                    self.persist()?;
                }
            }
            None => println!("{}", "Invalid selection.".red()),
        }
        Ok(())
    }

    async fn change_model(&mut self) -> Result<()> {
        let Some(active) = self.registry.active() else {
            println!("{}", "No active LLM service. Select or configure one first.".yellow());
            return Ok(());
        };
        let Some(config) = self.registry.get(active).cloned() else {
            return Ok(());
        };

        println!(
            "{}",
            format!("\n--- Change Model for Active Service: {} ---", active.display_name()).green()
        );
        let fetched = match &config {
            ServiceConfig::Ollama(ollama) => {
                println!(
                    "{}",
                    format!("Attempting to fetch models from {}...", ollama.server_address).blue()
                );
                OllamaClient::new(ollama.server_address.clone()).list_models().await
            }
            ServiceConfig::Gemini(gemini) => {
                let Some(entry) = gemini.keys.active() else {
                    println!(
                        "{}",
                        "No active Gemini API key to fetch models with. Run --set-key first.".red()
                    );
                    return Ok(());
                };
                println!("{}", "Attempting to fetch Gemini models...".blue());
                GeminiClient::new(entry.key.clone()).list_models().await
            }
        };
        let models = match fetched {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => {
                println!(
                    "{}",
                    format!("No models found for {}. Cannot change the model.", active.display_name()).yellow()
                );
                return Ok(());
            }
            Err(e) => {
                println!("{}", format!("{e:#}").red());
                return Ok(());
            }
        };

        println!("{}", format!("\nAvailable Models for {}:", active.display_name()).green());
        let current = config.model().map(str::to_string);
        let Some(chosen) = self.pick_model(active, &models, current.as_deref())? else {
            return Ok(());
        };
        if current.as_deref() == Some(chosen.as_str()) {
            println!(
                "{}",
                format!(
                    "The model for {} is already {}.",
                    active.display_name(),
                    display_model_name(active, &chosen)
                )
                .yellow()
            );
            return Ok(());
        }

        let mut updated = config;
        updated.set_model(chosen.clone());
        self.registry.upsert(active, updated)?;
        println!(
            "{}",
            format!(
                "Default model for {} set to {}.",
                active.display_name(),
                display_model_name(active, &chosen)
            )
            .green()
        );
        self.persist()?;
        Ok(())
    }

    fn show_config(&self) {
        const LABEL_WIDTH: usize = 19;

        println!("{}", "\n--- Active Configuration ---".green());
        let Some(active) = self.registry.active() else {
            println!("{}", "No active LLM service is set in the configuration.".yellow());
            println!("{}", "Use --llm to select or configure an LLM service.".yellow());
            return;
        };
        println!(
            "{}",
            format!("{:<width$} {}", "Active LLM Service:", active.display_name(), width = LABEL_WIDTH).blue()
        );
        let Some(config) = self.registry.get(active) else {
            return;
        };

        match config.model() {
            Some(model) => {
                let full_id = if active == ServiceId::Gemini && model.contains('/') {
                    format!(" (Full ID: {model})")
                } else {
                    String::new()
                };
                println!(
                    "{}",
                    format!(
                        "{:<width$} {}{}",
                        "Active Model:",
                        display_model_name(active, model),
                        full_id,
                        width = LABEL_WIDTH
                    )
                    .blue()
                );
            }
            None => println!(
                "{}",
                format!("{:<width$} Not set", "Active Model:", width = LABEL_WIDTH).yellow()
            ),
        }

        match config {
            ServiceConfig::Ollama(ollama) => {
                println!(
                    "{}",
                    format!("{:<width$} {}", "Ollama Server:", ollama.server_address, width = LABEL_WIDTH).blue()
                );
            }
            ServiceConfig::Gemini(gemini) => match gemini.keys.active() {
                Some(entry) => {
                    println!(
                        "{}",
                        format!("{:<width$} {}", "API Key Nickname:", entry.nickname, width = LABEL_WIDTH).blue()
                    );
                    println!(
                        "{}",
                        format!("{:<width$} {}", "API Key Value:", entry.masked_key(), width = LABEL_WIDTH).blue()
                    );
                }
                None => println!(
                    "{}",
                    format!("{:<width$} Not set", "Active API Key:", width = LABEL_WIDTH).yellow()
                ),
            },
        }
        println!(
            "{}",
            format!(
                "{:<width$} {}",
                "Render Markdown:",
                if config.render_markdown() { "Enabled" } else { "Disabled" },
                width = LABEL_WIDTH
            )
            .blue()
        );
    }

    /// Returns true when the file was deleted (the wizard then exits).
    fn delete_config(&mut self) -> Result<bool> {
        println!("{}", "\n--- Delete Configuration File ---".yellow());
        if !self.store.exists() {
            println!(
                "{}",
                format!(
                    "Configuration file not found at {}. Nothing to delete.",
                    self.store.path().display()
                )
                .yellow()
            );
            return Ok(false);
        }

        let question = format!(
            "Are you sure you want to delete the configuration file at {}? (Y/n): ",
            self.store.path().display()
        );
        if confirm(self.prompter, &question)? {
            self.store.delete()?;
            debug!("Configuration file deleted by user request");
            println!(
                "{}",
                format!("Configuration file {} has been deleted.", self.store.path().display()).green()
            );
            Ok(true)
        } else {
            println!("{}", "Deletion cancelled by user.".yellow());
            Ok(false)
        }
    }
}

/// Gemini ids are displayed by their short name; everything else as-is.
fn display_model_name(id: ServiceId, name: &str) -> &str {
    match id {
        ServiceId::Gemini => short_model_name(name),
        ServiceId::Ollama => name,
    }
}
