/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes four top-level command modules:

- `chat`     - Interactive chat session
- `ask`      - One question, printed as JSON
- `serve`    - HTTP API server
- `sessions` - Session administration

These handlers stay small and delegate to the library components.
*/

use crate::agent::{Assistant, RecorderMetrics, StructuredResult};
use crate::config::Config;
use crate::error::Result;
use crate::memory::SessionMemory;
use std::sync::Arc;

// Special commands parser for the chat loop
pub mod special_commands;

fn build_assistant(config: &Config) -> Result<Assistant> {
    Ok(Assistant::from_config(config)?.with_metrics(Arc::new(RecorderMetrics)))
}

/// Pick a display string out of a product or store record
fn record_label(record: &serde_json::Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| record.to_string())
}

/// Render a structured result for the terminal
pub fn render_result(result: &StructuredResult) -> String {
    use colored::Colorize;

    let mut out = format!("\n{}\n", result.answer);

    if let Some(products) = result.products.as_deref().filter(|p| !p.is_empty()) {
        out.push_str(&format!("\n{}\n", "Products:".bold()));
        for product in products {
            let name = record_label(product, &["name", "title", "product_name"]);
            match product.get("price") {
                Some(price) => {
                    let price = price.as_str().map(str::to_string).unwrap_or_else(|| price.to_string());
                    out.push_str(&format!("  - {} ({})\n", name.cyan(), price));
                }
                None => out.push_str(&format!("  - {}\n", name.cyan())),
            }
        }
    }

    if let Some(stores) = result.stores.as_deref().filter(|s| !s.is_empty()) {
        out.push_str(&format!("\n{}\n", "Stores:".bold()));
        for store in stores {
            let name = record_label(store, &["name", "store_name"]);
            match store.get("address").and_then(|a| a.as_str()) {
                Some(address) => out.push_str(&format!("  - {}: {}\n", name.cyan(), address)),
                None => out.push_str(&format!("  - {}\n", name.cyan())),
            }
        }
    }

    if let Some(end) = &result.end {
        out.push_str(&format!("\n{}\n", end.green()));
    }

    out
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Builds the assistant from configuration and runs a readline-based
    //! loop that sends each line to `Assistant::chat`.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `session` - Session id to resume; a short new id is generated when `None`
    pub async fn run_chat(config: Config, session: Option<String>) -> Result<()> {
        use colored::Colorize;

        tracing::info!("Starting interactive chat mode");

        let assistant = build_assistant(&config)?;
        let session_id = session
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string()[..8].to_string());

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&assistant, &session_id);

        loop {
            let prompt = format!("{} ", "you>".cyan().bold());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::Clear) => {
                            assistant.clear_session(&session_id);
                            println!("{}", "Conversation history cleared.".green());
                            continue;
                        }
                        Ok(SpecialCommand::Stats) => {
                            print_stats(&assistant, &session_id);
                            continue;
                        }
                        Ok(SpecialCommand::Help) => {
                            print_help();
                            continue;
                        }
                        Ok(SpecialCommand::None) => {}
                        Err(e) => {
                            eprintln!("{}", e.to_string().yellow());
                            continue;
                        }
                    }

                    match assistant.chat(trimmed, &session_id).await {
                        Ok(result) => println!("{}", render_result(&result)),
                        Err(e) => eprintln!("Error: {}\n", e),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye! Your session id is {}", session_id.cyan());
        Ok(())
    }

    fn print_welcome_banner(assistant: &Assistant, session_id: &str) {
        use colored::Colorize;

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║              Retail Assistant - How can we help?             ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Session: {}", session_id.cyan());
        if assistant.memory().is_persistent() {
            println!("Memory:  {}", assistant.memory().backend_name().green());
        } else {
            println!(
                "Memory:  {}",
                "disabled (conversations are not remembered)".yellow()
            );
        }
        println!("Tools:   {}\n", assistant.tool_names().join(", "));
        println!("Type 'help' for available commands, 'quit' to leave\n");
    }

    fn print_stats(assistant: &Assistant, session_id: &str) {
        println!("\n--- Session {} ---", session_id);
        println!("Stored messages: {}", assistant.memory().get(session_id).len());
        println!("Active sessions: {}", assistant.active_session_count());
        println!("{}", "-".repeat(30));
    }
}

// One-shot question handler
pub mod ask {
    //! Answer a single message and print the structured result as JSON.

    use super::*;

    /// Ask one question
    ///
    /// # Errors
    ///
    /// Returns an error if the assistant cannot be built or the input is blank
    pub async fn run_ask(config: Config, session: String, message: String) -> Result<()> {
        let assistant = build_assistant(&config)?;
        let result = assistant.chat(&message, &session).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }
}

// HTTP server handler
pub mod serve {
    //! Run the HTTP API.

    use super::*;

    /// Serve the HTTP API on `bind`, or the configured address
    pub async fn run_serve(config: Config, bind: Option<String>) -> Result<()> {
        let address = bind.unwrap_or_else(|| config.server.bind.clone());
        let assistant = Arc::new(build_assistant(&config)?);
        crate::server::serve(assistant, &address).await
    }
}

// Session administration handler
pub mod sessions {
    //! Session administration without starting a model provider.

    use super::*;
    use crate::cli::SessionCommand;
    use colored::Colorize;

    /// Number of session ids shown by `sessions stats`
    const STATS_SAMPLE: usize = 10;

    /// Handle a session subcommand
    pub fn handle_sessions(config: &Config, command: SessionCommand) -> Result<()> {
        let memory = SessionMemory::connect(&config.memory);

        match command {
            SessionCommand::Clear { id } => {
                memory.clear(&id);
                println!("{}", format!("Cleared session {}", id).green());
            }
            SessionCommand::Stats => {
                let sessions = memory.list_active_sessions();
                println!("Memory backend:  {}", memory.backend_name());
                println!("Active sessions: {}", sessions.len());
                for id in sessions.iter().take(STATS_SAMPLE) {
                    println!("  {}", id.cyan());
                }
            }
        }

        Ok(())
    }
}
