//! Retail Assistant - conversational product, store and policy assistant
//!
#![doc = "Retail Assistant CLI"]
#![doc = "Main entry point for the retail assistant application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use retail_assistant::cli::{Cli, Commands};
use retail_assistant::commands;
use retail_assistant::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config = Config::load(&cli.config, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Chat { session } => {
            if let Some(s) = &session {
                tracing::debug!("Resuming session: {}", s);
            }
            commands::chat::run_chat(config, session).await
        }
        Commands::Ask { session, message } => {
            commands::ask::run_ask(config, session, message).await
        }
        Commands::Serve { bind } => {
            tracing::info!("Starting HTTP API");
            commands::serve::run_serve(config, bind).await
        }
        Commands::Sessions { command } => commands::sessions::handle_sessions(&config, command),
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins; otherwise `--verbose` selects debug output for this
/// crate. Logs go to stderr so `ask` output stays parseable.
fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "retail_assistant=debug"
    } else {
        "retail_assistant=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
