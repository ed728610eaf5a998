//! Caderneta application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Initialize tracing
//! 3. Load the product catalog and create the ledger
//! 4. Run the stdin REPL or the axum HTTP server

mod cli;
mod repl;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use caderneta_api::{routes, AppState};
use caderneta_chat::DialogueOrchestrator;
use caderneta_core::config::CadernetaConfig;
use caderneta_core::types::ConversationId;
use caderneta_ledger::{InMemoryCatalog, InMemoryLedger};

use cli::{CliArgs, Command};

/// Level resolution: --log-level > RUST_LOG > config file.
fn init_tracing(cli_level: Option<String>, config_level: &str) {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The catalog file, or an empty catalog when it is missing or unreadable.
fn load_catalog(path: &Path) -> InMemoryCatalog {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Catalog file not found, starting with an empty catalog");
        return InMemoryCatalog::default();
    }
    match InMemoryCatalog::from_json_file(path) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to load catalog, starting with an empty catalog");
            InMemoryCatalog::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config_exists = config_file.exists();
    let mut config = if config_exists {
        CadernetaConfig::load(&config_file)?
    } else {
        CadernetaConfig::default()
    };

    // Tracing.
    init_tracing(args.resolve_log_level(), &config.general.log_level);
    tracing::info!("Starting Caderneta v{}", env!("CARGO_PKG_VERSION"));
    if config_exists {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::info!(path = %config_file.display(), "No configuration file, using defaults");
    }

    // Collaborators.
    let catalog_path = args.resolve_catalog_path(&config.general.catalog_path);
    let catalog = Arc::new(load_catalog(&catalog_path));
    let ledger = Arc::new(InMemoryLedger::new());

    match args.resolve_command() {
        Command::Repl { conversation } => {
            let orchestrator =
                DialogueOrchestrator::new(config.chat.clone(), catalog, ledger.clone());
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            repl::run(
                &orchestrator,
                &ledger,
                &ConversationId::from(conversation),
                stdin,
                &mut stdout,
            )
            .await?;
            tracing::info!(entries = ledger.len(), "Session finished");
        }
        Command::Serve { .. } => {
            config.general.port = args.resolve_port(config.general.port);
            let state = AppState::new(config.clone(), catalog, ledger);
            if let Err(e) = routes::start_server(&config, state).await {
                tracing::error!(port = config.general.port, error = %e, "API server stopped");
                tracing::error!("Try: caderneta serve --port {}", config.general.port.saturating_add(1));
                return Err(e.into());
            }
        }
    }

    Ok(())
}
