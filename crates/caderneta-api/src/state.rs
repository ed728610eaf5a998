//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use caderneta_chat::DialogueOrchestrator;
use caderneta_core::config::CadernetaConfig;
use caderneta_ledger::{Catalog, Ledger};

/// Shared application state, cloned into every handler task.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, read-only once the server is up.
    pub config: Arc<CadernetaConfig>,
    /// The interpreter, holding every conversation's context.
    pub orchestrator: Arc<DialogueOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Build the orchestrator from the `chat` section of `config`.
    pub fn new(config: CadernetaConfig, catalog: Arc<dyn Catalog>, ledger: Arc<dyn Ledger>) -> Self {
        let orchestrator = DialogueOrchestrator::new(config.chat.clone(), catalog, ledger);
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
        }
    }
}
