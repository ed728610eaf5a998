//! In-memory collaborators.
//!
//! Back the CLI, the HTTP server and the test suites. Both can be switched
//! into a failing mode to exercise collaborator-failure paths.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use caderneta_core::error::CadernetaError;
use caderneta_core::types::{CatalogItem, Timestamp};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::{CatalogError, LedgerError};
use crate::ledger::{Dispatch, Ledger, LedgerEntry, LedgerReceipt};

// =============================================================================
// Ledger
// =============================================================================

/// Ledger that keeps entries in a vector.
pub struct InMemoryLedger {
    entries: Mutex<Vec<LedgerEntry>>,
    unavailable: AtomicBool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every following `record` call fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of every entry recorded so far, oldest first.
    pub fn recorded(&self) -> Vec<LedgerEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.recorded().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn record(&self, dispatch: &Dispatch) -> Result<LedgerReceipt, LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            warn!("Ledger dispatch refused: ledger marked unavailable");
            return Err(LedgerError::Unavailable(
                "in-memory ledger switched off".to_string(),
            ));
        }

        for intent in dispatch.entries() {
            if intent.total_amount < Decimal::ZERO {
                return Err(LedgerError::Rejected(format!(
                    "negative total {} for '{}'",
                    intent.total_amount,
                    intent.subject()
                )));
            }
        }

        let recorded_at = Timestamp::now();
        let new_entries: Vec<LedgerEntry> = dispatch
            .entries()
            .into_iter()
            .map(|intent| LedgerEntry {
                id: Uuid::new_v4(),
                intent: intent.clone(),
                recorded_at,
            })
            .collect();
        let entry_ids = new_entries.iter().map(|e| e.id).collect::<Vec<_>>();

        let mut entries = self.entries.lock().map_err(|e| {
            LedgerError::Storage(CadernetaError::Ledger(format!("Lock poisoned: {}", e)))
        })?;
        entries.extend(new_entries);

        info!(entries = entry_ids.len(), total = entries.len(), "Ledger dispatch recorded");
        Ok(LedgerReceipt {
            entry_ids,
            recorded_at,
        })
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Catalog held in memory, optionally loaded from a JSON array file.
pub struct InMemoryCatalog {
    items: Vec<CatalogItem>,
    unavailable: AtomicBool,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Parse a JSON array of catalog items.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<CatalogItem> = serde_json::from_str(json).map_err(CadernetaError::from)?;
        Ok(Self::new(items))
    }

    /// Load a JSON array of catalog items from disk.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(CadernetaError::from)?;
        let catalog = Self::from_json(&content)?;
        info!(
            items = catalog.items.len(),
            "Catalog loaded from {}",
            path.display()
        );
        Ok(catalog)
    }

    /// Make every following `snapshot` call fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn snapshot(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable(
                "in-memory catalog switched off".to_string(),
            ));
        }
        debug!(items = self.items.len(), "Catalog snapshot served");
        Ok(self.items.clone())
    }
}
