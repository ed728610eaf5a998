//! Error types for the collaborators.

use caderneta_core::CadernetaError;

/// Errors from recording a dispatch in the ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger rejected entry: {0}")]
    Rejected(String),
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
    #[error("Storage error: {0}")]
    Storage(#[from] CadernetaError),
}

/// Errors from fetching the catalog snapshot.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
    #[error("Catalog load failed: {0}")]
    Load(#[from] CadernetaError),
}
