//! Catalog collaborator: read-only product snapshots.

use async_trait::async_trait;
use caderneta_core::types::CatalogItem;

use crate::error::CatalogError;

/// Source of the product catalog.
///
/// The interpreter asks for a fresh snapshot at the start of every sale
/// parse and never mutates what it receives.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn snapshot(&self) -> Result<Vec<CatalogItem>, CatalogError>;
}
