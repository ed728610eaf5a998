//! External collaborators of the Caderneta interpreter.
//!
//! The interpreter never stores transactions or products itself. It reads a
//! catalog snapshot through [`Catalog`] and hands fully-resolved intents to a
//! [`Ledger`]. In-memory implementations back the CLI, the HTTP server and
//! the tests.

pub mod catalog;
pub mod error;
pub mod ledger;
pub mod memory;

pub use catalog::Catalog;
pub use error::{CatalogError, LedgerError};
pub use ledger::{Dispatch, Ledger, LedgerEntry, LedgerReceipt, FEE_CATEGORY};
pub use memory::{InMemoryCatalog, InMemoryLedger};
