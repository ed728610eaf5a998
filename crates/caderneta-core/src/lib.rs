//! Shared foundation for Caderneta.
//!
//! Holds configuration loading, the top-level error type, and the domain
//! types (entities, candidates, pending intents) every other crate speaks.

pub mod config;
pub mod error;
pub mod types;

pub use config::CadernetaConfig;
pub use error::{CadernetaError, Result};
pub use types::*;
