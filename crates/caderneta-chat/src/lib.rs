//! Conversational transaction interpreter.
//!
//! Turns free-form Portuguese sentences ("vendi 2 brincos de gota por 70",
//! "gastei 50 reais no mercado ontem") into resolved transactions. Tracks a
//! typed dialogue state per conversation and asks follow-up questions
//! (confirmation, product selection, card-machine fee) before handing the
//! result to the ledger.

pub mod catalog;
pub mod classifier;
pub mod context;
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod reply;
pub mod response;
pub mod text;
pub mod types;

pub use catalog::CatalogResolver;
pub use classifier::{Classification, IntentClassifier};
pub use context::{ContextStore, ConversationContext, DialogueState};
pub use error::ChatError;
pub use extractor::EntityExtractor;
pub use orchestrator::DialogueOrchestrator;
pub use reply::FeeAnswer;
pub use types::{RawCommand, ResponseData, ResponseType, TurnOutcome, TurnRequest, TurnResponse};
