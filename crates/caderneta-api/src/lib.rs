//! Caderneta API crate: axum HTTP surface for the turn protocol.
//!
//! Exposes one conversation per path id. A turn is posted as `{text}` and
//! answered with the interpreter's turn response; deleting a conversation
//! drops whatever it was waiting on.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
