//! Errors the interpreter raises instead of answering.
//!
//! Unparseable replies, missing amounts and collaborator outages are not
//! errors here: they become `error` turn responses. `ChatError` is for turns
//! refused outright and for poisoned internal locks.

use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("interpreter is disabled")]
    Disabled,
    #[error("empty message")]
    EmptyMessage,
    #[error("message longer than {0} characters")]
    MessageTooLong(usize),
    #[error("{what} lock poisoned: {detail}")]
    LockPoisoned { what: &'static str, detail: String },
}

impl ChatError {
    pub(crate) fn poisoned(what: &'static str, err: impl fmt::Display) -> Self {
        ChatError::LockPoisoned {
            what,
            detail: err.to_string(),
        }
    }
}
