//! Turn protocol types.

use caderneta_core::types::{ProductCandidate, Timestamp};
use serde::{Deserialize, Serialize};

/// One user turn as received.
#[derive(Debug, Clone)]
pub struct RawCommand {
    pub text: String,
    pub received_at: Timestamp,
}

impl RawCommand {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            received_at: Timestamp::now(),
        }
    }
}

/// Body of a turn request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    pub text: String,
}

/// How the client should present a turn response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Info,
    Success,
    Error,
    Question,
}

/// Terminal outcome of a dialogue, when the turn ended one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    Executed,
    Cancelled,
}

/// Structured hints for rich clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_matches: Option<Vec<ProductCandidate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_fee_input: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_fee_amount: Option<bool>,
}

/// What the interpreter says back for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TurnOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl TurnResponse {
    pub fn new(kind: ResponseType, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            data: None,
            outcome: None,
            suggestions: Vec::new(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ResponseType::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ResponseType::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ResponseType::Error, message)
    }

    pub fn question(message: impl Into<String>) -> Self {
        Self::new(ResponseType::Question, message)
    }

    pub fn with_data(mut self, data: ResponseData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_outcome(mut self, outcome: TurnOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn with_suggestions<S: Into<String>>(mut self, suggestions: impl IntoIterator<Item = S>) -> Self {
        self.suggestions = suggestions.into_iter().map(Into::into).collect();
        self
    }
}
