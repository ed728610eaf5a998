use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// The financial action a user wants to record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionAction {
    /// A sale of a catalog item or service. Also the fallback when no
    /// keyword signals otherwise.
    #[default]
    Sale,
    /// Money leaving the business.
    Expense,
    /// Money entering the business that is not a sale.
    Income,
}

impl TransactionAction {
    /// Portuguese noun used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionAction::Sale => "venda",
            TransactionAction::Expense => "despesa",
            TransactionAction::Income => "receita",
        }
    }
}

impl fmt::Display for TransactionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionAction::Sale => write!(f, "sale"),
            TransactionAction::Expense => write!(f, "expense"),
            TransactionAction::Income => write!(f, "income"),
        }
    }
}

/// Spacing between installments or recurring occurrences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
}

impl Interval {
    /// Portuguese adjective used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Interval::Weekly => "semanal",
            Interval::Monthly => "mensal",
            Interval::Quarterly => "trimestral",
        }
    }
}

// =============================================================================
// Newtype Wrappers
// =============================================================================

/// Unix timestamp in seconds since epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }

    /// Seconds elapsed since this timestamp (negative if in the future).
    pub fn age_secs(&self) -> i64 {
        Timestamp::now().0 - self.0
    }
}

/// Identifier of one conversation (a chat window, an HTTP client, a CLI run).
///
/// Opaque to the interpreter; any non-empty string the caller chooses.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// =============================================================================
// Extraction output
// =============================================================================

/// An installment plan: `count` payments spaced by `interval`.
///
/// Only built for `count >= 2`; a single payment is not an installment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installments {
    pub count: u32,
    pub interval: Interval,
}

/// A repeating transaction with an optional last date.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    pub interval: Interval,
    pub end_date: Option<NaiveDate>,
}

/// Structured signals found in one raw user sentence.
///
/// `scheduled_date`, `installments` and `recurrence` are `Some` exactly when
/// the corresponding flag holds, so the flag/value pairs cannot disagree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntities {
    pub action: TransactionAction,
    pub amount: Option<Decimal>,
    pub date: NaiveDate,
    pub category: String,
    pub scheduled_date: Option<NaiveDate>,
    pub installments: Option<Installments>,
    pub recurrence: Option<Recurrence>,
    /// Units mentioned ("vendi 2 brincos"); 1 when none is stated.
    pub quantity: u32,
    pub description: Option<String>,
}

impl ExtractedEntities {
    /// Entities with every optional signal absent.
    pub fn new(action: TransactionAction, date: NaiveDate) -> Self {
        Self {
            action,
            amount: None,
            date,
            category: String::new(),
            scheduled_date: None,
            installments: None,
            recurrence: None,
            quantity: 1,
            description: None,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled_date.is_some()
    }

    pub fn is_installment(&self) -> bool {
        self.installments.is_some()
    }

    /// Number of payments; 1 for a single payment.
    pub fn installment_count(&self) -> u32 {
        self.installments.map(|i| i.count).unwrap_or(1)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// One product in the caller-provided catalog snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub category_label: String,
}

/// A catalog item proposed as the referent of the user's sentence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCandidate {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: i64,
    pub category_label: String,
    /// Display-ordering hint in `[0, 1]`; not a similarity score.
    pub match_confidence: f32,
}

impl ProductCandidate {
    pub fn from_item(item: &CatalogItem, match_confidence: f32) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            stock_quantity: item.stock_quantity,
            category_label: item.category_label.clone(),
            match_confidence: match_confidence.clamp(0.0, 1.0),
        }
    }
}

// =============================================================================
// Pending intent
// =============================================================================

/// A resolved transaction waiting for its last answer, then handed to the
/// ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingIntent {
    pub action: TransactionAction,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    /// Unit amount.
    pub amount: Decimal,
    pub quantity: u32,
    pub total_amount: Decimal,
    pub date: NaiveDate,
    pub category: String,
    pub description: String,
    pub scheduled_date: Option<NaiveDate>,
    pub installments: Option<Installments>,
    pub recurrence: Option<Recurrence>,
    pub is_paid: bool,
}

impl PendingIntent {
    pub fn is_scheduled(&self) -> bool {
        self.scheduled_date.is_some()
    }

    pub fn is_installment(&self) -> bool {
        self.installments.is_some()
    }

    pub fn installment_count(&self) -> u32 {
        self.installments.map(|i| i.count).unwrap_or(1)
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Installment sales must disclose the card-machine fee before commit.
    pub fn requires_fee_disclosure(&self) -> bool {
        self.action == TransactionAction::Sale && self.installment_count() > 1
    }

    /// Product name when one was resolved, otherwise the free description.
    pub fn subject(&self) -> &str {
        self.product_name.as_deref().unwrap_or(&self.description)
    }
}

/// Round a monetary value to cents.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

// =============================================================================
// Tests
// =============================================================================
