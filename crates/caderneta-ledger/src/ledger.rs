//! Ledger collaborator: where resolved intents end up.

use async_trait::async_trait;
use caderneta_core::types::{round_money, PendingIntent, Timestamp, TransactionAction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

/// Category label used for card-machine fee expenses.
pub const FEE_CATEGORY: &str = "Taxas";

/// What the interpreter hands to the ledger in one commit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dispatch {
    /// A single transaction.
    Single(PendingIntent),
    /// An installment sale split into the amount the seller keeps and the
    /// card-machine fee, recorded together.
    WithFee {
        net: PendingIntent,
        fee: PendingIntent,
    },
}

impl Dispatch {
    /// Split `intent` by a fee `percentage` in `(0, 100]`.
    ///
    /// `net = round2(total * (1 - pct/100))` and `fee = total - net`, so the
    /// two entries always add up to the original total.
    pub fn with_fee(intent: PendingIntent, percentage: Decimal) -> Self {
        let total = intent.total_amount;
        let keep = Decimal::ONE - percentage / Decimal::ONE_HUNDRED;
        let net_total = round_money(total * keep);
        let fee_total = total - net_total;

        let quantity = Decimal::from(intent.quantity.max(1));
        let fee = PendingIntent {
            action: TransactionAction::Expense,
            product_id: None,
            product_name: None,
            amount: fee_total,
            quantity: 1,
            total_amount: fee_total,
            date: intent.date,
            category: FEE_CATEGORY.to_string(),
            description: format!(
                "Taxa da maquininha {}% ({})",
                percentage.normalize(),
                intent.subject()
            ),
            scheduled_date: intent.scheduled_date,
            installments: None,
            recurrence: None,
            is_paid: intent.is_paid,
        };
        let net = PendingIntent {
            amount: round_money(net_total / quantity),
            total_amount: net_total,
            ..intent
        };

        Dispatch::WithFee { net, fee }
    }

    /// Entries in the order they are recorded.
    pub fn entries(&self) -> Vec<&PendingIntent> {
        match self {
            Dispatch::Single(intent) => vec![intent],
            Dispatch::WithFee { net, fee } => vec![net, fee],
        }
    }

    /// The intent the user described (the net side for fee splits).
    pub fn primary(&self) -> &PendingIntent {
        match self {
            Dispatch::Single(intent) => intent,
            Dispatch::WithFee { net, .. } => net,
        }
    }

    pub fn fee(&self) -> Option<&PendingIntent> {
        match self {
            Dispatch::Single(_) => None,
            Dispatch::WithFee { fee, .. } => Some(fee),
        }
    }
}

/// One recorded transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: Uuid,
    pub intent: PendingIntent,
    pub recorded_at: Timestamp,
}

/// Acknowledgement of a successful dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReceipt {
    pub entry_ids: Vec<Uuid>,
    pub recorded_at: Timestamp,
}

/// Persistence of resolved transactions.
///
/// A dispatch is all-or-nothing: either every entry is recorded or an error
/// is returned and nothing is.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn record(&self, dispatch: &Dispatch) -> Result<LedgerReceipt, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use caderneta_core::types::{Installments, Interval};
    use chrono::NaiveDate;

    fn sale(total: Decimal, quantity: u32) -> PendingIntent {
        PendingIntent {
            action: TransactionAction::Sale,
            product_id: Some("p1".into()),
            product_name: Some("Colar Coração".into()),
            amount: total / Decimal::from(quantity),
            quantity,
            total_amount: total,
            date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
            category: "Vendas".into(),
            description: "colar".into(),
            scheduled_date: None,
            installments: Some(Installments {
                count: 3,
                interval: Interval::Monthly,
            }),
            recurrence: None,
            is_paid: true,
        }
    }

    #[test]
    fn test_fee_split_adds_up() {
        let dispatch = Dispatch::with_fee(sale(Decimal::new(150, 0), 1), Decimal::new(25, 1));
        let Dispatch::WithFee { net, fee } = &dispatch else {
            panic!("expected a fee split");
        };
        assert_eq!(net.total_amount, Decimal::new(14625, 2));
        assert_eq!(fee.total_amount, Decimal::new(375, 2));
        assert_eq!(net.total_amount + fee.total_amount, Decimal::new(150, 0));
    }

    #[test]
    fn test_fee_split_rounds_net_to_cents() {
        let dispatch = Dispatch::with_fee(sale(Decimal::new(9999, 2), 1), Decimal::new(333, 2));
        let net = dispatch.primary();
        let fee = dispatch.fee().unwrap();
        assert_eq!(net.total_amount, Decimal::new(9666, 2));
        assert_eq!(fee.total_amount, Decimal::new(333, 2));
    }

    #[test]
    fn test_fee_entry_is_expense_in_fee_category() {
        let dispatch = Dispatch::with_fee(sale(Decimal::new(100, 0), 1), Decimal::new(5, 0));
        let fee = dispatch.fee().unwrap();
        assert_eq!(fee.action, TransactionAction::Expense);
        assert_eq!(fee.category, FEE_CATEGORY);
        assert!(fee.installments.is_none());
        assert!(fee.description.contains("5%"));
        assert!(fee.description.contains("Colar Coração"));
    }

    #[test]
    fn test_net_keeps_sale_details() {
        let dispatch = Dispatch::with_fee(sale(Decimal::new(100, 0), 2), Decimal::new(10, 0));
        let net = dispatch.primary();
        assert_eq!(net.action, TransactionAction::Sale);
        assert_eq!(net.product_id.as_deref(), Some("p1"));
        assert_eq!(net.installment_count(), 3);
        assert_eq!(net.total_amount, Decimal::new(90, 0));
        assert_eq!(net.amount, Decimal::new(45, 0));
    }

    #[test]
    fn test_full_fee() {
        let dispatch = Dispatch::with_fee(sale(Decimal::new(80, 0), 1), Decimal::ONE_HUNDRED);
        assert_eq!(dispatch.primary().total_amount, Decimal::ZERO);
        assert_eq!(dispatch.fee().unwrap().total_amount, Decimal::new(80, 0));
    }

    #[test]
    fn test_entries_order() {
        let single = Dispatch::Single(sale(Decimal::new(50, 0), 1));
        assert_eq!(single.entries().len(), 1);
        assert!(single.fee().is_none());

        let split = Dispatch::with_fee(sale(Decimal::new(50, 0), 1), Decimal::new(2, 0));
        let entries = split.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, TransactionAction::Sale);
        assert_eq!(entries[1].action, TransactionAction::Expense);
    }
}
