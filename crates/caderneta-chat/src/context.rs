//! Conversation context store.
//!
//! Holds at most one pending question per conversation. Setting a context
//! replaces whatever was there; contexts older than the TTL read as absent
//! and are evicted on access.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use caderneta_core::types::{ConversationId, ExtractedEntities, PendingIntent, ProductCandidate, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ChatError;

// =============================================================================
// ConversationContext
// =============================================================================

/// The question a conversation is waiting on, with what is needed to finish
/// it once answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConversationContext {
    AwaitingConfirmation {
        pending_intent: PendingIntent,
    },
    AwaitingProductSelection {
        candidates: Vec<ProductCandidate>,
        question: String,
        /// Entities of the sentence that produced the candidates, used to
        /// assemble the intent once one is picked.
        entities: ExtractedEntities,
    },
    AwaitingFeeQuestion {
        pending_intent: PendingIntent,
    },
    AwaitingFeeAmount {
        pending_intent: PendingIntent,
        is_card_machine: bool,
    },
}

impl ConversationContext {
    pub fn state(&self) -> DialogueState {
        match self {
            ConversationContext::AwaitingConfirmation { .. } => DialogueState::AwaitingConfirmation,
            ConversationContext::AwaitingProductSelection { .. } => {
                DialogueState::AwaitingProductSelection
            }
            ConversationContext::AwaitingFeeQuestion { .. } => DialogueState::AwaitingFeeQuestion,
            ConversationContext::AwaitingFeeAmount { .. } => DialogueState::AwaitingFeeAmount,
        }
    }
}

/// Dialogue state of a conversation, derived from its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialogueState {
    Idle,
    AwaitingConfirmation,
    AwaitingProductSelection,
    AwaitingFeeQuestion,
    AwaitingFeeAmount,
}

impl fmt::Display for DialogueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DialogueState::Idle => "IDLE",
            DialogueState::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            DialogueState::AwaitingProductSelection => "AWAITING_PRODUCT_SELECTION",
            DialogueState::AwaitingFeeQuestion => "AWAITING_FEE_QUESTION",
            DialogueState::AwaitingFeeAmount => "AWAITING_FEE_AMOUNT",
        };
        f.write_str(s)
    }
}

// =============================================================================
// ContextStore
// =============================================================================

#[derive(Debug, Clone)]
struct StoredContext {
    context: ConversationContext,
    created_at: Timestamp,
}

/// Per-conversation context map with expiry.
pub struct ContextStore {
    ttl_secs: i64,
    contexts: Mutex<HashMap<ConversationId, StoredContext>>,
}

impl ContextStore {
    pub fn new(ttl_minutes: u32) -> Self {
        Self {
            ttl_secs: i64::from(ttl_minutes) * 60,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// The live context of `id`, if any. An expired context is removed and
    /// reported as absent.
    pub fn get(&self, id: &ConversationId) -> Result<Option<ConversationContext>, ChatError> {
        let mut contexts = self.lock()?;
        let expired = match contexts.get(id) {
            None => return Ok(None),
            Some(stored) => stored.created_at.age_secs() > self.ttl_secs,
        };
        if expired {
            contexts.remove(id);
            debug!(conversation_id = %id, "Context expired");
            return Ok(None);
        }
        Ok(contexts.get(id).map(|stored| stored.context.clone()))
    }

    /// Replace the context of `id`, stamped now.
    pub fn set(&self, id: &ConversationId, context: ConversationContext) -> Result<(), ChatError> {
        self.set_at(id, context, Timestamp::now())
    }

    /// Replace the context of `id` with an explicit creation time.
    pub fn set_at(
        &self,
        id: &ConversationId,
        context: ConversationContext,
        created_at: Timestamp,
    ) -> Result<(), ChatError> {
        let state = context.state();
        self.lock()?.insert(
            id.clone(),
            StoredContext {
                context,
                created_at,
            },
        );
        debug!(conversation_id = %id, state = %state, "Context set");
        Ok(())
    }

    /// Drop the context of `id`. Returns whether one was stored.
    pub fn clear(&self, id: &ConversationId) -> Result<bool, ChatError> {
        let removed = self.lock()?.remove(id).is_some();
        if removed {
            debug!(conversation_id = %id, "Context cleared");
        }
        Ok(removed)
    }

    /// Dialogue state of `id`; `Idle` when no live context exists.
    pub fn state(&self, id: &ConversationId) -> Result<DialogueState, ChatError> {
        Ok(self
            .get(id)?
            .map(|c| c.state())
            .unwrap_or(DialogueState::Idle))
    }

    /// Remove every expired context. Returns how many were dropped.
    pub fn purge_expired(&self) -> Result<usize, ChatError> {
        let mut contexts = self.lock()?;
        let before = contexts.len();
        contexts.retain(|_, stored| stored.created_at.age_secs() <= self.ttl_secs);
        Ok(before - contexts.len())
    }

    /// Number of stored contexts, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.contexts.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Number of stored contexts that have not expired.
    pub fn live_len(&self) -> usize {
        self.contexts
            .lock()
            .map(|c| {
                c.values()
                    .filter(|stored| stored.created_at.age_secs() <= self.ttl_secs)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<ConversationId, StoredContext>>, ChatError> {
        self.contexts
            .lock()
            .map_err(|e| ChatError::poisoned("context", e))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use caderneta_core::types::TransactionAction;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn intent() -> PendingIntent {
        PendingIntent {
            action: TransactionAction::Expense,
            product_id: None,
            product_name: None,
            amount: Decimal::new(50, 0),
            quantity: 1,
            total_amount: Decimal::new(50, 0),
            date: NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
            category: "Compras".into(),
            description: "mercado".into(),
            scheduled_date: None,
            installments: None,
            recurrence: None,
            is_paid: true,
        }
    }

    fn confirmation() -> ConversationContext {
        ConversationContext::AwaitingConfirmation {
            pending_intent: intent(),
        }
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = ContextStore::new(10);
        assert!(store.get(&"a".into()).unwrap().is_none());
        assert_eq!(store.state(&"a".into()).unwrap(), DialogueState::Idle);
    }

    #[test]
    fn test_set_and_get() {
        let store = ContextStore::new(10);
        let id: ConversationId = "a".into();
        store.set(&id, confirmation()).unwrap();
        assert_eq!(store.get(&id).unwrap(), Some(confirmation()));
        assert_eq!(store.state(&id).unwrap(), DialogueState::AwaitingConfirmation);
    }

    #[test]
    fn test_set_replaces() {
        let store = ContextStore::new(10);
        let id: ConversationId = "a".into();
        store.set(&id, confirmation()).unwrap();
        store
            .set(
                &id,
                ConversationContext::AwaitingFeeAmount {
                    pending_intent: intent(),
                    is_card_machine: true,
                },
            )
            .unwrap();
        assert_eq!(store.state(&id).unwrap(), DialogueState::AwaitingFeeAmount);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_conversations_are_isolated() {
        let store = ContextStore::new(10);
        store.set(&"a".into(), confirmation()).unwrap();
        assert!(store.get(&"b".into()).unwrap().is_none());
        assert!(store.clear(&"b".into()).is_ok());
        assert!(store.get(&"a".into()).unwrap().is_some());
    }

    #[test]
    fn test_clear() {
        let store = ContextStore::new(10);
        let id: ConversationId = "a".into();
        store.set(&id, confirmation()).unwrap();
        assert!(store.clear(&id).unwrap());
        assert!(!store.clear(&id).unwrap());
        assert!(store.get(&id).unwrap().is_none());
    }

    #[test]
    fn test_expired_context_reads_as_none() {
        let store = ContextStore::new(10);
        let id: ConversationId = "a".into();
        let old = Timestamp(Timestamp::now().0 - 11 * 60);
        store.set_at(&id, confirmation(), old).unwrap();
        assert!(store.get(&id).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_context_within_ttl_survives() {
        let store = ContextStore::new(10);
        let id: ConversationId = "a".into();
        let recent = Timestamp(Timestamp::now().0 - 9 * 60);
        store.set_at(&id, confirmation(), recent).unwrap();
        assert!(store.get(&id).unwrap().is_some());
    }

    #[test]
    fn test_purge_expired() {
        let store = ContextStore::new(1);
        let old = Timestamp(Timestamp::now().0 - 120);
        store.set_at(&"old".into(), confirmation(), old).unwrap();
        store.set(&"new".into(), confirmation()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.live_len(), 1);
        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(DialogueState::Idle.to_string(), "IDLE");
        assert_eq!(
            DialogueState::AwaitingProductSelection.to_string(),
            "AWAITING_PRODUCT_SELECTION"
        );
    }
}
