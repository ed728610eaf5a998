//! Dialogue orchestrator: the per-turn state machine.
//!
//! Each turn first consults the conversation's pending context (a
//! confirmation, a fee question, a fee percentage or a product selection).
//! When no context applies, the sentence is parsed afresh. Every turn ends
//! either with a question (context saved) or a terminal outcome (context
//! cleared).

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use caderneta_core::config::ChatConfig;
use caderneta_core::types::{
    round_money, ConversationId, ExtractedEntities, PendingIntent, ProductCandidate, Timestamp,
    TransactionAction,
};
use caderneta_ledger::{Catalog, Dispatch, Ledger};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::catalog::CatalogResolver;
use crate::context::{ContextStore, ConversationContext, DialogueState};
use crate::error::ChatError;
use crate::extractor::{extract_amount, EntityExtractor};
use crate::reply::{self, FeeAnswer};
use crate::response;
use crate::types::{RawCommand, TurnResponse};

/// Minimum seconds between two sweeps of expired contexts.
const PURGE_INTERVAL_SECS: i64 = 60;

/// Coordinates extraction, resolution, context and collaborators.
pub struct DialogueOrchestrator {
    config: ChatConfig,
    extractor: EntityExtractor,
    resolver: CatalogResolver,
    contexts: ContextStore,
    catalog: Arc<dyn Catalog>,
    ledger: Arc<dyn Ledger>,
    /// One entry per conversation with a turn in flight or queued.
    turn_locks: Mutex<HashMap<ConversationId, Arc<AsyncMutex<()>>>>,
    last_purge: AtomicI64,
}

impl DialogueOrchestrator {
    pub fn new(config: ChatConfig, catalog: Arc<dyn Catalog>, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            extractor: EntityExtractor::new(config.default_scheduled_horizon_months),
            resolver: CatalogResolver::new(config.fallback_candidates),
            contexts: ContextStore::new(config.context_ttl_minutes),
            catalog,
            ledger,
            turn_locks: Mutex::new(HashMap::new()),
            last_purge: AtomicI64::new(0),
            config,
        }
    }

    pub fn context_store(&self) -> &ContextStore {
        &self.contexts
    }

    /// Handle one user turn, with relative dates anchored on the local date.
    pub async fn handle_turn(
        &self,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<TurnResponse, ChatError> {
        self.handle_turn_at(conversation_id, text, Local::now().date_naive())
            .await
    }

    /// Handle one user turn with relative dates anchored on `today`.
    ///
    /// Turns of one conversation are serialized; different conversations
    /// proceed independently.
    pub async fn handle_turn_at(
        &self,
        conversation_id: &ConversationId,
        text: &str,
        today: NaiveDate,
    ) -> Result<TurnResponse, ChatError> {
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }
        let command = RawCommand::new(text.trim());
        if command.text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if command.text.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        self.purge_expired_contexts()?;

        let guard = self.turn_lock(conversation_id)?.lock_owned().await;
        let _permit = TurnPermit {
            orchestrator: self,
            id: conversation_id,
            guard: Some(guard),
        };
        self.run_turn(conversation_id, &command.text, today).await
    }

    async fn run_turn(
        &self,
        id: &ConversationId,
        text: &str,
        today: NaiveDate,
    ) -> Result<TurnResponse, ChatError> {
        let context = self.contexts.get(id)?;
        debug!(
            conversation_id = %id,
            state = %context.as_ref().map(|c| c.state()).unwrap_or(DialogueState::Idle),
            "Turn received"
        );

        if reply::is_cancellation(text) {
            return if self.contexts.clear(id)? {
                info!(conversation_id = %id, "Pending operation cancelled");
                Ok(response::cancelled())
            } else {
                Ok(response::nothing_pending())
            };
        }

        match context {
            Some(ConversationContext::AwaitingConfirmation { pending_intent }) => {
                self.on_confirmation(id, pending_intent, text, today).await
            }
            Some(ConversationContext::AwaitingFeeQuestion { pending_intent }) => {
                self.on_fee_question(id, pending_intent, text, today).await
            }
            Some(ConversationContext::AwaitingFeeAmount { pending_intent, .. }) => {
                self.on_fee_amount(id, pending_intent, text).await
            }
            Some(ConversationContext::AwaitingProductSelection {
                candidates,
                question,
                entities,
            }) => match reply::parse_selection(text) {
                Some(index) => {
                    self.on_selection(id, candidates, &question, entities, index)
                        .await
                }
                None if self.looks_like_command(text) => {
                    debug!(conversation_id = %id, "New command while awaiting selection");
                    self.fresh_parse(id, text, today).await
                }
                None => {
                    debug!(conversation_id = %id, "Selection not understood");
                    Ok(response::invalid_selection(&candidates, &question))
                }
            },
            None => self.fresh_parse(id, text, today).await,
        }
    }

    /// Drop whatever the conversation is waiting on. A turn already in
    /// flight keeps its lock.
    pub fn reset(&self, conversation_id: &ConversationId) -> Result<bool, ChatError> {
        let cleared = self.contexts.clear(conversation_id)?;
        info!(conversation_id = %conversation_id, cleared, "Conversation reset");
        Ok(cleared)
    }

    pub fn state(&self, conversation_id: &ConversationId) -> Result<DialogueState, ChatError> {
        self.contexts.state(conversation_id)
    }

    // =========================================================================
    // Context handlers
    // =========================================================================

    async fn on_confirmation(
        &self,
        id: &ConversationId,
        intent: PendingIntent,
        text: &str,
        today: NaiveDate,
    ) -> Result<TurnResponse, ChatError> {
        if reply::is_negative(text) {
            self.contexts.clear(id)?;
            info!(conversation_id = %id, "Confirmation declined");
            return Ok(response::cancelled());
        }
        if reply::is_affirmative(text) {
            return self.execute(id, Dispatch::Single(intent)).await;
        }
        if self.looks_like_command(text) {
            debug!(conversation_id = %id, "New command while awaiting confirmation");
            return self.fresh_parse(id, text, today).await;
        }
        Ok(response::confirmation_reprompt(&intent))
    }

    async fn on_fee_question(
        &self,
        id: &ConversationId,
        intent: PendingIntent,
        text: &str,
        today: NaiveDate,
    ) -> Result<TurnResponse, ChatError> {
        match reply::parse_fee_answer(text) {
            Some(FeeAnswer::NoFee) => self.execute(id, Dispatch::Single(intent)).await,
            Some(FeeAnswer::Percent(pct)) => self.execute(id, Dispatch::with_fee(intent, pct)).await,
            Some(FeeAnswer::HasFee) => {
                self.contexts.set(
                    id,
                    ConversationContext::AwaitingFeeAmount {
                        pending_intent: intent,
                        is_card_machine: true,
                    },
                )?;
                Ok(response::fee_amount_prompt())
            }
            None if self.looks_like_command(text) => self.fresh_parse(id, text, today).await,
            None => Ok(response::fee_question_reprompt(&intent)),
        }
    }

    async fn on_fee_amount(
        &self,
        id: &ConversationId,
        intent: PendingIntent,
        text: &str,
    ) -> Result<TurnResponse, ChatError> {
        if let Some(pct) = reply::parse_fee_percentage(text) {
            return self.execute(id, Dispatch::with_fee(intent, pct)).await;
        }
        if reply::parse_fee_answer(text) == Some(FeeAnswer::NoFee) {
            return self.execute(id, Dispatch::Single(intent)).await;
        }
        debug!(conversation_id = %id, "Fee percentage not understood");
        Ok(response::invalid_fee_amount())
    }

    async fn on_selection(
        &self,
        id: &ConversationId,
        candidates: Vec<ProductCandidate>,
        question: &str,
        entities: ExtractedEntities,
        index: usize,
    ) -> Result<TurnResponse, ChatError> {
        if index == 0 || index > candidates.len() {
            debug!(
                conversation_id = %id,
                index,
                candidates = candidates.len(),
                "Selection out of range"
            );
            return Ok(response::invalid_selection(&candidates, question));
        }
        let chosen = candidates[index - 1].clone();
        debug!(conversation_id = %id, product_id = %chosen.id, "Product selected");
        self.proceed(id, entities, Some(chosen), true).await
    }

    // =========================================================================
    // Fresh parse and resolution
    // =========================================================================

    async fn fresh_parse(
        &self,
        id: &ConversationId,
        text: &str,
        today: NaiveDate,
    ) -> Result<TurnResponse, ChatError> {
        let entities = self.extractor.extract_at(text, today);
        debug!(
            conversation_id = %id,
            action = %entities.action,
            amount = ?entities.amount,
            "Sentence parsed"
        );

        let mut candidates = Vec::new();
        if entities.action == TransactionAction::Sale {
            match self.catalog.snapshot().await {
                Ok(snapshot) => candidates = self.resolver.resolve(text, &snapshot),
                Err(e) => {
                    warn!(conversation_id = %id, error = %e, "Catalog snapshot failed");
                    self.contexts.clear(id)?;
                    return Ok(response::catalog_unavailable());
                }
            }
        }

        if candidates.len() > 1 {
            let question = response::selection_question(&candidates);
            let reply = response::selection_prompt(&candidates, &question);
            debug!(conversation_id = %id, candidates = candidates.len(), "Asking product selection");
            self.contexts.set(
                id,
                ConversationContext::AwaitingProductSelection {
                    candidates,
                    question,
                    entities,
                },
            )?;
            return Ok(reply);
        }

        self.proceed(id, entities, candidates.into_iter().next(), false)
            .await
    }

    /// Turn resolved entities into a pending intent and ask the next
    /// question, or execute straight away for a selected product sold in a
    /// single payment.
    async fn proceed(
        &self,
        id: &ConversationId,
        entities: ExtractedEntities,
        product: Option<ProductCandidate>,
        from_selection: bool,
    ) -> Result<TurnResponse, ChatError> {
        let Some(intent) = assemble_intent(&entities, product.as_ref()) else {
            debug!(conversation_id = %id, "No amount and no product price");
            self.contexts.clear(id)?;
            return Ok(response::missing_amount());
        };

        if intent.requires_fee_disclosure() {
            let reply = response::fee_question(&intent);
            self.contexts.set(
                id,
                ConversationContext::AwaitingFeeQuestion {
                    pending_intent: intent,
                },
            )?;
            return Ok(reply);
        }

        if from_selection && intent.action == TransactionAction::Sale {
            return self.execute(id, Dispatch::Single(intent)).await;
        }

        let stock_warning = product
            .filter(|p| i64::from(intent.quantity) > p.stock_quantity)
            .map(|p| p.stock_quantity);
        let reply = response::confirmation_prompt(&intent, stock_warning);
        self.contexts.set(
            id,
            ConversationContext::AwaitingConfirmation {
                pending_intent: intent,
            },
        )?;
        Ok(reply)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    async fn execute(
        &self,
        id: &ConversationId,
        dispatch: Dispatch,
    ) -> Result<TurnResponse, ChatError> {
        let result = self.ledger.record(&dispatch).await;
        self.contexts.clear(id)?;
        match result {
            Ok(receipt) => {
                info!(
                    conversation_id = %id,
                    entries = receipt.entry_ids.len(),
                    "Transaction executed"
                );
                Ok(response::executed(&dispatch))
            }
            Err(e) => {
                warn!(conversation_id = %id, error = %e, "Ledger dispatch failed");
                Ok(response::ledger_failed())
            }
        }
    }

    fn looks_like_command(&self, text: &str) -> bool {
        self.extractor.classifier().mentions_action(text) || extract_amount(text).is_some()
    }

    fn turn_lock(&self, id: &ConversationId) -> Result<Arc<AsyncMutex<()>>, ChatError> {
        let mut locks = self
            .turn_locks
            .lock()
            .map_err(|e| ChatError::poisoned("turn", e))?;
        Ok(locks.entry(id.clone()).or_default().clone())
    }

    /// Forget the turn lock of `id` unless another turn holds or awaits it.
    fn release_turn_lock(&self, id: &ConversationId, lock: Arc<AsyncMutex<()>>) {
        let Ok(mut locks) = self.turn_locks.lock() else {
            return;
        };
        // The map entry and `lock` are the only references left.
        let idle = locks.get(id).is_some_and(|held| Arc::ptr_eq(held, &lock))
            && Arc::strong_count(&lock) == 2;
        if idle {
            locks.remove(id);
        }
    }

    /// Sweep expired contexts, at most once per `PURGE_INTERVAL_SECS`.
    fn purge_expired_contexts(&self) -> Result<(), ChatError> {
        let now = Timestamp::now().0;
        let last = self.last_purge.load(Ordering::Relaxed);
        if now - last < PURGE_INTERVAL_SECS {
            return Ok(());
        }
        if self
            .last_purge
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return Ok(());
        }
        let purged = self.contexts.purge_expired()?;
        if purged > 0 {
            debug!(purged, "Expired contexts purged");
        }
        Ok(())
    }
}

/// Exclusive right to run a turn of one conversation. Dropping it, also when
/// the turn future is cancelled, unlocks and forgets the lock if no other
/// turn is queued.
struct TurnPermit<'a> {
    orchestrator: &'a DialogueOrchestrator,
    id: &'a ConversationId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for TurnPermit<'_> {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            let lock = OwnedMutexGuard::mutex(&guard).clone();
            drop(guard);
            self.orchestrator.release_turn_lock(self.id, lock);
        }
    }
}

/// Build the pending intent. The stated amount is the total; without one,
/// the product price is the unit amount. `None` when neither exists.
///
/// The description is the product name, else the leftover words of the
/// sentence, else the action label.
fn assemble_intent(
    entities: &ExtractedEntities,
    product: Option<&ProductCandidate>,
) -> Option<PendingIntent> {
    let quantity = entities.quantity.max(1);
    let units = Decimal::from(quantity);
    let (amount, total_amount) = match (entities.amount, product) {
        (Some(total), _) => (round_money(total / units), total),
        (None, Some(p)) => (p.price, round_money(p.price * units)),
        (None, None) => return None,
    };

    let description = product
        .map(|p| p.name.clone())
        .or_else(|| entities.description.clone())
        .unwrap_or_else(|| entities.action.label().to_string());

    Some(PendingIntent {
        action: entities.action,
        product_id: product.map(|p| p.id.clone()),
        product_name: product.map(|p| p.name.clone()),
        amount,
        quantity,
        total_amount,
        date: entities.date,
        category: entities.category.clone(),
        description,
        scheduled_date: entities.scheduled_date,
        installments: entities.installments,
        recurrence: entities.recurrence,
        is_paid: !entities.is_scheduled(),
    })
}

// =============================================================================
// Tests
// =============================================================================
