//! Two-phase local-write / conf-confirmation sequence with a durable intent.
//!
//! An intent is recorded as `pending` before the local write, carrying the
//! compensation that undoes it. The caller then either commits the intent once
//! the conf service confirms, compensates it after a rejection, or discards it
//! when the local write never happened. Intents left pending by a crash are
//! picked up by the reconciliation pass.

use postgres_models::{Compensation, IntentAction, IntentState, NewRateIntent, RateIntent};
use tracing::{error, info, warn};

use crate::ports::{IntentLog, RateStore, StoreError};

pub struct Saga<'a> {
    intents: &'a dyn IntentLog,
    store: &'a dyn RateStore,
    intent: RateIntent,
    compensation: Compensation,
}

impl<'a> Saga<'a> {
    pub async fn begin(
        intents: &'a dyn IntentLog,
        store: &'a dyn RateStore,
        action: IntentAction,
        rate_name: &str,
        rate_id: Option<i32>,
        compensation: Compensation,
    ) -> Result<Saga<'a>, StoreError> {
        let mut new_intent = NewRateIntent::new(action, rate_name.to_string(), &compensation)?;
        if let Some(rate_id) = rate_id {
            new_intent = new_intent.with_rate_id(rate_id);
        }
        let intent = intents.record_intent(new_intent).await?;

        Ok(Self {
            intents,
            store,
            intent,
            compensation,
        })
    }

    pub fn intent(&self) -> &RateIntent {
        &self.intent
    }

    /// Returns `false` when the reconciliation pass settled the intent first;
    /// the local write has then already been undone.
    pub async fn commit(self) -> Result<bool, StoreError> {
        let committed = self
            .intents
            .settle_intent(self.intent.id, IntentState::Committed, None)
            .await?;
        if committed {
            info!(intent_id = %self.intent.id, action = %self.intent.action, "rate change committed");
        } else {
            warn!(intent_id = %self.intent.id, "intent settled before commit");
        }
        Ok(committed)
    }

    /// Close the intent without touching the rates table.
    pub async fn discard(self, reason: &str) {
        match self
            .intents
            .settle_intent(
                self.intent.id,
                IntentState::Compensated,
                Some(reason.to_string()),
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(intent_id = %self.intent.id, "intent settled before discard"),
            Err(err) => error!(intent_id = %self.intent.id, error = %err, "failed to discard intent"),
        }
    }

    /// Undo the local write. Best-effort: a failing compensation is logged and
    /// recorded on the intent, never surfaced separately to the caller.
    pub async fn compensate(self, reason: &str) {
        warn!(
            intent_id = %self.intent.id,
            action = %self.intent.action,
            rate_name = %self.intent.rate_name,
            reason,
            "compensating rate change"
        );

        let (state, message) = match apply_compensation(self.store, &self.compensation).await {
            Ok(()) => (IntentState::Compensated, reason.to_string()),
            Err(err) => {
                error!(intent_id = %self.intent.id, error = %err, "compensation failed");
                (IntentState::Failed, format!("{}; compensation failed: {}", reason, err))
            }
        };

        match self
            .intents
            .settle_intent(self.intent.id, state, Some(message))
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(intent_id = %self.intent.id, "intent settled before compensation"),
            Err(err) => error!(intent_id = %self.intent.id, error = %err, "failed to settle intent"),
        }
    }
}

/// Run the inverse local write. Every compensation is idempotent.
pub async fn apply_compensation(
    store: &dyn RateStore,
    compensation: &Compensation,
) -> Result<(), StoreError> {
    match compensation {
        Compensation::DeleteCreated { name } => {
            store.delete_rate_by_name(name).await?;
        }
        Compensation::RestoreRow { row } => {
            store.restore_rate(row).await?;
        }
        Compensation::RestoreStatus { id, status } => {
            store.set_status(*id, status).await?;
        }
    }
    Ok(())
}
