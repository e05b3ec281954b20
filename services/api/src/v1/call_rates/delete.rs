use conf_client::ConfAction;
use postgres_models::{Compensation, IntentAction};
use serde_json::json;
use tracing::info;

use super::dispatcher::RateDispatcher;
use crate::envelope::data;
use crate::errors::{DispatchResult, RateError};
use crate::extractors::RateRequest;
use crate::saga::Saga;

impl RateDispatcher {
    /// Remove a rate. On conf rejection the row is re-inserted under its
    /// original id.
    pub(super) async fn delete(&self, request: &RateRequest) -> DispatchResult {
        let id = request.require_id()?;

        self.ensure_conf_reachable().await?;

        let rate = self.store.find_rate(id).await?.ok_or(RateError::NotFound)?;

        let saga = Saga::begin(
            self.intents.as_ref(),
            self.store.as_ref(),
            IntentAction::Delete,
            &rate.name,
            Some(id),
            Compensation::RestoreRow { row: rate.clone() },
        )
        .await?;

        match self.store.delete_rate(id).await {
            Ok(true) => {}
            Ok(false) => {
                saga.discard("rate disappeared before delete").await;
                return Err(RateError::NotFound.into());
            }
            Err(err) => {
                saga.discard("delete failed").await;
                return Err(err.into());
            }
        }

        if !self.confirm(ConfAction::Delete, &rate.name).await {
            saga.compensate("conf service did not confirm delete").await;
            return Err(RateError::ConfRejected.into());
        }
        if !saga.commit().await? {
            return Err(RateError::ConfRejected.into());
        }

        info!(rate_id = id, name = %rate.name, "call rate deleted");

        Ok(data(json!({ "delete": true })))
    }
}
