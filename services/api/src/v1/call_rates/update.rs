use conf_client::ConfAction;
use postgres_models::{Compensation, IntentAction};
use tracing::info;

use super::dispatcher::RateDispatcher;
use crate::envelope::data;
use crate::errors::{DispatchResult, RateError};
use crate::extractors::RateRequest;
use crate::payload::RatePayload;
use crate::saga::Saga;
use crate::validation::{validate, UPDATE_RULES};

impl RateDispatcher {
    /// Apply a partial update, rolling back to the pre-update row if the conf
    /// service does not confirm.
    pub(super) async fn update(&self, request: &RateRequest) -> DispatchResult {
        let id = request.require_id()?;
        let body = request.body()?;
        validate(body, UPDATE_RULES).map_err(RateError::Validation)?;
        let payload = RatePayload::from_body(body).map_err(RateError::Validation)?;

        self.ensure_conf_reachable().await?;

        if let Some(name) = payload.name.as_value() {
            if self.store.name_taken(name, Some(id)).await? {
                return Err(RateError::NameTaken.into());
            }
        }

        let current = self.store.find_rate(id).await?.ok_or(RateError::NotFound)?;
        let changes = payload.into_changes();

        let saga = Saga::begin(
            self.intents.as_ref(),
            self.store.as_ref(),
            IntentAction::Update,
            &current.name,
            Some(id),
            Compensation::RestoreRow {
                row: current.clone(),
            },
        )
        .await?;

        let updated = match self.store.update_rate(id, &changes).await {
            Ok(Some(rate)) => rate,
            Ok(None) => {
                saga.discard("rate disappeared before update").await;
                return Err(RateError::NotFound.into());
            }
            Err(err) => {
                saga.discard("update failed").await;
                return Err(err.into());
            }
        };

        if !self.confirm(ConfAction::Update, &updated.name).await {
            saga.compensate("conf service did not confirm update").await;
            return Err(RateError::ConfRejected.into());
        }
        if !saga.commit().await? {
            return Err(RateError::ConfRejected.into());
        }

        info!(rate_id = id, name = %updated.name, "call rate updated");

        let detail = self.rate_detail(id).await?.ok_or(RateError::NotFound)?;
        Ok(data(detail))
    }
}
