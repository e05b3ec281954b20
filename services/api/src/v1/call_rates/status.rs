use conf_client::ConfAction;
use postgres_models::{Compensation, IntentAction, RateStatus};
use serde_json::json;
use tracing::info;

use super::dispatcher::RateDispatcher;
use crate::envelope::data;
use crate::errors::{DispatchError, DispatchResult, RateError};
use crate::extractors::RateRequest;
use crate::saga::Saga;

impl RateDispatcher {
    pub(super) async fn enable(&self, request: &RateRequest) -> DispatchResult {
        self.set_status(request, RateStatus::Active).await?;
        Ok(data(json!({ "active": true })))
    }

    pub(super) async fn disable(&self, request: &RateRequest) -> DispatchResult {
        self.set_status(request, RateStatus::Inactive).await?;
        Ok(data(json!({ "inactive": true })))
    }

    /// Write the new status, reverting to the previous one if the conf service
    /// does not confirm.
    async fn set_status(
        &self,
        request: &RateRequest,
        status: RateStatus,
    ) -> Result<(), DispatchError> {
        let id = request.require_id()?;

        let rate = self.store.find_rate(id).await?.ok_or(RateError::NotFound)?;

        self.ensure_conf_reachable().await?;

        let action = match status {
            RateStatus::Active => IntentAction::Enable,
            RateStatus::Inactive => IntentAction::Disable,
        };
        let saga = Saga::begin(
            self.intents.as_ref(),
            self.store.as_ref(),
            action,
            &rate.name,
            Some(id),
            Compensation::RestoreStatus {
                id,
                status: rate.status.clone(),
            },
        )
        .await?;

        match self.store.set_status(id, status.as_str()).await {
            Ok(0) => {
                saga.discard("status not updated").await;
                return Err(RateError::StatusNotUpdated.into());
            }
            Ok(_) => {}
            Err(err) => {
                saga.discard("status update failed").await;
                return Err(err.into());
            }
        }

        if !self.confirm(ConfAction::Update, &rate.name).await {
            saga.compensate("conf service did not confirm status change").await;
            return Err(RateError::ConfRejected.into());
        }
        if !saga.commit().await? {
            return Err(RateError::ConfRejected.into());
        }

        info!(rate_id = id, status = status.as_str(), "call rate status changed");
        Ok(())
    }
}
