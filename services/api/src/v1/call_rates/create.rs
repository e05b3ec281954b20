use conf_client::ConfAction;
use postgres_models::{Compensation, IntentAction};
use tracing::info;

use super::dispatcher::RateDispatcher;
use crate::envelope::data;
use crate::errors::{DispatchResult, RateError};
use crate::extractors::RateRequest;
use crate::payload::RatePayload;
use crate::saga::Saga;
use crate::validation::{validate, CREATE_RULES};

impl RateDispatcher {
    /// Insert a rate, then have the conf service pick it up.
    ///
    /// If the conf service does not confirm, the inserted row is deleted again.
    pub(super) async fn create(&self, request: &RateRequest) -> DispatchResult {
        let body = request.body()?;
        validate(body, CREATE_RULES).map_err(RateError::Validation)?;
        let new_rate = RatePayload::from_body(body)
            .and_then(RatePayload::into_new_rate)
            .map_err(RateError::Validation)?;

        self.ensure_conf_reachable().await?;

        if self.store.name_taken(&new_rate.name, None).await? {
            return Err(RateError::NameTaken.into());
        }

        let saga = Saga::begin(
            self.intents.as_ref(),
            self.store.as_ref(),
            IntentAction::Create,
            &new_rate.name,
            None,
            Compensation::DeleteCreated {
                name: new_rate.name.clone(),
            },
        )
        .await?;

        let rate = match self.store.insert_rate(new_rate).await {
            Ok(rate) => rate,
            Err(err) => {
                saga.discard("insert failed").await;
                return Err(err.into());
            }
        };

        if !self.confirm(ConfAction::Create, &rate.name).await {
            saga.compensate("conf service did not confirm create").await;
            return Err(RateError::ConfRejected.into());
        }
        if !saga.commit().await? {
            return Err(RateError::ConfRejected.into());
        }

        info!(rate_id = rate.id, name = %rate.name, "call rate created");

        let detail = self.rate_detail(rate.id).await?.ok_or(RateError::NotFound)?;
        Ok(data(detail))
    }
}
