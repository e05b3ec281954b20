use super::dispatcher::RateDispatcher;
use crate::envelope::data;
use crate::errors::{DispatchResult, RateError};
use crate::extractors::RateRequest;

impl RateDispatcher {
    /// Fetch one rate with its currency joined in.
    pub(super) async fn show(&self, request: &RateRequest) -> DispatchResult {
        let id = request.require_id()?;

        let detail = self.rate_detail(id).await?.ok_or(RateError::NotFound)?;

        Ok(data(detail))
    }
}
