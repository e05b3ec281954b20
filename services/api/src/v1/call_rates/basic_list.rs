use super::dispatcher::RateDispatcher;
use crate::envelope::data;
use crate::errors::DispatchResult;

impl RateDispatcher {
    pub(super) async fn basic_list_rate(&self) -> DispatchResult {
        Ok(data(self.store.all_rates().await?))
    }

    pub(super) async fn basic_list_currency(&self) -> DispatchResult {
        Ok(data(self.store.all_currencies().await?))
    }
}
