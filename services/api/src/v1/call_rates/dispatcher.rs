use conf_client::ConfAction;
use postgres_models::{Currency, Rate};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::errors::{AppError, DispatchResult, RateError};
use crate::extractors::RateRequest;
use crate::ports::{ConfGateway, IntentLog, RateStore, StoreError};

/// Dispatch keys. Each has a symbolic name and the legacy numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Show,
    Create,
    List,
    Update,
    Delete,
    Enable,
    Disable,
    BasicListRate,
    BasicListCurrency,
}

impl OpCode {
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "show" | "2500" => Some(Self::Show),
            "create" | "2510" => Some(Self::Create),
            "list" | "2511" => Some(Self::List),
            "update" | "2512" => Some(Self::Update),
            "delete" | "2513" => Some(Self::Delete),
            "enable" | "2514" => Some(Self::Enable),
            "disable" | "2515" => Some(Self::Disable),
            "basicListCurrency" | "2518" => Some(Self::BasicListCurrency),
            "basicListRate" | "2519" => Some(Self::BasicListRate),
            _ => None,
        }
    }
}

/// A rate joined with its currency, as returned by `show`, `create` and `update`.
#[derive(Debug, Clone, Serialize)]
pub struct RateDetail {
    #[serde(flatten)]
    pub rate: Rate,
    pub currency: Option<Currency>,
}

/// Routes operation codes to the rate handlers.
///
/// Storage, the intent log and the conf service are injected; the dispatcher
/// itself holds no mutable state.
#[derive(Clone)]
pub struct RateDispatcher {
    pub(super) store: Arc<dyn RateStore>,
    pub(super) intents: Arc<dyn IntentLog>,
    pub(super) conf: Arc<dyn ConfGateway>,
}

impl RateDispatcher {
    pub fn new(
        store: Arc<dyn RateStore>,
        intents: Arc<dyn IntentLog>,
        conf: Arc<dyn ConfGateway>,
    ) -> Self {
        Self {
            store,
            intents,
            conf,
        }
    }

    pub fn store(&self) -> &dyn RateStore {
        self.store.as_ref()
    }

    pub fn intents(&self) -> &dyn IntentLog {
        self.intents.as_ref()
    }

    pub fn conf(&self) -> &dyn ConfGateway {
        self.conf.as_ref()
    }

    pub async fn handle(&self, op_code: &str, request: RateRequest) -> DispatchResult {
        let Some(op) = OpCode::parse(op_code) else {
            return Err(AppError::internal_server_error(format!("unknown op code {:?}", op_code)).into());
        };

        match op {
            OpCode::Show => self.show(&request).await,
            OpCode::Create => self.create(&request).await,
            OpCode::List => self.list(&request).await,
            OpCode::Update => self.update(&request).await,
            OpCode::Delete => self.delete(&request).await,
            OpCode::Enable => self.enable(&request).await,
            OpCode::Disable => self.disable(&request).await,
            OpCode::BasicListRate => self.basic_list_rate().await,
            OpCode::BasicListCurrency => self.basic_list_currency().await,
        }
    }

    pub(super) async fn rate_detail(&self, id: i32) -> Result<Option<RateDetail>, StoreError> {
        let Some(rate) = self.store.find_rate(id).await? else {
            return Ok(None);
        };

        let currency = match rate.currency_id {
            Some(currency_id) => self.store.find_currency(currency_id).await?,
            None => None,
        };

        Ok(Some(RateDetail { rate, currency }))
    }

    pub(super) async fn ensure_conf_reachable(&self) -> Result<(), RateError> {
        if self.conf.is_reachable().await {
            Ok(())
        } else {
            Err(RateError::ConfUnavailable)
        }
    }

    /// True only when the conf service answered `OK` / `Complete`.
    pub(super) async fn confirm(&self, action: ConfAction, name: &str) -> bool {
        match self.conf.notify(action, name).await {
            Ok(response) if response.is_complete() => true,
            Ok(response) => {
                warn!(
                    ?action,
                    name,
                    state = %response.state,
                    log = %response.log,
                    "conf service rejected rate change"
                );
                false
            }
            Err(err) => {
                warn!(?action, name, error = %err, "conf service call failed");
                false
            }
        }
    }
}
