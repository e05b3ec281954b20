//! Seams between the dispatcher and its collaborators: rate storage, the
//! intent log and the conf service. Adapters are injected at construction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use conf_client::{ConfAction, ConfClient, ConfError, ConfResponse};
use postgres_models::{
    Currency, DbError, IntentState, NewRate, NewRateIntent, Rate, RateChanges, RateIntent,
    RateListRow,
};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Intent encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        StoreError::Db(DbError::Query(err))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    Name,
    Status,
    Prefix,
    MinRate,
    CurrencyId,
}

impl OrderField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "status" => Some(Self::Status),
            "prefix" => Some(Self::Prefix),
            "min_rate" => Some(Self::MinRate),
            "currency_id" => Some(Self::CurrencyId),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuery {
    /// Case-insensitive prefix match on the rate name.
    pub name_prefix: Option<String>,
    pub order_field: OrderField,
    pub direction: OrderDirection,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatePage {
    pub rows: Vec<RateListRow>,
    pub total: i64,
}

#[async_trait]
pub trait RateStore: Send + Sync {
    async fn find_rate(&self, id: i32) -> Result<Option<Rate>, StoreError>;
    async fn find_currency(&self, id: i32) -> Result<Option<Currency>, StoreError>;
    /// Whether another rate already uses `name`, compared case-insensitively.
    async fn name_taken(&self, name: &str, exclude_id: Option<i32>) -> Result<bool, StoreError>;
    async fn insert_rate(&self, rate: NewRate) -> Result<Rate, StoreError>;
    /// Returns `None` when no row has `id`.
    async fn update_rate(&self, id: i32, changes: &RateChanges)
        -> Result<Option<Rate>, StoreError>;
    /// Upsert the full row, keeping its primary key.
    async fn restore_rate(&self, rate: &Rate) -> Result<(), StoreError>;
    async fn delete_rate(&self, id: i32) -> Result<bool, StoreError>;
    async fn delete_rate_by_name(&self, name: &str) -> Result<usize, StoreError>;
    /// Returns the number of affected rows.
    async fn set_status(&self, id: i32, status: &str) -> Result<usize, StoreError>;
    async fn search_rates(&self, query: &RateQuery) -> Result<RatePage, StoreError>;
    async fn all_rates(&self) -> Result<Vec<Rate>, StoreError>;
    async fn all_currencies(&self) -> Result<Vec<Currency>, StoreError>;
}

#[async_trait]
pub trait IntentLog: Send + Sync {
    async fn record_intent(&self, intent: NewRateIntent) -> Result<RateIntent, StoreError>;
    /// Move a `pending` intent to `state`. Returns `false` if it was already settled.
    async fn settle_intent(
        &self,
        id: Uuid,
        state: IntentState,
        error_message: Option<String>,
    ) -> Result<bool, StoreError>;
    /// Pending intents created before `older_than`, oldest first.
    async fn pending_intents(&self, older_than: DateTime<Utc>)
        -> Result<Vec<RateIntent>, StoreError>;
    async fn find_intent(&self, id: Uuid) -> Result<Option<RateIntent>, StoreError>;
    /// Whether a later `committed` or `pending` intent touches the same rate,
    /// matched by name (case-insensitive) or by rate id.
    async fn superseded(&self, intent: &RateIntent) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ConfGateway: Send + Sync {
    async fn is_reachable(&self) -> bool;
    async fn notify(&self, action: ConfAction, name: &str) -> Result<ConfResponse, ConfError>;
}

#[async_trait]
impl ConfGateway for ConfClient {
    async fn is_reachable(&self) -> bool {
        self.check_connection().await
    }

    async fn notify(&self, action: ConfAction, name: &str) -> Result<ConfResponse, ConfError> {
        self.call_rates(action, name).await
    }
}
