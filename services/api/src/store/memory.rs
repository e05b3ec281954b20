use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postgres_models::{
    Currency, IntentState, NewRate, NewRateIntent, Rate, RateChanges, RateIntent, RateListRow,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::ports::{
    IntentLog, OrderDirection, OrderField, RatePage, RateQuery, RateStore, StoreError,
};

#[derive(Default)]
struct MemoryState {
    rates: BTreeMap<i32, Rate>,
    currencies: BTreeMap<i32, Currency>,
    intents: HashMap<Uuid, RateIntent>,
    last_id: i32,
}

/// In-process implementation of the storage ports.
///
/// Mirrors the PostgreSQL adapter's semantics (case-insensitive name matching,
/// NULLs sorted last ascending and first descending, `id` as tiebreak) so it can
/// stand in for the database in tests and local runs.
#[derive(Default, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_currencies(currencies: impl IntoIterator<Item = Currency>) -> Self {
        let state = MemoryState {
            currencies: currencies.into_iter().map(|c| (c.id, c)).collect(),
            ..Default::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// NULLs last when ascending, matching PostgreSQL's default ordering.
fn cmp_nullable<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &Rate, b: &Rate, field: OrderField) -> Ordering {
    match field {
        OrderField::Name => a.name.cmp(&b.name),
        OrderField::Status => a.status.cmp(&b.status),
        OrderField::Prefix => cmp_nullable(&a.prefix, &b.prefix),
        OrderField::MinRate => a.min_rate.cmp(&b.min_rate),
        OrderField::CurrencyId => cmp_nullable(&a.currency_id, &b.currency_id),
    }
}

#[async_trait]
impl RateStore for MemoryStore {
    async fn find_rate(&self, id: i32) -> Result<Option<Rate>, StoreError> {
        Ok(self.state.read().await.rates.get(&id).cloned())
    }

    async fn find_currency(&self, id: i32) -> Result<Option<Currency>, StoreError> {
        Ok(self.state.read().await.currencies.get(&id).cloned())
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<i32>) -> Result<bool, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .rates
            .values()
            .any(|r| same_name(&r.name, name) && Some(r.id) != exclude_id))
    }

    async fn insert_rate(&self, rate: NewRate) -> Result<Rate, StoreError> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let rate = rate.into_rate(state.last_id);
        state.rates.insert(rate.id, rate.clone());
        Ok(rate)
    }

    async fn update_rate(
        &self,
        id: i32,
        changes: &RateChanges,
    ) -> Result<Option<Rate>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.rates.get_mut(&id).map(|rate| {
            changes.apply(rate);
            rate.clone()
        }))
    }

    async fn restore_rate(&self, rate: &Rate) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.last_id = state.last_id.max(rate.id);
        state.rates.insert(rate.id, rate.clone());
        Ok(())
    }

    async fn delete_rate(&self, id: i32) -> Result<bool, StoreError> {
        Ok(self.state.write().await.rates.remove(&id).is_some())
    }

    async fn delete_rate_by_name(&self, name: &str) -> Result<usize, StoreError> {
        let mut state = self.state.write().await;
        let before = state.rates.len();
        state.rates.retain(|_, r| !same_name(&r.name, name));
        Ok(before - state.rates.len())
    }

    async fn set_status(&self, id: i32, status: &str) -> Result<usize, StoreError> {
        let mut state = self.state.write().await;
        match state.rates.get_mut(&id) {
            Some(rate) => {
                rate.status = status.to_string();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn search_rates(&self, query: &RateQuery) -> Result<RatePage, StoreError> {
        let state = self.state.read().await;
        let prefix = query.name_prefix.as_deref().unwrap_or("").to_lowercase();

        let mut matching: Vec<&Rate> = state
            .rates
            .values()
            .filter(|r| r.name.to_lowercase().starts_with(&prefix))
            .collect();
        matching.sort_by(|a, b| {
            let ordering = compare(a, b, query.order_field);
            let ordering = match query.direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            };
            ordering.then(a.id.cmp(&b.id))
        });

        let total = matching.len() as i64;
        let rows = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .map(|r| RateListRow {
                id: r.id,
                name: r.name.clone(),
                prefix: r.prefix.clone(),
                number_of_digits: r.number_of_digits,
                min_rate: r.min_rate,
                sec_rate: r.sec_rate,
                currency: r
                    .currency_id
                    .and_then(|id| state.currencies.get(&id))
                    .map(|c| c.name.clone()),
                status: r.status.clone(),
            })
            .collect();

        Ok(RatePage { rows, total })
    }

    async fn all_rates(&self) -> Result<Vec<Rate>, StoreError> {
        let state = self.state.read().await;
        let mut all: Vec<Rate> = state.rates.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn all_currencies(&self) -> Result<Vec<Currency>, StoreError> {
        let state = self.state.read().await;
        let mut all: Vec<Currency> = state.currencies.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(all)
    }
}

#[async_trait]
impl IntentLog for MemoryStore {
    async fn record_intent(&self, intent: NewRateIntent) -> Result<RateIntent, StoreError> {
        let intent = intent.into_intent(Utc::now());
        let mut state = self.state.write().await;
        state.intents.insert(intent.id, intent.clone());
        Ok(intent)
    }

    async fn settle_intent(
        &self,
        id: Uuid,
        new_state: IntentState,
        error_message: Option<String>,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        match state.intents.get_mut(&id) {
            Some(intent) if intent.state == IntentState::Pending.as_str() => {
                intent.state = new_state.as_str().to_string();
                intent.error_message = error_message;
                intent.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn pending_intents(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<RateIntent>, StoreError> {
        let state = self.state.read().await;
        let mut pending: Vec<RateIntent> = state
            .intents
            .values()
            .filter(|i| i.state == IntentState::Pending.as_str() && i.created_at < older_than)
            .cloned()
            .collect();
        pending.sort_by_key(|i| i.created_at);
        Ok(pending)
    }

    async fn find_intent(&self, id: Uuid) -> Result<Option<RateIntent>, StoreError> {
        Ok(self.state.read().await.intents.get(&id).cloned())
    }

    async fn superseded(&self, intent: &RateIntent) -> Result<bool, StoreError> {
        let state = self.state.read().await;
        let live = [IntentState::Committed.as_str(), IntentState::Pending.as_str()];
        Ok(state.intents.values().any(|other| {
            other.created_at > intent.created_at
                && live.contains(&other.state.as_str())
                && (same_name(&other.rate_name, &intent.rate_name)
                    || (intent.rate_id.is_some() && other.rate_id == intent.rate_id))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn currency(id: i32, name: &str) -> Currency {
        Currency {
            id,
            name: name.to_string(),
            currency: name[..3].to_uppercase(),
            symbol: None,
        }
    }

    fn rate(name: &str) -> NewRate {
        NewRate::new(name.to_string(), dec!(0.10), dec!(0.002))
    }

    #[tokio::test]
    async fn test_name_taken_is_case_insensitive() {
        let store = MemoryStore::new();
        let europe = store.insert_rate(rate("europe")).await.unwrap();

        assert!(store.name_taken("Europe", None).await.unwrap());
        assert!(!store.name_taken("EUROPE", Some(europe.id)).await.unwrap());
        assert!(!store.name_taken("asia", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_restore_keeps_primary_key() {
        let store = MemoryStore::new();
        let first = store.insert_rate(rate("one")).await.unwrap();
        store.insert_rate(rate("two")).await.unwrap();

        assert!(store.delete_rate(first.id).await.unwrap());
        store.restore_rate(&first).await.unwrap();

        assert_eq!(store.find_rate(first.id).await.unwrap(), Some(first));
        let third = store.insert_rate(rate("three")).await.unwrap();
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn test_search_orders_nulls_last_and_joins_currency() {
        let store = MemoryStore::with_currencies(vec![currency(1, "euro")]);
        let mut with_prefix = rate("b-rate");
        with_prefix.prefix = Some("0034".to_string());
        with_prefix.currency_id = Some(1);
        store.insert_rate(with_prefix).await.unwrap();
        store.insert_rate(rate("a-rate")).await.unwrap();

        let page = store
            .search_rates(&RateQuery {
                name_prefix: None,
                order_field: OrderField::Prefix,
                direction: OrderDirection::Asc,
                limit: 10,
                offset: 0,
            })
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(page.rows[0].name, "b-rate");
        assert_eq!(page.rows[0].currency.as_deref(), Some("euro"));
        assert_eq!(page.rows[1].currency, None);
    }

    #[tokio::test]
    async fn test_pending_intents_filters_settled() {
        use postgres_models::{Compensation, IntentAction};

        let store = MemoryStore::new();
        let compensation = Compensation::DeleteCreated {
            name: "europe".to_string(),
        };
        let open = store
            .record_intent(
                NewRateIntent::new(IntentAction::Create, "europe".into(), &compensation).unwrap(),
            )
            .await
            .unwrap();
        let done = store
            .record_intent(
                NewRateIntent::new(IntentAction::Create, "asia".into(), &compensation).unwrap(),
            )
            .await
            .unwrap();
        store
            .settle_intent(done.id, IntentState::Committed, None)
            .await
            .unwrap();

        let later = Utc::now() + chrono::Duration::seconds(1);
        let pending = store.pending_intents(later).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, open.id);

        let earlier = Utc::now() - chrono::Duration::seconds(60);
        assert!(store.pending_intents(earlier).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settle_only_moves_pending_intents() {
        use postgres_models::{Compensation, IntentAction};

        let store = MemoryStore::new();
        let compensation = Compensation::DeleteCreated {
            name: "europe".to_string(),
        };
        let intent = store
            .record_intent(
                NewRateIntent::new(IntentAction::Create, "europe".into(), &compensation).unwrap(),
            )
            .await
            .unwrap();

        assert!(store
            .settle_intent(intent.id, IntentState::Compensated, Some("reconciled".into()))
            .await
            .unwrap());
        assert!(!store
            .settle_intent(intent.id, IntentState::Committed, None)
            .await
            .unwrap());
        assert!(!store
            .settle_intent(Uuid::new_v4(), IntentState::Committed, None)
            .await
            .unwrap());

        let settled = store.find_intent(intent.id).await.unwrap().unwrap();
        assert_eq!(settled.state, IntentState::Compensated.as_str());
        assert_eq!(settled.error_message.as_deref(), Some("reconciled"));
    }

    #[tokio::test]
    async fn test_superseded_by_later_live_change_to_same_rate() {
        use postgres_models::{Compensation, IntentAction};

        let store = MemoryStore::new();
        let restore = Compensation::RestoreStatus {
            id: 7,
            status: "ACTIVE".to_string(),
        };
        let record = |name: &str, rate_id: i32| {
            NewRateIntent::new(IntentAction::Disable, name.to_string(), &restore)
                .unwrap()
                .with_rate_id(rate_id)
        };

        let older = store.record_intent(record("europe", 7)).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let unrelated = store.record_intent(record("asia", 8)).await.unwrap();
        assert!(!store.superseded(&older).await.unwrap());

        // A later change that was undone does not count.
        let undone = store.record_intent(record("EUROPE", 7)).await.unwrap();
        store
            .settle_intent(undone.id, IntentState::Compensated, None)
            .await
            .unwrap();
        assert!(!store.superseded(&older).await.unwrap());

        // Matched by id even after a rename.
        let renamed = store.record_intent(record("europe-west", 7)).await.unwrap();
        store
            .settle_intent(renamed.id, IntentState::Committed, None)
            .await
            .unwrap();
        assert!(store.superseded(&older).await.unwrap());
        assert!(!store.superseded(&renamed).await.unwrap());
        assert!(!store.superseded(&unrelated).await.unwrap());
    }
}
