//! PostgreSQL adapter for the storage ports, built on diesel-async and bb8.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel_async::RunQueryDsl;
use postgres_models::schema::{currencies, rate_intents, rates};
use postgres_models::{
    Currency, DbConnection, DbError, DbPool, IntentState, NewRate, NewRateIntent, Rate,
    RateChanges, RateIntent, RateListRow,
};
use uuid::Uuid;

use crate::ports::{
    IntentLog, OrderDirection, OrderField, RatePage, RateQuery, RateStore, StoreError,
};

diesel::define_sql_function!(fn lower(x: Text) -> Text);

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<DbConnection, StoreError> {
        self.pool
            .get_owned()
            .await
            .map_err(|e| StoreError::Db(DbError::from(e)))
    }
}

/// Escape LIKE metacharacters so user input only ever matches literally.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl RateStore for PgStore {
    async fn find_rate(&self, id: i32) -> Result<Option<Rate>, StoreError> {
        let mut conn = self.conn().await?;
        let rate = rates::table
            .find(id)
            .select(Rate::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(rate)
    }

    async fn find_currency(&self, id: i32) -> Result<Option<Currency>, StoreError> {
        let mut conn = self.conn().await?;
        let currency = currencies::table
            .find(id)
            .select(Currency::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(currency)
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<i32>) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let mut query = rates::table
            .select(rates::id)
            .filter(lower(rates::name).eq(lower(name)))
            .into_boxed();
        if let Some(id) = exclude_id {
            query = query.filter(rates::id.ne(id));
        }

        let found: Option<i32> = query.first(&mut conn).await.optional()?;
        Ok(found.is_some())
    }

    async fn insert_rate(&self, rate: NewRate) -> Result<Rate, StoreError> {
        let mut conn = self.conn().await?;
        let inserted = diesel::insert_into(rates::table)
            .values(&rate)
            .returning(Rate::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(inserted)
    }

    async fn update_rate(
        &self,
        id: i32,
        changes: &RateChanges,
    ) -> Result<Option<Rate>, StoreError> {
        if changes.is_empty() {
            return self.find_rate(id).await;
        }

        let mut conn = self.conn().await?;
        let updated = diesel::update(rates::table.find(id))
            .set(changes)
            .returning(Rate::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?;
        Ok(updated)
    }

    async fn restore_rate(&self, rate: &Rate) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        diesel::insert_into(rates::table)
            .values(rate)
            .on_conflict(rates::id)
            .do_update()
            .set(rate)
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete_rate(&self, id: i32) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(rates::table.find(id))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn delete_rate_by_name(&self, name: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(rates::table.filter(lower(rates::name).eq(lower(name))))
            .execute(&mut conn)
            .await?;
        Ok(deleted)
    }

    async fn set_status(&self, id: i32, status: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn().await?;
        let affected = diesel::update(rates::table.find(id))
            .set(rates::status.eq(status))
            .execute(&mut conn)
            .await?;
        Ok(affected)
    }

    async fn search_rates(&self, query: &RateQuery) -> Result<RatePage, StoreError> {
        let mut conn = self.conn().await?;

        let mut rows_query = rates::table
            .left_join(currencies::table)
            .select((
                rates::id,
                rates::name,
                rates::prefix,
                rates::number_of_digits,
                rates::min_rate,
                rates::sec_rate,
                currencies::name.nullable(),
                rates::status,
            ))
            .into_boxed();
        let mut count_query = rates::table.count().into_boxed();

        if let Some(prefix) = query.name_prefix.as_deref().filter(|p| !p.is_empty()) {
            let pattern = like_prefix(prefix);
            rows_query = rows_query.filter(rates::name.ilike(pattern.clone()));
            count_query = count_query.filter(rates::name.ilike(pattern));
        }

        rows_query = match (query.order_field, query.direction) {
            (OrderField::Name, OrderDirection::Asc) => rows_query.order(rates::name.asc()),
            (OrderField::Name, OrderDirection::Desc) => rows_query.order(rates::name.desc()),
            (OrderField::Status, OrderDirection::Asc) => rows_query.order(rates::status.asc()),
            (OrderField::Status, OrderDirection::Desc) => rows_query.order(rates::status.desc()),
            (OrderField::Prefix, OrderDirection::Asc) => rows_query.order(rates::prefix.asc()),
            (OrderField::Prefix, OrderDirection::Desc) => rows_query.order(rates::prefix.desc()),
            (OrderField::MinRate, OrderDirection::Asc) => rows_query.order(rates::min_rate.asc()),
            (OrderField::MinRate, OrderDirection::Desc) => {
                rows_query.order(rates::min_rate.desc())
            }
            (OrderField::CurrencyId, OrderDirection::Asc) => {
                rows_query.order(rates::currency_id.asc())
            }
            (OrderField::CurrencyId, OrderDirection::Desc) => {
                rows_query.order(rates::currency_id.desc())
            }
        };

        let rows = rows_query
            .then_order_by(rates::id.asc())
            .limit(query.limit)
            .offset(query.offset)
            .load::<RateListRow>(&mut conn)
            .await?;
        let total: i64 = count_query.get_result(&mut conn).await?;

        Ok(RatePage { rows, total })
    }

    async fn all_rates(&self) -> Result<Vec<Rate>, StoreError> {
        let mut conn = self.conn().await?;
        let all = rates::table
            .select(Rate::as_select())
            .order(rates::name.asc())
            .load(&mut conn)
            .await?;
        Ok(all)
    }

    async fn all_currencies(&self) -> Result<Vec<Currency>, StoreError> {
        let mut conn = self.conn().await?;
        let all = currencies::table
            .select(Currency::as_select())
            .order(currencies::name.asc())
            .load(&mut conn)
            .await?;
        Ok(all)
    }
}

#[async_trait]
impl IntentLog for PgStore {
    async fn record_intent(&self, intent: NewRateIntent) -> Result<RateIntent, StoreError> {
        let mut conn = self.conn().await?;
        let recorded = diesel::insert_into(rate_intents::table)
            .values(&intent)
            .returning(RateIntent::as_returning())
            .get_result(&mut conn)
            .await?;
        Ok(recorded)
    }

    async fn settle_intent(
        &self,
        id: Uuid,
        state: IntentState,
        error_message: Option<String>,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let settled = diesel::update(
            rate_intents::table
                .find(id)
                .filter(rate_intents::state.eq(IntentState::Pending.as_str())),
        )
        .set((
            rate_intents::state.eq(state.as_str()),
            rate_intents::error_message.eq(error_message),
            rate_intents::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await?;
        Ok(settled > 0)
    }

    async fn pending_intents(
        &self,
        older_than: DateTime<Utc>,
    ) -> Result<Vec<RateIntent>, StoreError> {
        let mut conn = self.conn().await?;
        let pending = rate_intents::table
            .filter(rate_intents::state.eq(IntentState::Pending.as_str()))
            .filter(rate_intents::created_at.lt(older_than))
            .order(rate_intents::created_at.asc())
            .select(RateIntent::as_select())
            .load(&mut conn)
            .await?;
        Ok(pending)
    }

    async fn find_intent(&self, id: Uuid) -> Result<Option<RateIntent>, StoreError> {
        let mut conn = self.conn().await?;
        let intent = rate_intents::table
            .find(id)
            .select(RateIntent::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(intent)
    }

    async fn superseded(&self, intent: &RateIntent) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let live = [IntentState::Committed.as_str(), IntentState::Pending.as_str()];
        let mut query = rate_intents::table
            .select(rate_intents::id)
            .filter(rate_intents::created_at.gt(intent.created_at))
            .filter(rate_intents::state.eq_any(live))
            .into_boxed();

        let same_name = lower(rate_intents::rate_name).eq(lower(intent.rate_name.clone()));
        query = match intent.rate_id {
            Some(rate_id) => query.filter(
                same_name.or(rate_intents::rate_id.is_not_distinct_from(rate_id)),
            ),
            None => query.filter(same_name),
        };

        let later: Option<Uuid> = query.first(&mut conn).await.optional()?;
        Ok(later.is_some())
    }
}
