use postgres_models::RateListRow;
use serde_json::{json, Map, Value};

use super::dispatcher::RateDispatcher;
use crate::envelope::data;
use crate::errors::{DispatchResult, RateError};
use crate::extractors::RateRequest;
use crate::ports::{OrderDirection, OrderField, RateQuery};
use crate::validation::{field_text, is_cleared};

const DEFAULT_PER_PAGE: i64 = 10;

impl RateDispatcher {
    /// Paginated, name-prefix filtered listing shaped as table rows.
    pub(super) async fn list(&self, request: &RateRequest) -> DispatchResult {
        let body = request.body()?;

        let per_page = positive(body, "perpage", DEFAULT_PER_PAGE)?;
        let page = positive(body, "page", 1)?;

        let direction = OrderDirection::parse(&text_or(body, "order", "asc"))
            .ok_or(RateError::InvalidOrder)?;
        let order_field = OrderField::parse(&text_or(body, "orderField", "name"))
            .ok_or(RateError::InvalidOrderField)?;

        let name_prefix = body
            .get("filters")
            .and_then(Value::as_object)
            .and_then(|filters| filters.get("name"))
            .and_then(field_text)
            .filter(|name| !is_cleared(name));

        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or(RateError::InvalidPagination)?;

        let result = self
            .store
            .search_rates(&RateQuery {
                name_prefix,
                order_field,
                direction,
                limit: per_page,
                offset,
            })
            .await?;

        if result.rows.is_empty() {
            return Ok(data(Vec::<Value>::new()));
        }

        let rows: Vec<Value> = result.rows.iter().map(table_row).collect();
        let (from, to) = page_window(offset, per_page, result.total);

        Ok(json!({
            "data": rows,
            "from": from,
            "to": to,
            "per_page": per_page,
            "totalhits": result.total,
            "current_page": page,
        }))
    }
}

/// 1-based bounds of the rows on the current page.
fn page_window(offset: i64, per_page: i64, total: i64) -> (i64, i64) {
    (offset + 1, (offset + per_page).min(total))
}

fn table_row(row: &RateListRow) -> Value {
    fn or_false(value: Option<Value>) -> Value {
        match value {
            Some(Value::String(s)) if s.is_empty() => Value::Bool(false),
            Some(value) => value,
            None => Value::Bool(false),
        }
    }

    json!({
        "id": row.id,
        "tr": [
            { "td": "name", "value": row.name },
            { "td": "currency", "value": or_false(row.currency.clone().map(Value::String)) },
            { "td": "prefix", "value": or_false(row.prefix.clone().map(Value::String)) },
            { "td": "number_of_digits", "value": or_false(row.number_of_digits.map(Value::from)) },
            { "td": "min_rate", "value": row.min_rate },
            { "td": "sec_rate", "value": row.sec_rate },
            { "td": "status", "value": row.status },
        ]
    })
}

fn text_or(body: &Map<String, Value>, key: &str, default: &str) -> String {
    body.get(key)
        .and_then(field_text)
        .filter(|text| !is_cleared(text))
        .unwrap_or_else(|| default.to_string())
}

fn positive(body: &Map<String, Value>, key: &str, default: i64) -> Result<i64, RateError> {
    let Some(text) = body
        .get(key)
        .and_then(field_text)
        .filter(|text| !is_cleared(text))
    else {
        return Ok(default);
    };

    text.trim()
        .parse::<i64>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or(RateError::InvalidPagination)
}
