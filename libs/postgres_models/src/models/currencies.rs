use crate::schema::currencies;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// Read-only reference data joined onto rates for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = currencies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Currency {
    pub id: i32,
    pub name: String,
    pub currency: String,
    pub symbol: Option<String>,
}
