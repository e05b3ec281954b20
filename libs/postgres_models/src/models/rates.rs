use crate::schema::rates;
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Insertable, AsChangeset,
)]
#[diesel(table_name = rates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct Rate {
    pub id: i32,
    pub name: String,
    pub prefix: Option<String>,
    pub number_of_digits: Option<i32>,
    pub min_rate: Decimal,
    pub sec_rate: Decimal,
    pub currency_id: Option<i32>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Insertable)]
#[diesel(table_name = rates)]
pub struct NewRate {
    pub name: String,
    pub prefix: Option<String>,
    pub number_of_digits: Option<i32>,
    pub min_rate: Decimal,
    pub sec_rate: Decimal,
    pub currency_id: Option<i32>,
    pub status: String,
}

impl NewRate {
    pub fn new(name: String, min_rate: Decimal, sec_rate: Decimal) -> Self {
        Self {
            name,
            prefix: None,
            number_of_digits: None,
            min_rate,
            sec_rate,
            currency_id: None,
            status: RateStatus::Active.as_str().to_string(),
        }
    }

    /// Materialize the row that an insert with `id` would produce.
    pub fn into_rate(self, id: i32) -> Rate {
        Rate {
            id,
            name: self.name,
            prefix: self.prefix,
            number_of_digits: self.number_of_digits,
            min_rate: self.min_rate,
            sec_rate: self.sec_rate,
            currency_id: self.currency_id,
            status: self.status,
        }
    }
}

/// Partial update of a rate row.
///
/// The outer `Option` says whether the column is touched at all; for nullable
/// columns the inner `Option` distinguishes "set NULL" from "set value".
#[derive(Debug, Clone, Default, PartialEq, AsChangeset)]
#[diesel(table_name = rates)]
pub struct RateChanges {
    pub name: Option<String>,
    pub prefix: Option<Option<String>>,
    pub number_of_digits: Option<Option<i32>>,
    pub min_rate: Option<Decimal>,
    pub sec_rate: Option<Decimal>,
    pub currency_id: Option<Option<i32>>,
    pub status: Option<String>,
}

impl RateChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, rate: &mut Rate) {
        if let Some(name) = &self.name {
            rate.name = name.clone();
        }
        if let Some(prefix) = &self.prefix {
            rate.prefix = prefix.clone();
        }
        if let Some(digits) = self.number_of_digits {
            rate.number_of_digits = digits;
        }
        if let Some(min_rate) = self.min_rate {
            rate.min_rate = min_rate;
        }
        if let Some(sec_rate) = self.sec_rate {
            rate.sec_rate = sec_rate;
        }
        if let Some(currency_id) = self.currency_id {
            rate.currency_id = currency_id;
        }
        if let Some(status) = &self.status {
            rate.status = status.clone();
        }
    }
}

/// Flattened row used by the paginated listing, with the currency name joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Queryable)]
pub struct RateListRow {
    pub id: i32,
    pub name: String,
    pub prefix: Option<String>,
    pub number_of_digits: Option<i32>,
    pub min_rate: Decimal,
    pub sec_rate: Decimal,
    pub currency: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RateStatus {
    Active,
    Inactive,
}

impl RateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "ACTIVE" | "TRUE" => Some(Self::Active),
            "INACTIVE" | "FALSE" => Some(Self::Inactive),
            _ => None,
        }
    }
}
