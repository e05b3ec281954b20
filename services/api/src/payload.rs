//! Typed view of a create/update body.
//!
//! | field            | `""` / `"--"` / `null` | value                        |
//! |------------------|------------------------|------------------------------|
//! | name             | omitted                | string                       |
//! | prefix           | NULL                   | string                       |
//! | number_of_digits | NULL                   | integer                      |
//! | min_rate         | omitted                | decimal                      |
//! | sec_rate         | omitted                | decimal                      |
//! | currency_id      | NULL                   | integer                      |
//! | status           | omitted                | `ACTIVE`/`INACTIVE`, boolean |
//!
//! Keys outside the table are ignored.

use postgres_models::{NewRate, RateChanges, RateStatus};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::validation::{field_text, is_cleared, parse_decimal, FieldErrors};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Absent,
    Cleared,
    Value(T),
}

impl<T> Field<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Field::Value(value) => Some(value),
            Field::Absent | Field::Cleared => None,
        }
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Field::Value(value) => Some(value),
            Field::Absent | Field::Cleared => None,
        }
    }

    /// Change for a NULL-able column: absent leaves it alone, cleared writes NULL.
    fn nullable_change(self) -> Option<Option<T>> {
        match self {
            Field::Absent => None,
            Field::Cleared => Some(None),
            Field::Value(value) => Some(Some(value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatePayload {
    pub name: Field<String>,
    pub prefix: Field<String>,
    pub number_of_digits: Field<i32>,
    pub min_rate: Field<Decimal>,
    pub sec_rate: Field<Decimal>,
    pub currency_id: Field<i32>,
    pub status: Field<RateStatus>,
}

impl RatePayload {
    pub fn from_body(body: &Map<String, Value>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let payload = Self {
            name: read(body, "name", |s| Some(s.to_string()), &mut errors),
            prefix: read(body, "prefix", |s| Some(s.to_string()), &mut errors),
            number_of_digits: read(body, "number_of_digits", |s| s.parse().ok(), &mut errors),
            min_rate: read(body, "min_rate", parse_decimal, &mut errors),
            sec_rate: read(body, "sec_rate", parse_decimal, &mut errors),
            currency_id: read(body, "currency_id", |s| s.parse().ok(), &mut errors),
            status: read(body, "status", RateStatus::parse, &mut errors),
        };

        if errors.is_empty() {
            Ok(payload)
        } else {
            Err(errors)
        }
    }

    pub fn into_new_rate(self) -> Result<NewRate, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = self.name.value();
        let min_rate = self.min_rate.value();
        let sec_rate = self.sec_rate.value();

        for (field, missing) in [
            ("name", name.is_none()),
            ("min_rate", min_rate.is_none()),
            ("sec_rate", sec_rate.is_none()),
        ] {
            if missing {
                errors.insert(field.to_string(), format!("{} is required", field));
            }
        }

        match (name, min_rate, sec_rate) {
            (Some(name), Some(min_rate), Some(sec_rate)) if errors.is_empty() => {
                let mut rate = NewRate::new(name, min_rate, sec_rate);
                rate.prefix = self.prefix.value();
                rate.number_of_digits = self.number_of_digits.value();
                rate.currency_id = self.currency_id.value();
                if let Some(status) = self.status.value() {
                    rate.status = status.as_str().to_string();
                }
                Ok(rate)
            }
            _ => Err(errors),
        }
    }

    pub fn into_changes(self) -> RateChanges {
        RateChanges {
            name: self.name.value(),
            prefix: self.prefix.nullable_change(),
            number_of_digits: self.number_of_digits.nullable_change(),
            min_rate: self.min_rate.value(),
            sec_rate: self.sec_rate.value(),
            currency_id: self.currency_id.nullable_change(),
            status: self.status.value().map(|s| s.as_str().to_string()),
        }
    }
}

fn read<T>(
    body: &Map<String, Value>,
    field: &str,
    parse: impl Fn(&str) -> Option<T>,
    errors: &mut FieldErrors,
) -> Field<T> {
    let Some(value) = body.get(field) else {
        return Field::Absent;
    };

    match field_text(value) {
        Some(text) if is_cleared(&text) => Field::Cleared,
        Some(text) => match parse(&text) {
            Some(parsed) => Field::Value(parsed),
            None => {
                errors.insert(field.to_string(), format!("{} has an invalid value", field));
                Field::Absent
            }
        },
        None => {
            errors.insert(field.to_string(), format!("{} has an invalid value", field));
            Field::Absent
        }
    }
}
