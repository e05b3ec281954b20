//! Declarative per-field form rules for rate payloads.
//!
//! Rules run against the textual form of each value, before any storage or
//! conf-service interaction. Every field is checked and the first failing rule
//! of each field is reported.

use postgres_models::RateStatus;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Unsigned whole number.
    Integer,
    /// Decimal number, optionally signed.
    Numeric,
    AlphaNumericDash,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Max(usize),
    Min(usize),
    Type(Kind),
}

pub struct FieldRules {
    pub field: &'static str,
    pub rules: &'static [Rule],
}

pub const CREATE_RULES: &[FieldRules] = &[
    FieldRules {
        field: "name",
        rules: &[Rule::Required, Rule::Max(40), Rule::Type(Kind::AlphaNumericDash)],
    },
    FieldRules {
        field: "prefix",
        rules: &[Rule::Max(10)],
    },
    FieldRules {
        field: "number_of_digits",
        rules: &[Rule::Max(2), Rule::Min(1), Rule::Type(Kind::Integer)],
    },
    FieldRules {
        field: "min_rate",
        rules: &[Rule::Required, Rule::Type(Kind::Numeric)],
    },
    FieldRules {
        field: "sec_rate",
        rules: &[Rule::Required, Rule::Type(Kind::Numeric)],
    },
    FieldRules {
        field: "currency_id",
        rules: &[Rule::Max(11), Rule::Type(Kind::Integer)],
    },
    FieldRules {
        field: "status",
        rules: &[Rule::Type(Kind::Status)],
    },
];

/// Same as [`CREATE_RULES`] except that an update may leave the name untouched.
pub const UPDATE_RULES: &[FieldRules] = &[
    FieldRules {
        field: "name",
        rules: &[Rule::Max(40), Rule::Type(Kind::AlphaNumericDash)],
    },
    FieldRules {
        field: "prefix",
        rules: &[Rule::Max(10)],
    },
    FieldRules {
        field: "number_of_digits",
        rules: &[Rule::Max(2), Rule::Min(1), Rule::Type(Kind::Integer)],
    },
    FieldRules {
        field: "min_rate",
        rules: &[Rule::Required, Rule::Type(Kind::Numeric)],
    },
    FieldRules {
        field: "sec_rate",
        rules: &[Rule::Required, Rule::Type(Kind::Numeric)],
    },
    FieldRules {
        field: "currency_id",
        rules: &[Rule::Max(11), Rule::Type(Kind::Integer)],
    },
    FieldRules {
        field: "status",
        rules: &[Rule::Type(Kind::Status)],
    },
];

/// Textual form of a payload value. `None` for arrays and objects.
///
/// Booleans become the `TRUE`/`FALSE` storage tokens.
pub fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("TRUE".to_string()),
        Value::Bool(false) => Some("FALSE".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// `""`, `"--"` and `null` all mean "no value".
pub fn is_cleared(text: &str) -> bool {
    text.is_empty() || text == "--"
}

pub fn validate(body: &Map<String, Value>, table: &[FieldRules]) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    for spec in table {
        let text = match body.get(spec.field) {
            None => String::new(),
            Some(value) => match field_text(value) {
                Some(text) => text,
                None => {
                    errors.insert(
                        spec.field.to_string(),
                        format!("{} has an invalid value", spec.field),
                    );
                    continue;
                }
            },
        };

        if let Some(message) = check(spec.field, &text, spec.rules) {
            errors.insert(spec.field.to_string(), message);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check(field: &str, text: &str, rules: &[Rule]) -> Option<String> {
    if is_cleared(text) {
        return rules
            .contains(&Rule::Required)
            .then(|| format!("{} is required", field));
    }

    let length = text.chars().count();
    rules.iter().find_map(|rule| match *rule {
        Rule::Required => None,
        Rule::Max(max) if length > max => {
            Some(format!("{} must not exceed {} characters", field, max))
        }
        Rule::Min(min) if length < min => {
            Some(format!("{} must have at least {} characters", field, min))
        }
        Rule::Type(kind) if !matches_kind(text, kind) => Some(kind_message(field, kind)),
        _ => None,
    })
}

fn matches_kind(text: &str, kind: Kind) -> bool {
    match kind {
        Kind::Integer => text.chars().all(|c| c.is_ascii_digit()),
        Kind::Numeric => parse_decimal(text).is_some(),
        Kind::AlphaNumericDash => text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-'),
        Kind::Status => RateStatus::parse(text).is_some(),
    }
}

/// Accepts plain (`0.0025`) and scientific (`2.5e-3`) notation.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn kind_message(field: &str, kind: Kind) -> String {
    match kind {
        Kind::Integer => format!("{} must be a whole number", field),
        Kind::Numeric => format!("{} must be numeric", field),
        Kind::AlphaNumericDash => {
            format!("{} may only contain letters, numbers and dashes", field)
        }
        Kind::Status => format!("{} must be ACTIVE or INACTIVE", field),
    }
}
