use crate::models::rates::Rate;
use crate::schema::rate_intents;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable record of a local rate mutation awaiting confirmation by the conf service.
#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable)]
#[diesel(table_name = rate_intents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RateIntent {
    pub id: Uuid,
    pub rate_name: String,
    /// Unknown for creates, whose row does not exist yet.
    pub rate_id: Option<i32>,
    pub action: String,
    pub compensation: serde_json::Value,
    pub state: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RateIntent {
    pub fn compensation(&self) -> Result<Compensation, serde_json::Error> {
        serde_json::from_value(self.compensation.clone())
    }

    pub fn action(&self) -> Option<IntentAction> {
        IntentAction::parse(&self.action)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Insertable)]
#[diesel(table_name = rate_intents)]
pub struct NewRateIntent {
    pub id: Uuid,
    pub rate_name: String,
    pub rate_id: Option<i32>,
    pub action: String,
    pub compensation: serde_json::Value,
    pub state: String,
}

impl NewRateIntent {
    pub fn new(
        action: IntentAction,
        rate_name: String,
        compensation: &Compensation,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            rate_name,
            rate_id: None,
            action: action.as_str().to_string(),
            compensation: serde_json::to_value(compensation)?,
            state: IntentState::Pending.as_str().to_string(),
        })
    }

    pub fn with_rate_id(mut self, rate_id: i32) -> Self {
        self.rate_id = Some(rate_id);
        self
    }

    pub fn into_intent(self, now: DateTime<Utc>) -> RateIntent {
        RateIntent {
            id: self.id,
            rate_name: self.rate_name,
            rate_id: self.rate_id,
            action: self.action,
            compensation: self.compensation,
            state: self.state,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentAction {
    Create,
    Update,
    Delete,
    Enable,
    Disable,
}

impl IntentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            "enable" => Some(Self::Enable),
            "disable" => Some(Self::Disable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentState {
    Pending,
    Committed,
    Compensated,
    /// Left unapplied because a later change to the same rate took over.
    Superseded,
    Failed,
}

impl IntentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Committed => "committed",
            Self::Compensated => "compensated",
            Self::Superseded => "superseded",
            Self::Failed => "failed",
        }
    }
}

/// Inverse local write that undoes a provisional mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Compensation {
    /// Remove the row inserted under this (case-insensitively unique) name.
    DeleteCreated { name: String },
    /// Put back the full row, original primary key included.
    RestoreRow { row: Rate },
    RestoreStatus { id: i32, status: String },
}
