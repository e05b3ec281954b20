pub mod currencies;
pub mod rate_intents;
pub mod rates;

pub use currencies::Currency;
pub use rate_intents::{Compensation, IntentAction, IntentState, NewRateIntent, RateIntent};
pub use rates::{NewRate, Rate, RateChanges, RateListRow, RateStatus};
