use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Total quantity requested for one product on one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesHistoryPoint {
    pub day: NaiveDate,
    pub quantity: u64,
}

impl SalesHistoryPoint {
    pub fn new(day: NaiveDate, quantity: u64) -> Self {
        Self { day, quantity }
    }
}
