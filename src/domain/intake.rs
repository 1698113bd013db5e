use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One stock upload, logged before it is merged into the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockIntake {
    pub id: String,
    pub product_name: String,
    pub category: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StockIntakeCreate {
    pub product_name: String,
    pub category: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub uploaded_at: DateTime<Utc>,
}
