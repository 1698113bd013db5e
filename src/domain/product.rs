use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Threshold assigned to products created without an explicit one.
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// A catalog entry. Stock only changes through the stock ledger or admin edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub unit_price: Decimal,
    pub current_stock: u32,
    pub low_stock_threshold: u32,
}

/// Payload for creating a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub category: String,
    pub unit_price: Decimal,
    pub current_stock: u32,
    pub low_stock_threshold: Option<u32>,
}

/// Partial admin edit. `None` leaves the field as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit_price: Option<Decimal>,
    pub current_stock: Option<u32>,
    pub low_stock_threshold: Option<u32>,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.low_stock_threshold
    }
}
