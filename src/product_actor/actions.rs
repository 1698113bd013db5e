use rust_decimal::Decimal;

/// Custom actions for Product entities.
///
/// Each action runs inside the product store's single message loop, so a check
/// and the write that depends on it can never interleave with another caller.
#[derive(Debug, Clone)]
pub enum ProductAction {
    /// Reads the current stock level without modifying it.
    CheckStock,
    /// Compare-and-decrement: subtracts the quantity only if enough stock remains.
    Decrement(u32),
    /// Adds received stock and overwrites the unit price.
    Replenish { quantity: u32, unit_price: Decimal },
}

/// Results from ProductActions - variants match 1:1 with ProductAction
#[derive(Debug, Clone, PartialEq)]
pub enum ProductActionResult {
    CheckStock(u32),
    Decrement(StockOutcome),
    Replenish(u32),
}

/// Outcome of a compare-and-decrement. A shortfall is a normal answer, not a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOutcome {
    Applied { remaining: u32 },
    Insufficient { requested: u32, available: u32 },
}
