//! Typed handles over the store actors.

#[macro_use]
mod macros;

pub mod order_client;
pub mod product_client;
pub mod stock_ledger;

pub use order_client::OrderClient;
pub use product_client::ProductClient;
pub use stock_ledger::{ReplenishRequest, Replenishment, StockLedger};
