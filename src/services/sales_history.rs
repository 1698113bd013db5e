use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::clients::OrderClient;
use crate::domain::{Order, SalesHistoryPoint};
use crate::error::OrderError;

/// Groups orders by UTC calendar day and sums their quantities.
///
/// Days without orders are absent from the result, never zero-filled.
pub fn group_by_day<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Vec<SalesHistoryPoint> {
    let mut days = BTreeMap::new();
    for order in orders {
        *days.entry(order.created_at.date_naive()).or_insert(0u64) += u64::from(order.quantity);
    }
    days.into_iter()
        .map(|(day, quantity)| SalesHistoryPoint::new(day, quantity))
        .collect()
}

/// Sales History Aggregator over the order store.
#[derive(Clone)]
pub struct SalesHistory {
    orders: OrderClient,
}

impl SalesHistory {
    pub fn new(orders: OrderClient) -> Self {
        Self { orders }
    }

    /// Per-day demand for one product from `since` onwards, oldest day first.
    /// Orders of every status count.
    #[instrument(skip(self))]
    pub async fn aggregate(&self, product_id: String, since: DateTime<Utc>) -> Result<Vec<SalesHistoryPoint>, OrderError> {
        let orders = self.orders.orders_for_product_since(product_id, since).await?;
        let series = group_by_day(&orders);
        debug!(orders = orders.len(), days = series.len(), "Sales history aggregated");
        Ok(series)
    }
}
