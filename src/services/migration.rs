//! One-time import of loosely shaped legacy order documents.
//!
//! Old records may lack names, prices, totals or status. They are normalised
//! once here instead of being patched every time they are read.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::clients::{OrderClient, ProductClient};
use crate::domain::{OrderCreate, OrderStatus};
use crate::error::{OrderError, ProductError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyOrderRecord {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default, alias = "quantity_sold")]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    /// Ignored on import; the total is always recomputed.
    #[serde(default)]
    pub total_price: Option<Decimal>,
    #[serde(default, alias = "user_id")]
    pub requester_id: Option<String>,
    #[serde(default, alias = "user_name")]
    pub requester_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "timestamp")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub legacy_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackfillReport {
    /// `(legacy id, new order id)` pairs.
    pub imported: Vec<(Option<String>, String)>,
    pub skipped: Vec<SkippedRecord>,
}

/// Legacy documents split into readable records and ones that failed to decode.
#[derive(Debug, Clone, Default)]
pub struct ParsedLegacyOrders {
    pub records: Vec<LegacyOrderRecord>,
    pub unreadable: Vec<SkippedRecord>,
}

/// Decodes each array item on its own, so one malformed document does not
/// hide the rest. Only a payload that is not a JSON array is an error.
pub fn parse_legacy_orders(json: &str) -> Result<ParsedLegacyOrders, serde_json::Error> {
    let items: Vec<Value> = serde_json::from_str(json)?;
    let mut parsed = ParsedLegacyOrders::default();

    for item in items {
        let legacy_id = ["_id", "id"]
            .iter()
            .find_map(|key| item.get(*key).and_then(Value::as_str))
            .map(str::to_string);
        match serde_json::from_value::<LegacyOrderRecord>(item) {
            Ok(record) => parsed.records.push(record),
            Err(e) => parsed.unreadable.push(SkippedRecord {
                legacy_id,
                reason: format!("unreadable record: {}", e),
            }),
        }
    }
    Ok(parsed)
}

/// Accepts RFC 3339, or a naive timestamp taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn parse_status(raw: Option<&str>) -> Result<OrderStatus, String> {
    match raw.map(str::trim) {
        None | Some("") | Some("pending") => Ok(OrderStatus::Pending),
        Some("approved") => Ok(OrderStatus::Approved),
        Some(other) => Err(format!("unsupported status '{}'", other)),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Imports legacy records into the order store without touching stock.
///
/// Missing product names and prices are filled from the catalog. Records that
/// cannot be made whole, or could not be decoded, are reported as skipped.
#[instrument(skip(products, orders, parsed), fields(records = parsed.records.len(), unreadable = parsed.unreadable.len()))]
pub async fn backfill_orders(
    products: &ProductClient,
    orders: &OrderClient,
    parsed: ParsedLegacyOrders,
) -> Result<BackfillReport, OrderError> {
    let mut report = BackfillReport::default();
    for skipped in parsed.unreadable {
        warn!(legacy_id = ?skipped.legacy_id, reason = %skipped.reason, "Legacy order skipped");
        report.skipped.push(skipped);
    }

    for record in parsed.records {
        let legacy_id = record.id.clone();
        match normalise(products, record).await? {
            Ok(params) => {
                let order = orders.create(params).await?;
                report.imported.push((legacy_id, order.id));
            }
            Err(reason) => {
                warn!(legacy_id = ?legacy_id, reason = %reason, "Legacy order skipped");
                report.skipped.push(SkippedRecord { legacy_id, reason });
            }
        }
    }

    info!(imported = report.imported.len(), skipped = report.skipped.len(), "Legacy backfill finished");
    Ok(report)
}

/// Outer error aborts the import; inner error skips the record.
async fn normalise(products: &ProductClient, record: LegacyOrderRecord) -> Result<Result<OrderCreate, String>, OrderError> {
    let Some(product_id) = non_empty(record.product_id) else {
        return Ok(Err("missing product reference".into()));
    };
    let Some(requester_id) = non_empty(record.requester_id) else {
        return Ok(Err("missing requester reference".into()));
    };
    let quantity = match record.quantity {
        Some(q) if q > 0 => q,
        _ => return Ok(Err("missing or zero quantity".into())),
    };
    let status = match parse_status(record.status.as_deref()) {
        Ok(status) => status,
        Err(reason) => return Ok(Err(reason)),
    };
    let Some(created_at) = record.created_at.as_deref().and_then(parse_timestamp) else {
        return Ok(Err("missing or unreadable timestamp".into()));
    };

    let mut product_name = non_empty(record.product_name);
    let mut unit_price = record.unit_price.filter(|p| *p > Decimal::ZERO);
    if product_name.is_none() || unit_price.is_none() {
        match products.get_product(product_id.clone()).await {
            Ok(Some(product)) => {
                product_name.get_or_insert(product.name);
                unit_price.get_or_insert(product.unit_price);
            }
            Ok(None) => {}
            Err(ProductError::ActorCommunicationError(reason)) => {
                return Err(OrderError::ActorCommunicationError(reason));
            }
            Err(e) => return Ok(Err(e.to_string())),
        }
    }
    let (Some(product_name), Some(unit_price)) = (product_name, unit_price) else {
        return Ok(Err(format!("product {} unresolved and record incomplete", product_id)));
    };

    let requester_name = non_empty(record.requester_name).unwrap_or_else(|| requester_id.clone());
    Ok(Ok(OrderCreate {
        product_id,
        product_name,
        quantity,
        unit_price,
        requester_id,
        requester_name,
        status,
        created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use crate::domain::{Order, Product, ProductCreate};
    use std::str::FromStr;
    use std::sync::atomic::{AtomicU64, Ordering};

    async fn stores() -> (ProductClient, OrderClient, String) {
        let product_ids = AtomicU64::new(1);
        let (product_actor, products) = ResourceActor::<Product>::new("product_store", 16, move || {
            format!("product_{}", product_ids.fetch_add(1, Ordering::SeqCst))
        });
        let order_ids = AtomicU64::new(1);
        let (order_actor, orders) = ResourceActor::<Order>::new("order_store", 16, move || {
            format!("order_{}", order_ids.fetch_add(1, Ordering::SeqCst))
        });
        tokio::spawn(product_actor.run());
        tokio::spawn(order_actor.run());

        let tea = products
            .create(ProductCreate {
                name: "Tea".into(),
                category: "Beverages".into(),
                unit_price: Decimal::from_str("3.00").unwrap(),
                current_stock: 8,
                low_stock_threshold: None,
            })
            .await
            .unwrap();
        (ProductClient::new(products), OrderClient::new(orders), tea.id)
    }

    #[tokio::test]
    async fn backfill_fills_gaps_and_skips_broken_records() {
        let (products, orders, tea_id) = stores().await;
        let json = format!(
            r#"[
                {{"_id": "a1", "product_id": "{tea}", "quantity_sold": 2, "user_id": "u1", "timestamp": "2024-02-01T10:00:00"}},
                {{"_id": "a2", "product_id": "{tea}", "product_name": "Old Tea", "unit_price": 2.5, "total_price": 99,
                  "quantity_sold": 4, "user_id": "u2", "user_name": "Kim", "status": "approved",
                  "timestamp": "2024-02-02T08:30:00Z"}},
                {{"_id": "a3", "quantity_sold": 1, "user_id": "u1", "timestamp": "2024-02-03T10:00:00"}},
                {{"_id": "a4", "product_id": "{tea}", "quantity_sold": 1, "user_id": "u1", "status": "cancelled",
                  "timestamp": "2024-02-03T10:00:00"}},
                {{"_id": "a5", "product_id": "product_99", "quantity_sold": 1, "user_id": "u1",
                  "timestamp": "2024-02-03T10:00:00"}},
                {{"_id": "a6", "product_id": "{tea}", "quantity_sold": -3, "user_id": "u1",
                  "timestamp": "2024-02-03T10:00:00"}},
                {{"_id": "a7", "product_id": "{tea}", "quantity_sold": 1.5, "user_id": "u1",
                  "timestamp": "2024-02-03T10:00:00"}},
                "not a document"
            ]"#,
            tea = tea_id
        );
        let parsed = parse_legacy_orders(&json).unwrap();
        assert_eq!(parsed.records.len(), 5);
        assert_eq!(parsed.unreadable.len(), 3);
        let report = backfill_orders(&products, &orders, parsed).await.unwrap();

        assert_eq!(report.imported.len(), 2);
        let skipped: Vec<Option<String>> = report.skipped.iter().map(|s| s.legacy_id.clone()).collect();
        assert_eq!(
            skipped,
            vec![Some("a6".into()), Some("a7".into()), None, Some("a3".into()), Some("a4".into()), Some("a5".into())]
        );
        assert!(report.skipped[0].reason.starts_with("unreadable record"));

        let stored = orders.list_orders().await.unwrap();
        let first = &stored[0];
        assert_eq!(first.product_name, "Tea");
        assert_eq!(first.total_price, Decimal::from_str("6.00").unwrap());
        assert_eq!(first.requester_name, "u1");
        assert_eq!(first.status, OrderStatus::Pending);

        let second = &stored[1];
        assert_eq!(second.product_name, "Old Tea");
        assert_eq!(second.total_price, Decimal::from_str("10.0").unwrap());
        assert_eq!(second.status, OrderStatus::Approved);

        assert_eq!(products.check_stock(tea_id).await.unwrap(), 8);
    }

    #[test]
    fn payload_that_is_not_an_array_is_an_error() {
        assert!(parse_legacy_orders(r#"{"_id": "a1"}"#).is_err());
        assert!(parse_legacy_orders("[1, 2").is_err());
    }

    #[test]
    fn timestamps_accept_naive_and_offset_forms() {
        assert!(parse_timestamp("2024-02-01T10:00:00").is_some());
        assert!(parse_timestamp("2024-02-01T10:00:00.123456").is_some());
        assert!(parse_timestamp("2024-02-01T10:00:00+07:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
