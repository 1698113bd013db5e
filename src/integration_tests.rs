//! End-to-end scenarios against a fully wired [`OrderSystem`].

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::api::CreateOrderRequest;
    use crate::app_system::{AppConfig, OrderSystem};
    use crate::clients::ReplenishRequest;
    use crate::domain::{OrderStatus, Principal, ProductCreate, ProductPatch, DEFAULT_LOW_STOCK_THRESHOLD};
    use crate::error::{ErrorKind, OrderError};
    use crate::services::{backfill_orders, parse_legacy_orders, ApprovalOutcome, StockStatus};

    fn admin() -> Principal {
        Principal::admin("admin_1", "Ada")
    }

    fn staff() -> Principal {
        Principal::staff("staff_1", "Sam")
    }

    async fn seed(system: &OrderSystem, name: &str, stock: u32, price: &str) -> String {
        system
            .product_client
            .create_product(
                &admin(),
                ProductCreate {
                    name: name.into(),
                    category: "Pantry".into(),
                    unit_price: Decimal::from_str(price).unwrap(),
                    current_stock: stock,
                    low_stock_threshold: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn concurrent_approvals_never_oversell() {
        let system = OrderSystem::new(&AppConfig::default());
        let product_id = seed(&system, "Olive Oil", 10, "7.00").await;

        // Both pass the advisory check because creation reserves nothing.
        let a = system.workflow.create_order(&staff(), product_id.clone(), 6).await.unwrap();
        let b = system.workflow.create_order(&staff(), product_id.clone(), 5).await.unwrap();

        let approver = admin();
        let (first, second) = tokio::join!(
            system.workflow.approve_order(&approver, a.id.clone()),
            system.workflow.approve_order(&approver, b.id.clone()),
        );

        let failures: Vec<&OrderError> = [&first, &second].into_iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].kind(), ErrorKind::InsufficientStock);

        let remaining = system.product_client.check_stock(product_id).await.unwrap();
        assert!(remaining == 4 || remaining == 5);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn racing_approvals_of_one_order_decrement_once() {
        let system = OrderSystem::new(&AppConfig::default());
        let product_id = seed(&system, "Honey", 9, "5.00").await;
        let order = system.workflow.create_order(&staff(), product_id.clone(), 3).await.unwrap();

        let approver = admin();
        let (first, second) = tokio::join!(
            system.workflow.approve_order(&approver, order.id.clone()),
            system.workflow.approve_order(&approver, order.id.clone()),
        );
        let outcomes = [first.unwrap(), second.unwrap()];
        let approved = outcomes.iter().filter(|o| matches!(o, ApprovalOutcome::Approved(_))).count();
        let already = outcomes.iter().filter(|o| matches!(o, ApprovalOutcome::AlreadyApproved(_))).count();
        assert_eq!((approved, already), (1, 1));
        assert_eq!(system.product_client.check_stock(product_id).await.unwrap(), 6);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn approve_twice_through_api() {
        let system = OrderSystem::new(&AppConfig::default());
        let product_id = seed(&system, "Rice", 20, "1.50").await;

        let created = system
            .api
            .create_order(&staff(), CreateOrderRequest { product_id: product_id.clone(), quantity: 8 })
            .await
            .unwrap();
        assert_eq!(created.status, OrderStatus::Pending);

        let first = system.api.approve_order(&admin(), created.id.clone()).await.unwrap();
        let second = system.api.approve_order(&admin(), created.id.clone()).await.unwrap();
        assert_eq!(first.message, "Order approved and stock updated");
        assert_eq!(second.message, "Order already approved");
        assert_eq!(second.status, OrderStatus::Approved);
        assert_eq!(system.product_client.check_stock(product_id).await.unwrap(), 12);

        let err = system.api.approve_order(&staff(), created.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn order_price_is_a_snapshot() {
        let system = OrderSystem::new(&AppConfig::default());
        let product_id = seed(&system, "Flour", 30, "2.00").await;
        let order = system.workflow.create_order(&staff(), product_id.clone(), 3).await.unwrap();

        let patch = ProductPatch {
            unit_price: Some(Decimal::from_str("9.99").unwrap()),
            ..ProductPatch::default()
        };
        system.product_client.update_product(&admin(), product_id, patch).await.unwrap();
        system.workflow.approve_order(&admin(), order.id.clone()).await.unwrap();

        let stored = system.order_client.require_order(order.id).await.unwrap();
        assert_eq!(stored.unit_price, Decimal::from_str("2.00").unwrap());
        assert_eq!(stored.total_price, Decimal::from_str("6.00").unwrap());
        assert_eq!(stored.total_price, stored.unit_price * Decimal::from(stored.quantity));
        assert!(stored.approved_at.is_some());

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn replenish_creates_then_merges() {
        let system = OrderSystem::new(&AppConfig::default());
        let upload = |quantity, price: &str| ReplenishRequest {
            product_name: "Lentils".into(),
            category: "Pantry".into(),
            quantity,
            unit_price: Decimal::from_str(price).unwrap(),
        };

        let first = system.api.replenish_stock(&admin(), upload(15, "3.10")).await.unwrap();
        assert_eq!(first.id, "intake_1");
        assert_eq!(first.message, "Stock logged and catalog synced");
        let second = system.api.replenish_stock(&admin(), upload(5, "3.40")).await.unwrap();
        assert_eq!(second.id, "intake_2");

        let products = system.product_client.list_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].current_stock, 20);
        assert_eq!(products[0].unit_price, Decimal::from_str("3.40").unwrap());
        assert_eq!(products[0].low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);

        let err = system.api.replenish_stock(&staff(), upload(1, "3.40")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn predictions_follow_recent_trend() {
        let system = OrderSystem::new(&AppConfig::default());
        let trending = seed(&system, "Espresso", 60, "12.00").await;
        let quiet = seed(&system, "Decaf", 5, "11.00").await;

        let now = Utc::now();
        for (days_ago, quantity) in [(4, 5), (3, 6), (2, 7), (1, 8), (0, 10)] {
            system
                .workflow
                .create_order_at(&staff(), trending.clone(), quantity, now - Duration::days(days_ago))
                .await
                .unwrap();
        }
        // Outside the 30 day window.
        system
            .workflow
            .create_order_at(&staff(), quiet.clone(), 5, now - Duration::days(45))
            .await
            .unwrap();

        let rows = system.api.list_predictions().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_id, trending);
        assert_eq!(rows[0].predicted_need, 101);
        assert_eq!(rows[0].status, StockStatus::Shortage);
        assert_eq!(rows[1].product_id, quiet);
        assert_eq!(rows[1].predicted_need, 0);
        assert_eq!(rows[1].status, StockStatus::Stocked);

        let history = system.sales_history.aggregate(quiet, now - Duration::days(30)).await.unwrap();
        assert!(history.is_empty());

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn order_listings_respect_roles() {
        let system = OrderSystem::new(&AppConfig::default());
        let product_id = seed(&system, "Sugar", 50, "0.90").await;
        let other = Principal::staff("staff_2", "Lee");
        let now = Utc::now();

        system.workflow.create_order_at(&staff(), product_id.clone(), 1, now - Duration::hours(2)).await.unwrap();
        system.workflow.create_order_at(&other, product_id.clone(), 2, now - Duration::hours(1)).await.unwrap();
        system.workflow.create_order_at(&staff(), product_id, 3, now).await.unwrap();

        let mine: Vec<u32> = system.workflow.my_orders(&staff()).await.unwrap().iter().map(|o| o.quantity).collect();
        assert_eq!(mine, vec![3, 1]);
        let all: Vec<u32> = system.workflow.list_all_orders(&admin()).await.unwrap().iter().map(|o| o.quantity).collect();
        assert_eq!(all, vec![3, 2, 1]);

        system.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn backfilled_history_feeds_forecast() {
        let system = OrderSystem::new(&AppConfig::default());
        let product_id = seed(&system, "Oats", 100, "2.20").await;
        let day = |n: i64| (Utc::now() - Duration::days(n)).format("%Y-%m-%dT%H:%M:%S").to_string();

        let json = format!(
            r#"[
                {{"_id": "x1", "product_id": "{id}", "quantity_sold": 5, "user_id": "u1", "timestamp": "{d2}"}},
                {{"_id": "x2", "product_id": "{id}", "quantity_sold": 5, "user_id": "u1", "status": "approved", "timestamp": "{d1}"}},
                {{"_id": "x3", "product_id": "{id}", "quantity_sold": 5, "user_id": "u2", "timestamp": "{d0}"}}
            ]"#,
            id = product_id,
            d2 = day(2),
            d1 = day(1),
            d0 = day(0),
        );
        let parsed = parse_legacy_orders(&json).unwrap();
        let report = backfill_orders(&system.product_client, &system.order_client, parsed).await.unwrap();
        assert_eq!(report.imported.len(), 3);
        assert_eq!(system.product_client.check_stock(product_id).await.unwrap(), 100);

        let rows = system.api.list_predictions().await.unwrap();
        assert_eq!(rows[0].predicted_need, 35);

        system.shutdown().await.unwrap();
    }

    fn stock_and_orders() -> impl Strategy<Value = (u32, Vec<u32>)> {
        (1u32..40).prop_flat_map(|stock| (Just(stock), prop::collection::vec(1..=stock, 1..8)))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn approvals_account_for_every_unit((stock, quantities) in stock_and_orders()) {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let (remaining, approved_total) = runtime.block_on(async move {
                let system = OrderSystem::new(&AppConfig::default());
                let product_id = seed(&system, "Widget", stock, "1.00").await;

                let mut order_ids = Vec::new();
                for quantity in &quantities {
                    let order = system.workflow.create_order(&staff(), product_id.clone(), *quantity).await.unwrap();
                    order_ids.push((order.id, *quantity));
                }

                let mut tasks = Vec::new();
                for (order_id, quantity) in order_ids {
                    let workflow = system.workflow.clone();
                    tasks.push(tokio::spawn(async move {
                        (workflow.approve_order(&admin(), order_id).await, quantity)
                    }));
                }

                let mut approved_total = 0u32;
                for task in tasks {
                    match task.await.unwrap() {
                        (Ok(_), quantity) => approved_total += quantity,
                        (Err(e), _) => assert_eq!(e.kind(), ErrorKind::InsufficientStock),
                    }
                }
                let remaining = system.product_client.check_stock(product_id).await.unwrap();
                system.shutdown().await.unwrap();
                (remaining, approved_total)
            });

            prop_assert!(approved_total <= stock);
            prop_assert_eq!(remaining, stock - approved_total);
        }
    }
}
