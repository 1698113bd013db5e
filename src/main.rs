use anyhow::Context;
use rust_decimal::Decimal;
use tracing::{error, info, Instrument};

use stockflow::api::CreateOrderRequest;
use stockflow::app_system::{setup_tracing, AppConfig, OrderSystem};
use stockflow::clients::ReplenishRequest;
use stockflow::domain::Principal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_tracing();

    let config = AppConfig::load().context("loading configuration")?;
    info!(?config, "Starting stockflow");

    let system = OrderSystem::new(&config);
    let admin = Principal::admin("admin_1", "Avery");
    let staff = Principal::staff("staff_1", "Robin");

    let span = tracing::info_span!("stock_upload");
    let upload = async {
        system
            .api
            .replenish_stock(
                &admin,
                ReplenishRequest {
                    product_name: "Arabica Beans 1kg".into(),
                    category: "Coffee".into(),
                    quantity: 12,
                    unit_price: Decimal::new(1850, 2),
                },
            )
            .await
    }
    .instrument(span)
    .await
    .map_err(|e| anyhow::anyhow!("{}", e.message))?;
    info!(intake_id = %upload.id, message = %upload.message, "Stock uploaded");

    let product = system
        .product_client
        .list_products()
        .await?
        .into_iter()
        .next()
        .context("catalog is empty after upload")?;

    let span = tracing::info_span!("order_processing");
    async {
        for quantity in [5, 4, 6] {
            let request = CreateOrderRequest {
                product_id: product.id.clone(),
                quantity,
            };
            match system.api.create_order(&staff, request).await {
                Ok(created) => match system.api.approve_order(&admin, created.id.clone()).await {
                    Ok(approved) => info!(order_id = %created.id, message = %approved.message, "Order processed"),
                    Err(e) => error!(order_id = %created.id, kind = ?e.kind, error = %e.message, "Approval failed"),
                },
                Err(e) => error!(kind = ?e.kind, error = %e.message, "Order request failed"),
            }
        }
    }
    .instrument(span)
    .await;

    match system.api.list_predictions().await {
        Ok(rows) => {
            for row in rows {
                info!(
                    product = %row.product_name,
                    current_stock = row.current_stock,
                    predicted_need = row.predicted_need,
                    status = row.status.as_str(),
                    "Forecast"
                );
            }
        }
        Err(e) => error!(error = %e.message, "Forecast failed"),
    }

    let low_stock = system.product_client.low_stock_products().await?;
    info!(count = low_stock.len(), "Low stock products");

    system.shutdown().await.map_err(anyhow::Error::msg)?;
    info!("Application completed successfully");
    Ok(())
}
