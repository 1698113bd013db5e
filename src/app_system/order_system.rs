use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::actor_framework::ResourceActor;
use crate::api::ShopApi;
use crate::app_system::AppConfig;
use crate::clients::{OrderClient, ProductClient, StockLedger};
use crate::domain::{Order, Product, StockIntake};
use crate::services::{NotificationService, OrderWorkflow, Reporting, SalesHistory};

fn sequential_ids(prefix: &'static str) -> impl Fn() -> String + Send + Sync + 'static {
    let counter = Arc::new(AtomicU64::new(1));
    move || format!("{}_{}", prefix, counter.fetch_add(1, Ordering::SeqCst))
}

/// Starts every store actor and the notification service, and wires the
/// clients and services that sit on top of them.
pub struct OrderSystem {
    pub product_client: ProductClient,
    pub order_client: OrderClient,
    pub stock_ledger: StockLedger,
    pub workflow: OrderWorkflow,
    pub sales_history: SalesHistory,
    pub reporting: Reporting,
    pub api: ShopApi,
    handles: Vec<JoinHandle<()>>,
}

impl OrderSystem {
    pub fn new(config: &AppConfig) -> Self {
        let buffer_size = config.actor.buffer_size;

        // 1. Stores
        let (product_actor, products) = ResourceActor::<Product>::new("product_store", buffer_size, sequential_ids("product"));
        let (order_actor, orders) = ResourceActor::<Order>::new("order_store", buffer_size, sequential_ids("order"));
        let (intake_actor, intakes) = ResourceActor::<StockIntake>::new("intake_store", buffer_size, sequential_ids("intake"));
        let (notification_service, notifications) = NotificationService::new(config.notification.buffer_size);

        let handles = vec![
            tokio::spawn(product_actor.run()),
            tokio::spawn(order_actor.run()),
            tokio::spawn(intake_actor.run()),
            tokio::spawn(notification_service.run()),
        ];

        // 2. Clients
        let product_client = ProductClient::new(products.clone());
        let order_client = OrderClient::new(orders);
        let stock_ledger = StockLedger::new(products, intakes, config.catalog.default_low_stock_threshold);

        // 3. Services
        let workflow = OrderWorkflow::new(
            order_client.clone(),
            product_client.clone(),
            stock_ledger.clone(),
            notifications,
            config.approval_settings(),
        );
        let sales_history = SalesHistory::new(order_client.clone());
        let reporting = Reporting::new(product_client.clone(), sales_history.clone(), config.forecast_settings());
        let api = ShopApi::new(workflow.clone(), stock_ledger.clone(), reporting.clone());

        info!(buffer_size, "Order system started");
        Self {
            product_client,
            order_client,
            stock_ledger,
            workflow,
            sales_history,
            reporting,
            api,
            handles,
        }
    }

    /// Drops every client so the actors see their channels close, then waits
    /// for them to finish. Clones held elsewhere keep their actor alive.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        let Self {
            product_client,
            order_client,
            stock_ledger,
            workflow,
            sales_history,
            reporting,
            api,
            handles,
        } = self;
        drop((product_client, order_client, stock_ledger, workflow, sales_history, reporting, api));

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
