use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{Order, OrderCreate};
use crate::error::OrderError;
use crate::order_actor::{OrderAction, OrderActionResult};

/// Handle to the order store.
///
/// This is plain persistence; the approval workflow around it lives in
/// [`crate::services::OrderWorkflow`].
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
}

impl_basic_client!(OrderClient, Order, OrderError, order);

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    // Reverse first so equal timestamps still list the later insert first.
    orders.reverse();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

impl OrderClient {
    #[instrument(skip(self, params), fields(product_id = %params.product_id, quantity = params.quantity))]
    pub async fn create(&self, params: OrderCreate) -> Result<Order, OrderError> {
        debug!("Sending request");
        Ok(self.inner.create(params).await?)
    }

    #[instrument(skip(self))]
    pub async fn require_order(&self, id: String) -> Result<Order, OrderError> {
        self.get_order(id.clone())
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("Order {}", id)))
    }

    /// Flips a pending order to approved. Returns `false` when it already was.
    #[instrument(skip(self))]
    pub async fn mark_approved(&self, id: String, approver_id: String, at: DateTime<Utc>) -> Result<bool, OrderError> {
        debug!("Sending request");
        match self.inner.perform_action(id, OrderAction::Approve { approver_id, at }).await? {
            OrderActionResult::Approve(changed) => Ok(changed),
        }
    }

    /// Orders for one product created at or after `since`, in insertion order.
    #[instrument(skip(self))]
    pub async fn orders_for_product_since(
        &self,
        product_id: String,
        since: DateTime<Utc>,
    ) -> Result<Vec<Order>, OrderError> {
        debug!("Sending request");
        Ok(self
            .inner
            .query(move |o: &Order| o.product_id == product_id && o.created_at >= since)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn orders_newest_first(&self) -> Result<Vec<Order>, OrderError> {
        Ok(newest_first(self.list_orders().await?))
    }

    #[instrument(skip(self))]
    pub async fn orders_for_requester(&self, requester_id: String) -> Result<Vec<Order>, OrderError> {
        debug!("Sending request");
        let orders = self
            .inner
            .query(move |o: &Order| o.requester_id == requester_id)
            .await?;
        Ok(newest_first(orders))
    }
}
