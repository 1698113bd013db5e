use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::domain::Order;

/// Fire-and-forget workflow events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    OrderCreated { order: Order },
    OrderApproved { order: Order },
}

impl NotificationEvent {
    pub fn order(&self) -> &Order {
        match self {
            NotificationEvent::OrderCreated { order } | NotificationEvent::OrderApproved { order } => order,
        }
    }
}

/// Sending side handed to the workflow. Delivery problems are logged and
/// never reach the caller.
#[derive(Clone)]
pub struct NotificationClient {
    sender: mpsc::Sender<NotificationEvent>,
}

impl NotificationClient {
    pub fn new(sender: mpsc::Sender<NotificationEvent>) -> Self {
        Self { sender }
    }

    pub fn notify(&self, event: NotificationEvent) {
        if let Err(e) = self.sender.try_send(event) {
            warn!(error = %e, "Notification dropped");
        }
    }
}

/// Consumes events and delivers them to the admin log.
pub struct NotificationService {
    receiver: mpsc::Receiver<NotificationEvent>,
}

impl NotificationService {
    pub fn new(buffer_size: usize) -> (Self, NotificationClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        (Self { receiver }, NotificationClient::new(sender))
    }

    #[instrument(name = "notification_service", skip(self))]
    pub async fn run(mut self) {
        info!("Notification service starting");
        let mut delivered = 0u64;
        while let Some(event) = self.receiver.recv().await {
            match &event {
                NotificationEvent::OrderCreated { order } => info!(
                    order_id = %order.id,
                    requester = %order.requester_name,
                    product = %order.product_name,
                    quantity = order.quantity,
                    "New order request"
                ),
                NotificationEvent::OrderApproved { order } => info!(
                    order_id = %order.id,
                    requester = %order.requester_name,
                    product = %order.product_name,
                    "Order approved"
                ),
            }
            delivered += 1;
        }
        info!(delivered, "Notification service stopped");
    }
}
