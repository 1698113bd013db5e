//! Outcomes handed to the transport layer.
//!
//! Each call returns a serialisable response or an [`ApiError`] carrying the
//! error kind and a readable message.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::clients::{ReplenishRequest, StockLedger};
use crate::domain::{OrderStatus, Principal};
use crate::error::{ErrorKind, OrderError, ProductError};
use crate::services::{ApprovalOutcome, OrderWorkflow, ProductForecast, Reporting};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrderResponse {
    pub id: String,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApproveOrderResponse {
    pub status: OrderStatus,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplenishResponse {
    pub id: String,
    pub message: String,
}

#[derive(Clone)]
pub struct ShopApi {
    workflow: OrderWorkflow,
    ledger: StockLedger,
    reporting: Reporting,
}

impl ShopApi {
    pub fn new(workflow: OrderWorkflow, ledger: StockLedger, reporting: Reporting) -> Self {
        Self {
            workflow,
            ledger,
            reporting,
        }
    }

    #[instrument(skip(self, principal))]
    pub async fn create_order(&self, principal: &Principal, request: CreateOrderRequest) -> Result<CreateOrderResponse, ApiError> {
        let order = self
            .workflow
            .create_order(principal, request.product_id, request.quantity)
            .await?;
        Ok(CreateOrderResponse {
            id: order.id,
            status: order.status,
        })
    }

    #[instrument(skip(self, principal))]
    pub async fn approve_order(&self, principal: &Principal, order_id: String) -> Result<ApproveOrderResponse, ApiError> {
        let response = match self.workflow.approve_order(principal, order_id).await? {
            ApprovalOutcome::Approved(order) => ApproveOrderResponse {
                status: order.status,
                message: "Order approved and stock updated".into(),
            },
            ApprovalOutcome::AlreadyApproved(order) => ApproveOrderResponse {
                status: order.status,
                message: "Order already approved".into(),
            },
        };
        Ok(response)
    }

    #[instrument(skip(self, principal))]
    pub async fn replenish_stock(&self, principal: &Principal, request: ReplenishRequest) -> Result<ReplenishResponse, ApiError> {
        let replenishment = self.ledger.replenish(principal, request).await?;
        Ok(ReplenishResponse {
            id: replenishment.intake.id,
            message: "Stock logged and catalog synced".into(),
        })
    }

    #[instrument(skip(self))]
    pub async fn list_predictions(&self) -> Result<Vec<ProductForecast>, ApiError> {
        Ok(self.reporting.predictions(Utc::now()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_keep_kind_and_reason() {
        let err = ApiError::from(OrderError::InsufficientStock { requested: 5, available: 2 });
        assert_eq!(err.kind, ErrorKind::InsufficientStock);
        assert_eq!(err.message, "Insufficient stock: requested 5, available 2");

        let json = serde_json::to_value(ApiError::from(ProductError::NotFound("product_3".into()))).unwrap();
        assert_eq!(json["kind"], "not_found");
    }

    #[test]
    fn responses_serialize_lowercase_status() {
        let json = serde_json::to_value(CreateOrderResponse {
            id: "order_1".into(),
            status: OrderStatus::Pending,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"id": "order_1", "status": "pending"}));
    }
}
