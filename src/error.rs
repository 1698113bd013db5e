use serde::Serialize;
use thiserror::Error;

use crate::actor_framework::FrameworkError;

/// Coarse classification every failure maps onto, so callers can branch on the
/// kind without matching each domain enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InsufficientStock,
    InvalidInput,
    Forbidden,
    Conflict,
    Inconsistent,
    Unavailable,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
    #[error("Invalid product input: {0}")]
    InvalidInput(String),
    #[error("Not allowed: {0}")]
    Forbidden(String),
    #[error("Product name is not unique: {0}")]
    DuplicateName(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
    /// A stock write was sent but its reply never arrived.
    #[error("Stock write outcome unknown: {0}")]
    OutcomeUnknown(String),
}

impl ProductError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProductError::NotFound(_) => ErrorKind::NotFound,
            ProductError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            ProductError::InvalidInput(_) => ErrorKind::InvalidInput,
            ProductError::Forbidden(_) => ErrorKind::Forbidden,
            ProductError::DuplicateName(_) => ErrorKind::Conflict,
            ProductError::ActorCommunicationError(_) | ProductError::OutcomeUnknown(_) => ErrorKind::Unavailable,
        }
    }
}

impl From<FrameworkError> for ProductError {
    fn from(err: FrameworkError) -> Self {
        match err {
            FrameworkError::NotFound(id) => ProductError::NotFound(id),
            FrameworkError::Rejected(reason) => ProductError::InvalidInput(reason),
            FrameworkError::Conflict(id) => ProductError::DuplicateName(id),
            FrameworkError::Ambiguous(count) => {
                ProductError::DuplicateName(format!("{} products share this name", count))
            }
            other => ProductError::ActorCommunicationError(other.to_string()),
        }
    }
}

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
    #[error("Invalid order input: {0}")]
    InvalidInput(String),
    #[error("Not allowed: {0}")]
    Forbidden(String),
    /// Stock was decremented but the order could not be marked approved.
    #[error("Order {order_id} needs reconciliation: {reason}")]
    Inconsistent { order_id: String, reason: String },
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NotFound(_) => ErrorKind::NotFound,
            OrderError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            OrderError::InvalidInput(_) => ErrorKind::InvalidInput,
            OrderError::Forbidden(_) => ErrorKind::Forbidden,
            OrderError::Inconsistent { .. } => ErrorKind::Inconsistent,
            OrderError::ActorCommunicationError(_) => ErrorKind::Unavailable,
        }
    }
}

impl From<FrameworkError> for OrderError {
    fn from(err: FrameworkError) -> Self {
        match err {
            FrameworkError::NotFound(id) => OrderError::NotFound(format!("Order {}", id)),
            FrameworkError::Rejected(reason) => OrderError::InvalidInput(reason),
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}

impl From<ProductError> for OrderError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(id) => OrderError::NotFound(format!("Product {}", id)),
            ProductError::InsufficientStock { requested, available } => {
                OrderError::InsufficientStock { requested, available }
            }
            ProductError::InvalidInput(reason) => OrderError::InvalidInput(reason),
            ProductError::Forbidden(reason) => OrderError::Forbidden(reason),
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}
