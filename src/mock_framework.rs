//! # Mock Framework
//!
//! Utilities for testing clients and services without a running store.
//!
//! [`create_mock_client`] returns a client plus the receiver its requests land on.
//! The test plays the store: it pulls each request with one of the `expect_*`
//! helpers, asserts on it, and answers through the responder. Answering with an
//! error (or dropping the responder) is how store failures are injected.

use crate::actor_framework::{Entity, Filter, FrameworkError, ResourceClient, ResourceRequest};
use tokio::sync::{mpsc, oneshot};

pub type Responder<R> = oneshot::Sender<Result<R, FrameworkError>>;

pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, Responder<T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Responder<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

pub async fn expect_query<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(Filter<T>, Responder<Vec<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Query { filter, respond_to }) => Some((filter, respond_to)),
        _ => None,
    }
}

pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Responder<T::ActionResult>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StockIntake, StockIntakeCreate};
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn mock_client_round_trips_a_create() {
        let (client, mut receiver) = create_mock_client::<StockIntake>(10);

        let create_task = tokio::spawn(async move {
            client
                .create(StockIntakeCreate {
                    product_name: "Oats".into(),
                    category: "Grocery".into(),
                    quantity: 4,
                    unit_price: Decimal::TWO,
                    uploaded_at: Utc::now(),
                })
                .await
        });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.product_name, "Oats");
        let stored = StockIntake {
            id: "intake_1".into(),
            product_name: payload.product_name,
            category: payload.category,
            quantity: payload.quantity,
            unit_price: payload.unit_price,
            uploaded_at: payload.uploaded_at,
        };
        responder.send(Ok(stored)).unwrap();

        let result = create_task.await.unwrap().unwrap();
        assert_eq!(result.id, "intake_1");
    }

    #[tokio::test]
    async fn dropped_responder_surfaces_as_error() {
        let (client, mut receiver) = create_mock_client::<StockIntake>(10);
        let task = tokio::spawn(async move { client.get("intake_1".into()).await });

        let (_, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        drop(responder);
        assert_eq!(task.await.unwrap(), Err(FrameworkError::ActorDropped));
    }
}
