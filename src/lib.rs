//! Stock-aware order workflow and demand forecasting for a small retail catalog.
//!
//! Each collection (products, orders, stock intakes) is owned by a
//! [`actor_framework::ResourceActor`] that handles one request at a time.
//! Clients wrap the actor channels; services combine clients into the order
//! workflow, sales history, forecasting and reporting.

pub mod actor_framework;
pub mod api;
pub mod app_system;
pub mod clients;
pub mod domain;
pub mod error;
pub mod intake_actor;
pub mod order_actor;
pub mod product_actor;
pub mod services;
pub mod validation;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod mock_framework;
