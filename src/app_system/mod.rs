//! System orchestration, configuration, startup, and shutdown logic.

pub mod config;
pub mod order_system;
pub mod telemetry;

pub use self::config::AppConfig;
pub use self::order_system::OrderSystem;
pub use self::telemetry::setup_tracing;
