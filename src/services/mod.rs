//! Workflow and reporting logic built on top of the store clients.

pub mod forecast;
pub mod migration;
pub mod notification;
pub mod order_workflow;
pub mod reporting;
pub mod sales_history;

pub use migration::{backfill_orders, parse_legacy_orders, BackfillReport, LegacyOrderRecord, ParsedLegacyOrders, SkippedRecord};
pub use notification::{NotificationClient, NotificationEvent, NotificationService};
pub use order_workflow::{ApprovalOutcome, ApprovalSettings, OrderWorkflow, ReconcileReport};
pub use reporting::{ForecastSettings, ProductForecast, Reporting, StockStatus};
pub use sales_history::SalesHistory;
