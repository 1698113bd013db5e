//! Runtime settings.
//!
//! Loaded in layers:
//! 1. Defaults in code
//! 2. `config/stockflow.toml`, if present
//! 3. Environment variables with the `STOCKFLOW__` prefix, e.g.
//!    `STOCKFLOW__FORECAST__HORIZON_DAYS=14`

use std::time::Duration;

use ::config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::services::{ApprovalSettings, ForecastSettings};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub actor: ActorConfig,
    pub forecast: ForecastConfig,
    pub catalog: CatalogConfig,
    pub approval: ApprovalConfig,
    pub notification: NotificationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ActorConfig {
    /// Channel capacity of each store actor
    pub buffer_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    /// Look-back window for sales history
    pub window_days: u32,
    /// Days of demand summed into a prediction
    pub horizon_days: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Threshold given to products created by a stock upload
    pub default_low_stock_threshold: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApprovalConfig {
    pub max_status_attempts: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    pub buffer_size: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("config/stockflow").required(false))
            .add_source(
                Environment::with_prefix("STOCKFLOW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<::config::builder::ConfigBuilder<::config::builder::DefaultState>, ConfigError> {
        ::config::Config::builder()
            .set_default("actor.buffer_size", 64)?
            .set_default("forecast.window_days", 30)?
            .set_default("forecast.horizon_days", 7)?
            .set_default("catalog.default_low_stock_threshold", 10)?
            .set_default("approval.max_status_attempts", 5)?
            .set_default("approval.retry_backoff_ms", 20)?
            .set_default("notification.buffer_size", 128)
    }

    pub fn approval_settings(&self) -> ApprovalSettings {
        ApprovalSettings {
            max_status_attempts: self.approval.max_status_attempts,
            retry_backoff: Duration::from_millis(self.approval.retry_backoff_ms),
        }
    }

    pub fn forecast_settings(&self) -> ForecastSettings {
        ForecastSettings {
            window_days: self.forecast.window_days,
            horizon_days: self.forecast.horizon_days,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            actor: ActorConfig { buffer_size: 64 },
            forecast: ForecastConfig {
                window_days: 30,
                horizon_days: 7,
            },
            catalog: CatalogConfig {
                default_low_stock_threshold: crate::domain::DEFAULT_LOW_STOCK_THRESHOLD,
            },
            approval: ApprovalConfig {
                max_status_attempts: 5,
                retry_backoff_ms: 20,
            },
            notification: NotificationConfig { buffer_size: 128 },
        }
    }
}
