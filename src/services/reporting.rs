use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::clients::ProductClient;
use crate::error::OrderError;
use crate::services::forecast;
use crate::services::sales_history::SalesHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StockStatus {
    Shortage,
    Stocked,
}

impl StockStatus {
    pub fn classify(current_stock: u32, predicted_need: u64) -> Self {
        if u64::from(current_stock) < predicted_need {
            StockStatus::Shortage
        } else {
            StockStatus::Stocked
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Shortage => "Shortage",
            StockStatus::Stocked => "Stocked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductForecast {
    pub product_id: String,
    pub product_name: String,
    pub current_stock: u32,
    pub predicted_need: u64,
    pub status: StockStatus,
}

#[derive(Debug, Clone, Copy)]
pub struct ForecastSettings {
    pub window_days: u32,
    pub horizon_days: u32,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            window_days: 30,
            horizon_days: 7,
        }
    }
}

/// Joins the catalog with forecast demand into a shortage verdict per product.
#[derive(Clone)]
pub struct Reporting {
    products: ProductClient,
    history: SalesHistory,
    settings: ForecastSettings,
}

impl Reporting {
    pub fn new(products: ProductClient, history: SalesHistory, settings: ForecastSettings) -> Self {
        Self {
            products,
            history,
            settings,
        }
    }

    /// One row per catalog product, in catalog order.
    #[instrument(skip(self))]
    pub async fn predictions(&self, now: DateTime<Utc>) -> Result<Vec<ProductForecast>, OrderError> {
        let since = now - Duration::days(i64::from(self.settings.window_days));
        let products = self.products.list_products().await?;

        let mut rows = Vec::with_capacity(products.len());
        for product in products {
            let series = self.history.aggregate(product.id.clone(), since).await?;
            let predicted_need = forecast::predict(&series, self.settings.horizon_days);
            debug!(product_id = %product.id, days = series.len(), predicted_need, "Forecast computed");
            rows.push(ProductForecast {
                status: StockStatus::classify(product.current_stock, predicted_need),
                product_id: product.id,
                product_name: product.name,
                current_stock: product.current_stock,
                predicted_need,
            });
        }
        Ok(rows)
    }
}
