//! Demand forecasting with a single-feature linear trend.
//!
//! The series is mapped onto day indices relative to its earliest day, a least
//! squares line is fitted through the (day index, quantity) pairs, and the line
//! is summed over the days following the last observed one.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::SalesHistoryPoint;

/// Fitted line `quantity = slope * day_index + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearTrend {
    slope: f64,
    intercept: f64,
}

impl LinearTrend {
    /// Ordinary least squares over `(x, y)` pairs.
    ///
    /// When every `x` is the same the slope is taken as 0 and the intercept as the
    /// mean of `y`. Returns `None` for an empty input.
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let covariance: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
        let variance: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();

        if variance.abs() < 1e-12 {
            return Some(Self {
                slope: 0.0,
                intercept: mean_y,
            });
        }

        let slope = covariance / variance;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Maps days onto indices from the earliest day, summing any points that share a day.
fn day_indexed(series: &[SalesHistoryPoint]) -> Vec<(i64, u64)> {
    let Some(first) = series.iter().map(|p| p.day).min() else {
        return Vec::new();
    };
    let mut by_index = BTreeMap::new();
    for point in series {
        *by_index.entry((point.day - first).num_days()).or_insert(0u64) += point.quantity;
    }
    by_index.into_iter().collect()
}

/// Total predicted demand over the `horizon_days` following the last observed day.
///
/// Fewer than two points predict 0. Each day's value is clamped at 0 before
/// summing and the sum is rounded half to even.
pub fn predict(series: &[SalesHistoryPoint], horizon_days: u32) -> u64 {
    if series.len() < 2 {
        return 0;
    }

    let indexed = day_indexed(series);
    let points: Vec<(f64, f64)> = indexed.iter().map(|&(x, y)| (x as f64, y as f64)).collect();
    let (Some(trend), Some(&(last, _))) = (LinearTrend::fit(&points), indexed.last()) else {
        return 0;
    };

    let total: f64 = (1..=i64::from(horizon_days))
        .map(|i| trend.at((last + i) as f64).max(0.0))
        .sum();
    total.round_ties_even() as u64
}
