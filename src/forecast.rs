//! In-sample diagnostics and out-of-sample forecasts for fitted models.

use crate::arima::{ArimaModel, Forecast};
use crate::fit::FitReport;
use crate::types::ArimaOrder;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_HORIZON: usize = 200;
pub const DEFAULT_ALPHA: f64 = 0.05;

/// One-step-ahead predictions against observed values, on observation
/// indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InSample {
    pub actual: Vec<f64>,
    pub index: Vec<f64>,
    pub predicted: Vec<f64>,
}

impl InSample {
    pub fn from_model(model: &ArimaModel) -> Self {
        let (index, predicted) = model
            .fitted_values()
            .into_iter()
            .map(|(i, v)| (i as f64, v))
            .unzip();
        Self {
            actual: model.data().to_vec(),
            index,
            predicted,
        }
    }

    /// Root mean squared one-step error.
    pub fn rmse(&self) -> f64 {
        if self.index.is_empty() {
            return f64::NAN;
        }
        let sse: f64 = self
            .index
            .iter()
            .zip(&self.predicted)
            .map(|(i, p)| (self.actual[*i as usize] - p).powi(2))
            .sum();
        (sse / self.index.len() as f64).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolForecast {
    pub symbol: String,
    pub order: ArimaOrder,
    pub in_sample: InSample,
    /// Observation indices of the forecast, continuing the history.
    pub index: Vec<f64>,
    pub forecast: Forecast,
}

#[derive(Debug, Clone, Copy)]
pub struct Forecaster {
    pub horizon: usize,
    pub alpha: f64,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl Forecaster {
    pub fn new(horizon: usize, alpha: f64) -> Self {
        Self { horizon, alpha }
    }

    pub fn forecast_model(&self, symbol: &str, model: &ArimaModel) -> SymbolForecast {
        let n = model.data().len();
        let forecast = model.forecast(self.horizon, self.alpha);
        debug!(
            "{}: {} forecast ends at {:.2} [{:.2}, {:.2}]",
            symbol,
            model.order,
            forecast.mean.last().copied().unwrap_or(f64::NAN),
            forecast.lower.last().copied().unwrap_or(f64::NAN),
            forecast.upper.last().copied().unwrap_or(f64::NAN),
        );
        SymbolForecast {
            symbol: symbol.to_string(),
            order: model.order,
            in_sample: InSample::from_model(model),
            index: (n..n + self.horizon).map(|i| i as f64).collect(),
            forecast,
        }
    }

    /// Forecast each symbol's preferred (lower-AIC) model.
    pub fn forecast_all(&self, report: &FitReport) -> Vec<SymbolForecast> {
        report
            .fits
            .iter()
            .map(|fit| self.forecast_model(&fit.symbol, fit.preferred()))
            .collect()
    }
}
