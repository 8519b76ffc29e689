//! Differencing-order estimation and correlogram sampling.

use crate::autocorrelation::{Correlogram, CorrelogramKind};
use crate::error::{PipelineError, Result};
use crate::stationarity::{ndiffs, AdfResult};
use crate::stats::difference;
use crate::types::SymbolSeries;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Settings for order selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfig {
    /// ADF significance level.
    pub alpha: f64,
    pub max_d: usize,
    /// Category index of the first PACF symbol and the sample size.
    pub pacf_start: usize,
    pub acf_start: usize,
    pub sample_size: usize,
    /// Lags shown in correlograms; `None` uses `min(10·log10(n), n-1)`.
    pub max_lag: Option<usize>,
    /// Significance level of the correlogram bands.
    pub band_alpha: f64,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            max_d: 2,
            pacf_start: 1,
            acf_start: 5,
            sample_size: 4,
            max_lag: None,
            band_alpha: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferencingEstimate {
    pub symbol: String,
    pub d: usize,
    pub adf: Option<AdfResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSelection {
    pub estimates: Vec<DifferencingEstimate>,
    /// Maximum of the per-symbol estimates.
    pub global_d: usize,
    pub pacf: Vec<Correlogram>,
    pub acf: Vec<Correlogram>,
}

pub fn estimate_differencing(
    series: &[SymbolSeries],
    config: &OrderConfig,
) -> Result<Vec<DifferencingEstimate>> {
    series
        .iter()
        .map(|s| {
            let est = ndiffs(&s.vwap(), config.alpha, config.max_d)
                .map_err(|e| e.for_symbol(&s.symbol))?;
            debug!("{}: d = {}", s.symbol, est.d);
            Ok(DifferencingEstimate {
                symbol: s.symbol.clone(),
                d: est.d,
                adf: est.initial,
            })
        })
        .collect()
}

/// Correlograms of the once-differenced VWAP for `count` symbols starting
/// at category index `start`.
pub fn sample_correlograms(
    series: &[SymbolSeries],
    kind: CorrelogramKind,
    start: usize,
    count: usize,
    max_lag: Option<usize>,
    alpha: f64,
) -> Result<Vec<Correlogram>> {
    let needed = start + count;
    if series.len() < needed {
        return Err(PipelineError::InsufficientSymbols {
            needed,
            available: series.len(),
        });
    }

    Ok(series[start..needed]
        .iter()
        .map(|s| {
            let diffed = difference(&s.vwap(), 1);
            Correlogram::compute(&s.symbol, kind, &diffed, max_lag, alpha)
        })
        .collect())
}

/// Estimate `d` per symbol and compute the PACF/ACF samples.
pub fn select_orders(series: &[SymbolSeries], config: &OrderConfig) -> Result<OrderSelection> {
    let pacf = sample_correlograms(
        series,
        CorrelogramKind::Pacf,
        config.pacf_start,
        config.sample_size,
        config.max_lag,
        config.band_alpha,
    )?;
    let acf = sample_correlograms(
        series,
        CorrelogramKind::Acf,
        config.acf_start,
        config.sample_size,
        config.max_lag,
        config.band_alpha,
    )?;

    let estimates = estimate_differencing(series, config)?;
    let global_d = estimates.iter().map(|e| e.d).max().unwrap_or(0);
    info!(
        "Differencing order: {} (max over {} symbols)",
        global_d,
        estimates.len()
    );

    Ok(OrderSelection {
        estimates,
        global_d,
        pacf,
        acf,
    })
}
