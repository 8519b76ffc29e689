//! Unit-root testing and differencing-order estimation.
//!
//! The Augmented Dickey-Fuller test regresses
//!
//! ```text
//! Δy_t = α + β·y_{t-1} + γ·t + Σ_{i=1..k} δ_i·Δy_{t-i} + ε_t
//! ```
//!
//! with `k = trunc((n - 1)^(1/3))` lags and reports `β / se(β)`. The p-value is
//! interpolated from the Banerjee et al. (1993) table for the trend case and
//! clamped to `[0.01, 0.99]`.

use crate::error::{PipelineError, Result};
use crate::stats::{difference, interpolate, is_constant, ols};
use serde::{Deserialize, Serialize};
use tracing::trace;

const TABLE_SIZES: [f64; 6] = [25.0, 50.0, 100.0, 250.0, 500.0, 100_000.0];
const TABLE_PROBS: [f64; 8] = [0.01, 0.025, 0.05, 0.10, 0.90, 0.95, 0.975, 0.99];
// Critical values per probability (columns) and sample size (rows).
const TABLE_CRITICAL: [[f64; 6]; 8] = [
    [-4.38, -4.15, -4.04, -3.99, -3.98, -3.96],
    [-3.95, -3.80, -3.73, -3.69, -3.68, -3.66],
    [-3.60, -3.50, -3.45, -3.43, -3.42, -3.41],
    [-3.24, -3.18, -3.15, -3.13, -3.13, -3.12],
    [-1.14, -1.19, -1.22, -1.23, -1.24, -1.25],
    [-0.80, -0.87, -0.90, -0.92, -0.93, -0.94],
    [-0.50, -0.58, -0.62, -0.64, -0.65, -0.66],
    [-0.15, -0.24, -0.28, -0.31, -0.32, -0.33],
];

/// Smallest series the ADF regression accepts.
pub const MIN_ADF_OBSERVATIONS: usize = 10;

/// Result of an Augmented Dickey-Fuller test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdfResult {
    pub statistic: f64,
    pub p_value: f64,
    pub lags: usize,
    /// Observations used in the regression.
    pub nobs: usize,
}

impl AdfResult {
    /// True when the unit root is rejected at `alpha`.
    pub fn is_stationary(&self, alpha: f64) -> bool {
        self.p_value <= alpha
    }
}

/// Default lag count, `trunc((n - 1)^(1/3))`.
pub fn default_lags(n: usize) -> usize {
    ((n.saturating_sub(1)) as f64).powf(1.0 / 3.0).trunc() as usize
}

/// Augmented Dickey-Fuller test with constant and linear trend.
pub fn adf_test(data: &[f64], lags: Option<usize>) -> Result<AdfResult> {
    let n_obs = data.len();
    if n_obs < MIN_ADF_OBSERVATIONS {
        return Err(PipelineError::InsufficientData {
            symbol: String::new(),
            needed: MIN_ADF_OBSERVATIONS,
            available: n_obs,
        });
    }

    let k = lags.unwrap_or_else(|| default_lags(n_obs));
    let dy = difference(data, 1);
    let n = dy.len();
    let ncols = 3 + k;
    if n <= k + ncols {
        return Err(PipelineError::InsufficientData {
            symbol: String::new(),
            needed: k + ncols + 2,
            available: n_obs,
        });
    }

    let mut rows = Vec::with_capacity((n - k) * ncols);
    let mut y = Vec::with_capacity(n - k);
    for t in k..n {
        y.push(dy[t]);
        rows.push(1.0);
        rows.push(data[t]);
        rows.push((t + 1) as f64);
        for i in 1..=k {
            rows.push(dy[t - i]);
        }
    }

    let fit = ols(&rows, &y, ncols).ok_or_else(|| {
        PipelineError::DataError("ADF regression is singular".to_string())
    })?;
    let se = fit.std_errors[1];
    let statistic = if se > 0.0 {
        fit.beta[1] / se
    } else {
        f64::NEG_INFINITY
    };
    let p_value = adf_p_value(statistic, n);
    trace!("ADF statistic {:.4}, p-value {:.4}, lags {}", statistic, p_value, k);

    Ok(AdfResult {
        statistic,
        p_value,
        lags: k,
        nobs: y.len(),
    })
}

/// Interpolated p-value of an ADF statistic for a sample of size `n`.
pub fn adf_p_value(statistic: f64, n: usize) -> f64 {
    let critical: Vec<f64> = TABLE_CRITICAL
        .iter()
        .map(|row| interpolate(&TABLE_SIZES, row, n as f64))
        .collect();
    interpolate(&critical, &TABLE_PROBS, statistic)
}

/// Differencing estimate for a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ndiffs {
    pub d: usize,
    /// Test on the undifferenced series, when it ran.
    pub initial: Option<AdfResult>,
}

/// Estimate how many differences make a series stationary.
///
/// Differences until the ADF test rejects a unit root at `alpha` or `max_d`
/// is reached. A constant series needs no differencing.
pub fn ndiffs(data: &[f64], alpha: f64, max_d: usize) -> Result<Ndiffs> {
    if is_constant(data) {
        return Ok(Ndiffs { d: 0, initial: None });
    }

    let initial = adf_test(data, None)?;
    let mut should_diff = !initial.is_stationary(alpha);
    let mut d = 0;
    let mut x = data.to_vec();

    while should_diff && d < max_d {
        d += 1;
        x = difference(&x, 1);
        if is_constant(&x) {
            break;
        }
        should_diff = !adf_test(&x, None)?.is_stationary(alpha);
    }

    Ok(Ndiffs {
        d,
        initial: Some(initial),
    })
}
