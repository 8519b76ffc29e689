//! Autocorrelation analysis.

use crate::stats::mean;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// Default lag count: `min(10·log10(n), n - 1)`.
pub fn default_lags(n: usize) -> usize {
    if n < 2 {
        return 0;
    }
    ((10.0 * (n as f64).log10()) as usize).min(n - 1)
}

/// Sample autocorrelation for lags `0..=max_lag`.
///
/// Uses the biased autocovariance (divides by n), so the sequence is
/// positive semi-definite.
pub fn acf(data: &[f64], max_lag: usize) -> Vec<f64> {
    let n = data.len();
    if n < 2 {
        return Vec::new();
    }

    let max_lag = max_lag.min(n - 1);
    let m = mean(data);
    let c0: f64 = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n as f64;

    if c0 == 0.0 {
        return vec![1.0; max_lag + 1];
    }

    (0..=max_lag)
        .map(|lag| {
            if lag == 0 {
                return 1.0;
            }
            let ck: f64 = data[lag..]
                .iter()
                .zip(data[..n - lag].iter())
                .map(|(a, b)| (a - m) * (b - m))
                .sum::<f64>()
                / n as f64;
            ck / c0
        })
        .collect()
}

/// Partial autocorrelation via the Durbin-Levinson recursion.
pub fn pacf(data: &[f64], max_lag: usize) -> Vec<f64> {
    let r = acf(data, max_lag);
    if r.is_empty() {
        return Vec::new();
    }

    let max_lag = r.len() - 1;
    let mut out = vec![0.0; max_lag + 1];
    out[0] = 1.0;
    if max_lag == 0 {
        return out;
    }

    let mut phi = vec![r[1]];
    out[1] = r[1];

    for k in 2..=max_lag {
        let num = r[k] - (1..k).map(|j| phi[j - 1] * r[k - j]).sum::<f64>();
        let den = 1.0 - (1..k).map(|j| phi[j - 1] * r[j]).sum::<f64>();
        if den.abs() < 1e-12 {
            break;
        }
        let phi_kk = num / den;
        let mut next: Vec<f64> = (1..k).map(|j| phi[j - 1] - phi_kk * phi[k - j - 1]).collect();
        next.push(phi_kk);
        phi = next;
        out[k] = phi_kk;
    }

    out
}

/// Two-sided standard normal quantile for a significance level.
pub fn normal_quantile(alpha: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(n) => n.inverse_cdf(1.0 - alpha / 2.0),
        Err(_) => 1.96,
    }
}

/// Half-widths of the ACF band under Bartlett's formula.
///
/// Lag 0 has no band (0.0); lag k uses `(1 + 2·Σ_{j<k} r_j²) / n`.
pub fn acf_bounds(acf_values: &[f64], n: usize, alpha: f64) -> Vec<f64> {
    let z = normal_quantile(alpha);
    let mut cumulative = 0.0;
    acf_values
        .iter()
        .enumerate()
        .map(|(k, r)| {
            if k == 0 {
                return 0.0;
            }
            let var = (1.0 + 2.0 * cumulative) / n as f64;
            cumulative += r * r;
            z * var.sqrt()
        })
        .collect()
}

/// Half-widths of the PACF band, `z / √n` for every lag above 0.
pub fn pacf_bounds(lags: usize, n: usize, alpha: f64) -> Vec<f64> {
    let z = normal_quantile(alpha);
    (0..=lags)
        .map(|k| if k == 0 { 0.0 } else { z / (n as f64).sqrt() })
        .collect()
}

/// Ljung-Box portmanteau test on residuals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LjungBox {
    pub statistic: f64,
    pub p_value: f64,
    pub lags: usize,
}

/// `Q = n(n+2) Σ r_k² / (n-k)` over lags `1..=lags`, chi-squared with
/// `lags - fitted_params` degrees of freedom.
pub fn ljung_box(residuals: &[f64], lags: usize, fitted_params: usize) -> LjungBox {
    let n = residuals.len();
    let r = acf(residuals, lags);
    let lags = r.len().saturating_sub(1);
    let nf = n as f64;
    let statistic = nf
        * (nf + 2.0)
        * (1..=lags)
            .map(|k| r[k] * r[k] / (nf - k as f64))
            .sum::<f64>();
    let df = lags.saturating_sub(fitted_params).max(1);
    let p_value = match ChiSquared::new(df as f64) {
        Ok(chi2) => 1.0 - chi2.cdf(statistic),
        Err(_) => 1.0,
    };
    LjungBox {
        statistic,
        p_value,
        lags,
    }
}

/// Which correlation function a correlogram shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelogramKind {
    Acf,
    Pacf,
}

impl CorrelogramKind {
    pub fn label(&self) -> &'static str {
        match self {
            CorrelogramKind::Acf => "ACF",
            CorrelogramKind::Pacf => "PACF",
        }
    }
}

/// Correlation values plus confidence band for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlogram {
    pub symbol: String,
    pub kind: CorrelogramKind,
    pub values: Vec<f64>,
    pub bounds: Vec<f64>,
    pub nobs: usize,
}

impl Correlogram {
    pub fn compute(
        symbol: impl Into<String>,
        kind: CorrelogramKind,
        data: &[f64],
        max_lag: Option<usize>,
        alpha: f64,
    ) -> Self {
        let n = data.len();
        let lags = max_lag.unwrap_or_else(|| default_lags(n));
        let (values, bounds) = match kind {
            CorrelogramKind::Acf => {
                let values = acf(data, lags);
                let bounds = acf_bounds(&values, n, alpha);
                (values, bounds)
            }
            CorrelogramKind::Pacf => {
                let values = pacf(data, lags);
                let bounds = pacf_bounds(values.len().saturating_sub(1), n, alpha);
                (values, bounds)
            }
        };
        Self {
            symbol: symbol.into(),
            kind,
            values,
            bounds,
            nobs: n,
        }
    }

    /// Lags (above 0) whose value falls outside the band.
    pub fn significant_lags(&self) -> Vec<usize> {
        self.values
            .iter()
            .zip(self.bounds.iter())
            .enumerate()
            .skip(1)
            .filter(|(_, (v, b))| v.abs() > **b)
            .map(|(k, _)| k)
            .collect()
    }
}
