//! ARIMA estimation, forecasting and stepwise order search.
//!
//! The differenced series `w_t` (d differences of the input) is modeled as
//!
//! ```text
//! w_t - μ = Σ φ_i (w_{t-i} - μ) + e_t + Σ θ_j e_{t-j}
//! ```
//!
//! Parameters minimize the conditional sum of squares with residuals before
//! `t = p` set to zero. The constant `μ` is estimated only when `d < 2`.
//! Models compared by AIC must condition on the same leading observations
//! ([`FitOptions::condition`]) so their likelihoods share a sample.
//! Non-stationary AR or non-invertible MA polynomials are rejected during the
//! search.

use crate::autocorrelation::{ljung_box, normal_quantile};
use crate::error::{PipelineError, Result};
use crate::optim::{nelder_mead, NelderMeadOptions};
use crate::stationarity::ndiffs;
use crate::stats::{difference, integrate, mean, ols, variance};
use crate::types::ArimaOrder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use tracing::{debug, trace};

/// Extra observations required beyond `p + d + q`.
const MIN_EXTRA_OBSERVATIONS: usize = 10;

/// Estimation options.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Force the constant on or off; `None` includes it when `d < 2`.
    pub include_constant: Option<bool>,
    /// Leading differenced observations left out of the likelihood; raised
    /// to `p` when smaller.
    pub condition: usize,
    pub optimizer: NelderMeadOptions,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            include_constant: None,
            condition: 0,
            optimizer: NelderMeadOptions::default(),
        }
    }
}

/// A fitted ARIMA model.
#[derive(Debug, Clone, Serialize)]
pub struct ArimaModel {
    pub order: ArimaOrder,
    pub include_constant: bool,
    /// Mean of the differenced series (0 when no constant).
    pub constant: f64,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    /// Observations entering the likelihood.
    pub nobs: usize,
    pub iterations: usize,
    /// Residuals for the differenced series, starting at index `p`.
    #[serde(skip)]
    pub residuals: Vec<f64>,
    #[serde(skip)]
    data: Vec<f64>,
}

/// Point forecast with a symmetric confidence band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub alpha: f64,
}

impl Forecast {
    pub fn horizon(&self) -> usize {
        self.mean.len()
    }
}

fn model_error(reason: impl Into<String>) -> PipelineError {
    PipelineError::ModelFit {
        symbol: String::new(),
        reason: reason.into(),
    }
}

impl ArimaModel {
    /// Fit with default options.
    pub fn fit(data: &[f64], order: ArimaOrder) -> Result<Self> {
        Self::fit_with(data, order, &FitOptions::default())
    }

    pub fn fit_with(data: &[f64], order: ArimaOrder, options: &FitOptions) -> Result<Self> {
        let ArimaOrder { p, d, q } = order;
        // Offset of the likelihood sample within the residuals, which start at `p`.
        let skip = options.condition.max(p) - p;
        let needed = p + d + q + skip + MIN_EXTRA_OBSERVATIONS;
        if data.len() < needed {
            return Err(PipelineError::InsufficientData {
                symbol: String::new(),
                needed,
                available: data.len(),
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(model_error("series contains non-finite values"));
        }

        let w = difference(data, d);
        let include_constant = options.include_constant.unwrap_or(d < 2);

        let start = starting_values(&w, p, q, include_constant);
        let scale = variance(&w).sqrt().max(1e-8);
        let steps: Vec<f64> = start
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if include_constant && i == 0 {
                    0.1 * scale
                } else {
                    0.1 + 0.05 * v.abs()
                }
            })
            .collect();

        let objective = |params: &[f64]| -> f64 {
            let (mu, ar, ma) = split_params(params, include_constant, p);
            if !is_stationary(ar) || !is_invertible(ma) {
                return f64::INFINITY;
            }
            let e = css_residuals(&w, mu, ar, ma);
            let sse: f64 = e[skip..].iter().map(|r| r * r).sum();
            sse / (e.len() - skip) as f64
        };

        let minimum = nelder_mead(objective, &start, &steps, &options.optimizer)
            .map_err(|e| model_error(format!("{} {}", order, e)))?;
        trace!("{} converged after {} iterations", order, minimum.iterations);

        let (mu, ar, ma) = split_params(&minimum.x, include_constant, p);
        let residuals = css_residuals(&w, mu, ar, ma);
        let nobs = residuals.len() - skip;
        let sse: f64 = residuals[skip..].iter().map(|r| r * r).sum();
        let sigma2 = sse / nobs as f64;
        if !sigma2.is_finite() || sigma2 <= 0.0 {
            return Err(model_error(format!("{} has degenerate residual variance", order)));
        }

        let n = nobs as f64;
        let log_likelihood = -0.5 * n * ((2.0 * PI * sigma2).ln() + 1.0);
        let k = (p + q + usize::from(include_constant) + 1) as f64;
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + k * n.ln();

        Ok(Self {
            order,
            include_constant,
            constant: mu,
            ar: ar.to_vec(),
            ma: ma.to_vec(),
            sigma2,
            log_likelihood,
            aic,
            bic,
            nobs,
            iterations: minimum.iterations,
            residuals,
            data: data.to_vec(),
        })
    }

    /// The series the model was fitted on.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// One-step-ahead in-sample predictions in levels.
    ///
    /// Returns `(index, value)` pairs indexed into the fitted series; the
    /// first `p + d` observations have no prediction.
    pub fn fitted_values(&self) -> Vec<(usize, f64)> {
        let offset = self.order.p + self.order.d;
        self.residuals
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let idx = offset + i;
                (idx, self.data[idx] - e)
            })
            .collect()
    }

    /// Forecast `horizon` steps past the end of the data with a
    /// `(1 - alpha)` band.
    pub fn forecast(&self, horizon: usize, alpha: f64) -> Forecast {
        let ArimaOrder { p, d, q } = self.order;
        let w = difference(&self.data, d);
        let n = w.len();

        let mut centered: Vec<f64> = w.iter().map(|v| v - self.constant).collect();
        let mut shocks = vec![0.0; n];
        shocks[p..].copy_from_slice(&self.residuals);

        let mut w_future = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let len = centered.len();
            let mut v = 0.0;
            for i in 1..=p {
                v += self.ar[i - 1] * centered[len - i];
            }
            for j in 1..=q {
                v += self.ma[j - 1] * shocks[len - j];
            }
            centered.push(v);
            shocks.push(0.0);
            w_future.push(v + self.constant);
        }

        let mut mean_path = w_future;
        for k in (0..d).rev() {
            let last = difference(&self.data, k).last().copied().unwrap_or(0.0);
            mean_path = integrate(&mean_path, last);
        }

        let psi = psi_weights(&integrated_ar(&self.ar, d), &self.ma, horizon);
        let z = normal_quantile(alpha);
        let mut cumulative = 0.0;
        let std_errors: Vec<f64> = psi
            .iter()
            .map(|w| {
                cumulative += w * w;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect();

        let lower = mean_path
            .iter()
            .zip(&std_errors)
            .map(|(m, s)| m - z * s)
            .collect();
        let upper = mean_path
            .iter()
            .zip(&std_errors)
            .map(|(m, s)| m + z * s)
            .collect();

        Forecast {
            mean: mean_path,
            lower,
            upper,
            std_errors,
            alpha,
        }
    }

    pub fn summary(&self) -> String {
        let mut s = format!("{} Model Summary\n", self.order);
        s.push_str(&"=".repeat(40));
        s.push('\n');
        s.push_str(&format!("Observations: {} ({} in likelihood)\n", self.data.len(), self.nobs));

        if self.include_constant {
            s.push_str(&format!("Constant: {:.6}\n", self.constant));
        }
        if !self.ar.is_empty() {
            s.push_str("AR Coefficients:\n");
            for (i, c) in self.ar.iter().enumerate() {
                s.push_str(&format!("  φ{} = {:.6}\n", i + 1, c));
            }
        }
        if !self.ma.is_empty() {
            s.push_str("MA Coefficients:\n");
            for (i, c) in self.ma.iter().enumerate() {
                s.push_str(&format!("  θ{} = {:.6}\n", i + 1, c));
            }
        }

        s.push_str(&format!("Sigma²: {:.6}\n", self.sigma2));
        s.push_str(&format!("Log-likelihood: {:.3}\n", self.log_likelihood));
        s.push_str(&format!("AIC: {:.2}\n", self.aic));
        s.push_str(&format!("BIC: {:.2}\n", self.bic));

        let lags = 10.min(self.residuals.len().saturating_sub(1));
        if lags > 0 {
            let lb = ljung_box(&self.residuals, lags, self.order.p + self.order.q);
            s.push_str(&format!(
                "Ljung-Box Q({}): {:.3} (p = {:.3})\n",
                lb.lags, lb.statistic, lb.p_value
            ));
        }
        s
    }
}

fn split_params(params: &[f64], include_constant: bool, p: usize) -> (f64, &[f64], &[f64]) {
    let (mu, rest) = if include_constant {
        (params[0], &params[1..])
    } else {
        (0.0, params)
    };
    let (ar, ma) = rest.split_at(p);
    (mu, ar, ma)
}

/// Conditional residuals for `t >= p`.
fn css_residuals(w: &[f64], mu: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let n = w.len();
    let p = ar.len();
    let mut e = vec![0.0; n];
    for t in p..n {
        let mut v = w[t] - mu;
        for (i, phi) in ar.iter().enumerate() {
            v -= phi * (w[t - i - 1] - mu);
        }
        for (j, theta) in ma.iter().enumerate() {
            if t > j {
                v -= theta * e[t - j - 1];
            }
        }
        e[t] = v;
    }
    e.split_off(p)
}

/// Step-down (Schur-Cohn) test: all roots of `1 - Σ a_i z^i` lie outside
/// the unit circle.
pub fn is_stationary(coeffs: &[f64]) -> bool {
    let mut a = coeffs.to_vec();
    while let Some(&r) = a.last() {
        if !r.is_finite() || r.abs() >= 1.0 {
            return false;
        }
        let k = a.len();
        let denom = 1.0 - r * r;
        a = (0..k - 1).map(|j| (a[j] + r * a[k - 2 - j]) / denom).collect();
    }
    true
}

/// MA polynomial `1 + Σ θ_j z^j` has no roots inside the unit circle.
pub fn is_invertible(coeffs: &[f64]) -> bool {
    let negated: Vec<f64> = coeffs.iter().map(|c| -c).collect();
    is_stationary(&negated)
}

/// Pull coefficients towards zero until the polynomial is admissible.
fn shrink_until(mut coeffs: Vec<f64>, admissible: fn(&[f64]) -> bool) -> Vec<f64> {
    for _ in 0..20 {
        if admissible(&coeffs) {
            return coeffs;
        }
        coeffs.iter_mut().for_each(|c| *c *= 0.5);
    }
    vec![0.0; coeffs.len()]
}

/// Least-squares regression of `x_t` on lagged `x` and lagged `e`.
fn lagged_regression(x: &[f64], e: Option<&[f64]>, p: usize, q: usize, start: usize) -> Option<Vec<f64>> {
    let ncols = p + q;
    let mut rows = Vec::new();
    let mut y = Vec::new();
    for t in start..x.len() {
        y.push(x[t]);
        for i in 1..=p {
            rows.push(x[t - i]);
        }
        if let Some(e) = e {
            for j in 1..=q {
                rows.push(e[t - j]);
            }
        }
    }
    ols(&rows, &y, ncols).map(|fit| fit.beta.iter().copied().collect())
}

/// Hannan-Rissanen starting values; plain OLS when there is no MA part.
fn starting_values(w: &[f64], p: usize, q: usize, include_constant: bool) -> Vec<f64> {
    let mu = if include_constant { mean(w) } else { 0.0 };
    let x: Vec<f64> = w.iter().map(|v| v - mu).collect();
    let n = x.len();

    let (ar, ma) = if p + q == 0 {
        (Vec::new(), Vec::new())
    } else if q == 0 {
        let ar = lagged_regression(&x, None, p, 0, p).unwrap_or_else(|| vec![0.0; p]);
        (ar, Vec::new())
    } else {
        let m = (p + q).max(((n as f64).ln().powi(2)) as usize).min(n / 4).max(p + q);
        let long_ar = if n > 2 * m + p + q + 2 {
            lagged_regression(&x, None, m, 0, m)
        } else {
            None
        };
        match long_ar {
            Some(pi) => {
                let mut e = vec![0.0; n];
                for t in m..n {
                    e[t] = x[t] - (1..=m).map(|i| pi[i - 1] * x[t - i]).sum::<f64>();
                }
                let start = m + p.max(q);
                match lagged_regression(&x, Some(&e), p, q, start) {
                    Some(beta) => (beta[..p].to_vec(), beta[p..].to_vec()),
                    None => (vec![0.0; p], vec![0.0; q]),
                }
            }
            None => (vec![0.0; p], vec![0.0; q]),
        }
    };

    let ar = shrink_until(ar, is_stationary);
    let ma = shrink_until(ma, is_invertible);

    let mut params = Vec::with_capacity(usize::from(include_constant) + p + q);
    if include_constant {
        params.push(mu);
    }
    params.extend(ar);
    params.extend(ma);
    params
}

/// AR polynomial of `φ(B)(1 - B)^d`, returned as coefficients `a_i` of
/// `1 - Σ a_i B^i`.
fn integrated_ar(ar: &[f64], d: usize) -> Vec<f64> {
    let mut poly: Vec<f64> = std::iter::once(1.0).chain(ar.iter().map(|a| -a)).collect();
    for _ in 0..d {
        let mut next = vec![0.0; poly.len() + 1];
        for (i, c) in poly.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c;
        }
        poly = next;
    }
    poly[1..].iter().map(|c| -c).collect()
}

/// First `h` MA(∞) weights, `ψ_0 = 1`.
fn psi_weights(ar: &[f64], ma: &[f64], h: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(h);
    for j in 0..h {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut v = if j <= ma.len() { ma[j - 1] } else { 0.0 };
        for i in 1..=j.min(ar.len()) {
            v += ar[i - 1] * psi[j - i];
        }
        psi.push(v);
    }
    psi
}

/// Bounds and starting point of the stepwise order search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoArimaConfig {
    pub start_p: usize,
    pub start_q: usize,
    pub max_p: usize,
    pub max_q: usize,
    pub max_d: usize,
    /// Upper bound on `p + q`.
    pub max_order: usize,
    /// Significance level of the ADF test used for `d`.
    pub alpha: f64,
}

impl Default for AutoArimaConfig {
    fn default() -> Self {
        Self {
            start_p: 1,
            start_q: 1,
            max_p: 3,
            max_q: 3,
            max_d: 2,
            max_order: 5,
            alpha: 0.05,
        }
    }
}

/// One order tried by the search; `aic` is `None` when the fit failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub order: ArimaOrder,
    pub aic: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoArimaResult {
    pub model: ArimaModel,
    pub d_estimate: usize,
    /// Orders in the order they were tried.
    pub candidates: Vec<Candidate>,
}

struct StepwiseSearch<'a> {
    data: &'a [f64],
    d: usize,
    config: &'a AutoArimaConfig,
    options: FitOptions,
    tried: BTreeMap<(usize, usize), Option<f64>>,
    candidates: Vec<Candidate>,
    best: Option<ArimaModel>,
}

impl<'a> StepwiseSearch<'a> {
    /// Fit `(p, d, q)`; true when it becomes the new best model.
    fn try_order(&mut self, p: usize, q: usize) -> bool {
        let cfg = self.config;
        if p > cfg.max_p || q > cfg.max_q || p + q > cfg.max_order {
            return false;
        }
        if self.tried.contains_key(&(p, q)) {
            return false;
        }

        let order = ArimaOrder::new(p, self.d, q);
        let (aic, better) = match ArimaModel::fit_with(self.data, order, &self.options) {
            Ok(model) => {
                debug!("{}: AIC {:.3}", order, model.aic);
                let better = self.best.as_ref().map_or(true, |b| model.aic < b.aic);
                let aic = model.aic;
                if better {
                    self.best = Some(model);
                }
                (Some(aic), better)
            }
            Err(e) => {
                debug!("{}: skipped ({})", order, e);
                (None, false)
            }
        };
        self.tried.insert((p, q), aic);
        self.candidates.push(Candidate { order, aic });
        better
    }
}

/// Hyndman-Khandakar stepwise search over `(p, q)` with `d` from [`ndiffs`].
///
/// Every candidate conditions on the first `max_p` differenced values, so
/// the reported AICs are directly comparable.
pub fn auto_arima(data: &[f64], config: &AutoArimaConfig) -> Result<AutoArimaResult> {
    let d = ndiffs(data, config.alpha, config.max_d)?.d;
    let mut search = StepwiseSearch {
        data,
        d,
        config,
        options: FitOptions {
            condition: config.max_p,
            ..Default::default()
        },
        tried: BTreeMap::new(),
        candidates: Vec::new(),
        best: None,
    };

    search.try_order(config.start_p.min(config.max_p), config.start_q.min(config.max_q));
    search.try_order(0, 0);
    search.try_order(1, 0);
    search.try_order(0, 1);

    const MOVES: [(isize, isize); 8] = [
        (-1, 0),
        (1, 0),
        (0, -1),
        (0, 1),
        (-1, -1),
        (1, 1),
        (-1, 1),
        (1, -1),
    ];

    while let Some(best) = search.best.as_ref().map(|m| m.order) {
        let mut improved = false;
        for (dp, dq) in MOVES {
            let (Some(p), Some(q)) = (
                best.p.checked_add_signed(dp),
                best.q.checked_add_signed(dq),
            ) else {
                continue;
            };
            if search.try_order(p, q) {
                improved = true;
                break;
            }
        }
        if !improved {
            break;
        }
    }

    let model = search
        .best
        .ok_or_else(|| model_error(format!("no candidate order could be fitted (d = {})", d)))?;
    debug!("auto_arima selected {} (AIC {:.3})", model.order, model.aic);

    Ok(AutoArimaResult {
        model,
        d_estimate: d,
        candidates: search.candidates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::testing::{ar1, arima111, random_walk};

    #[test]
    fn test_stationarity_checks() {
        assert!(is_stationary(&[]));
        assert!(is_stationary(&[0.5]));
        assert!(!is_stationary(&[1.0]));
        assert!(!is_stationary(&[-1.2]));
        // 1 - 1.2z + 0.32z² = (1 - 0.8z)(1 - 0.4z)
        assert!(is_stationary(&[1.2, -0.32]));
        // 1 - 0.5z - 0.6z² has a root inside the unit circle.
        assert!(!is_stationary(&[0.5, 0.6]));
        assert!(is_invertible(&[0.9]));
        assert!(!is_invertible(&[-1.5]));
    }

    #[test]
    fn test_integrated_ar_and_psi() {
        // (1 - 0.5B)(1 - B) = 1 - 1.5B + 0.5B²
        let a = integrated_ar(&[0.5], 1);
        assert!((a[0] - 1.5).abs() < 1e-12);
        assert!((a[1] + 0.5).abs() < 1e-12);

        // Random walk: every psi weight is 1.
        let psi = psi_weights(&integrated_ar(&[], 1), &[], 4);
        assert_eq!(psi, vec![1.0; 4]);

        // MA(1): 1, θ, 0, 0
        assert_eq!(psi_weights(&[], &[0.4], 4), vec![1.0, 0.4, 0.0, 0.0]);
    }

    #[test]
    fn test_fit_ar1_recovers_coefficient() {
        let data = ar1(1000, 0.6, 21);
        let model = ArimaModel::fit(&data, ArimaOrder::new(1, 0, 0)).unwrap();
        assert!((model.ar[0] - 0.6).abs() < 0.08);
        assert!(model.include_constant);
        assert_eq!(model.nobs, 999);
        assert!(model.sigma2 > 0.0);
    }

    #[test]
    fn test_fit_arima111() {
        let data = arima111(800, 100.0, 0.5, 0.3, 17);
        let model = ArimaModel::fit(&data, ArimaOrder::new(1, 1, 1)).unwrap();
        assert!((model.ar[0] - 0.5).abs() < 0.15);
        assert!((model.ma[0] - 0.3).abs() < 0.15);
        assert!(is_stationary(&model.ar));
        assert!(is_invertible(&model.ma));
        assert!(model.summary().contains("ARIMA(1,1,1)"));
    }

    #[test]
    fn test_ma_term_lowers_aic_for_arma_increments() {
        let data = arima111(800, 100.0, 0.5, 0.3, 17);
        let with_ma = ArimaModel::fit(&data, ArimaOrder::new(1, 1, 1)).unwrap();
        let without_ma = ArimaModel::fit(&data, ArimaOrder::new(1, 1, 0)).unwrap();
        assert_ne!(with_ma.aic, without_ma.aic);
        // Nested models: the extra MA term can only lower the CSS.
        assert!(with_ma.sigma2 <= without_ma.sigma2 * (1.0 + 1e-6));
    }

    #[test]
    fn test_information_criteria() {
        let data = ar1(300, 0.4, 5);
        let model = ArimaModel::fit(&data, ArimaOrder::new(1, 0, 0)).unwrap();
        let k = 3.0;
        assert!((model.aic - (-2.0 * model.log_likelihood + 2.0 * k)).abs() < 1e-9);
        assert!((model.bic - (-2.0 * model.log_likelihood + k * (model.nobs as f64).ln())).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_observations() {
        let err = ArimaModel::fit(&[1.0, 2.0, 3.0], ArimaOrder::new(1, 1, 1)).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { needed: 13, .. }));
    }

    #[test]
    fn test_fitted_values_align_with_data() {
        let data = random_walk(200, 50.0, 3);
        let model = ArimaModel::fit(&data, ArimaOrder::new(1, 1, 0)).unwrap();
        let fitted = model.fitted_values();
        assert_eq!(fitted.len(), data.len() - 2);
        assert_eq!(fitted[0].0, 2);
        for (i, v) in &fitted {
            assert!((v - data[*i]).abs() < 8.0);
        }
    }

    #[test]
    fn test_forecast_band_widens() {
        let data = arima111(500, 100.0, 0.5, 0.3, 8);
        let model = ArimaModel::fit(&data, ArimaOrder::new(1, 1, 1)).unwrap();
        let fc = model.forecast(50, 0.05);
        assert_eq!(fc.horizon(), 50);
        for w in fc.std_errors.windows(2) {
            assert!(w[1] >= w[0]);
        }
        for i in 0..50 {
            assert!(fc.lower[i] < fc.mean[i] && fc.mean[i] < fc.upper[i]);
        }
        assert!((fc.std_errors[0] - model.sigma2.sqrt()).abs() < 1e-12);
        assert!(fc.upper[49] - fc.lower[49] > fc.upper[0] - fc.lower[0]);
    }

    #[test]
    fn test_random_walk_forecast_is_flat_without_drift() {
        let data = random_walk(300, 20.0, 13);
        let opts = FitOptions {
            include_constant: Some(false),
            ..Default::default()
        };
        let model = ArimaModel::fit_with(&data, ArimaOrder::new(0, 1, 0), &opts).unwrap();
        let fc = model.forecast(5, 0.05);
        let last = *data.last().unwrap();
        for m in &fc.mean {
            assert!((m - last).abs() < 1e-12);
        }
        // Variance grows linearly: se_h = σ√h.
        let s = model.sigma2.sqrt();
        assert!((fc.std_errors[3] - 2.0 * s).abs() < 1e-9);
    }

    #[test]
    fn test_auto_arima_random_walk() {
        let data = random_walk(300, 100.0, 9);
        let result = auto_arima(&data, &AutoArimaConfig::default()).unwrap();
        assert_eq!(result.d_estimate, 1);
        assert_eq!(result.model.order.d, 1);
        assert!(result.candidates.len() >= 4);
        let best = result
            .candidates
            .iter()
            .filter_map(|c| c.aic)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(result.model.aic, best);
        assert_eq!(result.model.order, ArimaOrder::new(0, 1, 0));
    }

    #[test]
    fn test_auto_arima_price_scale_walk_stays_small() {
        for seed in 2..=5 {
            let data: Vec<f64> = random_walk(1000, 0.0, seed)
                .iter()
                .map(|v| 1000.0 + 25.0 * v)
                .collect();
            let result = auto_arima(&data, &AutoArimaConfig::default()).unwrap();
            assert_eq!(result.model.order, ArimaOrder::new(0, 1, 0), "seed {}", seed);
            assert_eq!(result.model.nobs, 999 - 3);
        }
    }

    #[test]
    fn test_conditioning_shares_the_likelihood_sample() {
        let data = random_walk(300, 20.0, 13);
        let opts = FitOptions {
            condition: 3,
            ..Default::default()
        };
        let small = ArimaModel::fit_with(&data, ArimaOrder::new(0, 1, 0), &opts).unwrap();
        let large = ArimaModel::fit_with(&data, ArimaOrder::new(3, 1, 0), &opts).unwrap();
        assert_eq!(small.nobs, 296);
        assert_eq!(large.nobs, 296);
        // Residuals still start at `p`; only the likelihood sample moves.
        assert_eq!(small.residuals.len(), 299);
        assert_eq!(small.fitted_values().len(), 299);

        let err = ArimaModel::fit_with(&data[..14], ArimaOrder::new(1, 1, 1), &opts).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { needed: 15, .. }));
    }
}
