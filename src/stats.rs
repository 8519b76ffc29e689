//! Small numeric helpers shared by the statistical modules.

use nalgebra::{DMatrix, DVector};

pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance (divides by n).
pub fn variance(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64
}

/// Difference a series `d` times.
pub fn difference(data: &[f64], d: usize) -> Vec<f64> {
    let mut result = data.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Cumulative sum starting after `start`; undoes one difference.
pub fn integrate(diff: &[f64], start: f64) -> Vec<f64> {
    let mut level = start;
    diff.iter()
        .map(|d| {
            level += d;
            level
        })
        .collect()
}

/// True when every value equals the first one.
pub fn is_constant(data: &[f64]) -> bool {
    match data.first() {
        Some(first) => data.iter().all(|x| x == first),
        None => true,
    }
}

/// Ordinary least squares fit.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub beta: DVector<f64>,
    /// Standard errors of the coefficients.
    pub std_errors: Vec<f64>,
    pub residuals: DVector<f64>,
    pub sse: f64,
}

/// Regress `y` on the row-major design matrix `x_rows` (`ncols` columns).
///
/// Returns `None` when the system is underdetermined or singular.
pub fn ols(x_rows: &[f64], y: &[f64], ncols: usize) -> Option<OlsFit> {
    let nrows = y.len();
    if ncols == 0 || nrows <= ncols || x_rows.len() != nrows * ncols {
        return None;
    }

    let x = DMatrix::from_row_slice(nrows, ncols, x_rows);
    let y_vec = DVector::from_column_slice(y);

    let xtx = x.transpose() * &x;
    let xty = x.transpose() * &y_vec;
    let xtx_inv = xtx.try_inverse()?;
    let beta = &xtx_inv * xty;

    let residuals = &y_vec - &x * &beta;
    let sse = residuals.iter().map(|r| r * r).sum::<f64>();
    let s2 = sse / (nrows - ncols) as f64;
    let std_errors = (0..ncols).map(|i| (s2 * xtx_inv[(i, i)]).sqrt()).collect();

    if beta.iter().any(|b| !b.is_finite()) {
        return None;
    }

    Some(OlsFit {
        beta,
        std_errors,
        residuals,
        sse,
    })
}

/// Linear interpolation with clamping outside `xs` (xs ascending).
/// NaN for an empty table.
pub fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    if xs.is_empty() {
        return f64::NAN;
    }
    if x <= xs[0] {
        return ys[0];
    }
    let last = xs.len() - 1;
    if x >= xs[last] {
        return ys[last];
    }
    let i = xs.windows(2).position(|w| x >= w[0] && x <= w[1]).unwrap_or(last - 1);
    let t = (x - xs[i]) / (xs[i + 1] - xs[i]);
    ys[i] + t * (ys[i + 1] - ys[i])
}
