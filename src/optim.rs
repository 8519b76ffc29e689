//! Derivative-free minimization (Nelder-Mead simplex).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizeError {
    #[error("objective is not finite at the starting point")]
    NonFiniteStart,

    #[error("did not converge within {0} iterations")]
    MaxIterations(usize),
}

/// Stopping rules for [`nelder_mead`].
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadOptions {
    pub max_iter: usize,
    /// Relative tolerance on the simplex extent.
    pub xtol: f64,
    /// Relative tolerance on the spread of objective values.
    pub ftol: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iter: 5000,
            xtol: 1e-7,
            ftol: 1e-10,
        }
    }
}

/// Location and value of a minimum.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub fx: f64,
    pub iterations: usize,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

fn value(f: &impl Fn(&[f64]) -> f64, x: &[f64]) -> f64 {
    let v = f(x);
    if v.is_nan() {
        f64::INFINITY
    } else {
        v
    }
}

/// Minimize `f` starting at `x0` with initial simplex edges `steps`.
///
/// The objective may return `f64::INFINITY` to mark infeasible points.
pub fn nelder_mead<F>(
    f: F,
    x0: &[f64],
    steps: &[f64],
    options: &NelderMeadOptions,
) -> Result<Minimum, OptimizeError>
where
    F: Fn(&[f64]) -> f64,
{
    let dim = x0.len();
    let f0 = value(&f, x0);
    if !f0.is_finite() {
        return Err(OptimizeError::NonFiniteStart);
    }
    if dim == 0 {
        return Ok(Minimum {
            x: Vec::new(),
            fx: f0,
            iterations: 0,
        });
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
    let mut fx: Vec<f64> = Vec::with_capacity(dim + 1);
    simplex.push(x0.to_vec());
    fx.push(f0);

    for i in 0..dim {
        let mut step = steps.get(i).copied().unwrap_or(0.1);
        if step == 0.0 {
            step = 0.1;
        }
        let mut vertex = x0.to_vec();
        let mut fv = f64::INFINITY;
        // Pull infeasible vertices back towards the start.
        for _ in 0..30 {
            vertex[i] = x0[i] + step;
            fv = value(&f, &vertex);
            if fv.is_finite() {
                break;
            }
            step *= 0.5;
        }
        simplex.push(vertex);
        fx.push(fv);
    }

    let mut iterations = 0;
    loop {
        let mut order: Vec<usize> = (0..=dim).collect();
        order.sort_by(|&a, &b| fx[a].total_cmp(&fx[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        fx = order.iter().map(|&i| fx[i]).collect();

        let best = fx[0];
        let f_spread = fx.iter().map(|v| (v - best).abs()).fold(0.0, f64::max);
        let x_scale = 1.0 + simplex[0].iter().map(|v| v.abs()).fold(0.0, f64::max);
        let x_spread = simplex[1..]
            .iter()
            .flat_map(|v| v.iter().zip(simplex[0].iter()).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max);

        let f_scale = 1.0 + best.abs();
        let converged = (f_spread <= options.ftol * f_scale && x_spread <= options.xtol * x_scale)
            || f_spread <= 1e-14 * f_scale;
        if converged {
            return Ok(Minimum {
                x: simplex[0].clone(),
                fx: best,
                iterations,
            });
        }
        if iterations >= options.max_iter {
            return Err(OptimizeError::MaxIterations(options.max_iter));
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..dim)
            .map(|j| simplex[..dim].iter().map(|v| v[j]).sum::<f64>() / dim as f64)
            .collect();
        let worst = simplex[dim].clone();
        let along = |t: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(worst.iter())
                .map(|(c, w)| c + t * (c - w))
                .collect()
        };

        let xr = along(REFLECT);
        let fr = value(&f, &xr);

        if fr < fx[0] {
            let xe = along(REFLECT * EXPAND);
            let fe = value(&f, &xe);
            if fe < fr {
                simplex[dim] = xe;
                fx[dim] = fe;
            } else {
                simplex[dim] = xr;
                fx[dim] = fr;
            }
            continue;
        }

        if fr < fx[dim - 1] {
            simplex[dim] = xr;
            fx[dim] = fr;
            continue;
        }

        let (xc, fc, accept) = if fr < fx[dim] {
            let xc = along(REFLECT * CONTRACT);
            let fc = value(&f, &xc);
            let ok = fc <= fr;
            (xc, fc, ok)
        } else {
            let xc = along(-CONTRACT);
            let fc = value(&f, &xc);
            let ok = fc < fx[dim];
            (xc, fc, ok)
        };

        if accept {
            simplex[dim] = xc;
            fx[dim] = fc;
            continue;
        }

        let anchor = simplex[0].clone();
        for i in 1..=dim {
            let shrunk: Vec<f64> = simplex[i]
                .iter()
                .zip(anchor.iter())
                .map(|(x, a)| a + SHRINK * (x - a))
                .collect();
            fx[i] = value(&f, &shrunk);
            simplex[i] = shrunk;
        }
    }
}
