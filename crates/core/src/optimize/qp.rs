//! Primal active-set solver for
//!
//! ```text
//! minimize  ½ yᵀ S y   subject to   aᵀ y = 1,  y ≥ 0
//! ```
//!
//! with `a = mu - rf` and `S` symmetric positive definite on every subset of
//! assets the solver visits. The normalized solution `y / Σy` is the long-only
//! tangency (max Sharpe) portfolio.

use super::error::OptimizeError;
use nalgebra::{DMatrix, DVector};

const TOLERANCE: f64 = 1e-12;

pub(crate) fn solve(
    cov: &DMatrix<f64>,
    expected_returns: &DVector<f64>,
    risk_free_rate: f64,
    labels: &[String],
) -> Result<DVector<f64>, OptimizeError> {
    let excess = &expected_returns.add_scalar(-risk_free_rate);
    let n = excess.len();
    let (start, best) = excess
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or(OptimizeError::NoAssets)?;
    if best <= 0.0 {
        return Err(OptimizeError::NoExcessReturn { risk_free_rate });
    }

    // Feasible start: everything in the single asset with the best excess return.
    let mut y = DVector::zeros(n);
    y[start] = 1.0 / best;
    let mut free = vec![false; n];
    free[start] = true;

    let max_iterations = 10 * n + 100;
    for _ in 0..max_iterations {
        let idx: Vec<usize> = (0..n).filter(|&i| free[i]).collect();
        let (target, lambda) = equality_solution(cov, excess, &idx, labels)?;

        let step: Vec<f64> = idx
            .iter()
            .zip(target.iter())
            .map(|(&i, t)| t - y[i])
            .collect();
        let step_size = step.iter().fold(0.0_f64, |m, v| m.max(v.abs()));

        if step_size <= TOLERANCE * (1.0 + y.amax()) {
            // Stationary on the current face; check the bound multipliers.
            let grad = cov * &y;
            let scale = 1.0 + lambda.abs() * excess.amax();
            let release = (0..n)
                .filter(|&i| !free[i])
                .map(|i| (i, grad[i] - lambda * excess[i]))
                .filter(|&(_, nu)| nu < -TOLERANCE * scale)
                .min_by(|a, b| a.1.total_cmp(&b.1));

            match release {
                Some((i, _)) => free[i] = true,
                None => return Ok(y),
            }
            continue;
        }

        // Longest step toward the target that keeps every free weight non-negative.
        let mut alpha = 1.0;
        let mut blocking = None;
        for (&i, &p) in idx.iter().zip(&step) {
            if p < 0.0 {
                let ratio = -y[i] / p;
                if ratio < alpha {
                    alpha = ratio;
                    blocking = Some(i);
                }
            }
        }

        for (&i, &p) in idx.iter().zip(&step) {
            y[i] += alpha * p;
        }
        if let Some(i) = blocking {
            y[i] = 0.0;
            free[i] = false;
        }
    }

    Err(OptimizeError::DidNotConverge {
        iterations: max_iterations,
    })
}

/// Minimizer of `½ yᵀSy` over the free assets subject to `aᵀy = 1`, together with
/// the multiplier `λ` of the equality constraint (`S_FF y_F = λ a_F`).
fn equality_solution(
    cov: &DMatrix<f64>,
    excess: &DVector<f64>,
    idx: &[usize],
    labels: &[String],
) -> Result<(DVector<f64>, f64), OptimizeError> {
    let k = idx.len();
    let sub = DMatrix::from_fn(k, k, |r, c| cov[(idx[r], idx[c])]);
    let a = DVector::from_fn(k, |r, _| excess[idx[r]]);

    let not_pd = || OptimizeError::NotPositiveDefinite {
        assets: idx.iter().map(|&i| labels[i].clone()).collect(),
    };

    let chol = sub.cholesky().ok_or_else(not_pd)?;
    let z = chol.solve(&a);
    let denom = a.dot(&z);
    if !(denom > 0.0) || !denom.is_finite() {
        return Err(not_pd());
    }

    Ok((z / denom, 1.0 / denom))
}
