use super::error::OptimizeError;
use super::qp;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CLEAN_CUTOFF: f64 = 1e-4;
pub const DEFAULT_CLEAN_ROUNDING: i32 = 5;

const SYMMETRY_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerWeight {
    pub ticker: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub expected_annual_return: f64,
    pub annual_volatility: f64,
    pub sharpe_ratio: f64,
}

/// Long-only, fully-invested mean-variance optimizer over a fixed asset list.
#[derive(Debug, Clone)]
pub struct EfficientFrontier {
    tickers: Vec<String>,
    expected_returns: DVector<f64>,
    cov: DMatrix<f64>,
    solved: Option<Solved>,
}

#[derive(Debug, Clone)]
struct Solved {
    weights: Vec<f64>,
    risk_free_rate: f64,
}

impl EfficientFrontier {
    pub fn new(
        tickers: Vec<String>,
        expected_returns: Vec<f64>,
        cov: Vec<Vec<f64>>,
    ) -> Result<Self, OptimizeError> {
        let n = tickers.len();
        if n == 0 {
            return Err(OptimizeError::NoAssets);
        }
        if expected_returns.len() != n {
            return Err(OptimizeError::DimensionMismatch {
                what: "expected returns",
                expected: n,
                got: expected_returns.len(),
            });
        }
        if cov.len() != n {
            return Err(OptimizeError::DimensionMismatch {
                what: "covariance matrix",
                expected: n,
                got: cov.len(),
            });
        }
        if let Some(row) = cov.iter().find(|row| row.len() != n) {
            return Err(OptimizeError::DimensionMismatch {
                what: "covariance row",
                expected: n,
                got: row.len(),
            });
        }
        if !expected_returns.iter().all(|v| v.is_finite()) {
            return Err(OptimizeError::NonFiniteInput {
                what: "expected returns",
            });
        }
        if !cov.iter().flatten().all(|v| v.is_finite()) {
            return Err(OptimizeError::NonFiniteInput {
                what: "covariance matrix",
            });
        }
        for i in 0..n {
            for j in (i + 1)..n {
                let scale = 1.0 + cov[i][j].abs().max(cov[j][i].abs());
                if (cov[i][j] - cov[j][i]).abs() > SYMMETRY_TOLERANCE * scale {
                    return Err(OptimizeError::AsymmetricCovariance { row: i, col: j });
                }
            }
        }

        Ok(Self {
            tickers,
            expected_returns: DVector::from_vec(expected_returns),
            cov: DMatrix::from_fn(n, n, |r, c| cov[r][c]),
            solved: None,
        })
    }

    /// Finds the long-only allocation with the highest Sharpe ratio for
    /// `risk_free_rate` and returns the raw weights in ticker order.
    pub fn max_sharpe(&mut self, risk_free_rate: f64) -> Result<&[f64], OptimizeError> {
        let y = qp::solve(
            &self.cov,
            &self.expected_returns,
            risk_free_rate,
            &self.tickers,
        )?;
        let total = y.sum();
        let weights: Vec<f64> = y.iter().map(|v| v / total).collect();

        tracing::debug!(
            assets = self.tickers.len(),
            held = weights.iter().filter(|w| **w > 0.0).count(),
            risk_free_rate,
            "max sharpe solved"
        );

        let solved = self.solved.insert(Solved {
            weights,
            risk_free_rate,
        });
        Ok(solved.weights.as_slice())
    }

    /// Weights with the default cutoff and rounding.
    pub fn clean_weights(&self) -> Result<Vec<TickerWeight>, OptimizeError> {
        self.clean_weights_with(DEFAULT_CLEAN_CUTOFF, DEFAULT_CLEAN_ROUNDING)
    }

    /// Zeroes weights below `cutoff` in magnitude and rounds the rest to
    /// `rounding` decimals. No renormalization happens afterwards.
    pub fn clean_weights_with(
        &self,
        cutoff: f64,
        rounding: i32,
    ) -> Result<Vec<TickerWeight>, OptimizeError> {
        let solved = self.solved.as_ref().ok_or(OptimizeError::NotSolved)?;
        let factor = 10f64.powi(rounding);

        Ok(self
            .tickers
            .iter()
            .zip(&solved.weights)
            .map(|(ticker, &w)| {
                let weight = if w.abs() < cutoff {
                    0.0
                } else {
                    (w * factor).round() / factor
                };
                TickerWeight {
                    ticker: ticker.clone(),
                    weight,
                }
            })
            .collect())
    }

    /// Expected annual return, volatility and Sharpe ratio of the solved
    /// (uncleaned) weights, against the rate passed to [`Self::max_sharpe`].
    pub fn portfolio_performance(&self) -> Result<Performance, OptimizeError> {
        let solved = self.solved.as_ref().ok_or(OptimizeError::NotSolved)?;
        let w = DVector::from_column_slice(&solved.weights);

        let expected_annual_return = w.dot(&self.expected_returns);
        let annual_volatility = (&self.cov * &w).dot(&w).max(0.0).sqrt();
        if annual_volatility == 0.0 {
            return Err(OptimizeError::ZeroVolatility);
        }

        Ok(Performance {
            expected_annual_return,
            annual_volatility,
            sharpe_ratio: (expected_annual_return - solved.risk_free_rate) / annual_volatility,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn three_assets() -> EfficientFrontier {
        EfficientFrontier::new(
            names(&["MA", "V", "JPM"]),
            vec![0.18, 0.15, 0.09],
            vec![
                vec![0.060, 0.040, 0.020],
                vec![0.040, 0.050, 0.015],
                vec![0.020, 0.015, 0.070],
            ],
        )
        .unwrap()
    }

    #[test]
    fn weights_are_long_only_and_fully_invested() {
        let mut ef = three_assets();
        let raw = ef.max_sharpe(0.02).unwrap().to_vec();
        assert!(raw.iter().all(|w| *w >= 0.0));
        assert_relative_eq!(raw.iter().sum::<f64>(), 1.0, epsilon = 1e-12);

        let cleaned = ef.clean_weights().unwrap();
        assert_eq!(
            cleaned.iter().map(|w| w.ticker.as_str()).collect::<Vec<_>>(),
            vec!["MA", "V", "JPM"]
        );
        assert!(cleaned.iter().all(|w| w.weight >= 0.0));
        assert_relative_eq!(
            cleaned.iter().map(|w| w.weight).sum::<f64>(),
            1.0,
            epsilon = 1e-4
        );
    }

    #[test]
    fn max_sharpe_beats_other_long_only_mixes() {
        let mut ef = three_assets();
        ef.max_sharpe(0.02).unwrap();
        let best = ef.portfolio_performance().unwrap().sharpe_ratio;

        let mu = [0.18, 0.15, 0.09];
        let cov = [
            [0.060, 0.040, 0.020],
            [0.040, 0.050, 0.015],
            [0.020, 0.015, 0.070],
        ];
        for a in 0..=20 {
            for b in 0..=(20 - a) {
                let w = [a as f64 / 20.0, b as f64 / 20.0, (20 - a - b) as f64 / 20.0];
                let ret: f64 = (0..3).map(|i| w[i] * mu[i]).sum();
                let var: f64 = (0..3)
                    .flat_map(|i| (0..3).map(move |j| (i, j)))
                    .map(|(i, j)| w[i] * w[j] * cov[i][j])
                    .sum();
                let sharpe = (ret - 0.02) / var.sqrt();
                assert!(sharpe <= best + 1e-9, "grid point {w:?} beats optimum");
            }
        }
    }

    #[test]
    fn performance_matches_definitions() {
        let mut ef = EfficientFrontier::new(
            names(&["A", "B"]),
            vec![0.10, 0.08],
            vec![vec![0.04, 0.0], vec![0.0, 0.04]],
        )
        .unwrap();
        let w = ef.max_sharpe(0.0).unwrap().to_vec();
        // Equal variances, no correlation: weights proportional to mu.
        assert_relative_eq!(w[0], 0.10 / 0.18, epsilon = 1e-10);

        let perf = ef.portfolio_performance().unwrap();
        let ret = w[0] * 0.10 + w[1] * 0.08;
        let vol = ((w[0] * w[0] + w[1] * w[1]) * 0.04).sqrt();
        assert_relative_eq!(perf.expected_annual_return, ret, epsilon = 1e-12);
        assert_relative_eq!(perf.annual_volatility, vol, epsilon = 1e-12);
        assert_relative_eq!(perf.sharpe_ratio, ret / vol, epsilon = 1e-12);
    }

    #[test]
    fn clean_weights_cuts_and_rounds() {
        let mut ef = EfficientFrontier::new(
            names(&["A", "B"]),
            vec![0.10, 0.08],
            vec![vec![0.04, 0.0], vec![0.0, 0.04]],
        )
        .unwrap();
        ef.max_sharpe(0.0).unwrap();

        let cleaned = ef.clean_weights_with(0.5, 2).unwrap();
        assert_eq!(cleaned[0].weight, 0.56);
        assert_eq!(cleaned[1].weight, 0.0);
    }

    #[test]
    fn requires_an_asset_above_risk_free_rate() {
        let mut ef = three_assets();
        let err = ef.max_sharpe(0.25).unwrap_err();
        assert_eq!(err, OptimizeError::NoExcessReturn { risk_free_rate: 0.25 });
        assert!(err.to_string().contains("exceeding the risk-free rate"));
    }

    #[test]
    fn results_before_solving_are_rejected() {
        let ef = three_assets();
        assert_eq!(ef.clean_weights().unwrap_err(), OptimizeError::NotSolved);
        assert_eq!(ef.portfolio_performance().unwrap_err(), OptimizeError::NotSolved);
    }

    #[test]
    fn rejects_malformed_inputs() {
        assert_eq!(
            EfficientFrontier::new(vec![], vec![], vec![]).unwrap_err(),
            OptimizeError::NoAssets
        );
        assert!(matches!(
            EfficientFrontier::new(names(&["A", "B"]), vec![0.1], vec![vec![1.0, 0.0], vec![0.0, 1.0]]),
            Err(OptimizeError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            EfficientFrontier::new(names(&["A", "B"]), vec![0.1, 0.1], vec![vec![1.0, 0.5], vec![0.1, 1.0]]),
            Err(OptimizeError::AsymmetricCovariance { row: 0, col: 1 })
        ));
        assert!(matches!(
            EfficientFrontier::new(names(&["A"]), vec![f64::NAN], vec![vec![1.0]]),
            Err(OptimizeError::NonFiniteInput { .. })
        ));
    }

    #[test]
    fn repeated_solves_are_identical() {
        let mut a = three_assets();
        let mut b = three_assets();
        assert_eq!(a.max_sharpe(0.0382).unwrap(), b.max_sharpe(0.0382).unwrap());
        assert_eq!(a.portfolio_performance().unwrap(), b.portfolio_performance().unwrap());
    }
}
