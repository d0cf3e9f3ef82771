use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum OptimizeError {
    NoAssets,
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    AsymmetricCovariance {
        row: usize,
        col: usize,
    },
    NonFiniteInput {
        what: &'static str,
    },
    NoExcessReturn {
        risk_free_rate: f64,
    },
    NotPositiveDefinite {
        assets: Vec<String>,
    },
    DidNotConverge {
        iterations: usize,
    },
    ZeroVolatility,
    NotSolved,
}

impl fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAssets => write!(f, "no assets to optimize"),
            Self::DimensionMismatch {
                what,
                expected,
                got,
            } => write!(f, "{what} has dimension {got}, expected {expected}"),
            Self::AsymmetricCovariance { row, col } => {
                write!(f, "covariance matrix is not symmetric at ({row}, {col})")
            }
            Self::NonFiniteInput { what } => write!(f, "{what} contains non-finite values"),
            Self::NoExcessReturn { risk_free_rate } => write!(
                f,
                "at least one asset must have an expected return exceeding the risk-free rate ({risk_free_rate})"
            ),
            Self::NotPositiveDefinite { assets } => write!(
                f,
                "covariance matrix is not positive definite over {}",
                assets.join(",")
            ),
            Self::DidNotConverge { iterations } => {
                write!(f, "max sharpe solver did not converge after {iterations} iterations")
            }
            Self::ZeroVolatility => write!(f, "portfolio volatility is zero"),
            Self::NotSolved => write!(f, "weights have not been computed yet"),
        }
    }
}

impl std::error::Error for OptimizeError {}
