//! Long-only max-Sharpe portfolio optimization.

pub mod error;
pub mod frontier;
mod qp;

pub use error::OptimizeError;
pub use frontier::{EfficientFrontier, Performance, TickerWeight};
