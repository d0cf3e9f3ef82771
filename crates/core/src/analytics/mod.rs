//! Pure transforms over a [`PriceTable`](crate::domain::table::PriceTable):
//! rebased cumulative returns, display correlations, and the return/risk
//! estimators the optimizer consumes.

pub mod correlation;
pub mod estimators;
pub mod returns;

/// Trading days per year used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: usize = 252;
