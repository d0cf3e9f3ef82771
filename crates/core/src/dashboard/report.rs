use crate::analytics::correlation::CorrelationMatrix;
use crate::domain::inputs::DashboardInputs;
use crate::domain::table::PriceTable;
use crate::optimize::{Performance, TickerWeight};
use serde::Serialize;

/// Name of the derived column holding the weighted portfolio price.
pub const OPTIMIZED_PORTFOLIO: &str = "Optimized Portfolio";

/// Everything one dashboard render needs, computed in a single pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub inputs: DashboardInputs,
    /// Fetched prices plus the appended [`OPTIMIZED_PORTFOLIO`] column.
    pub prices: PriceTable,
    /// Rebased index per ticker.
    pub cumulative_returns: PriceTable,
    /// Rebased index of the optimized portfolio alone.
    pub optimized_cumulative_returns: PriceTable,
    pub correlation: CorrelationMatrix,
    /// Cleaned max-Sharpe weights in ticker order.
    pub weights: Vec<TickerWeight>,
    pub performance: Performance,
}

impl DashboardReport {
    /// Price columns of the individual tickers, without the derived portfolio.
    pub fn ticker_prices(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.prices
            .series()
            .filter(|(name, _)| *name != OPTIMIZED_PORTFOLIO)
    }
}
