//! One dashboard computation: parse the form, fetch prices, estimate, optimize
//! and assemble everything the page renders. Runs top to bottom with no state
//! kept between calls; any failing step fails the whole run.

pub mod error;
pub mod report;

use crate::analytics::correlation::correlation;
use crate::analytics::estimators::{mean_historical_return, sample_cov};
use crate::analytics::returns::cumulative_returns;
use crate::analytics::TRADING_DAYS_PER_YEAR;
use crate::domain::inputs::{DashboardForm, DashboardInputs};
use crate::domain::table::PriceTable;
use crate::ingest::provider::PriceProvider;
use crate::optimize::{EfficientFrontier, TickerWeight};
use error::{AtStage, DashboardError, Stage};
use report::{DashboardReport, OPTIMIZED_PORTFOLIO};
use tracing::Instrument;
use uuid::Uuid;

pub async fn run(
    form: &DashboardForm,
    provider: &dyn PriceProvider,
) -> Result<DashboardReport, DashboardError> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("dashboard_run", %run_id, provider = provider.provider_name());

    async move {
        let result = run_inner(form, provider).await;
        match &result {
            Ok(report) => tracing::info!(
                tickers = %report.inputs.tickers_string,
                rows = report.prices.len(),
                sharpe = report.performance.sharpe_ratio,
                "dashboard run complete"
            ),
            Err(err) => tracing::warn!(
                stage = err.stage.as_str(),
                detail = %err.detail,
                "dashboard run failed"
            ),
        }
        result
    }
    .instrument(span)
    .await
}

async fn run_inner(
    form: &DashboardForm,
    provider: &dyn PriceProvider,
) -> Result<DashboardReport, DashboardError> {
    let inputs = DashboardInputs::from_form(form).at_stage(Stage::ParseInput)?;

    let mut prices = provider
        .fetch_adjusted_close(&inputs.tickers, inputs.start, inputs.end)
        .await
        .at_stage(Stage::FetchPrices)?;

    let cumulative = cumulative_returns(&prices).at_stage(Stage::Estimate)?;
    let corr = correlation(&prices);
    let mu = mean_historical_return(&prices, TRADING_DAYS_PER_YEAR).at_stage(Stage::Estimate)?;
    let cov = sample_cov(&prices, TRADING_DAYS_PER_YEAR).at_stage(Stage::Estimate)?;

    let mut frontier =
        EfficientFrontier::new(inputs.tickers.clone(), mu, cov).at_stage(Stage::Optimize)?;
    frontier
        .max_sharpe(inputs.risk_free_rate)
        .at_stage(Stage::Optimize)?;
    let weights = frontier.clean_weights().at_stage(Stage::Optimize)?;
    let performance = frontier.portfolio_performance().at_stage(Stage::Optimize)?;

    let portfolio = weighted_price(&prices, &weights).at_stage(Stage::Assemble)?;
    prices
        .push_column(OPTIMIZED_PORTFOLIO, portfolio)
        .at_stage(Stage::Assemble)?;
    let optimized = prices
        .select(&[OPTIMIZED_PORTFOLIO])
        .and_then(|t| cumulative_returns(&t))
        .at_stage(Stage::Assemble)?;

    Ok(DashboardReport {
        inputs,
        prices,
        cumulative_returns: cumulative,
        optimized_cumulative_returns: optimized,
        correlation: corr,
        weights,
        performance,
    })
}

/// Per-date sum of each ticker's price level times its weight.
fn weighted_price(prices: &PriceTable, weights: &[TickerWeight]) -> anyhow::Result<Vec<f64>> {
    let mut out = vec![0.0; prices.len()];
    for w in weights {
        let series = prices
            .column(&w.ticker)
            .ok_or_else(|| anyhow::anyhow!("no price column for weighted ticker {}", w.ticker))?;
        for (acc, p) in out.iter_mut().zip(series) {
            *acc += p * w.weight;
        }
    }
    Ok(out)
}
