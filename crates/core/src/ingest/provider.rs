use crate::config::Settings;
use crate::domain::table::PriceTable;
use crate::ingest::types::ChartResponse;
use crate::time::session::{period_bounds, session_date};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRIES: u32 = 1;
const CHART_PATH: &str = "/v8/finance/chart";
const CLIENT_USER_AGENT: &str = "Mozilla/5.0 (compatible; sharpe-dashboard/0.1)";

#[async_trait::async_trait]
pub trait PriceProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Adjusted closing prices for `tickers` over `start..=end`, one column per
    /// ticker in request order. Any unknown ticker fails the whole fetch.
    async fn fetch_adjusted_close(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceTable>;
}

#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.resolved_data_provider_base_url().to_string();
        let timeout_secs = settings
            .data_provider_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let retries = settings.data_provider_retries.unwrap_or(DEFAULT_RETRIES).max(1);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build data provider http client")?;

        Ok(Self {
            http,
            base_url,
            retries,
        })
    }

    fn url(&self, ticker: &str) -> String {
        format!("{}{CHART_PATH}/{ticker}", self.base_url.trim_end_matches('/'))
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers
    }

    async fn fetch_once(&self, ticker: &str, period1: i64, period2: i64) -> Result<ChartResponse> {
        let res = self
            .http
            .get(self.url(ticker))
            .headers(self.headers())
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,split".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("price request for {ticker} failed"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("failed to read price response for {ticker}"))?;

        if !status.is_success() {
            anyhow::bail!("data provider HTTP {status} for {ticker}: {text}");
        }

        serde_json::from_str::<ChartResponse>(&text)
            .with_context(|| format!("failed to parse chart response for {ticker}"))
    }

    async fn fetch_history(
        &self,
        ticker: &str,
        period1: i64,
        period2: i64,
    ) -> Result<BTreeMap<NaiveDate, f64>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let res = self.fetch_once(ticker, period1, period2).await;
            match res {
                Ok(parsed) => return parse_chart(ticker, parsed),
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ticker, ?backoff, error = %err, "price fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl PriceProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_adjusted_close(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceTable> {
        let (period1, period2) = period_bounds(start, end)?;

        let mut histories = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let history = self.fetch_history(ticker, period1, period2).await?;
            tracing::debug!(ticker = %ticker, rows = history.len(), "fetched price history");
            histories.push(history);
        }

        join_on_common_dates(tickers, histories)
    }
}

/// Extracts date-keyed adjusted closes from a chart payload, skipping null bars.
///
/// Falls back to raw closes when the payload carries no adjusted series.
pub fn parse_chart(ticker: &str, resp: ChartResponse) -> Result<BTreeMap<NaiveDate, f64>> {
    if let Some(err) = resp.chart.error {
        anyhow::bail!(
            "data provider rejected {ticker}: {} {}",
            err.code,
            err.description.unwrap_or_default()
        );
    }

    let result = resp
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .with_context(|| format!("no price data returned for {ticker}"))?;

    let offset = result
        .meta
        .as_ref()
        .and_then(|m| m.gmtoffset)
        .unwrap_or(0);

    let prices = match result.indicators.adjclose.into_iter().next() {
        Some(adj) => adj.adjclose,
        None => result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .with_context(|| format!("no close prices returned for {ticker}"))?,
    };

    anyhow::ensure!(
        prices.len() == result.timestamp.len(),
        "price/timestamp length mismatch for {ticker}: {} prices, {} timestamps",
        prices.len(),
        result.timestamp.len()
    );

    let mut out = BTreeMap::new();
    for (ts, price) in result.timestamp.iter().zip(prices) {
        let Some(price) = price.filter(|p| p.is_finite()) else {
            continue;
        };
        let date = session_date(*ts, offset)
            .with_context(|| format!("timestamp out of range for {ticker}: {ts}"))?;
        out.insert(date, price);
    }

    anyhow::ensure!(!out.is_empty(), "no price data returned for {ticker}");
    Ok(out)
}

/// Aligns per-ticker histories on the dates every ticker reports.
pub fn join_on_common_dates(
    tickers: &[String],
    histories: Vec<BTreeMap<NaiveDate, f64>>,
) -> Result<PriceTable> {
    anyhow::ensure!(
        tickers.len() == histories.len(),
        "got {} histories for {} tickers",
        histories.len(),
        tickers.len()
    );

    let dates: Vec<NaiveDate> = match histories.split_first() {
        Some((first, rest)) => first
            .keys()
            .filter(|d| rest.iter().all(|h| h.contains_key(d)))
            .copied()
            .collect(),
        None => Vec::new(),
    };
    anyhow::ensure!(
        !dates.is_empty(),
        "no overlapping price history for {}",
        tickers.join(",")
    );

    let values = histories
        .iter()
        .map(|h| dates.iter().map(|d| h[d]).collect())
        .collect();

    PriceTable::new(dates, tickers.to_vec(), values)
}
