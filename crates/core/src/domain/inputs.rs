use anyhow::{ensure, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TICKERS: &str = "MA,FB,V,AMZN,JPM,BA";
pub const DEFAULT_RISK_FREE_RATE: &str = "0.0382";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2013, 1, 1).unwrap_or_default()
}

/// Raw user selection as submitted by the page form. Absent fields fall back
/// to the dashboard defaults. A blank date also means the default, since an
/// empty date input submits `""`; blank tickers or rate are kept and fail to
/// parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardRequest {
    pub start: Option<String>,
    pub end: Option<String>,
    pub tickers: Option<String>,
    pub risk_free_rate: Option<String>,
}

/// The user selection with defaults applied, still as entered text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardForm {
    pub start: String,
    pub end: String,
    pub tickers: String,
    pub risk_free_rate: String,
}

impl DashboardRequest {
    pub fn resolve(self, today: NaiveDate) -> DashboardForm {
        fn date_or(v: Option<String>, default: NaiveDate) -> String {
            v.filter(|s| !s.is_empty())
                .unwrap_or_else(|| default.format(DATE_FORMAT).to_string())
        }

        DashboardForm {
            start: date_or(self.start, default_start_date()),
            end: date_or(self.end, today),
            tickers: self.tickers.unwrap_or_else(|| DEFAULT_TICKERS.to_string()),
            risk_free_rate: self
                .risk_free_rate
                .unwrap_or_else(|| DEFAULT_RISK_FREE_RATE.to_string()),
        }
    }
}

/// Typed parameters for one dashboard computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardInputs {
    /// Uppercased ticker text exactly as it is echoed in the page header.
    pub tickers_string: String,
    pub tickers: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// A fraction: 0.02 means 2%.
    pub risk_free_rate: f64,
}

impl DashboardInputs {
    pub fn from_form(form: &DashboardForm) -> anyhow::Result<Self> {
        let (tickers_string, tickers) = parse_tickers(&form.tickers)?;

        let start = NaiveDate::parse_from_str(&form.start, DATE_FORMAT)
            .with_context(|| format!("invalid start date: {}", form.start))?;
        let end = NaiveDate::parse_from_str(&form.end, DATE_FORMAT)
            .with_context(|| format!("invalid end date: {}", form.end))?;

        let risk_free_rate = form
            .risk_free_rate
            .parse::<f64>()
            .with_context(|| format!("invalid risk free rate: {}", form.risk_free_rate))?;
        ensure!(
            risk_free_rate.is_finite(),
            "risk free rate must be finite (got {risk_free_rate})"
        );

        Ok(Self {
            tickers_string,
            tickers,
            start,
            end,
            risk_free_rate,
        })
    }
}

/// Uppercases the input and splits it on commas.
///
/// Entries are not trimmed or deduplicated; `"MA, V"` yields `" V"`, which the
/// price provider then rejects. Only empty entries are refused here since they
/// can never name a price column.
pub fn parse_tickers(input: &str) -> anyhow::Result<(String, Vec<String>)> {
    let upper = input.to_uppercase();
    let tickers: Vec<String> = upper.split(',').map(str::to_string).collect();
    ensure!(
        tickers.iter().all(|t| !t.is_empty()),
        "ticker list contains an empty entry: {input:?}"
    );
    Ok((upper, tickers))
}
