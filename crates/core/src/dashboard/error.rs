use serde::Serialize;
use std::fmt;

/// The one message users see whenever a dashboard run fails, whatever the cause.
pub const USER_ERROR_MESSAGE: &str = "Enter correct stock tickers to be included in portfolio separated by commas WITHOUT spaces, e.g. \"MA,FB,V,AMZN,JPM,BA\" and hit Enter.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ParseInput,
    FetchPrices,
    Estimate,
    Optimize,
    Assemble,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ParseInput => "parse_input",
            Self::FetchPrices => "fetch_prices",
            Self::Estimate => "estimate",
            Self::Optimize => "optimize",
            Self::Assemble => "assemble",
        }
    }
}

/// Failure of a dashboard run. Carries where it failed and why; the page only
/// ever shows [`USER_ERROR_MESSAGE`].
#[derive(Debug, Clone)]
pub struct DashboardError {
    pub stage: Stage,
    pub detail: String,
}

impl DashboardError {
    pub fn user_message(&self) -> &'static str {
        USER_ERROR_MESSAGE
    }
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dashboard run failed (stage={}): {}",
            self.stage.as_str(),
            self.detail
        )
    }
}

impl std::error::Error for DashboardError {}

pub(crate) trait AtStage<T> {
    fn at_stage(self, stage: Stage) -> Result<T, DashboardError>;
}

impl<T, E> AtStage<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn at_stage(self, stage: Stage) -> Result<T, DashboardError> {
        self.map_err(|e| DashboardError {
            stage,
            detail: format!("{:#}", e.into()),
        })
    }
}
