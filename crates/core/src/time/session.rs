use anyhow::Context;
use chrono::{DateTime, Days, NaiveDate, Utc};

/// Default end of the requested range: the current UTC calendar date.
pub fn today(now_utc: DateTime<Utc>) -> NaiveDate {
    now_utc.date_naive()
}

/// Epoch-second bounds `[period1, period2)` covering `start..=end` in UTC.
///
/// `period2` is midnight after `end` so the last requested day is included.
/// An inverted range is passed through unchanged; the provider decides what an
/// empty window returns.
pub fn period_bounds(start: NaiveDate, end: NaiveDate) -> anyhow::Result<(i64, i64)> {
    let period1 = start
        .and_hms_opt(0, 0, 0)
        .context("invalid start date")?
        .and_utc()
        .timestamp();
    let period2 = end
        .checked_add_days(Days::new(1))
        .context("end date out of range")?
        .and_hms_opt(0, 0, 0)
        .context("invalid end date")?
        .and_utc()
        .timestamp();
    Ok((period1, period2))
}

/// Trading session date of a bar timestamp, in the exchange's local time.
pub fn session_date(timestamp: i64, gmtoffset_secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp.checked_add(gmtoffset_secs)?, 0).map(|dt| dt.date_naive())
}
