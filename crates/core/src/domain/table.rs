use anyhow::{ensure, Context};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Date-indexed table of prices, one column per ticker.
///
/// Values are stored column-major; `NaN` marks a missing observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl PriceTable {
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> anyhow::Result<Self> {
        ensure!(
            columns.len() == values.len(),
            "column count mismatch: {} names for {} series",
            columns.len(),
            values.len()
        );
        ensure!(
            dates.windows(2).all(|w| w[0] < w[1]),
            "dates must be strictly ascending"
        );

        let mut seen = BTreeSet::new();
        for (name, series) in columns.iter().zip(&values) {
            ensure!(seen.insert(name.as_str()), "duplicate column: {name}");
            ensure!(
                series.len() == dates.len(),
                "column {name} has {} values for {} dates",
                series.len(),
                dates.len()
            );
        }

        Ok(Self {
            dates,
            columns,
            values,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(&self.values[idx])
    }

    pub fn series(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// Appends a derived column. This is the only mutation a fetched table sees.
    pub fn push_column(&mut self, name: impl Into<String>, series: Vec<f64>) -> anyhow::Result<()> {
        let name = name.into();
        ensure!(
            !self.columns.iter().any(|c| *c == name),
            "duplicate column: {name}"
        );
        ensure!(
            series.len() == self.dates.len(),
            "column {name} has {} values for {} dates",
            series.len(),
            self.dates.len()
        );
        self.columns.push(name);
        self.values.push(series);
        Ok(())
    }

    /// Copies out the named columns in the requested order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> anyhow::Result<Self> {
        let mut values = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let series = self
                .column(name)
                .with_context(|| format!("no price column for ticker {name}"))?;
            values.push(series.to_vec());
        }
        Self::new(
            self.dates.clone(),
            names.iter().map(|n| n.as_ref().to_string()).collect(),
            values,
        )
    }

    /// Keeps rows whose date falls inside `[start, end]`.
    pub fn clip(&self, start: NaiveDate, end: NaiveDate) -> Self {
        self.filter_rows(|row| (start..=end).contains(&self.dates[row]))
    }

    /// Drops every row holding a missing value in any column.
    pub fn drop_missing_rows(&self) -> Self {
        self.filter_rows(|row| self.values.iter().all(|s| s[row].is_finite()))
    }

    fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Self {
        let rows: Vec<usize> = (0..self.dates.len()).filter(|&r| keep(r)).collect();
        Self {
            dates: rows.iter().map(|&r| self.dates[r]).collect(),
            columns: self.columns.clone(),
            values: self
                .values
                .iter()
                .map(|s| rows.iter().map(|&r| s[r]).collect())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn sample() -> PriceTable {
        PriceTable::new(
            vec![d(2), d(3), d(6)],
            vec!["MA".to_string(), "V".to_string()],
            vec![vec![300.0, f64::NAN, 310.0], vec![190.0, 191.0, 192.0]],
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_columns() {
        let res = PriceTable::new(vec![d(2), d(3)], vec!["MA".to_string()], vec![vec![1.0]]);
        assert!(res.is_err());
    }

    #[test]
    fn rejects_unsorted_dates() {
        let res = PriceTable::new(vec![d(3), d(2)], vec![], vec![]);
        assert!(res.is_err());
    }

    #[test]
    fn rejects_duplicate_columns() {
        let res = PriceTable::new(
            vec![d(2)],
            vec!["MA".to_string(), "MA".to_string()],
            vec![vec![1.0], vec![2.0]],
        );
        assert!(res.is_err());
    }

    #[test]
    fn push_column_appends_and_guards_length() {
        let mut t = sample();
        t.push_column("Optimized Portfolio", vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(t.columns().last().unwrap(), "Optimized Portfolio");
        assert!(t.push_column("X", vec![1.0]).is_err());
        assert!(t.push_column("MA", vec![1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn drop_missing_rows_removes_incomplete_dates() {
        let t = sample().drop_missing_rows();
        assert_eq!(t.dates(), &[d(2), d(6)]);
        assert_eq!(t.column("MA").unwrap(), &[300.0, 310.0]);
        assert_eq!(t.column("V").unwrap(), &[190.0, 192.0]);
    }

    #[test]
    fn select_reorders_and_fails_on_unknown() {
        let t = sample().select(&["V", "MA"]).unwrap();
        assert_eq!(t.columns(), &["V".to_string(), "MA".to_string()]);
        assert!(sample().select(&["NOTASYMBOL"]).is_err());
    }

    #[test]
    fn clip_is_inclusive() {
        let t = sample().clip(d(3), d(6));
        assert_eq!(t.dates(), &[d(3), d(6)]);
    }
}
