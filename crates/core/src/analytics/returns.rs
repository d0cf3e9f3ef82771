use crate::domain::table::PriceTable;

/// Base value of a rebased cumulative-return index.
pub const INDEX_BASE: f64 = 100.0;

/// Relative change between consecutive observations; one shorter than the input.
pub fn pct_change(series: &[f64]) -> Vec<f64> {
    series.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Rebases a price series to an index starting at [`INDEX_BASE`].
///
/// The first observation has no defined change and becomes the base; every
/// later point is `INDEX_BASE * Π(1 + r)` over the changes seen so far.
pub fn cumulative_index(series: &[f64]) -> Vec<f64> {
    if series.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(series.len());
    let mut level = INDEX_BASE;
    out.push(level);
    for r in pct_change(series) {
        level *= 1.0 + r;
        out.push(level);
    }
    out
}

/// Cumulative return index for every column of `table`.
///
/// Rows with a missing value in any column are dropped first so all columns
/// share the same dates.
pub fn cumulative_returns(table: &PriceTable) -> anyhow::Result<PriceTable> {
    let clean = table.drop_missing_rows();
    let (columns, values): (Vec<String>, Vec<Vec<f64>>) = clean
        .series()
        .map(|(name, series)| (name.to_string(), cumulative_index(series)))
        .unzip();
    PriceTable::new(clean.dates().to_vec(), columns, values)
}

/// Daily simple returns per column, computed over rows with no missing values.
pub fn daily_returns(table: &PriceTable) -> Vec<Vec<f64>> {
    let clean = table.drop_missing_rows();
    clean.series().map(|(_, series)| pct_change(series)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, day).unwrap()
    }

    #[test]
    fn pct_change_drops_leading_value() {
        let r = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert_relative_eq!(r[0], 0.10, epsilon = 1e-12);
        assert_relative_eq!(r[1], -0.10, epsilon = 1e-12);
    }

    #[test]
    fn constant_series_is_flat_at_base() {
        let idx = cumulative_index(&[42.0; 10]);
        assert_eq!(idx.len(), 10);
        assert!(idx.iter().all(|v| *v == INDEX_BASE));
    }

    #[test]
    fn index_tracks_price_relative_to_first_row() {
        let prices = [50.0, 55.0, 45.0, 60.0];
        let idx = cumulative_index(&prices);
        assert_eq!(idx[0], 100.0);
        for (p, v) in prices.iter().zip(&idx) {
            assert_relative_eq!(*v, 100.0 * p / prices[0], epsilon = 1e-9);
        }
    }

    #[test]
    fn empty_series_yields_empty_index() {
        assert!(cumulative_index(&[]).is_empty());
        assert!(pct_change(&[1.0]).is_empty());
    }

    #[test]
    fn table_transform_skips_incomplete_rows() {
        let table = PriceTable::new(
            vec![d(2), d(3), d(4)],
            vec!["MA".to_string(), "V".to_string()],
            vec![vec![10.0, f64::NAN, 12.0], vec![20.0, 21.0, 22.0]],
        )
        .unwrap();

        let cum = cumulative_returns(&table).unwrap();
        assert_eq!(cum.dates(), &[d(2), d(4)]);
        assert_eq!(cum.column("MA").unwrap()[0], 100.0);
        assert_relative_eq!(cum.column("MA").unwrap()[1], 120.0, epsilon = 1e-9);
        assert_relative_eq!(cum.column("V").unwrap()[1], 110.0, epsilon = 1e-9);

        let daily = daily_returns(&table);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].len(), 1);
    }
}
