use crate::analytics::returns::daily_returns;
use crate::domain::table::PriceTable;
use anyhow::ensure;

/// Annualized compounded mean of historical daily returns, one entry per column:
/// `(Π(1 + r_t))^(frequency / n) - 1`.
pub fn mean_historical_return(table: &PriceTable, frequency: usize) -> anyhow::Result<Vec<f64>> {
    let returns = daily_returns(table);
    ensure!(!returns.is_empty(), "price table has no columns");

    let mut out = Vec::with_capacity(returns.len());
    for (name, r) in table.columns().iter().zip(&returns) {
        ensure!(!r.is_empty(), "not enough price history to estimate returns for {name}");
        let growth: f64 = r.iter().map(|x| 1.0 + x).product();
        ensure!(
            growth > 0.0 && growth.is_finite(),
            "degenerate price history for {name}"
        );
        out.push(growth.powf(frequency as f64 / r.len() as f64) - 1.0);
    }
    Ok(out)
}

/// Annualized sample covariance of daily returns (n - 1 denominator).
pub fn sample_cov(table: &PriceTable, frequency: usize) -> anyhow::Result<Vec<Vec<f64>>> {
    let returns = daily_returns(table);
    ensure!(!returns.is_empty(), "price table has no columns");

    let t = returns[0].len();
    ensure!(
        t >= 2,
        "at least two daily returns are needed for a covariance estimate (got {t})"
    );

    let means: Vec<f64> = returns
        .iter()
        .map(|r| r.iter().sum::<f64>() / t as f64)
        .collect();

    let n = returns.len();
    let scale = frequency as f64 / (t - 1) as f64;
    let mut cov = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let s: f64 = (0..t)
                .map(|k| (returns[i][k] - means[i]) * (returns[j][k] - means[j]))
                .sum();
            cov[i][j] = s * scale;
            cov[j][i] = cov[i][j];
        }
    }

    ensure!(
        cov.iter().flatten().all(|v| v.is_finite()),
        "covariance estimate is not finite"
    );
    Ok(cov)
}
