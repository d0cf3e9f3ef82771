use chrono::NaiveDate;
use plotly::common::{Mode, Title};
use plotly::layout::Annotation;
use plotly::{HeatMap, Layout, Plot, Scatter};
use sharpe_core::analytics::correlation::CorrelationMatrix;
use sharpe_core::dashboard::report::DashboardReport;
use sharpe_core::domain::inputs::DATE_FORMAT;
use sharpe_core::domain::table::PriceTable;

const CHART_HEIGHT: usize = 450;

pub const TITLE_PRICES: &str = "Price of Individual Stocks";
pub const TITLE_CUMULATIVE: &str = "Cumulative Returns of Individual Stocks Starting with $100";
pub const TITLE_OPTIMIZED: &str = "Cumulative Returns of Optimized Portfolio Starting with $100";
pub const TITLE_CORRELATION: &str = "Correlation between Stocks";

pub fn price_chart(report: &DashboardReport) -> Plot {
    line_chart(TITLE_PRICES, report.prices.dates(), report.ticker_prices())
}

pub fn cumulative_chart(table: &PriceTable, title: &str) -> Plot {
    line_chart(title, table.dates(), table.series())
}

fn line_chart<'a>(
    title: &str,
    dates: &[NaiveDate],
    series: impl Iterator<Item = (&'a str, &'a [f64])>,
) -> Plot {
    let x: Vec<String> = dates
        .iter()
        .map(|d| d.format(DATE_FORMAT).to_string())
        .collect();

    let mut plot = Plot::new();
    for (name, values) in series {
        let trace = Scatter::new(x.clone(), values.to_vec())
            .name(name.to_string())
            .mode(Mode::Lines);
        plot.add_trace(trace);
    }
    plot.set_layout(
        Layout::new()
            .title(Title::from(title))
            .height(CHART_HEIGHT),
    );
    plot
}

/// Correlation heatmap with each cell's value written on it.
pub fn correlation_heatmap(corr: &CorrelationMatrix) -> Plot {
    let mut plot = Plot::new();
    plot.add_trace(HeatMap::new(
        corr.labels.clone(),
        corr.labels.clone(),
        corr.values.clone(),
    ));

    let mut annotations = Vec::new();
    for (i, row) in corr.values.iter().enumerate() {
        for (j, v) in row.iter().enumerate() {
            let text = if v.is_finite() {
                format!("{v:.2}")
            } else {
                "n/a".to_string()
            };
            annotations.push(
                Annotation::new()
                    .x(j as f64)
                    .y(i as f64)
                    .text(text)
                    .show_arrow(false),
            );
        }
    }

    plot.set_layout(
        Layout::new()
            .title(Title::from(TITLE_CORRELATION))
            .height(CHART_HEIGHT)
            .annotations(annotations),
    );
    plot
}
