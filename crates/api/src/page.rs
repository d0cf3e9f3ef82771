use crate::charts;
use sharpe_core::dashboard::error::DashboardError;
use sharpe_core::dashboard::report::DashboardReport;
use sharpe_core::domain::inputs::DashboardForm;

const PAGE_TITLE: &str = "Stock Portfolio Optimizer";
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

pub fn render(form: &DashboardForm, outcome: &Result<DashboardReport, DashboardError>) -> String {
    let body = match outcome {
        Ok(report) => render_report(report),
        Err(err) => format!("<p class=\"error\">{}</p>", escape_html(err.user_message())),
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{PAGE_TITLE}</title>\n<script src=\"{PLOTLY_JS}\"></script>\n</head>\n\
         <body>\n<h1>{PAGE_TITLE}</h1>\n{form}\n{body}\n</body>\n</html>\n",
        form = render_form(form),
    )
}

fn render_form(form: &DashboardForm) -> String {
    format!(
        "<form method=\"get\" action=\"/\">\n\
         <label>Start Date <input type=\"date\" name=\"start\" value=\"{start}\"></label>\n\
         <label>End Date <input type=\"date\" name=\"end\" value=\"{end}\"></label>\n\
         <label>Enter your defined risk free rate WITHOUT PERCENTAGE, e.g. \"0.02 for 2%\" \
         <input type=\"text\" name=\"risk_free_rate\" value=\"{rate}\"></label>\n\
         <label>Enter all stock tickers to be included in portfolio separated by commas WITHOUT spaces, \
         e.g. \"MA,FB,V,AMZN,JPM,BA\" \
         <input type=\"text\" name=\"tickers\" value=\"{tickers}\"></label>\n\
         <button type=\"submit\">Optimize</button>\n</form>",
        start = escape_html(&form.start),
        end = escape_html(&form.end),
        rate = escape_html(&form.risk_free_rate),
        tickers = escape_html(&form.tickers),
    )
}

/// All nine artifacts, always in the same order.
fn render_report(report: &DashboardReport) -> String {
    let perf = &report.performance;
    let mut out = String::new();

    out.push_str(&format!(
        "<h2>Your Portfolio Consists of {} Stocks</h2>\n",
        escape_html(&report.inputs.tickers_string)
    ));
    out.push_str(
        &charts::cumulative_chart(&report.optimized_cumulative_returns, charts::TITLE_OPTIMIZED)
            .to_inline_html(Some("optimized-cumulative-returns")),
    );

    out.push_str("<h2>Optimized Max Sharpe Portfolio Weights</h2>\n");
    out.push_str(&weights_table(report));

    out.push_str(&format!(
        "<h2>Expected annual return: {:.2}%</h2>\n",
        perf.expected_annual_return * 100.0
    ));
    out.push_str(&format!(
        "<h2>Annual volatility: {:.2}%</h2>\n",
        perf.annual_volatility * 100.0
    ));
    out.push_str(&format!(
        "<h2>Sharpe Ratio: {:.2}</h2>\n",
        perf.sharpe_ratio
    ));

    out.push_str(
        &charts::correlation_heatmap(&report.correlation).to_inline_html(Some("correlation")),
    );
    out.push_str(&charts::price_chart(report).to_inline_html(Some("prices")));
    out.push_str(
        &charts::cumulative_chart(&report.cumulative_returns, charts::TITLE_CUMULATIVE)
            .to_inline_html(Some("cumulative-returns")),
    );
    out
}

fn weights_table(report: &DashboardReport) -> String {
    let mut out = String::from("<table class=\"weights\">\n<tr><th></th><th>weights</th></tr>\n");
    for w in &report.weights {
        out.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape_html(&w.ticker),
            w.weight
        ));
    }
    out.push_str("</table>\n");
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sharpe_core::dashboard;
    use sharpe_core::dashboard::error::{Stage, USER_ERROR_MESSAGE};
    use sharpe_core::ingest::fixture::StaticPriceProvider;

    fn form(tickers: &str) -> DashboardForm {
        DashboardForm {
            start: "2020-01-01".to_string(),
            end: "2020-12-31".to_string(),
            tickers: tickers.to_string(),
            risk_free_rate: "0.02".to_string(),
        }
    }

    async fn outcome(tickers: &str) -> Result<DashboardReport, DashboardError> {
        let provider = StaticPriceProvider::synthetic(
            &["MA", "V", "JPM"],
            NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
        )
        .unwrap();
        dashboard::run(&form(tickers), &provider).await
    }

    #[tokio::test]
    async fn artifacts_render_in_fixed_order() {
        let html = render(&form("MA,V,JPM"), &outcome("MA,V,JPM").await);

        let markers = [
            "Your Portfolio Consists of MA,V,JPM Stocks",
            "optimized-cumulative-returns",
            "Optimized Max Sharpe Portfolio Weights",
            "Expected annual return:",
            "Annual volatility:",
            "Sharpe Ratio:",
            "\"correlation\"",
            "\"prices\"",
            "\"cumulative-returns\"",
        ];
        let positions: Vec<usize> = markers
            .iter()
            .map(|m| html.find(m).unwrap_or_else(|| panic!("missing {m}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
        assert!(!html.contains(USER_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn failure_renders_only_the_static_message() {
        let res = outcome("MA,V,NOTASYMBOL").await;
        assert_eq!(res.as_ref().unwrap_err().stage, Stage::FetchPrices);

        let html = render(&form("MA,V,NOTASYMBOL"), &res);
        assert!(html.contains(&escape_html(USER_ERROR_MESSAGE)));
        assert!(!html.contains("Plotly.newPlot"));
        assert!(!html.contains("Sharpe Ratio:"));
        assert!(html.contains("value=\"MA,V,NOTASYMBOL\""));
    }

    #[tokio::test]
    async fn stats_and_weights_are_formatted() {
        let res = outcome("MA,V").await;
        let report = res.as_ref().unwrap();
        let html = render_report(report);

        let perf = &report.performance;
        assert!(html.contains(&format!(
            "<h2>Expected annual return: {:.2}%</h2>\n",
            perf.expected_annual_return * 100.0
        )));
        assert!(html.contains(&format!("<h2>Sharpe Ratio: {:.2}</h2>\n", perf.sharpe_ratio)));
        for w in &report.weights {
            assert!(html.contains(&format!("<tr><td>{}</td><td>{}</td></tr>\n", w.ticker, w.weight)));
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html("<b>\"MA\"&'V'</b>"),
            "&lt;b&gt;&quot;MA&quot;&amp;&#39;V&#39;&lt;/b&gt;"
        );
    }
}
