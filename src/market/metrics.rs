use statrs::statistics::Statistics;

use super::error::MetricsError;
use super::types::{MetricsSet, PriceTable};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Trailing rows used for the headline volatility.
pub const VOLATILITY_LOOKBACK_ROWS: usize = 60;
pub const SHORT_TERM_SESSIONS: usize = 5;

/// Period-over-period simple returns. One element shorter than `prices`.
pub fn pct_change(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
}

/// Sample std (n - 1) of the trailing `window` returns scaled by sqrt(252).
/// Zero when fewer than two returns are available.
pub fn annualized_volatility(returns: &[f64], window: usize) -> f64 {
    let start = returns.len().saturating_sub(window);
    let tail = &returns[start..];
    if tail.len() < 2 {
        return 0.0;
    }
    tail.iter().copied().std_dev() * TRADING_DAYS_PER_YEAR.sqrt()
}

fn relative_change(from: f64, to: f64) -> f64 {
    (to - from) / from
}

/// Derives trend, momentum and volatility metrics for every column of `table`.
///
/// The medium-term trend spans the whole table. The short-term return looks
/// back `SHORT_TERM_SESSIONS` rows and falls back to the trend on tables with
/// fewer than six rows.
pub fn compute_metrics(
    table: &PriceTable,
    tech_proxy: &str,
    safe_haven_proxy: &str,
    short_volatility_window: usize,
) -> Result<MetricsSet, MetricsError> {
    if table.is_empty() {
        return Err(MetricsError::EmptyTable);
    }

    let rows = table.len();
    let mut metrics = MetricsSet {
        metadata_days: rows,
        ..Default::default()
    };

    for ticker in table.tickers() {
        let prices = table.column(ticker).unwrap_or_default();

        // Every price except the last is a divisor somewhere below.
        if let Some(row) = prices[..rows - 1].iter().position(|p| *p == 0.0) {
            return Err(MetricsError::ZeroBasePrice {
                ticker: ticker.clone(),
                row,
            });
        }

        let first = prices[0];
        let last = prices[rows - 1];
        let trend = relative_change(first, last);
        let short = if rows > SHORT_TERM_SESSIONS {
            relative_change(prices[rows - 1 - SHORT_TERM_SESSIONS], last)
        } else {
            trend
        };

        let returns = pct_change(&prices);
        let volatility = annualized_volatility(&returns, VOLATILITY_LOOKBACK_ROWS);

        for (metric, value) in [("trend", trend), ("return_5d", short), ("volatility", volatility)] {
            if !value.is_finite() {
                return Err(MetricsError::NonFinite {
                    metric,
                    ticker: ticker.clone(),
                });
            }
        }

        if ticker == tech_proxy {
            metrics.tech_volatility_short = annualized_volatility(&returns, short_volatility_window);
        }

        metrics.trend_medium.insert(ticker.clone(), trend);
        metrics.return_5d.insert(ticker.clone(), short);
        metrics.volatility.insert(ticker.clone(), volatility);
    }

    metrics.tech_volatility = metrics.volatility_of(tech_proxy);
    metrics.risk_on_signal =
        metrics.trend_medium_of(tech_proxy) > metrics.trend_medium_of(safe_haven_proxy);

    Ok(metrics)
}
