use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate};
use log::{debug, info};
use serde::Deserialize;

use super::error::MarketDataError;
use super::types::{Column, ProviderFrame};

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) macro-strategist/0.1";

pub const CLOSE_LEVEL: &str = "Close";

/// Source of daily price history.
#[allow(async_fn_in_trait)]
#[cfg_attr(test, mockall::automock)]
pub trait PriceProvider {
    /// Downloads history for `tickers` over `period` (e.g. `"190d"`) sampled
    /// at `interval` (e.g. `"1d"`).
    async fn download(
        &self,
        tickers: &[String],
        period: &str,
        interval: &str,
    ) -> Result<ProviderFrame, MarketDataError>;
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Column,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Column,
}

/// Daily history of one ticker, keyed by field name. Only `Close` is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerHistory {
    pub dates: Vec<NaiveDate>,
    pub fields: BTreeMap<String, Column>,
}

/// Decodes a Yahoo chart payload. `Close` holds the adjusted close when the
/// payload carries one, the raw close otherwise.
pub fn parse_chart(ticker: &str, body: &str) -> Result<TickerHistory, MarketDataError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| MarketDataError::Decode(e.to_string()))?;

    if let Some(err) = envelope.chart.error {
        return Err(MarketDataError::Provider {
            ticker: ticker.to_string(),
            message: format!("{}: {}", err.code, err.description),
        });
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Err(MarketDataError::NoData(vec![ticker.to_string()]));
    };

    let offset = result.meta.gmtoffset;
    let dates = result
        .timestamp
        .iter()
        .map(|ts| {
            ts.checked_add(offset)
                .and_then(|local| DateTime::from_timestamp(local, 0))
                .map(|dt| dt.date_naive())
                .ok_or_else(|| MarketDataError::Decode(format!("bad timestamp {} for {}", ts, ticker)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let close = match result.indicators.adjclose.into_iter().next() {
        Some(adj) if !adj.adjclose.is_empty() => adj.adjclose,
        _ => quote.close,
    };

    Ok(TickerHistory {
        dates,
        fields: BTreeMap::from([(CLOSE_LEVEL.to_string(), close)]),
    })
}

/// Aligns per-ticker histories on the union of their dates.
pub fn align(histories: Vec<(String, TickerHistory)>) -> ProviderFrame {
    let dates: Vec<NaiveDate> = histories
        .iter()
        .flat_map(|(_, h)| h.dates.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut levels: BTreeMap<String, BTreeMap<String, Column>> = BTreeMap::new();
    for (ticker, history) in histories {
        for (field, values) in history.fields {
            let by_date: BTreeMap<NaiveDate, Option<f64>> = history
                .dates
                .iter()
                .copied()
                .zip(values)
                .collect();
            let column = dates
                .iter()
                .map(|d| by_date.get(d).copied().flatten())
                .collect();
            levels.entry(field).or_default().insert(ticker.clone(), column);
        }
    }

    ProviderFrame::MultiLevel { dates, levels }
}

pub struct YahooFinanceClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        Self::with_base_url(YAHOO_CHART_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: reqwest::Client::new(),
        }
    }

    async fn fetch_ticker(
        &self,
        ticker: &str,
        period: &str,
        interval: &str,
    ) -> Result<TickerHistory, MarketDataError> {
        let url = format!("{}/{}", self.base_url, ticker);
        debug!("GET {} range={} interval={}", url, period, interval);

        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("range", period),
                ("interval", interval),
                ("includeAdjustedClose", "true"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::Status {
                ticker: ticker.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        parse_chart(ticker, &body)
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceProvider for YahooFinanceClient {
    async fn download(
        &self,
        tickers: &[String],
        period: &str,
        interval: &str,
    ) -> Result<ProviderFrame, MarketDataError> {
        let mut histories = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            let history = self.fetch_ticker(ticker, period, interval).await?;
            info!("Fetched {} rows for {}", history.dates.len(), ticker);
            histories.push((ticker.clone(), history));
        }
        Ok(align(histories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QQQ_CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "symbol": "QQQ", "gmtoffset": -14400},
                "timestamp": [1709731800, 1709818200, 1709904600],
                "indicators": {
                    "quote": [{
                        "open": [430.1, 432.0, null],
                        "high": [433.0, 435.5, 436.0],
                        "low": [429.0, 431.2, 433.3],
                        "close": [431.0, 434.0, 435.0],
                        "volume": [41000000, 38000000, 40000000]
                    }],
                    "adjclose": [{"adjclose": [430.5, 433.5, null]}]
                }
            }],
            "error": null
        }
    }"#;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_parse_chart_prefers_adjusted_close() {
        let history = parse_chart("QQQ", QQQ_CHART).unwrap();

        assert_eq!(history.dates, vec![day(6), day(7), day(8)]);
        assert_eq!(history.fields[CLOSE_LEVEL], vec![Some(430.5), Some(433.5), None]);
        assert_eq!(history.fields.len(), 1);
    }

    #[test]
    fn test_parse_chart_falls_back_to_raw_close() {
        let body = r#"{"chart": {"result": [{
            "meta": {"gmtoffset": 0},
            "timestamp": [1709683200],
            "indicators": {"quote": [{"close": [101.25]}]}
        }], "error": null}}"#;

        let history = parse_chart("GLD", body).unwrap();
        assert_eq!(history.fields[CLOSE_LEVEL], vec![Some(101.25)]);
    }

    #[test]
    fn test_parse_chart_provider_error() {
        let body = r#"{"chart": {"result": null,
            "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;

        let err = parse_chart("NOPE", body).unwrap_err();
        assert!(matches!(err, MarketDataError::Provider { ref ticker, .. } if ticker == "NOPE"));
    }

    #[test]
    fn test_parse_chart_timestamp_overflow_is_decode_error() {
        let body = r#"{"chart": {"result": [{
            "meta": {"gmtoffset": 28800},
            "timestamp": [9223372036854775807],
            "indicators": {"quote": [{"close": [3500.0]}]}
        }], "error": null}}"#;

        let err = parse_chart("000300.SS", body).unwrap_err();
        assert!(matches!(err, MarketDataError::Decode(ref msg) if msg.contains("000300.SS")));
    }

    #[test]
    fn test_parse_chart_garbage() {
        let err = parse_chart("QQQ", "<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, MarketDataError::Decode(_)));
    }

    #[test]
    fn test_align_uses_union_of_dates() {
        let history = |dates: Vec<NaiveDate>, closes: Column| TickerHistory {
            dates,
            fields: BTreeMap::from([(CLOSE_LEVEL.to_string(), closes)]),
        };

        let frame = align(vec![
            ("QQQ".into(), history(vec![day(4), day(5)], vec![Some(1.0), Some(2.0)])),
            (
                "BTC-USD".into(),
                history(vec![day(3), day(4), day(5)], vec![Some(10.0), Some(11.0), Some(12.0)]),
            ),
        ]);

        let ProviderFrame::MultiLevel { dates, levels } = frame else {
            panic!("expected multi-level frame");
        };
        assert_eq!(dates, vec![day(3), day(4), day(5)]);
        assert_eq!(levels[CLOSE_LEVEL]["QQQ"], vec![None, Some(1.0), Some(2.0)]);
        assert_eq!(levels[CLOSE_LEVEL]["BTC-USD"], vec![Some(10.0), Some(11.0), Some(12.0)]);
    }
}
