use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// One provider column: a value per date, `None` where the provider had a gap.
pub type Column = Vec<Option<f64>>;

/// Raw provider output before normalization. Either ticker-keyed columns, or
/// a field level (`Close`, `Open`, ...) over ticker-keyed columns. Both share
/// one date index.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderFrame {
    Flat {
        dates: Vec<NaiveDate>,
        columns: BTreeMap<String, Column>,
    },
    MultiLevel {
        dates: Vec<NaiveDate>,
        levels: BTreeMap<String, BTreeMap<String, Column>>,
    },
}

impl ProviderFrame {
    pub fn dates(&self) -> &[NaiveDate] {
        match self {
            ProviderFrame::Flat { dates, .. } => dates,
            ProviderFrame::MultiLevel { dates, .. } => dates,
        }
    }

    pub fn is_empty(&self) -> bool {
        let no_columns = match self {
            ProviderFrame::Flat { columns, .. } => columns.is_empty(),
            ProviderFrame::MultiLevel { levels, .. } => levels.values().all(|c| c.is_empty()),
        };
        self.dates().is_empty() || no_columns
    }
}

/// Date-indexed adjusted close prices, one column per ticker.
///
/// Dates are strictly increasing and every cell holds a finite, non-negative
/// price.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl PriceTable {
    /// Builds a clean table from sparse columns: rows are sorted by date
    /// (a repeated date keeps its last row), gaps are forward-filled and rows
    /// that are still incomplete are dropped.
    pub fn from_columns(dates: Vec<NaiveDate>, columns: Vec<(String, Column)>) -> Self {
        let tickers: Vec<String> = columns.iter().map(|(t, _)| t.clone()).collect();

        let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
        for (i, date) in dates.iter().enumerate() {
            let row = columns
                .iter()
                .map(|(_, col)| col.get(i).copied().flatten().filter(|v| is_valid_price(*v)))
                .collect();
            by_date.insert(*date, row);
        }

        let mut last_seen: Vec<Option<f64>> = vec![None; tickers.len()];
        let mut clean_dates = Vec::with_capacity(by_date.len());
        let mut rows = Vec::with_capacity(by_date.len());

        for (date, row) in by_date {
            for (slot, cell) in last_seen.iter_mut().zip(row) {
                if cell.is_some() {
                    *slot = cell;
                }
            }
            if let Some(complete) = last_seen.iter().copied().collect::<Option<Vec<f64>>>() {
                clean_dates.push(date);
                rows.push(complete);
            }
        }

        Self {
            dates: clean_dates,
            tickers,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.tickers.is_empty()
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn column_index(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    pub fn column(&self, ticker: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(ticker)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn latest_price(&self, ticker: &str) -> Option<f64> {
        let idx = self.column_index(ticker)?;
        self.rows.last().map(|row| row[idx])
    }

    /// The last `n` rows.
    pub fn tail(&self, n: usize) -> PriceTable {
        let start = self.len().saturating_sub(n);
        Self {
            dates: self.dates[start..].to_vec(),
            tickers: self.tickers.clone(),
            rows: self.rows[start..].to_vec(),
        }
    }
}

fn is_valid_price(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl fmt::Display for PriceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .tickers
            .iter()
            .map(|t| t.len())
            .max()
            .unwrap_or(0)
            .max(12);

        write!(f, "{:<10}", "Date")?;
        for ticker in &self.tickers {
            write!(f, " {:>width$}", ticker, width = width)?;
        }
        for (date, row) in self.dates.iter().zip(&self.rows) {
            write!(f, "\n{:<10}", date.format("%Y-%m-%d"))?;
            for price in row {
                write!(f, " {:>width$.4}", price, width = width)?;
            }
        }
        Ok(())
    }
}

/// A single named metric value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(usize),
    Number(f64),
    Flag(bool),
}

/// Metrics derived from one fetch. An empty set means "no metrics available";
/// every lookup on it yields zero or false.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MetricsSet {
    pub metadata_days: usize,
    pub tech_volatility: f64,
    /// Tech volatility over the configured short window.
    pub tech_volatility_short: f64,
    pub risk_on_signal: bool,
    pub volatility: BTreeMap<String, f64>,
    pub trend_medium: BTreeMap<String, f64>,
    pub return_5d: BTreeMap<String, f64>,
}

impl MetricsSet {
    pub fn is_empty(&self) -> bool {
        self.metadata_days == 0
    }

    pub fn days(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.metadata_days)
    }

    pub fn trend_medium_of(&self, ticker: &str) -> f64 {
        self.trend_medium.get(ticker).copied().unwrap_or(0.0)
    }

    pub fn return_5d_of(&self, ticker: &str) -> f64 {
        self.return_5d.get(ticker).copied().unwrap_or(0.0)
    }

    pub fn volatility_of(&self, ticker: &str) -> f64 {
        self.volatility.get(ticker).copied().unwrap_or(0.0)
    }

    /// Flat `name -> value` view, e.g. `QQQ_trend_medium`, `risk_on_signal`.
    pub fn named_values(&self) -> BTreeMap<String, MetricValue> {
        let mut named = BTreeMap::new();
        if self.is_empty() {
            return named;
        }

        named.insert("metadata_days".to_string(), MetricValue::Count(self.metadata_days));
        named.insert("tech_volatility".to_string(), MetricValue::Number(self.tech_volatility));
        named.insert(
            "tech_volatility_short".to_string(),
            MetricValue::Number(self.tech_volatility_short),
        );
        named.insert("risk_on_signal".to_string(), MetricValue::Flag(self.risk_on_signal));
        for (ticker, value) in &self.volatility {
            named.insert(format!("{}_volatility", ticker), MetricValue::Number(*value));
        }
        for (ticker, value) in &self.trend_medium {
            named.insert(format!("{}_trend_medium", ticker), MetricValue::Number(*value));
        }
        for (ticker, value) in &self.return_5d {
            named.insert(format!("{}_return_5d", ticker), MetricValue::Number(*value));
        }
        named
    }

    pub fn get(&self, name: &str) -> Option<MetricValue> {
        self.named_values().get(name).copied()
    }
}

/// Latest-snapshot summary as ordered `key -> formatted value` pairs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarketSummary {
    entries: Vec<(String, String)>,
}

impl MarketSummary {
    pub fn insert(&mut self, key: &str, value: String) {
        self.entries.push((key.to_string(), value));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Display for MarketSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_forward_fill_and_drop_leading_gaps() {
        let table = PriceTable::from_columns(
            vec![day(1), day(2), day(3), day(4)],
            vec![
                ("QQQ".into(), vec![Some(1.0), Some(2.0), None, Some(4.0)]),
                ("BTC-USD".into(), vec![None, Some(20.0), Some(30.0), None]),
            ],
        );

        assert_eq!(table.dates(), &[day(2), day(3), day(4)]);
        assert_eq!(table.column("QQQ").unwrap(), vec![2.0, 2.0, 4.0]);
        assert_eq!(table.column("BTC-USD").unwrap(), vec![20.0, 30.0, 30.0]);
    }

    #[test]
    fn test_unsorted_and_duplicate_dates() {
        let table = PriceTable::from_columns(
            vec![day(3), day(1), day(3)],
            vec![("GLD".into(), vec![Some(3.0), Some(1.0), Some(3.5)])],
        );

        assert_eq!(table.dates(), &[day(1), day(3)]);
        assert_eq!(table.column("GLD").unwrap(), vec![1.0, 3.5]);
    }

    #[test]
    fn test_invalid_cells_are_gaps() {
        let table = PriceTable::from_columns(
            vec![day(1), day(2)],
            vec![("GLD".into(), vec![Some(f64::NAN), Some(-1.0)])],
        );
        assert!(table.is_empty());
    }

    #[test]
    fn test_tail_and_latest() {
        let table = PriceTable::from_columns(
            (1..=8).map(day).collect(),
            vec![("QQQ".into(), (1..=8).map(|v| Some(v as f64)).collect())],
        );

        let tail = table.tail(5);
        assert_eq!(tail.len(), 5);
        assert_eq!(tail.column("QQQ").unwrap(), vec![4.0, 5.0, 6.0, 7.0, 8.0]);
        assert_eq!(table.tail(50).len(), 8);
        assert_eq!(table.latest_date(), Some(day(8)));
        assert_eq!(table.latest_price("QQQ"), Some(8.0));
        assert_eq!(table.latest_price("GLD"), None);
    }

    #[test]
    fn test_display_lists_dates_and_tickers() {
        let table = PriceTable::from_columns(
            vec![day(1)],
            vec![("QQQ".into(), vec![Some(431.5)])],
        );
        let text = table.to_string();
        assert!(text.starts_with("Date"));
        assert!(text.contains("QQQ"));
        assert!(text.contains("2024-03-01"));
        assert!(text.contains("431.5000"));
    }

    #[test]
    fn test_empty_metrics_lookups_default() {
        let metrics = MetricsSet::default();
        assert!(metrics.is_empty());
        assert_eq!(metrics.days(), None);
        assert_eq!(metrics.trend_medium_of("QQQ"), 0.0);
        assert_eq!(metrics.return_5d_of("BTC-USD"), 0.0);
        assert_eq!(metrics.volatility_of("GLD"), 0.0);
        assert!(!metrics.risk_on_signal);
        assert!(metrics.named_values().is_empty());
    }

    #[test]
    fn test_named_values() {
        let mut metrics = MetricsSet {
            metadata_days: 10,
            tech_volatility: 0.2,
            risk_on_signal: true,
            ..Default::default()
        };
        metrics.trend_medium.insert("QQQ".into(), 0.1);
        metrics.return_5d.insert("QQQ".into(), -0.01);

        assert_eq!(metrics.get("metadata_days"), Some(MetricValue::Count(10)));
        assert_eq!(metrics.get("QQQ_trend_medium"), Some(MetricValue::Number(0.1)));
        assert_eq!(metrics.get("QQQ_return_5d"), Some(MetricValue::Number(-0.01)));
        assert_eq!(metrics.get("risk_on_signal"), Some(MetricValue::Flag(true)));
        assert_eq!(metrics.get("GLD_trend_medium"), None);
    }

    #[test]
    fn test_summary_display_keeps_insertion_order() {
        let mut summary = MarketSummary::default();
        summary.insert("latest_date", "2024-03-01".into());
        summary.insert("data_points", "42".into());
        assert_eq!(summary.to_string(), "{latest_date: 2024-03-01, data_points: 42}");
        assert_eq!(summary.get("data_points"), Some("42"));
    }
}
