use log::{debug, error, info, warn};

use super::error::MarketDataError;
use super::metrics::compute_metrics;
use super::provider::{PriceProvider, CLOSE_LEVEL};
use super::types::{Column, MarketSummary, MetricsSet, PriceTable, ProviderFrame};
use crate::macro_config::MacroConfig;

const DAILY_INTERVAL: &str = "1d";

/// Flattens a provider frame into ticker-keyed close columns.
///
/// Assumes the upstream shape is either already ticker-keyed, or carries the
/// prices under a `Close` field level. A multi-level frame without that level
/// is rejected rather than guessed at.
pub fn normalize_frame(
    frame: ProviderFrame,
) -> Result<(Vec<chrono::NaiveDate>, Vec<(String, Column)>), MarketDataError> {
    match frame {
        ProviderFrame::Flat { dates, columns } => Ok((dates, columns.into_iter().collect())),
        ProviderFrame::MultiLevel { dates, mut levels } => {
            let close = levels
                .remove(CLOSE_LEVEL)
                .ok_or(MarketDataError::MissingCloseLevel)?;
            Ok((dates, close.into_iter().collect()))
        }
    }
}

pub struct GlobalMacroLoader<P> {
    config: MacroConfig,
    provider: P,
}

impl<P: PriceProvider> GlobalMacroLoader<P> {
    pub fn new(config: MacroConfig, provider: P) -> Self {
        info!("Initializing market data loader: {}", config.describe());
        Self { config, provider }
    }

    pub fn config(&self) -> &MacroConfig {
        &self.config
    }

    /// Downloads and cleans the configured tickers. `None` means no usable
    /// data, which callers treat as a normal outcome.
    pub async fn fetch_combined_data(&self) -> Option<PriceTable> {
        let tickers = self.config.tickers();
        info!("📡 Syncing market data for {:?} ...", tickers);

        match self.try_fetch(&tickers).await {
            Ok(table) if table.is_empty() => {
                error!("No complete rows left after cleaning data for {:?}", tickers);
                None
            }
            Ok(table) => {
                info!("✅ Fetched {} trading days", table.len());
                Some(table)
            }
            Err(e) => {
                error!("Market data download failed: {}", e);
                None
            }
        }
    }

    async fn try_fetch(&self, tickers: &[String]) -> Result<PriceTable, MarketDataError> {
        let period = format!("{}d", self.config.fetch_period_days());
        let frame = self
            .provider
            .download(tickers, &period, DAILY_INTERVAL)
            .await?;

        if frame.is_empty() {
            return Err(MarketDataError::NoData(tickers.to_vec()));
        }

        let (dates, columns) = normalize_frame(frame)?;
        for ticker in tickers {
            if !columns.iter().any(|(t, _)| t == ticker) {
                warn!("Provider returned no column for {}", ticker);
            }
        }
        debug!("Normalized {} dates across {} columns", dates.len(), columns.len());

        Ok(PriceTable::from_columns(dates, columns))
    }

    /// Latest date, row count and latest price per key ticker. Empty when
    /// there is no data.
    pub fn get_market_summary(&self, table: Option<&PriceTable>) -> MarketSummary {
        let mut summary = MarketSummary::default();
        let Some(table) = table.filter(|t| !t.is_empty()) else {
            return summary;
        };
        let price = |ticker: &str| format!("{:.2}", table.latest_price(ticker).unwrap_or(0.0));

        if let Some(date) = table.latest_date() {
            summary.insert("latest_date", date.format("%Y-%m-%d").to_string());
        }
        summary.insert("data_points", table.len().to_string());
        summary.insert("tech_price", price(&self.config.tech_proxy));
        summary.insert("gold_price", price(&self.config.safe_haven_proxy));
        summary.insert("target_price", price(&self.config.target_asset));

        if let Some(crypto) = &self.config.crypto_proxy {
            if table.column_index(crypto).is_some() {
                summary.insert("crypto_price", price(crypto));
            }
        }
        summary
    }

    /// Metrics for `table`. Any failure is logged and yields an empty set.
    pub fn calculate_metrics(&self, table: &PriceTable) -> MetricsSet {
        match compute_metrics(
            table,
            &self.config.tech_proxy,
            &self.config.safe_haven_proxy,
            self.config.volatility_window,
        ) {
            Ok(metrics) => {
                info!("📊 Metrics computed (days={})", metrics.metadata_days);
                metrics
            }
            Err(e) => {
                error!("Metrics computation failed: {}", e);
                MetricsSet::default()
            }
        }
    }
}
