mod error;
mod loader;
mod metrics;
mod provider;
mod types;

pub use error::{MarketDataError, MetricsError};
pub use loader::{normalize_frame, GlobalMacroLoader};
pub use metrics::{
    annualized_volatility,
    compute_metrics,
    pct_change,
    SHORT_TERM_SESSIONS,
    TRADING_DAYS_PER_YEAR,
    VOLATILITY_LOOKBACK_ROWS,
};
pub use provider::{align, parse_chart, PriceProvider, TickerHistory, YahooFinanceClient, CLOSE_LEVEL};
pub use types::{Column, MarketSummary, MetricValue, MetricsSet, PriceTable, ProviderFrame};
