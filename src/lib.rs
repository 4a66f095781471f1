pub mod macro_config;
pub mod market;
pub mod strategist;

// Re-export key types
pub use macro_config::{mask_secret, ApiKey, ConfigError, MacroConfig};

pub use market::{
    GlobalMacroLoader,
    MarketSummary,
    MetricsSet,
    PriceProvider,
    PriceTable,
    YahooFinanceClient,
};

pub use strategist::{
    format_report_for_display,
    CompletionClient,
    DeepSeekClient,
    MacroStrategist,
    Report,
};
