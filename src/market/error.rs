use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status} for {ticker}")]
    Status { ticker: String, status: u16 },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("Provider error for {ticker}: {message}")]
    Provider { ticker: String, message: String },

    #[error("No data returned for {0:?}")]
    NoData(Vec<String>),

    #[error("Multi-level frame has no Close level")]
    MissingCloseLevel,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Price table is empty")]
    EmptyTable,

    #[error("Zero base price for {ticker} at row {row}")]
    ZeroBasePrice { ticker: String, row: usize },

    #[error("Non-finite {metric} for {ticker}")]
    NonFinite { metric: &'static str, ticker: String },
}
