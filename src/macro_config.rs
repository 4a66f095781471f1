use std::env;
use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

pub const DEFAULT_TECH_PROXY: &str = "QQQ";
pub const DEFAULT_SAFE_HAVEN_PROXY: &str = "GLD";
pub const DEFAULT_CRYPTO_PROXY: &str = "BTC-USD";
pub const DEFAULT_TARGET_ASSET: &str = "000300.SS";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 150;
pub const DEFAULT_VOLATILITY_WINDOW: usize = 20;
/// Ten years of sessions; anything longer is a typo.
pub const MAX_LOOKBACK_DAYS: u32 = 3650;
pub const MAX_VOLATILITY_WINDOW: usize = 252;
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

pub const API_KEY_VAR: &str = "DEEPSEEK_API_KEY";
pub const LOOKBACK_DAYS_VAR: &str = "LOOKBACK_DAYS";
pub const BASE_URL_VAR: &str = "DEEPSEEK_BASE_URL";
pub const MODEL_VAR: &str = "DEEPSEEK_MODEL";
pub const VOLATILITY_WINDOW_VAR: &str = "VOLATILITY_WINDOW";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("API key not set: export DEEPSEEK_API_KEY or add it to a .env file")]
    MissingCredential,

    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Secret API key. Wiped on drop, never printed in the clear.
#[derive(Clone)]
pub struct ApiKey(Zeroizing<String>);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Zeroizing::new(key.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn masked(&self) -> String {
        mask_secret(self.expose())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({:?})", self.masked())
    }
}

/// Masks a secret as `abc****wxyz`. Secrets of 6 chars or fewer become `****`.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 6 {
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}****{}", head, tail)
    } else {
        "****".to_string()
    }
}

/// Resolved run configuration. Only `resolve` and the `with_*` builders
/// produce one, and both validate `lookback_days` (1..=3650) and
/// `volatility_window` (2..=252).
#[derive(Clone, Debug)]
pub struct MacroConfig {
    pub tech_proxy: String,
    pub safe_haven_proxy: String,
    pub crypto_proxy: Option<String>,
    pub target_asset: String,
    pub lookback_days: u32,
    pub volatility_window: usize,
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
}

impl MacroConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(None, |name| env::var(name).ok())
    }

    /// Resolve configuration from an explicit key (which wins) and an
    /// environment lookup.
    pub fn resolve<F>(api_key: Option<String>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .or_else(|| lookup(API_KEY_VAR).filter(|key| !key.trim().is_empty()))
            .map(|key| ApiKey::new(key.trim()))
            .ok_or(ConfigError::MissingCredential)?;

        let lookback_days = match lookup(LOOKBACK_DAYS_VAR) {
            Some(raw) => parse_bounded(LOOKBACK_DAYS_VAR, &raw, 1, MAX_LOOKBACK_DAYS)?,
            None => DEFAULT_LOOKBACK_DAYS,
        };

        let volatility_window = match lookup(VOLATILITY_WINDOW_VAR) {
            Some(raw) => parse_bounded(VOLATILITY_WINDOW_VAR, &raw, 2, MAX_VOLATILITY_WINDOW)?,
            None => DEFAULT_VOLATILITY_WINDOW,
        };

        Ok(Self {
            tech_proxy: DEFAULT_TECH_PROXY.to_string(),
            safe_haven_proxy: DEFAULT_SAFE_HAVEN_PROXY.to_string(),
            crypto_proxy: Some(DEFAULT_CRYPTO_PROXY.to_string()),
            target_asset: DEFAULT_TARGET_ASSET.to_string(),
            lookback_days,
            volatility_window,
            api_key,
            base_url: lookup(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn with_crypto_proxy(mut self, crypto_proxy: Option<String>) -> Self {
        self.crypto_proxy = crypto_proxy.filter(|ticker| !ticker.is_empty());
        self
    }

    pub fn with_volatility_window(mut self, window: usize) -> Result<Self, ConfigError> {
        self.volatility_window =
            check_bounds(VOLATILITY_WINDOW_VAR, window, 2, MAX_VOLATILITY_WINDOW)?;
        Ok(self)
    }

    /// Tickers to download: tech, safe haven, target, then crypto if set.
    pub fn tickers(&self) -> Vec<String> {
        let mut tickers = vec![
            self.tech_proxy.clone(),
            self.safe_haven_proxy.clone(),
            self.target_asset.clone(),
        ];
        if let Some(crypto) = &self.crypto_proxy {
            tickers.push(crypto.clone());
        }
        tickers
    }

    /// Calendar days requested from the provider. The padding leaves room for
    /// weekends, holidays and the rows lost to cleaning.
    pub fn fetch_period_days(&self) -> u32 {
        self.lookback_days.saturating_add(40)
    }

    /// Human readable form with the API key masked.
    pub fn describe(&self) -> String {
        format!(
            "MacroConfig(tech_proxy={:?}, safe_haven_proxy={:?}, crypto_proxy={:?}, \
             target_asset={:?}, lookback_days={}, volatility_window={}, api_key={:?}, \
             base_url={:?}, model={:?})",
            self.tech_proxy,
            self.safe_haven_proxy,
            self.crypto_proxy,
            self.target_asset,
            self.lookback_days,
            self.volatility_window,
            self.api_key.masked(),
            self.base_url,
            self.model,
        )
    }
}

fn parse_bounded<T>(name: &'static str, raw: &str, min: T, max: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + fmt::Display + Copy,
{
    let value: T = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
        reason: "not an integer",
    })?;
    check_bounds(name, value, min, max)
}

fn check_bounds<T>(name: &'static str, value: T, min: T, max: T) -> Result<T, ConfigError>
where
    T: PartialOrd + fmt::Display + Copy,
{
    if value < min {
        return Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "below the minimum",
        });
    }
    if value > max {
        return Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "above the maximum",
        });
    }
    Ok(value)
}
