use std::fmt::Write;

use crate::macro_config::MacroConfig;
use crate::market::{MetricsSet, PriceTable, SHORT_TERM_SESSIONS};

/// Formats a fraction as a signed percentage, e.g. `0.052` -> `+5.20%`.
pub fn signed_pct(value: f64) -> String {
    format!("{:+.2}%", value * 100.0)
}

pub fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

pub fn risk_label(metrics: &MetricsSet) -> &'static str {
    if metrics.risk_on_signal {
        "Risk-On"
    } else {
        "Risk-Off"
    }
}

/// Tracked assets as `(role, ticker)`, skipping an unset crypto proxy.
pub fn tracked_assets(config: &MacroConfig) -> Vec<(&'static str, &str)> {
    let mut assets = vec![
        ("Tech", config.tech_proxy.as_str()),
        ("Safe haven gold", config.safe_haven_proxy.as_str()),
    ];
    if let Some(crypto) = &config.crypto_proxy {
        assets.push(("Crypto", crypto.as_str()));
    }
    assets.push(("Target asset", config.target_asset.as_str()));
    assets
}

/// Structured data block the model is asked to cite from.
pub fn build_context(metrics: &MetricsSet, config: &MacroConfig) -> String {
    let days = metrics
        .days()
        .map(|d| d.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    let mut context = format!(
        "Window: medium-term trend covers the past {} sessions, short-term momentum covers the past {} sessions.\n\n",
        days, SHORT_TERM_SESSIONS
    );

    for (role, ticker) in tracked_assets(config) {
        let _ = writeln!(context, "Asset: {} ({})", role, ticker);
        let _ = writeln!(
            context,
            "  - [Data: {}-day trend]: {}",
            days,
            signed_pct(metrics.trend_medium_of(ticker))
        );
        let _ = writeln!(
            context,
            "  - [Data: {}-day return]: {}",
            SHORT_TERM_SESSIONS,
            signed_pct(metrics.return_5d_of(ticker))
        );
    }

    let _ = writeln!(
        context,
        "\nMarket Volatility (Annualized): {}",
        pct(metrics.tech_volatility)
    );
    let _ = writeln!(
        context,
        "Tech Volatility ({}-session, Annualized): {}",
        config.volatility_window,
        pct(metrics.tech_volatility_short)
    );
    let _ = writeln!(context, "Risk Signal: {}", risk_label(metrics));
    context
}

pub fn system_prompt(config: &MacroConfig) -> String {
    let mut prompt = String::from(
        "You are a quantitative macro analyst who argues strictly from data.\n\
         Assess the market regime from the medium-term and short-term metrics provided.\n\n\
         Rules (mandatory):\n\
         1. Every analytical claim must cite the data point it rests on.\n\
         2. Citations use square brackets naming the metric and its value, for example:\n   \
            - \"Tech is trending up [Data: 90-day trend +5.2%]\"\n   \
            - \"but pulled back this week [Data: 5-day return -1.3%]\"\n\
         3. Never conflate short-term moves with the long-term trend.\n",
    );

    if let Some(crypto) = &config.crypto_proxy {
        let _ = writeln!(
            prompt,
            "4. Explicitly compare {crypto} with {tech} (risk-asset correlation) and {crypto} with {gold} (safe-haven correlation).",
            crypto = crypto,
            tech = config.tech_proxy,
            gold = config.safe_haven_proxy,
        );
    }
    prompt
}

pub fn user_prompt(context: &str, recent: &PriceTable) -> String {
    format!(
        "[Structured market data]\n{}\n[Recent daily prices]\n{}\n\n\
         Write a concise strategy report on the macro state of these assets and give actionable recommendations.",
        context, recent
    )
}
