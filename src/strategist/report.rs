use crate::market::MetricsSet;

use super::prompt::pct;

pub const EMPTY_COMPLETION_PLACEHOLDER: &str = "analysis complete but response was empty";
pub const EMPTY_REPORT_PLACEHOLDER: &str = "report is empty";
pub const REPORT_TITLE: &str = "GLOBAL MACRO PRECISION REPORT";

const HEADER_WIDTH: usize = 40;

/// Prepends the risk/volatility header to a raw report body.
pub fn format_report_for_display(raw_report: Option<&str>, metrics: &MetricsSet) -> String {
    let Some(body) = raw_report.filter(|r| !r.trim().is_empty()) else {
        return EMPTY_REPORT_PLACEHOLDER.to_string();
    };

    let signal = if metrics.risk_on_signal {
        "🟢 RISK-ON"
    } else {
        "🔴 RISK-OFF"
    };
    let rule = "=".repeat(HEADER_WIDTH);

    format!(
        "\n{}\n{}\nRisk Signal: {}\nVolatility : {}\n{}\n{}",
        REPORT_TITLE,
        rule,
        signal,
        pct(metrics.tech_volatility),
        rule,
        body
    )
}

/// Model output paired with the metrics it was prompted with.
#[derive(Debug, Clone)]
pub struct Report {
    pub body: String,
    pub metrics: MetricsSet,
}

impl Report {
    pub fn new(body: String, metrics: MetricsSet) -> Self {
        Self { body, metrics }
    }

    pub fn display(&self) -> String {
        format_report_for_display(Some(&self.body), &self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_placeholder() {
        let metrics = MetricsSet::default();
        assert_eq!(format_report_for_display(None, &metrics), "report is empty");
        assert_eq!(format_report_for_display(Some(""), &metrics), "report is empty");
        assert_eq!(format_report_for_display(Some("  \n"), &metrics), "report is empty");
    }

    #[test]
    fn test_header_shows_signal_and_volatility() {
        let metrics = MetricsSet {
            metadata_days: 100,
            tech_volatility: 0.1834,
            risk_on_signal: true,
            ..Default::default()
        };
        let text = format_report_for_display(Some("Overweight tech."), &metrics);

        assert!(text.contains(REPORT_TITLE));
        assert!(text.contains(&"=".repeat(40)));
        assert!(text.contains("Risk Signal: 🟢 RISK-ON"));
        assert!(text.contains("Volatility : 18.34%"));
        assert!(text.ends_with("Overweight tech."));
    }

    #[test]
    fn test_report_display_risk_off() {
        let report = Report::new("Hold gold.".into(), MetricsSet::default());
        let text = report.display();
        assert!(text.contains("🔴 RISK-OFF"));
        assert!(text.contains("Volatility : 0.00%"));
    }

    #[test]
    fn test_report_display_matches_free_formatter() {
        let metrics = MetricsSet {
            metadata_days: 60,
            tech_volatility: 0.25,
            risk_on_signal: true,
            ..Default::default()
        };
        let report = Report::new("Rotate into tech.".into(), metrics.clone());
        assert_eq!(
            report.display(),
            format_report_for_display(Some("Rotate into tech."), &metrics)
        );

        let blank = Report::new("   ".into(), metrics);
        assert_eq!(blank.display(), EMPTY_REPORT_PLACEHOLDER);
    }
}
