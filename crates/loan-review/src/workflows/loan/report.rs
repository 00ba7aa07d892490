use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::checks::{FraudVerdict, RateVerdict, SlaVerdict};
use super::recommendation::Recommendation;
use super::trend::TrendAnalysis;

/// Addressing defaults for generated reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSettings {
    pub default_recipient: String,
    pub signature: String,
}

/// Routing details handed to a delivery channel alongside the report body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMetadata {
    pub subject: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct ReportFormatter {
    settings: ReportSettings,
}

impl ReportFormatter {
    pub fn new(settings: ReportSettings) -> Self {
        Self { settings }
    }

    fn recipient<'a>(&'a self, recipient: Option<&'a str>) -> &'a str {
        recipient
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.settings.default_recipient.as_str())
    }

    pub fn format(
        &self,
        recommendation: &Recommendation,
        fraud: &FraudVerdict,
        sla: &SlaVerdict,
        rate: &RateVerdict,
        recipient: Option<&str>,
    ) -> String {
        // Writing into a String cannot fail.
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Loan Application Review: {}",
            recommendation.application_id
        );
        let _ = writeln!(out, "To: {}", self.recipient(recipient));
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Recommendation: {}",
            recommendation.outcome.label()
        );
        let _ = writeln!(out, "Rationale: {}", recommendation.rationale);
        let _ = writeln!(out);

        let _ = writeln!(
            out,
            "Fraud check: {} (risk score {:.2})",
            if fraud.flagged { "flagged" } else { "clear" },
            fraud.risk_score
        );
        let _ = writeln!(out, "  {}", fraud.label);

        let _ = writeln!(
            out,
            "SLA check: {}",
            if sla.violated { "violated" } else { "compliant" }
        );
        let _ = writeln!(out, "  {}", sla.label);
        for breach in &sla.breaches {
            let _ = writeln!(
                out,
                "  - {}: {} min (limit {} min)",
                breach.step, breach.minutes, breach.limit
            );
        }

        let _ = writeln!(out, "Rate check: {}", rate.level.label());
        let _ = writeln!(out, "  {}", rate.label);
        let _ = writeln!(
            out,
            "  Reference rate {:.2}% from {} as of {}{}",
            rate.quote.rate * 100.0,
            rate.quote.source_name,
            rate.quote.as_of,
            if rate.quote.stale { " (stale)" } else { "" }
        );
        match rate.affordability.ratio {
            Some(ratio) => {
                let _ = writeln!(
                    out,
                    "  Affordability ratio {:.2} ({})",
                    ratio, rate.affordability.label
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "  Affordability ratio n/a, no income ({})",
                    rate.affordability.label
                );
            }
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Regards,");
        let _ = write!(out, "{}", self.settings.signature);
        out
    }

    /// Operations summary for a batch of applications.
    pub fn format_trend(&self, analysis: &TrendAnalysis, recipient: Option<&str>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Loan Application System Summary");
        let _ = writeln!(out, "To: {}", self.recipient(recipient));
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Applications analysed: {}",
            analysis.application_count
        );
        let _ = writeln!(
            out,
            "Average processing time: {:.1} min",
            analysis.average_processing_minutes
        );
        let _ = writeln!(
            out,
            "Average requested amount: {:.2}",
            analysis.average_requested_amount
        );
        match analysis.costs_to_income_ratio {
            Some(ratio) => {
                let _ = writeln!(out, "Costs to income ratio: {ratio:.2}");
            }
            None => {
                let _ = writeln!(out, "Costs to income ratio: n/a, no income");
            }
        }
        let _ = writeln!(out, "Summary: {}", analysis.summary);
        let _ = writeln!(out);

        let _ = writeln!(out, "Regards,");
        let _ = write!(out, "{}", self.settings.signature);
        out
    }

    pub fn delivery_metadata(
        &self,
        recommendation: &Recommendation,
        recipient: Option<&str>,
    ) -> DeliveryMetadata {
        DeliveryMetadata {
            subject: format!(
                "Loan application {}: {}",
                recommendation.application_id,
                recommendation.outcome.label()
            ),
            to: self.recipient(recipient).to_string(),
        }
    }
}
