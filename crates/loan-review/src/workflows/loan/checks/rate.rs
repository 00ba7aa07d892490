use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::domain::{ApplicationId, ApplicationRecord};
use super::config::{AffordabilityBands, RateBands};
use super::{DataUnavailableError, EvaluationError};

/// Capability supplying the current reference interest rate.
///
/// Implementations own fetching, timeouts, and any fallback policy. A fallback quote must be
/// marked `stale`.
pub trait RateSource: Send + Sync {
    fn current_rate(&self) -> Result<RateQuote, DataUnavailableError>;
}

/// Reference rate observation expressed as a decimal fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateQuote {
    pub rate: f64,
    pub as_of: NaiveDate,
    pub source_name: String,
    #[serde(default)]
    pub stale: bool,
}

/// Acceptability level, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLevel {
    Approve,
    Review,
    Reject,
}

impl RateLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RateLevel::Approve => "approve",
            RateLevel::Review => "review",
            RateLevel::Reject => "reject",
        }
    }

    /// Three contiguous bands: `[.., lower)`, `[lower, upper)`, `[upper, ..]`.
    fn classify(value: f64, lower: f64, upper: f64) -> Self {
        if value < lower {
            RateLevel::Approve
        } else if value < upper {
            RateLevel::Review
        } else {
            RateLevel::Reject
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affordability {
    /// `None` when the applicant has no income against a positive burden.
    pub ratio: Option<f64>,
    pub level: RateLevel,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateVerdict {
    pub application_id: ApplicationId,
    /// Combined level: the more severe of `rate_level` and the affordability level.
    pub level: RateLevel,
    pub rate_level: RateLevel,
    pub label: String,
    pub quote: RateQuote,
    pub affordability: Affordability,
}

#[derive(Debug, Clone)]
pub struct RateEvaluator {
    bands: RateBands,
    affordability: AffordabilityBands,
}

impl RateEvaluator {
    pub fn new(bands: RateBands, affordability: AffordabilityBands) -> Self {
        Self {
            bands,
            affordability,
        }
    }

    pub fn evaluate(
        &self,
        record: &ApplicationRecord,
        source: &dyn RateSource,
    ) -> Result<RateVerdict, EvaluationError> {
        record.financials()?;
        let quote = source.current_rate()?;
        self.evaluate_quote(record, quote)
    }

    /// Classify an already fetched quote against the bands and the record's affordability.
    pub fn evaluate_quote(
        &self,
        record: &ApplicationRecord,
        quote: RateQuote,
    ) -> Result<RateVerdict, EvaluationError> {
        let financials = record.financials()?;

        if !quote.rate.is_finite() || quote.rate < 0.0 {
            return Err(DataUnavailableError::InvalidRate {
                source_name: quote.source_name,
                rate: quote.rate,
            }
            .into());
        }

        let rate_level = RateLevel::classify(
            quote.rate,
            self.bands.approve_below,
            self.bands.reject_at_or_above,
        );
        let rate_label = match rate_level {
            RateLevel::Approve => &self.bands.approve_label,
            RateLevel::Review => &self.bands.review_label,
            RateLevel::Reject => &self.bands.reject_label,
        };

        let ratio = financials.affordability_ratio();
        let affordability_level = match ratio {
            Some(ratio) => RateLevel::classify(
                ratio,
                self.affordability.approve_below,
                self.affordability.reject_at_or_above,
            ),
            None => RateLevel::Reject,
        };
        let affordability_label = match affordability_level {
            RateLevel::Approve => &self.affordability.approve_label,
            RateLevel::Review => &self.affordability.review_label,
            RateLevel::Reject => &self.affordability.reject_label,
        };

        let mut label = format!("{rate_label}, affordability {affordability_label}");
        if quote.stale {
            label.push_str(&format!(
                " [stale quote from {} as of {}]",
                quote.source_name, quote.as_of
            ));
        }

        Ok(RateVerdict {
            application_id: record.application_id.clone(),
            level: rate_level.max(affordability_level),
            rate_level,
            label,
            quote,
            affordability: Affordability {
                ratio,
                level: affordability_level,
                label: affordability_label.clone(),
            },
        })
    }
}
