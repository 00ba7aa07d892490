mod config;
pub mod fraud;
pub mod rate;
pub mod sla;

pub use config::{AffordabilityBands, FraudPolicy, RateBands, ReviewPolicy};
pub use fraud::{FraudEvaluator, FraudRule, FraudVerdict};
pub use rate::{Affordability, RateEvaluator, RateLevel, RateQuote, RateSource, RateVerdict};
pub use sla::{SlaBreach, SlaEvaluator, SlaLimits, SlaVerdict};

/// Malformed application data or check configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("application_id must not be empty")]
    EmptyApplicationId,
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} must be a finite, non-negative amount (found {value})")]
    InvalidAmount { field: &'static str, value: f64 },
    #[error("processing step '{step}' has invalid duration {minutes}")]
    InvalidDuration { step: String, minutes: f64 },
    #[error("SLA limit for '{step}' must be finite and non-negative (found {minutes})")]
    InvalidLimit { step: String, minutes: f64 },
    #[error("invalid review policy: {0}")]
    InvalidPolicy(String),
    #[error("trend analysis needs at least one application")]
    EmptyBatch,
}

/// The reference rate could not be obtained.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataUnavailableError {
    #[error("rate source '{source_name}' timed out after {timeout_ms} ms")]
    Timeout { source_name: String, timeout_ms: u64 },
    #[error("rate source '{source_name}' unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },
    #[error("rate source '{source_name}' returned invalid rate {rate}")]
    InvalidRate { source_name: String, rate: f64 },
    #[error("no reference rate source configured")]
    NotConfigured,
}

/// Failure of a single check. Checks never return partial verdicts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    DataUnavailable(#[from] DataUnavailableError),
}

/// The three checks whose verdicts feed a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Fraud,
    Sla,
    Rate,
}

impl CheckKind {
    pub const fn label(self) -> &'static str {
        match self {
            CheckKind::Fraud => "fraud",
            CheckKind::Sla => "sla",
            CheckKind::Rate => "rate",
        }
    }
}
