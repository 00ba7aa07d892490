use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Thresholds and weights driving every check, loaded from configuration at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPolicy {
    pub fraud: FraudPolicy,
    pub sla_limits: BTreeMap<String, f64>,
    pub rate_bands: RateBands,
    pub affordability: AffordabilityBands,
}

impl ReviewPolicy {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.fraud.validate()?;
        self.rate_bands.validate()?;
        self.affordability.validate()?;
        for (step, minutes) in &self.sla_limits {
            if !minutes.is_finite() || *minutes < 0.0 {
                return Err(ValidationError::InvalidLimit {
                    step: step.clone(),
                    minutes: *minutes,
                });
            }
        }
        Ok(())
    }
}

/// Rule weights for the fraud screen. A record is flagged once its score exceeds `flag_threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudPolicy {
    pub prior_flag_weight: f64,
    pub max_request_to_annual_income: f64,
    pub request_to_income_weight: f64,
    pub obligations_weight: f64,
    pub out_of_order_review_weight: f64,
    pub min_review_minutes: i64,
    pub rapid_review_weight: f64,
    #[serde(default)]
    pub flag_threshold: f64,
}

impl FraudPolicy {
    fn validate(&self) -> Result<(), ValidationError> {
        let weights = [
            ("prior_flag_weight", self.prior_flag_weight),
            ("request_to_income_weight", self.request_to_income_weight),
            ("obligations_weight", self.obligations_weight),
            ("out_of_order_review_weight", self.out_of_order_review_weight),
            ("rapid_review_weight", self.rapid_review_weight),
        ];
        if let Some((name, _)) = weights
            .iter()
            .find(|(_, weight)| !weight.is_finite() || *weight <= 0.0)
        {
            return Err(ValidationError::InvalidPolicy(format!(
                "fraud {name} must be a positive number"
            )));
        }

        if !self.max_request_to_annual_income.is_finite()
            || self.max_request_to_annual_income <= 0.0
        {
            return Err(ValidationError::InvalidPolicy(
                "fraud max_request_to_annual_income must be a positive number".to_string(),
            ));
        }
        if self.min_review_minutes < 0 {
            return Err(ValidationError::InvalidPolicy(
                "fraud min_review_minutes must not be negative".to_string(),
            ));
        }
        if !self.flag_threshold.is_finite() || self.flag_threshold < 0.0 {
            return Err(ValidationError::InvalidPolicy(
                "fraud flag_threshold must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reference rate cutoffs as decimal fractions (0.045 is 4.5%).
///
/// `rate < approve_below` approves, `rate >= reject_at_or_above` rejects, anything between
/// goes to review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateBands {
    pub approve_below: f64,
    pub reject_at_or_above: f64,
    #[serde(default = "default_rate_approve_label")]
    pub approve_label: String,
    #[serde(default = "default_rate_review_label")]
    pub review_label: String,
    #[serde(default = "default_rate_reject_label")]
    pub reject_label: String,
}

impl RateBands {
    pub fn new(approve_below: f64, reject_at_or_above: f64) -> Self {
        Self {
            approve_below,
            reject_at_or_above,
            approve_label: default_rate_approve_label(),
            review_label: default_rate_review_label(),
            reject_label: default_rate_reject_label(),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_cutoffs("rate_bands", self.approve_below, self.reject_at_or_above)
    }
}

/// Affordability ratio cutoffs, using the same inclusive-low/exclusive-high convention as
/// [`RateBands`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordabilityBands {
    pub approve_below: f64,
    pub reject_at_or_above: f64,
    #[serde(default = "default_affordability_approve_label")]
    pub approve_label: String,
    #[serde(default = "default_affordability_review_label")]
    pub review_label: String,
    #[serde(default = "default_affordability_reject_label")]
    pub reject_label: String,
}

impl AffordabilityBands {
    pub fn new(approve_below: f64, reject_at_or_above: f64) -> Self {
        Self {
            approve_below,
            reject_at_or_above,
            approve_label: default_affordability_approve_label(),
            review_label: default_affordability_review_label(),
            reject_label: default_affordability_reject_label(),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_cutoffs("affordability", self.approve_below, self.reject_at_or_above)
    }
}

fn validate_cutoffs(name: &str, lower: f64, upper: f64) -> Result<(), ValidationError> {
    if !lower.is_finite() || !upper.is_finite() {
        return Err(ValidationError::InvalidPolicy(format!(
            "{name} cutoffs must be finite"
        )));
    }
    if lower > upper {
        return Err(ValidationError::InvalidPolicy(format!(
            "{name} approve_below ({lower}) must not exceed reject_at_or_above ({upper})"
        )));
    }
    Ok(())
}

fn default_rate_approve_label() -> String {
    "Excellent".to_string()
}

fn default_rate_review_label() -> String {
    "Acceptable".to_string()
}

fn default_rate_reject_label() -> String {
    "Too high".to_string()
}

fn default_affordability_approve_label() -> String {
    "Comfortable".to_string()
}

fn default_affordability_review_label() -> String {
    "Stretched".to_string()
}

fn default_affordability_reject_label() -> String {
    "Unaffordable".to_string()
}
