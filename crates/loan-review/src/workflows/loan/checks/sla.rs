use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::super::domain::{ApplicationId, ApplicationRecord};
use super::ValidationError;

/// Maximum allowed minutes per processing step. Steps without an entry are unconstrained.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlaLimits {
    limits: BTreeMap<String, f64>,
}

impl SlaLimits {
    pub fn new(limits: BTreeMap<String, f64>) -> Result<Self, ValidationError> {
        for (step, minutes) in &limits {
            if !minutes.is_finite() || *minutes < 0.0 {
                return Err(ValidationError::InvalidLimit {
                    step: step.clone(),
                    minutes: *minutes,
                });
            }
        }
        Ok(Self { limits })
    }

    pub fn limit_for(&self, step: &str) -> Option<f64> {
        self.limits.get(step).copied()
    }
}

/// A processing step that ran past its limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaBreach {
    pub step: String,
    pub minutes: f64,
    pub limit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaVerdict {
    pub application_id: ApplicationId,
    pub violated: bool,
    pub breaches: Vec<SlaBreach>,
    pub label: String,
}

impl SlaVerdict {
    pub fn violated_steps(&self) -> Vec<&str> {
        self.breaches
            .iter()
            .map(|breach| breach.step.as_str())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct SlaEvaluator {
    limits: SlaLimits,
}

impl SlaEvaluator {
    pub fn new(limits: SlaLimits) -> Self {
        Self { limits }
    }

    pub fn evaluate(&self, record: &ApplicationRecord) -> Result<SlaVerdict, ValidationError> {
        let mut breaches = Vec::new();
        for (step, minutes) in &record.processing_steps {
            if !minutes.is_finite() || *minutes < 0.0 {
                return Err(ValidationError::InvalidDuration {
                    step: step.clone(),
                    minutes: *minutes,
                });
            }

            if let Some(limit) = self.limits.limit_for(step) {
                if *minutes > limit {
                    breaches.push(SlaBreach {
                        step: step.clone(),
                        minutes: *minutes,
                        limit,
                    });
                }
            }
        }

        let label = if breaches.is_empty() {
            "All processing steps within SLA".to_string()
        } else {
            let steps: Vec<&str> = breaches.iter().map(|breach| breach.step.as_str()).collect();
            format!("SLA exceeded: {}", steps.join(", "))
        };

        Ok(SlaVerdict {
            application_id: record.application_id.clone(),
            violated: !breaches.is_empty(),
            breaches,
            label,
        })
    }
}
