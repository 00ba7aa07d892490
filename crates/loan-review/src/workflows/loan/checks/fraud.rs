use serde::{Deserialize, Serialize};

use super::super::domain::{ApplicationId, ApplicationRecord, Financials};
use super::config::FraudPolicy;
use super::ValidationError;

/// Fraud rules in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudRule {
    PriorFraudFlag,
    RequestExceedsIncomeMultiple,
    ObligationsExceedIncome,
    ReviewBeforeSubmission,
    RapidReview,
}

impl FraudRule {
    pub const fn ordered() -> [FraudRule; 5] {
        [
            FraudRule::PriorFraudFlag,
            FraudRule::RequestExceedsIncomeMultiple,
            FraudRule::ObligationsExceedIncome,
            FraudRule::ReviewBeforeSubmission,
            FraudRule::RapidReview,
        ]
    }

    pub const fn id(self) -> &'static str {
        match self {
            FraudRule::PriorFraudFlag => "prior_fraud_flag",
            FraudRule::RequestExceedsIncomeMultiple => "request_exceeds_income_multiple",
            FraudRule::ObligationsExceedIncome => "obligations_exceed_income",
            FraudRule::ReviewBeforeSubmission => "review_before_submission",
            FraudRule::RapidReview => "rapid_review",
        }
    }
}

/// Outcome of the fraud screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudVerdict {
    pub application_id: ApplicationId,
    pub flagged: bool,
    pub risk_score: f64,
    pub triggered_rules: Vec<FraudRule>,
    pub label: String,
}

/// Stateless fraud screen applying [`FraudPolicy`] weights.
#[derive(Debug, Clone)]
pub struct FraudEvaluator {
    policy: FraudPolicy,
}

impl FraudEvaluator {
    pub fn new(policy: FraudPolicy) -> Self {
        Self { policy }
    }

    pub fn evaluate(&self, record: &ApplicationRecord) -> Result<FraudVerdict, ValidationError> {
        let financials = record.financials()?;

        let mut risk_score = 0.0;
        let mut triggered_rules = Vec::new();
        for rule in FraudRule::ordered() {
            if let Some(weight) = self.weight_if_triggered(rule, record, &financials) {
                risk_score += weight;
                triggered_rules.push(rule);
            }
        }

        let flagged = risk_score > self.policy.flag_threshold;
        let label = if triggered_rules.is_empty() {
            "No fraud indicators detected".to_string()
        } else {
            let ids: Vec<&str> = triggered_rules.iter().map(|rule| rule.id()).collect();
            format!("Fraud indicators: {}", ids.join(", "))
        };

        Ok(FraudVerdict {
            application_id: record.application_id.clone(),
            flagged,
            risk_score,
            triggered_rules,
            label,
        })
    }

    fn weight_if_triggered(
        &self,
        rule: FraudRule,
        record: &ApplicationRecord,
        financials: &Financials,
    ) -> Option<f64> {
        let policy = &self.policy;
        let triggered = match rule {
            FraudRule::PriorFraudFlag => record.flagged_for_fraud,
            FraudRule::RequestExceedsIncomeMultiple => {
                financials.requested_amount
                    > policy.max_request_to_annual_income * financials.annual_income()
            }
            FraudRule::ObligationsExceedIncome => {
                financials.monthly_costs + financials.monthly_debt > financials.monthly_income
            }
            FraudRule::ReviewBeforeSubmission => matches!(
                (record.submitted_time, record.reviewed_time),
                (Some(submitted), Some(reviewed)) if reviewed < submitted
            ),
            FraudRule::RapidReview => matches!(
                (record.submitted_time, record.reviewed_time),
                (Some(submitted), Some(reviewed))
                    if reviewed >= submitted
                        && (reviewed - submitted).num_minutes() < policy.min_review_minutes
            ),
        };

        if !triggered {
            return None;
        }

        Some(match rule {
            FraudRule::PriorFraudFlag => policy.prior_flag_weight,
            FraudRule::RequestExceedsIncomeMultiple => policy.request_to_income_weight,
            FraudRule::ObligationsExceedIncome => policy.obligations_weight,
            FraudRule::ReviewBeforeSubmission => policy.out_of_order_review_weight,
            FraudRule::RapidReview => policy.rapid_review_weight,
        })
    }
}
