use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::checks::ValidationError;

/// Identifier wrapper for loan applications under review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Auditable facts about one loan application at evaluation time.
///
/// Monetary amounts share a single currency unit and processing step durations are minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application_id: ApplicationId,
    #[serde(default)]
    pub submitted_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub reviewed_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub approved_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub rejected_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub processing_steps: BTreeMap<String, f64>,
    #[serde(default)]
    pub flagged_for_fraud: bool,
    #[serde(default)]
    pub monthly_income: Option<f64>,
    #[serde(default)]
    pub monthly_costs: Option<f64>,
    #[serde(default)]
    pub monthly_debt: Option<f64>,
    #[serde(default)]
    pub requested_amount: Option<f64>,
}

impl ApplicationRecord {
    /// Resolve the monetary fields, defaulting absent costs and debt to zero.
    pub fn financials(&self) -> Result<Financials, ValidationError> {
        if self.application_id.0.trim().is_empty() {
            return Err(ValidationError::EmptyApplicationId);
        }

        let monthly_income = required_amount("monthly_income", self.monthly_income)?;
        let requested_amount = required_amount("requested_amount", self.requested_amount)?;
        let monthly_costs = amount("monthly_costs", self.monthly_costs.unwrap_or(0.0))?;
        let monthly_debt = amount("monthly_debt", self.monthly_debt.unwrap_or(0.0))?;

        Ok(Financials {
            monthly_income,
            monthly_costs,
            monthly_debt,
            requested_amount,
        })
    }

    /// An application carrying both an approval and a rejection timestamp is inconsistent.
    ///
    /// Checks still run on such records; upstream intake is expected to flag them.
    pub fn has_conflicting_outcome(&self) -> bool {
        self.approved_time.is_some() && self.rejected_time.is_some()
    }
}

/// Validated monetary view of an application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Financials {
    pub monthly_income: f64,
    pub monthly_costs: f64,
    pub monthly_debt: f64,
    pub requested_amount: f64,
}

impl Financials {
    pub fn annual_income(&self) -> f64 {
        self.monthly_income * 12.0
    }

    /// Share of a year's income consumed by the requested amount plus a year of debt service.
    ///
    /// `None` when there is a burden but no income to carry it.
    pub fn affordability_ratio(&self) -> Option<f64> {
        let burden = self.requested_amount + self.monthly_debt * 12.0;
        let annual_income = self.annual_income();
        if annual_income > 0.0 {
            Some(burden / annual_income)
        } else if burden > 0.0 {
            None
        } else {
            Some(0.0)
        }
    }
}

fn required_amount(field: &'static str, value: Option<f64>) -> Result<f64, ValidationError> {
    let value = value.ok_or(ValidationError::MissingField { field })?;
    amount(field, value)
}

fn amount(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::InvalidAmount { field, value })
    }
}
