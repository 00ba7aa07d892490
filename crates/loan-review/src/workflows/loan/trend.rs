//! Batch statistics over a set of applications, for periodic operations summaries.

use serde::{Deserialize, Serialize};

use super::checks::ValidationError;
use super::domain::ApplicationRecord;

/// Aggregate view of a batch of applications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub application_count: usize,
    /// Mean of each application's total processing minutes across all steps.
    pub average_processing_minutes: f64,
    pub average_requested_amount: f64,
    /// Total monthly costs over total monthly income. `None` when the batch reports no income.
    pub costs_to_income_ratio: Option<f64>,
    pub summary: String,
}

/// Summarize a non-empty batch. Every record must pass the same validation a review applies.
pub fn analyze(records: &[ApplicationRecord]) -> Result<TrendAnalysis, ValidationError> {
    if records.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }

    let mut processing_minutes = 0.0;
    let mut requested = 0.0;
    let mut costs = 0.0;
    let mut income = 0.0;
    for record in records {
        let financials = record.financials()?;
        processing_minutes += total_processing_minutes(record)?;
        requested += financials.requested_amount;
        costs += financials.monthly_costs;
        income += financials.monthly_income;
    }

    let count = records.len() as f64;
    let average_processing_minutes = processing_minutes / count;
    let average_requested_amount = requested / count;
    let costs_to_income_ratio = (income > 0.0).then_some(costs / income);

    let summary = summarize(
        records.len(),
        average_processing_minutes,
        average_requested_amount,
        costs_to_income_ratio,
    );

    Ok(TrendAnalysis {
        application_count: records.len(),
        average_processing_minutes,
        average_requested_amount,
        costs_to_income_ratio,
        summary,
    })
}

fn total_processing_minutes(record: &ApplicationRecord) -> Result<f64, ValidationError> {
    record
        .processing_steps
        .iter()
        .try_fold(0.0, |total, (step, minutes)| {
            if minutes.is_finite() && *minutes >= 0.0 {
                Ok(total + minutes)
            } else {
                Err(ValidationError::InvalidDuration {
                    step: step.clone(),
                    minutes: *minutes,
                })
            }
        })
}

fn summarize(
    count: usize,
    average_processing_minutes: f64,
    average_requested_amount: f64,
    costs_to_income_ratio: Option<f64>,
) -> String {
    let noun = if count == 1 {
        "application"
    } else {
        "applications"
    };
    let costs = match costs_to_income_ratio {
        Some(ratio) => format!("monthly costs take {:.1}% of income", ratio * 100.0),
        None => "no income reported".to_string(),
    };
    format!(
        "{count} {noun} averaged {average_processing_minutes:.1} min of processing \
         and {average_requested_amount:.2} requested; {costs}"
    )
}
