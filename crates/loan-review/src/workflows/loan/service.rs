use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::checks::{
    DataUnavailableError, EvaluationError, FraudEvaluator, FraudVerdict, RateEvaluator,
    RateSource, RateVerdict, ReviewPolicy, SlaEvaluator, SlaLimits, SlaVerdict, ValidationError,
};
use super::delivery::DeliveryChannel;
use super::domain::{ApplicationId, ApplicationRecord};
use super::recommendation::{synthesize, Recommendation};
use super::report::{DeliveryMetadata, ReportFormatter, ReportSettings};
use super::trend::{self, TrendAnalysis};

/// Service composing the checks, the rate source, the report formatter, and delivery.
pub struct LoanReviewService<S, C> {
    fraud: FraudEvaluator,
    sla: SlaEvaluator,
    rate: RateEvaluator,
    formatter: ReportFormatter,
    rates: Arc<S>,
    channel: Arc<C>,
}

/// Everything produced by one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub application_id: ApplicationId,
    pub recommendation: Recommendation,
    pub fraud: FraudVerdict,
    pub sla: SlaVerdict,
    pub rate: RateVerdict,
    pub report: String,
    pub metadata: DeliveryMetadata,
    /// Set when the record carries both approval and rejection timestamps.
    pub conflicting_outcome: bool,
    pub delivery: DeliveryStatus,
}

/// Batch statistics with their rendered summary.
#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub analysis: TrendAnalysis,
    pub report: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    NotRequested,
    Delivered,
    Failed { reason: String },
}

impl<S, C> LoanReviewService<S, C>
where
    S: RateSource + 'static,
    C: DeliveryChannel + 'static,
{
    pub fn new(
        policy: ReviewPolicy,
        report: ReportSettings,
        rates: Arc<S>,
        channel: Arc<C>,
    ) -> Result<Self, ValidationError> {
        policy.validate()?;
        let ReviewPolicy {
            fraud,
            sla_limits,
            rate_bands,
            affordability,
        } = policy;

        Ok(Self {
            fraud: FraudEvaluator::new(fraud),
            sla: SlaEvaluator::new(SlaLimits::new(sla_limits)?),
            rate: RateEvaluator::new(rate_bands, affordability),
            formatter: ReportFormatter::new(report),
            rates,
            channel,
        })
    }

    /// Run every check, synthesize a recommendation, and render the report without sending it.
    pub fn assess(
        &self,
        record: &ApplicationRecord,
        recipient: Option<&str>,
    ) -> Result<ReviewOutcome, ReviewError> {
        let conflicting_outcome = record.has_conflicting_outcome();
        if conflicting_outcome {
            warn!(
                application_id = %record.application_id,
                "application carries both approval and rejection timestamps"
            );
        }

        // The rate fetch is the only blocking call; the local checks run alongside it.
        let ((fraud, sla), quote) = rayon::join(
            || (self.fraud.evaluate(record), self.sla.evaluate(record)),
            || self.rates.current_rate(),
        );
        let fraud = fraud?;
        let sla = sla?;
        let rate = self.rate.evaluate_quote(record, quote?)?;
        if rate.quote.stale {
            warn!(
                application_id = %record.application_id,
                source = %rate.quote.source_name,
                as_of = %rate.quote.as_of,
                "rate check used a stale quote"
            );
        }

        let recommendation = synthesize(&fraud, &sla, &rate);
        let report = self
            .formatter
            .format(&recommendation, &fraud, &sla, &rate, recipient);
        let metadata = self.formatter.delivery_metadata(&recommendation, recipient);

        info!(
            application_id = %record.application_id,
            outcome = recommendation.outcome.label(),
            basis = ?recommendation.basis,
            risk_score = fraud.risk_score,
            "loan review completed"
        );

        Ok(ReviewOutcome {
            application_id: record.application_id.clone(),
            recommendation,
            fraud,
            sla,
            rate,
            report,
            metadata,
            conflicting_outcome,
            delivery: DeliveryStatus::NotRequested,
        })
    }

    /// Assess and hand the report to the delivery channel. Delivery failures are reported in
    /// the outcome rather than failing the review.
    pub fn review(
        &self,
        record: &ApplicationRecord,
        recipient: Option<&str>,
    ) -> Result<ReviewOutcome, ReviewError> {
        let mut outcome = self.assess(record, recipient)?;

        outcome.delivery = match self.channel.send(&outcome.report, &outcome.metadata) {
            Ok(()) => DeliveryStatus::Delivered,
            Err(err) => {
                warn!(
                    application_id = %outcome.application_id,
                    error = %err,
                    "report delivery failed"
                );
                DeliveryStatus::Failed {
                    reason: err.to_string(),
                }
            }
        };

        Ok(outcome)
    }

    /// Aggregate a batch of records and render the operations summary. Nothing is delivered.
    pub fn summarize_trends(
        &self,
        records: &[ApplicationRecord],
        recipient: Option<&str>,
    ) -> Result<TrendReport, ValidationError> {
        let analysis = trend::analyze(records)?;
        let report = self.formatter.format_trend(&analysis, recipient);

        info!(
            applications = analysis.application_count,
            average_processing_minutes = analysis.average_processing_minutes,
            "trend analysis completed"
        );

        Ok(TrendReport { analysis, report })
    }
}

/// Error raised by the review service.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    DataUnavailable(#[from] DataUnavailableError),
}

impl From<EvaluationError> for ReviewError {
    fn from(value: EvaluationError) -> Self {
        match value {
            EvaluationError::Validation(err) => Self::Validation(err),
            EvaluationError::DataUnavailable(err) => Self::DataUnavailable(err),
        }
    }
}
