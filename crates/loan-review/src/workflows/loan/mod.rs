//! Loan application review: fraud, SLA, and rate checks combined into a single
//! recommendation and report.
//!
//! Each check is a plain evaluator over an [`ApplicationRecord`]. [`synthesize`] applies the
//! fixed precedence (fraud, then SLA, then rate) and [`ReportFormatter`] renders the result.
//! [`LoanReviewService`] wires them together with an injected [`RateSource`] and
//! [`DeliveryChannel`]; it is one possible host, not the only one. [`trend`] aggregates a
//! batch of records into an operations summary.

pub mod checks;
pub mod delivery;
pub mod domain;
pub mod rate_source;
pub mod recommendation;
pub mod report;
pub mod router;
pub mod service;
pub mod trend;

#[cfg(test)]
mod tests;

pub use checks::{
    CheckKind, DataUnavailableError, EvaluationError, FraudEvaluator, FraudPolicy, FraudRule,
    FraudVerdict, RateBands, RateEvaluator, RateLevel, RateQuote, RateSource, RateVerdict,
    ReviewPolicy, SlaBreach, SlaEvaluator, SlaLimits, SlaVerdict, ValidationError,
};
pub use checks::{Affordability, AffordabilityBands};
pub use delivery::{DeliveryChannel, DeliveryError, WebhookChannel};
pub use domain::{ApplicationId, ApplicationRecord, Financials};
pub use rate_source::{CachedRateSource, FredRateSource, StaticRateSource, UnconfiguredRateSource};
pub use recommendation::{
    synthesize, DecisionBasis, Outcome, Recommendation, SynthesisError, VerdictSet,
};
pub use report::{DeliveryMetadata, ReportFormatter, ReportSettings};
pub use router::review_router;
pub use service::{DeliveryStatus, LoanReviewService, ReviewError, ReviewOutcome, TrendReport};
pub use trend::{analyze as analyze_trends, TrendAnalysis};
