use serde::{Deserialize, Serialize};

use super::checks::{CheckKind, FraudVerdict, RateLevel, RateVerdict, SlaVerdict};
use super::domain::ApplicationId;

/// Final decision for an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Approve,
    Reject,
    Review,
}

impl Outcome {
    pub const fn label(self) -> &'static str {
        match self {
            Outcome::Approve => "Approve",
            Outcome::Reject => "Reject",
            Outcome::Review => "Review",
        }
    }
}

/// Which rung of the precedence list decided the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionBasis {
    FraudIndicators,
    SlaBreach,
    UnacceptableRate,
    BorderlineRate,
    AllChecksPassed,
}

impl DecisionBasis {
    pub fn summary(self) -> &'static str {
        match self {
            DecisionBasis::FraudIndicators => "fraud indicators were detected",
            DecisionBasis::SlaBreach => "processing exceeded its SLA",
            DecisionBasis::UnacceptableRate => "the rate assessment is unacceptable",
            DecisionBasis::BorderlineRate => {
                "the rate assessment is borderline and needs human judgment"
            }
            DecisionBasis::AllChecksPassed => "all checks passed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub application_id: ApplicationId,
    pub outcome: Outcome,
    pub basis: DecisionBasis,
    pub rationale: String,
}

/// Combine the three verdicts. Precedence is fraud, then SLA, then rate.
pub fn synthesize(fraud: &FraudVerdict, sla: &SlaVerdict, rate: &RateVerdict) -> Recommendation {
    let (outcome, basis) = if fraud.flagged {
        (Outcome::Reject, DecisionBasis::FraudIndicators)
    } else if sla.violated {
        (Outcome::Reject, DecisionBasis::SlaBreach)
    } else {
        match rate.level {
            RateLevel::Reject => (Outcome::Reject, DecisionBasis::UnacceptableRate),
            RateLevel::Review => (Outcome::Review, DecisionBasis::BorderlineRate),
            RateLevel::Approve => (Outcome::Approve, DecisionBasis::AllChecksPassed),
        }
    };

    let rationale = format!(
        "{}: {}. Fraud: {} (risk score {:.2}). SLA: {}. Rate: {} (level {}).",
        outcome.label(),
        basis.summary(),
        fraud.label,
        fraud.risk_score,
        sla.label,
        rate.label,
        rate.level.label(),
    );

    Recommendation {
        application_id: fraud.application_id.clone(),
        outcome,
        basis,
        rationale,
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    #[error("cannot synthesize a recommendation without the {} verdict", .0.label())]
    MissingVerdict(CheckKind),
    #[error("{kind:?} verdict belongs to {found}, expected {expected}")]
    MismatchedApplication {
        kind: CheckKind,
        expected: ApplicationId,
        found: ApplicationId,
    },
}

/// Join point collecting verdicts as checks finish.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerdictSet {
    pub fraud: Option<FraudVerdict>,
    pub sla: Option<SlaVerdict>,
    pub rate: Option<RateVerdict>,
}

impl VerdictSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesize once every verdict is present. A missing check is never treated as passed.
    pub fn synthesize(&self) -> Result<Recommendation, SynthesisError> {
        let fraud = self
            .fraud
            .as_ref()
            .ok_or(SynthesisError::MissingVerdict(CheckKind::Fraud))?;
        let sla = self
            .sla
            .as_ref()
            .ok_or(SynthesisError::MissingVerdict(CheckKind::Sla))?;
        let rate = self
            .rate
            .as_ref()
            .ok_or(SynthesisError::MissingVerdict(CheckKind::Rate))?;

        let expected = &fraud.application_id;
        for (kind, found) in [
            (CheckKind::Sla, &sla.application_id),
            (CheckKind::Rate, &rate.application_id),
        ] {
            if found != expected {
                return Err(SynthesisError::MismatchedApplication {
                    kind,
                    expected: expected.clone(),
                    found: found.clone(),
                });
            }
        }

        Ok(synthesize(fraud, sla, rate))
    }
}
