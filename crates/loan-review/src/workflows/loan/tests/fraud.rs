use super::common::*;
use crate::workflows::loan::checks::{FraudEvaluator, FraudRule, ValidationError};
use crate::workflows::loan::domain::ApplicationRecord;

fn evaluator() -> FraudEvaluator {
    FraudEvaluator::new(fraud_policy())
}

#[test]
fn clean_application_has_no_indicators() {
    let verdict = evaluator()
        .evaluate(&application(50.0))
        .expect("valid record");

    assert!(!verdict.flagged);
    assert_eq!(verdict.risk_score, 0.0);
    assert!(verdict.triggered_rules.is_empty());
    assert_eq!(verdict.label, "No fraud indicators detected");
}

#[test]
fn prior_flag_alone_flags_the_application() {
    let mut record = application(50.0);
    record.flagged_for_fraud = true;

    let verdict = evaluator().evaluate(&record).expect("valid record");

    assert!(verdict.flagged);
    assert_eq!(verdict.triggered_rules, vec![FraudRule::PriorFraudFlag]);
    assert_eq!(verdict.risk_score, 1.0);
    assert_eq!(verdict.label, "Fraud indicators: prior_fraud_flag");
}

#[test]
fn request_far_above_annual_income_is_anomalous() {
    let mut record = application(50.0);
    record.monthly_income = Some(1_000.0);
    record.monthly_costs = Some(200.0);
    record.monthly_debt = Some(0.0);
    record.requested_amount = Some(30_000.0);

    let verdict = evaluator().evaluate(&record).expect("valid record");

    assert_eq!(
        verdict.triggered_rules,
        vec![FraudRule::RequestExceedsIncomeMultiple]
    );
    assert!(verdict.flagged);
}

#[test]
fn zero_income_with_a_request_trips_the_income_multiple_rule() {
    let mut record = application(50.0);
    record.monthly_income = Some(0.0);
    record.monthly_costs = None;
    record.monthly_debt = None;

    let verdict = evaluator().evaluate(&record).expect("valid record");

    assert_eq!(
        verdict.triggered_rules,
        vec![FraudRule::RequestExceedsIncomeMultiple]
    );
}

#[test]
fn obligations_above_income_are_flagged() {
    let mut record = application(50.0);
    record.monthly_income = Some(3_000.0);
    record.monthly_costs = Some(2_500.0);
    record.monthly_debt = Some(900.0);
    record.requested_amount = Some(10_000.0);

    let verdict = evaluator().evaluate(&record).expect("valid record");

    assert_eq!(
        verdict.triggered_rules,
        vec![FraudRule::ObligationsExceedIncome]
    );
}

#[test]
fn review_recorded_before_submission_is_out_of_order_not_rapid() {
    let mut record = application(50.0);
    record.submitted_time = Some(timestamp("2025-03-03T09:00:00"));
    record.reviewed_time = Some(timestamp("2025-03-03T08:59:30"));

    let verdict = evaluator().evaluate(&record).expect("valid record");

    assert_eq!(
        verdict.triggered_rules,
        vec![FraudRule::ReviewBeforeSubmission]
    );
}

#[test]
fn rapid_review_respects_the_minimum_window() {
    let mut record = application(50.0);
    record.reviewed_time = Some(timestamp("2025-03-03T09:02:00"));
    let rapid = evaluator().evaluate(&record).expect("valid record");
    assert_eq!(rapid.triggered_rules, vec![FraudRule::RapidReview]);

    record.reviewed_time = Some(timestamp("2025-03-03T09:05:00"));
    let at_minimum = evaluator().evaluate(&record).expect("valid record");
    assert!(at_minimum.triggered_rules.is_empty());
}

#[test]
fn missing_timestamps_skip_timing_rules() {
    let mut record = application(50.0);
    record.submitted_time = None;

    let verdict = evaluator().evaluate(&record).expect("valid record");

    assert!(verdict.triggered_rules.is_empty());
}

#[test]
fn triggered_rules_follow_rule_order() {
    let mut record = application(50.0);
    record.flagged_for_fraud = true;
    record.reviewed_time = Some(timestamp("2025-03-03T09:01:00"));
    record.monthly_costs = Some(49_000.0);
    record.monthly_debt = Some(2_000.0);

    let verdict = evaluator().evaluate(&record).expect("valid record");

    assert_eq!(
        verdict.triggered_rules,
        vec![
            FraudRule::PriorFraudFlag,
            FraudRule::ObligationsExceedIncome,
            FraudRule::RapidReview,
        ]
    );
    assert_eq!(
        verdict.label,
        "Fraud indicators: prior_fraud_flag, obligations_exceed_income, rapid_review"
    );
}

#[test]
fn risk_score_grows_with_each_triggered_rule() {
    let mut record = application(50.0);
    let mut previous = evaluator().evaluate(&record).expect("valid record");

    let mutations: Vec<Box<dyn Fn(&mut ApplicationRecord)>> = vec![
        Box::new(|r: &mut ApplicationRecord| r.flagged_for_fraud = true),
        Box::new(|r: &mut ApplicationRecord| {
            r.reviewed_time = Some(timestamp("2025-03-03T09:01:00"))
        }),
        Box::new(|r: &mut ApplicationRecord| r.monthly_debt = Some(60_000.0)),
    ];

    for mutate in mutations {
        mutate(&mut record);
        let next = evaluator().evaluate(&record).expect("valid record");
        assert!(next.triggered_rules.len() > previous.triggered_rules.len());
        assert!(next.risk_score > previous.risk_score);
        assert!(next.flagged);
        previous = next;
    }
}

#[test]
fn threshold_keeps_low_scores_unflagged() {
    let mut policy = fraud_policy();
    policy.flag_threshold = 0.8;
    let evaluator = FraudEvaluator::new(policy);

    let mut record = application(50.0);
    record.reviewed_time = Some(timestamp("2025-03-03T09:01:00"));
    let low = evaluator.evaluate(&record).expect("valid record");
    assert_eq!(low.triggered_rules, vec![FraudRule::RapidReview]);
    assert!(!low.flagged);

    record.flagged_for_fraud = true;
    let high = evaluator.evaluate(&record).expect("valid record");
    assert!(high.flagged);
}

#[test]
fn evaluation_is_repeatable() {
    let mut record = application(72.0);
    record.flagged_for_fraud = true;
    let evaluator = evaluator();

    let first = evaluator.evaluate(&record).expect("valid record");
    let second = evaluator.evaluate(&record).expect("valid record");

    assert_eq!(first, second);
}

#[test]
fn missing_income_is_a_validation_error() {
    let mut record = application(50.0);
    record.monthly_income = None;

    assert_eq!(
        evaluator().evaluate(&record),
        Err(ValidationError::MissingField {
            field: "monthly_income"
        })
    );
}

#[test]
fn negative_costs_are_rejected() {
    let mut record = application(50.0);
    record.monthly_costs = Some(-10.0);

    assert_eq!(
        evaluator().evaluate(&record),
        Err(ValidationError::InvalidAmount {
            field: "monthly_costs",
            value: -10.0,
        })
    );
}
