use crate::infra::{build_review_service, default_review_policy, LoggingChannel};
use chrono::{Local, NaiveDateTime};
use clap::Args;
use loan_review::config::AppConfig;
use loan_review::error::AppError;
use loan_review::workflows::loan::{
    analyze_trends, ApplicationId, ApplicationRecord, DeliveryStatus, LoanReviewService,
    ReportFormatter, ReviewError, ReviewOutcome, StaticRateSource, TrendReport,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON file holding one application record
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Report recipient (defaults to LOAN_REVIEW_REPORT_RECIPIENT)
    #[arg(long)]
    pub(crate) recipient: Option<String>,
    /// Pin the reference rate (decimal fraction, e.g. 0.045) instead of the configured source
    #[arg(long)]
    pub(crate) rate: Option<f64>,
    /// Send the report through the configured delivery channel
    #[arg(long)]
    pub(crate) deliver: bool,
    /// Print the full review outcome as JSON instead of the report text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct TrendArgs {
    /// JSON file holding an array of application records
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Report recipient (defaults to LOAN_REVIEW_REPORT_RECIPIENT)
    #[arg(long)]
    pub(crate) recipient: Option<String>,
    /// Print the analysis and report as JSON instead of the report text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Reference rate used for both demo applications (decimal fraction)
    #[arg(long, default_value_t = 0.045)]
    pub(crate) rate: f64,
    /// Report recipient
    #[arg(long)]
    pub(crate) recipient: Option<String>,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        input,
        recipient,
        rate,
        deliver,
        json,
    } = args;

    let config = AppConfig::load()?;
    let raw = std::fs::read_to_string(&input)?;
    let record: ApplicationRecord = serde_json::from_str(&raw)?;

    let service = build_review_service(&config.review, rate)?;
    let outcome = if deliver {
        service.review(&record, recipient.as_deref())?
    } else {
        service.assess(&record, recipient.as_deref())?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        render_outcome(&outcome);
    }
    Ok(())
}

/// Batch summary needs no rate source, so only the report settings are loaded.
pub(crate) fn run_trend(args: TrendArgs) -> Result<(), AppError> {
    let TrendArgs {
        input,
        recipient,
        json,
    } = args;

    let config = AppConfig::load()?;
    let raw = std::fs::read_to_string(&input)?;
    let records: Vec<ApplicationRecord> = serde_json::from_str(&raw)?;

    let summary = trend_report(
        &ReportFormatter::new(config.review.report),
        &records,
        recipient.as_deref(),
    )?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.report);
    }
    Ok(())
}

fn trend_report(
    formatter: &ReportFormatter,
    records: &[ApplicationRecord],
    recipient: Option<&str>,
) -> Result<TrendReport, AppError> {
    let analysis = analyze_trends(records).map_err(ReviewError::Validation)?;
    let report = formatter.format_trend(&analysis, recipient);
    Ok(TrendReport { analysis, report })
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { rate, recipient } = args;

    let config = AppConfig::load()?;
    let service = LoanReviewService::new(
        default_review_policy(),
        config.review.report,
        Arc::new(StaticRateSource::new(
            rate,
            Local::now().date_naive(),
            "demo rate",
        )),
        Arc::new(LoggingChannel),
    )?;

    println!("Loan review demo (reference rate {:.2}%)", rate * 100.0);
    for (title, record) in [
        ("KYC ran past its SLA", demo_application("demo-sla-breach", 72.0)),
        ("all steps within SLA", demo_application("demo-compliant", 50.0)),
    ] {
        println!("\n== {title} ==");
        let outcome = service.assess(&record, recipient.as_deref())?;
        render_outcome(&outcome);
    }
    Ok(())
}

fn render_outcome(outcome: &ReviewOutcome) {
    println!("{}", outcome.report);
    if outcome.conflicting_outcome {
        println!("\nWarning: application carries both approval and rejection timestamps");
    }
    match &outcome.delivery {
        DeliveryStatus::NotRequested => {}
        DeliveryStatus::Delivered => println!("\nDelivered to {}", outcome.metadata.to),
        DeliveryStatus::Failed { reason } => println!("\nDelivery failed: {reason}"),
    }
}

fn demo_application(id: &str, kyc_minutes: f64) -> ApplicationRecord {
    ApplicationRecord {
        application_id: ApplicationId(id.to_string()),
        submitted_time: demo_timestamp("2025-03-03T09:00:00"),
        reviewed_time: demo_timestamp("2025-03-03T11:30:00"),
        approved_time: None,
        rejected_time: None,
        processing_steps: BTreeMap::from([
            ("KYC".to_string(), kyc_minutes),
            ("CreditCheck".to_string(), 50.0),
            ("FinalApproval".to_string(), 35.0),
        ]),
        flagged_for_fraud: false,
        monthly_income: Some(50_000.0),
        monthly_costs: Some(1_000.0),
        monthly_debt: Some(400.0),
        requested_amount: Some(25_000.0),
    }
}

fn demo_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok()
}
