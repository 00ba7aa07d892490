use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::workflows::loan::checks::{
    AffordabilityBands, DataUnavailableError, FraudPolicy, RateBands, RateQuote, RateSource,
    ReviewPolicy,
};
use crate::workflows::loan::delivery::{DeliveryChannel, DeliveryError};
use crate::workflows::loan::domain::{ApplicationId, ApplicationRecord};
use crate::workflows::loan::rate_source::StaticRateSource;
use crate::workflows::loan::report::{DeliveryMetadata, ReportSettings};
use crate::workflows::loan::service::LoanReviewService;

pub(super) fn fraud_policy() -> FraudPolicy {
    FraudPolicy {
        prior_flag_weight: 1.0,
        max_request_to_annual_income: 2.0,
        request_to_income_weight: 0.6,
        obligations_weight: 0.4,
        out_of_order_review_weight: 0.5,
        min_review_minutes: 5,
        rapid_review_weight: 0.3,
        flag_threshold: 0.0,
    }
}

pub(super) fn sla_limits() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("KYC".to_string(), 60.0),
        ("CreditCheck".to_string(), 60.0),
        ("FinalApproval".to_string(), 45.0),
    ])
}

pub(super) fn review_policy() -> ReviewPolicy {
    ReviewPolicy {
        fraud: fraud_policy(),
        sla_limits: sla_limits(),
        rate_bands: RateBands::new(0.05, 0.08),
        affordability: AffordabilityBands::new(0.35, 0.5),
    }
}

pub(super) fn report_settings() -> ReportSettings {
    ReportSettings {
        default_recipient: "Loan Operations".to_string(),
        signature: "Loan Review Service".to_string(),
    }
}

pub(super) fn timestamp(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").expect("valid timestamp")
}

/// The reference application: income 50000, costs 1000, debt 400, requesting 25000.
pub(super) fn application(kyc_minutes: f64) -> ApplicationRecord {
    ApplicationRecord {
        application_id: ApplicationId("loan-0042".to_string()),
        submitted_time: Some(timestamp("2025-03-03T09:00:00")),
        reviewed_time: Some(timestamp("2025-03-03T11:30:00")),
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

pub(super) fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date")
}

pub(super) fn quote(rate: f64) -> RateQuote {
    RateQuote {
        rate,
        as_of: as_of(),
        source_name: "FRED DGS10".to_string(),
        stale: false,
    }
}

pub(super) fn static_source(rate: f64) -> StaticRateSource {
    StaticRateSource::new(rate, as_of(), "FRED DGS10")
}

pub(super) struct FailingSource;

impl RateSource for FailingSource {
    fn current_rate(&self) -> Result<RateQuote, DataUnavailableError> {
        Err(DataUnavailableError::Timeout {
            source_name: "FRED DGS10".to_string(),
            timeout_ms: 5000,
        })
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryChannel {
    sent: Arc<Mutex<Vec<(String, DeliveryMetadata)>>>,
}

impl MemoryChannel {
    pub(super) fn sent(&self) -> Vec<(String, DeliveryMetadata)> {
        self.sent.lock().expect("channel mutex poisoned").clone()
    }
}

impl DeliveryChannel for MemoryChannel {
    fn send(&self, message: &str, metadata: &DeliveryMetadata) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .expect("channel mutex poisoned")
            .push((message.to_string(), metadata.clone()));
        Ok(())
    }
}

pub(super) struct OfflineChannel;

impl DeliveryChannel for OfflineChannel {
    fn send(&self, _message: &str, _metadata: &DeliveryMetadata) -> Result<(), DeliveryError> {
        Err(DeliveryError::Transport("connection refused".to_string()))
    }
}

pub(super) fn build_service(
    rate: f64,
) -> (
    LoanReviewService<StaticRateSource, MemoryChannel>,
    Arc<MemoryChannel>,
) {
    let channel = Arc::new(MemoryChannel::default());
    let service = LoanReviewService::new(
        review_policy(),
        report_settings(),
        Arc::new(static_source(rate)),
        channel.clone(),
    )
    .expect("valid policy");
    (service, channel)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
