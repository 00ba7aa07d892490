use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::loan::rate_source::UnconfiguredRateSource;
use crate::workflows::loan::router::{review_handler, review_router, ReviewRequest};
use crate::workflows::loan::service::LoanReviewService;

fn post_json(uri: &str, payload: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(payload).expect("serialize")))
        .expect("request")
}

fn review_payload(kyc_minutes: f64, deliver: bool) -> Value {
    json!({
        "application": application(kyc_minutes),
        "recipient": "Risk Desk",
        "deliver": deliver,
    })
}

#[tokio::test]
async fn review_route_returns_the_outcome() {
    let (service, channel) = build_service(0.045);
    let router = review_router(Arc::new(service));

    let response = router
        .oneshot(post_json("/api/v1/loan/reviews", &review_payload(72.0, false)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["application_id"], "loan-0042");
    assert_eq!(body["recommendation"]["outcome"], "reject");
    assert_eq!(body["recommendation"]["basis"], "sla_breach");
    assert_eq!(body["delivery"]["status"], "not_requested");
    assert_eq!(body["metadata"]["to"], "Risk Desk");
    assert!(channel.sent().is_empty());
}

#[tokio::test]
async fn review_route_delivers_on_request() {
    let (service, channel) = build_service(0.045);
    let router = review_router(Arc::new(service));

    let response = router
        .oneshot(post_json("/api/v1/loan/reviews", &review_payload(50.0, true)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["recommendation"]["outcome"], "approve");
    assert_eq!(body["delivery"]["status"], "delivered");
    assert_eq!(channel.sent().len(), 1);
}

#[tokio::test]
async fn review_handler_returns_unprocessable_for_invalid_record() {
    let (service, _) = build_service(0.045);
    let mut record = application(50.0);
    record.monthly_income = None;

    let response = review_handler(
        State(Arc::new(service)),
        axum::Json(ReviewRequest {
            application: record,
            recipient: None,
            deliver: false,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "monthly_income is required");
}

#[tokio::test]
async fn review_handler_returns_unavailable_without_a_rate_source() {
    let service = LoanReviewService::new(
        review_policy(),
        report_settings(),
        Arc::new(UnconfiguredRateSource),
        Arc::new(MemoryChannel::default()),
    )
    .expect("valid policy");

    let response = review_handler(
        State(Arc::new(service)),
        axum::Json(ReviewRequest {
            application: application(50.0),
            recipient: None,
            deliver: false,
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn recommendation_route_synthesizes_supplied_verdicts() {
    let (service, _) = build_service(0.045);
    let outcome = service
        .assess(&application(72.0), None)
        .expect("review completes");
    let router = review_router(Arc::new(service));

    let payload = json!({
        "fraud": outcome.fraud,
        "sla": outcome.sla,
        "rate": outcome.rate,
    });
    let response = router
        .oneshot(post_json("/api/v1/loan/recommendations", &payload))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["outcome"], "reject");
    assert_eq!(body["basis"], "sla_breach");
}

#[tokio::test]
async fn zero_income_verdicts_can_be_resubmitted_for_synthesis() {
    let (service, _) = build_service(0.045);
    let mut record = application(50.0);
    record.monthly_income = Some(0.0);
    record.requested_amount = Some(1_000.0);
    let router = review_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/loan/reviews",
            &json!({ "application": record }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let review = read_json_body(response).await;
    assert!(review["rate"]["affordability"]["ratio"].is_null());

    let payload = json!({
        "fraud": review["fraud"],
        "sla": review["sla"],
        "rate": review["rate"],
    });
    let response = router
        .oneshot(post_json("/api/v1/loan/recommendations", &payload))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["outcome"], "reject");
    assert_eq!(body["basis"], "fraud_indicators");
}

#[tokio::test]
async fn recommendation_route_rejects_incomplete_verdicts() {
    let (service, _) = build_service(0.045);
    let outcome = service
        .assess(&application(50.0), None)
        .expect("review completes");
    let router = review_router(Arc::new(service));

    let payload = json!({ "fraud": outcome.fraud, "sla": outcome.sla });
    let response = router
        .oneshot(post_json("/api/v1/loan/recommendations", &payload))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(
        body["error"],
        "cannot synthesize a recommendation without the rate verdict"
    );
}

#[tokio::test]
async fn trend_route_summarizes_a_batch() {
    let (service, channel) = build_service(0.045);
    let router = review_router(Arc::new(service));
    let mut second = application(72.0);
    second.application_id.0 = "loan-0043".to_string();

    let payload = json!({
        "applications": [application(50.0), second],
        "recipient": "Risk Desk",
    });
    let response = router
        .oneshot(post_json("/api/v1/loan/trends", &payload))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["analysis"]["application_count"], 2);
    assert_eq!(body["analysis"]["average_processing_minutes"], 146.0);
    let report = body["report"].as_str().expect("report text");
    assert!(report.starts_with("Loan Application System Summary\nTo: Risk Desk\n"));
    assert!(channel.sent().is_empty());
}

#[tokio::test]
async fn trend_route_rejects_an_empty_batch() {
    let (service, _) = build_service(0.045);
    let router = review_router(Arc::new(service));

    let response = router
        .oneshot(post_json("/api/v1/loan/trends", &json!({ "applications": [] })))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(
        body["error"],
        "trend analysis needs at least one application"
    );
}
