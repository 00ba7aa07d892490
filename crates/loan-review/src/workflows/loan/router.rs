use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::checks::RateSource;
use super::delivery::DeliveryChannel;
use super::domain::ApplicationRecord;
use super::recommendation::VerdictSet;
use super::service::{LoanReviewService, ReviewError};

/// Request body for a full pipeline run.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub application: ApplicationRecord,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub deliver: bool,
}

/// Request body for a batch summary.
#[derive(Debug, Deserialize)]
pub struct TrendRequest {
    pub applications: Vec<ApplicationRecord>,
    #[serde(default)]
    pub recipient: Option<String>,
}

/// Router builder exposing the review pipeline over HTTP.
pub fn review_router<S, C>(service: Arc<LoanReviewService<S, C>>) -> Router
where
    S: RateSource + 'static,
    C: DeliveryChannel + 'static,
{
    Router::new()
        .route("/api/v1/loan/reviews", post(review_handler::<S, C>))
        .route("/api/v1/loan/recommendations", post(recommendation_handler))
        .route("/api/v1/loan/trends", post(trend_handler::<S, C>))
        .with_state(service)
}

pub(crate) async fn review_handler<S, C>(
    State(service): State<Arc<LoanReviewService<S, C>>>,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    S: RateSource + 'static,
    C: DeliveryChannel + 'static,
{
    let ReviewRequest {
        application,
        recipient,
        deliver,
    } = request;

    let result = tokio::task::spawn_blocking(move || {
        if deliver {
            service.review(&application, recipient.as_deref())
        } else {
            service.assess(&application, recipient.as_deref())
        }
    })
    .await;

    match result {
        Ok(Ok(outcome)) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Ok(Err(ReviewError::Validation(err))) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Ok(Err(ReviewError::DataUnavailable(err))) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(join_error) => {
            error!(error = %join_error, "review task failed");
            let payload = json!({ "error": "review task failed" });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

/// Synthesize from verdicts produced elsewhere, e.g. by an external orchestrator.
pub(crate) async fn recommendation_handler(
    axum::Json(verdicts): axum::Json<VerdictSet>,
) -> Response {
    match verdicts.synthesize() {
        Ok(recommendation) => (StatusCode::OK, axum::Json(recommendation)).into_response(),
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn trend_handler<S, C>(
    State(service): State<Arc<LoanReviewService<S, C>>>,
    axum::Json(request): axum::Json<TrendRequest>,
) -> Response
where
    S: RateSource + 'static,
    C: DeliveryChannel + 'static,
{
    match service.summarize_trends(&request.applications, request.recipient.as_deref()) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
    }
}
