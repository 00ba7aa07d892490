use crate::cli::ServeArgs;
use crate::infra::{build_review_service, release_review_service, AppState};
use crate::routes::with_review_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_review::config::{AppConfig, RateSourceConfig};
use loan_review::error::AppError;
use loan_review::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let review_service =
        tokio::task::block_in_place(|| build_review_service(&config.review, None))?;

    let app = with_review_routes(review_service.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        rate_source = rate_source_kind(&config),
        "loan review service ready"
    );

    let served = axum::serve(listener, app).await;
    // The router's copy went with the server; this is the last handle to the HTTP clients.
    release_review_service(review_service);
    served?;
    Ok(())
}

fn rate_source_kind(config: &AppConfig) -> &'static str {
    match config.review.rate_source {
        RateSourceConfig::Static { .. } => "static",
        RateSourceConfig::Fred { .. } => "fred",
        RateSourceConfig::Unconfigured => "unconfigured",
    }
}
