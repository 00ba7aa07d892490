use chrono::Local;
use loan_review::config::{RateSourceConfig, ReviewSettings};
use loan_review::error::AppError;
use loan_review::workflows::loan::{
    AffordabilityBands, CachedRateSource, DataUnavailableError, DeliveryChannel, DeliveryError,
    DeliveryMetadata, FraudPolicy, FredRateSource, LoanReviewService, RateBands, RateQuote,
    RateSource, ReviewError, ReviewPolicy, StaticRateSource, UnconfiguredRateSource,
    WebhookChannel,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub(crate) type ReviewService = LoanReviewService<ConfiguredRateSource, ConfiguredChannel>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Rate source selected from configuration.
pub(crate) enum ConfiguredRateSource {
    Static(StaticRateSource),
    Fred(CachedRateSource<FredRateSource>),
    Unconfigured(UnconfiguredRateSource),
}

impl RateSource for ConfiguredRateSource {
    fn current_rate(&self) -> Result<RateQuote, DataUnavailableError> {
        match self {
            Self::Static(source) => source.current_rate(),
            Self::Fred(source) => source.current_rate(),
            Self::Unconfigured(source) => source.current_rate(),
        }
    }
}

/// Writes reports to the log when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LoggingChannel;

impl DeliveryChannel for LoggingChannel {
    fn send(&self, message: &str, metadata: &DeliveryMetadata) -> Result<(), DeliveryError> {
        info!(
            to = %metadata.to,
            subject = %metadata.subject,
            bytes = message.len(),
            "report delivered to log channel"
        );
        Ok(())
    }
}

pub(crate) enum ConfiguredChannel {
    Webhook(WebhookChannel),
    Log(LoggingChannel),
}

impl DeliveryChannel for ConfiguredChannel {
    fn send(&self, message: &str, metadata: &DeliveryMetadata) -> Result<(), DeliveryError> {
        match self {
            Self::Webhook(channel) => channel.send(message, metadata),
            Self::Log(channel) => channel.send(message, metadata),
        }
    }
}

pub(crate) fn default_review_policy() -> ReviewPolicy {
    ReviewPolicy {
        fraud: FraudPolicy {
            prior_flag_weight: 1.0,
            max_request_to_annual_income: 2.0,
            request_to_income_weight: 0.6,
            obligations_weight: 0.4,
            out_of_order_review_weight: 0.5,
            min_review_minutes: 5,
            rapid_review_weight: 0.3,
            flag_threshold: 0.0,
        },
        sla_limits: BTreeMap::from([
            ("KYC".to_string(), 60.0),
            ("CreditCheck".to_string(), 60.0),
            ("FinalApproval".to_string(), 45.0),
        ]),
        rate_bands: RateBands::new(0.05, 0.08),
        affordability: AffordabilityBands::new(0.35, 0.5),
    }
}

/// A rate given on the command line wins over the configured source.
pub(crate) fn rate_source(
    config: &RateSourceConfig,
    cache_max_age_hours: i64,
    rate_override: Option<f64>,
) -> Result<ConfiguredRateSource, AppError> {
    let today = Local::now().date_naive();
    if let Some(rate) = rate_override {
        return Ok(ConfiguredRateSource::Static(StaticRateSource::new(
            rate,
            today,
            "command line",
        )));
    }

    let source = match config {
        RateSourceConfig::Static { rate } => ConfiguredRateSource::Static(
            StaticRateSource::new(*rate, today, "LOAN_REVIEW_STATIC_RATE"),
        ),
        RateSourceConfig::Fred {
            api_key,
            series_id,
            timeout_ms,
        } => {
            let fred = FredRateSource::new(
                api_key.clone(),
                series_id.clone(),
                Duration::from_millis(*timeout_ms),
            )
            .map_err(ReviewError::from)?;
            ConfiguredRateSource::Fred(CachedRateSource::new(
                fred,
                chrono::Duration::hours(cache_max_age_hours),
            ))
        }
        RateSourceConfig::Unconfigured => {
            ConfiguredRateSource::Unconfigured(UnconfiguredRateSource)
        }
    };
    Ok(source)
}

pub(crate) fn delivery_channel(settings: &ReviewSettings) -> Result<ConfiguredChannel, AppError> {
    match &settings.webhook_url {
        Some(url) => Ok(ConfiguredChannel::Webhook(WebhookChannel::new(
            url.clone(),
            Duration::from_millis(settings.delivery_timeout_ms),
        )?)),
        None => Ok(ConfiguredChannel::Log(LoggingChannel)),
    }
}

/// Assemble the review service from settings. Builds blocking HTTP clients, so call it outside
/// async contexts.
pub(crate) fn build_review_service(
    settings: &ReviewSettings,
    rate_override: Option<f64>,
) -> Result<Arc<ReviewService>, AppError> {
    let policy = match settings.load_policy()? {
        Some(policy) => policy,
        None => default_review_policy(),
    };
    let rates = rate_source(
        &settings.rate_source,
        settings.rate_cache_max_age_hours,
        rate_override,
    )?;
    let channel = delivery_channel(settings)?;

    let service = LoanReviewService::new(
        policy,
        settings.report.clone(),
        Arc::new(rates),
        Arc::new(channel),
    )?;
    Ok(Arc::new(service))
}

/// Drop the service where blocking is allowed. Its HTTP clients join their runtime threads on
/// drop, which must not happen on an async worker.
pub(crate) fn release_review_service(service: Arc<ReviewService>) {
    tokio::task::block_in_place(move || drop(service));
}
