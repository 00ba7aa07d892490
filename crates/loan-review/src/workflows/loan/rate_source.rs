//! Reference rate adapters implementing [`RateSource`].

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::warn;

use super::checks::{DataUnavailableError, RateQuote, RateSource};

const FRED_OBSERVATIONS_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const FRED_OBSERVATION_LIMIT: usize = 10;

/// Fixed quote, for operators pinning a rate and for tests.
#[derive(Debug, Clone)]
pub struct StaticRateSource {
    quote: RateQuote,
}

impl StaticRateSource {
    pub fn new(rate: f64, as_of: NaiveDate, source_name: impl Into<String>) -> Self {
        Self {
            quote: RateQuote {
                rate,
                as_of,
                source_name: source_name.into(),
                stale: false,
            },
        }
    }
}

impl RateSource for StaticRateSource {
    fn current_rate(&self) -> Result<RateQuote, DataUnavailableError> {
        Ok(self.quote.clone())
    }
}

/// Stand-in used when no source is configured. Every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredRateSource;

impl RateSource for UnconfiguredRateSource {
    fn current_rate(&self) -> Result<RateQuote, DataUnavailableError> {
        Err(DataUnavailableError::NotConfigured)
    }
}

#[derive(Debug, Clone)]
struct CachedQuote {
    quote: RateQuote,
    fetched_at: DateTime<Utc>,
}

/// Wraps a source and falls back to its last good quote, marked stale, while that quote is
/// younger than `max_age`.
pub struct CachedRateSource<S> {
    inner: S,
    max_age: chrono::Duration,
    last: Mutex<Option<CachedQuote>>,
}

impl<S: RateSource> CachedRateSource<S> {
    pub fn new(inner: S, max_age: chrono::Duration) -> Self {
        Self {
            inner,
            max_age,
            last: Mutex::new(None),
        }
    }

    fn current_rate_at(&self, now: DateTime<Utc>) -> Result<RateQuote, DataUnavailableError> {
        match self.inner.current_rate() {
            Ok(quote) => {
                // Writers replace the whole entry, so a poisoned lock still holds a usable quote.
                let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
                *last = Some(CachedQuote {
                    quote: quote.clone(),
                    fetched_at: now,
                });
                Ok(quote)
            }
            Err(err) => {
                let cached = self
                    .last
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                match cached {
                    Some(cached) if now - cached.fetched_at <= self.max_age => {
                        warn!(
                            error = %err,
                            source = %cached.quote.source_name,
                            as_of = %cached.quote.as_of,
                            "rate source failed, serving last known quote"
                        );
                        Ok(RateQuote {
                            stale: true,
                            ..cached.quote
                        })
                    }
                    _ => Err(err),
                }
            }
        }
    }
}

impl<S: RateSource> RateSource for CachedRateSource<S> {
    fn current_rate(&self) -> Result<RateQuote, DataUnavailableError> {
        self.current_rate_at(Utc::now())
    }
}

/// Latest observation of a FRED series quoted in percent, e.g. `DGS10` (10-year Treasury).
pub struct FredRateSource {
    client: Client,
    api_key: String,
    series_id: String,
    timeout: Duration,
}

impl FredRateSource {
    pub fn new(
        api_key: impl Into<String>,
        series_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DataUnavailableError> {
        let series_id = series_id.into();
        let client = Client::builder().timeout(timeout).build().map_err(|err| {
            DataUnavailableError::Unavailable {
                source_name: fred_source_name(&series_id),
                reason: format!("failed to build HTTP client: {err}"),
            }
        })?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            series_id,
            timeout,
        })
    }

    fn source_name(&self) -> String {
        fred_source_name(&self.series_id)
    }

    fn request_error(&self, err: reqwest::Error) -> DataUnavailableError {
        if err.is_timeout() {
            DataUnavailableError::Timeout {
                source_name: self.source_name(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            DataUnavailableError::Unavailable {
                source_name: self.source_name(),
                reason: format!("request failed: {err}"),
            }
        }
    }
}

impl RateSource for FredRateSource {
    fn current_rate(&self) -> Result<RateQuote, DataUnavailableError> {
        let limit = FRED_OBSERVATION_LIMIT.to_string();
        let resp = self
            .client
            .get(FRED_OBSERVATIONS_URL)
            .query(&[
                ("series_id", self.series_id.as_str()),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("sort_order", "desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .map_err(|err| self.request_error(err))?;

        if !resp.status().is_success() {
            return Err(DataUnavailableError::Unavailable {
                source_name: self.source_name(),
                reason: format!("status {}", resp.status()),
            });
        }

        let body: ObservationsResponse = resp.json().map_err(|err| self.request_error(err))?;
        let (as_of, percent) =
            latest_observation(&body).ok_or_else(|| DataUnavailableError::Unavailable {
                source_name: self.source_name(),
                reason: "no usable observations returned".to_string(),
            })?;

        Ok(RateQuote {
            rate: percent / 100.0,
            as_of,
            source_name: self.source_name(),
            stale: false,
        })
    }
}

fn fred_source_name(series_id: &str) -> String {
    format!("FRED {series_id}")
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

/// Most recent observation with a numeric value. FRED marks gaps with ".".
fn latest_observation(body: &ObservationsResponse) -> Option<(NaiveDate, f64)> {
    body.observations
        .iter()
        .filter_map(|obs| {
            let value = obs.value.trim();
            if value == "." || value.is_empty() {
                return None;
            }
            let value = value.parse::<f64>().ok().filter(|v| v.is_finite())?;
            let date = NaiveDate::parse_from_str(obs.date.trim(), "%Y-%m-%d").ok()?;
            Some((date, value))
        })
        .max_by_key(|(date, _)| *date)
}
