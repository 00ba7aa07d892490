use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::loan::{ReportSettings, ReviewPolicy, ValidationError};

const DEFAULT_RATE_SERIES: &str = "DGS10";
const DEFAULT_RATE_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_RATE_CACHE_HOURS: i64 = 72;
const DEFAULT_DELIVERY_TIMEOUT_MS: u64 = 5_000;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub review: ReviewSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            review: ReviewSettings::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the reference interest rate comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum RateSourceConfig {
    /// Operator-pinned rate (decimal fraction).
    Static { rate: f64 },
    Fred {
        api_key: String,
        series_id: String,
        timeout_ms: u64,
    },
    Unconfigured,
}

/// Review pipeline wiring: policy file, rate source, delivery, and report addressing.
#[derive(Debug, Clone)]
pub struct ReviewSettings {
    pub policy_path: Option<PathBuf>,
    pub rate_source: RateSourceConfig,
    pub rate_cache_max_age_hours: i64,
    pub webhook_url: Option<String>,
    pub delivery_timeout_ms: u64,
    pub report: ReportSettings,
}

impl ReviewSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let policy_path = non_empty_var("LOAN_REVIEW_POLICY_PATH").map(PathBuf::from);

        let rate_source = if let Some(raw) = non_empty_var("LOAN_REVIEW_STATIC_RATE") {
            let rate = raw
                .parse::<f64>()
                .ok()
                .filter(|rate| rate.is_finite() && *rate >= 0.0)
                .ok_or(ConfigError::InvalidNumber {
                    var: "LOAN_REVIEW_STATIC_RATE",
                    value: raw,
                })?;
            RateSourceConfig::Static { rate }
        } else if let Some(api_key) = non_empty_var("FRED_API_KEY") {
            RateSourceConfig::Fred {
                api_key,
                series_id: non_empty_var("LOAN_REVIEW_RATE_SERIES")
                    .unwrap_or_else(|| DEFAULT_RATE_SERIES.to_string()),
                timeout_ms: parse_var("LOAN_REVIEW_RATE_TIMEOUT_MS", DEFAULT_RATE_TIMEOUT_MS)?,
            }
        } else {
            RateSourceConfig::Unconfigured
        };

        let rate_cache_max_age_hours =
            parse_var("LOAN_REVIEW_RATE_CACHE_HOURS", DEFAULT_RATE_CACHE_HOURS)?;
        if rate_cache_max_age_hours < 0 {
            return Err(ConfigError::InvalidNumber {
                var: "LOAN_REVIEW_RATE_CACHE_HOURS",
                value: rate_cache_max_age_hours.to_string(),
            });
        }

        Ok(Self {
            policy_path,
            rate_source,
            rate_cache_max_age_hours,
            webhook_url: non_empty_var("LOAN_REVIEW_WEBHOOK_URL"),
            delivery_timeout_ms: parse_var(
                "LOAN_REVIEW_DELIVERY_TIMEOUT_MS",
                DEFAULT_DELIVERY_TIMEOUT_MS,
            )?,
            report: ReportSettings {
                default_recipient: non_empty_var("LOAN_REVIEW_REPORT_RECIPIENT")
                    .unwrap_or_else(|| "Loan Operations".to_string()),
                signature: non_empty_var("LOAN_REVIEW_REPORT_SIGNATURE")
                    .unwrap_or_else(|| "Loan Review Service".to_string()),
            },
        })
    }

    /// Read the JSON policy file, if one is configured.
    pub fn load_policy(&self) -> Result<Option<ReviewPolicy>, ConfigError> {
        let Some(path) = &self.policy_path else {
            return Ok(None);
        };

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::PolicyRead {
            path: path.clone(),
            source,
        })?;
        let policy: ReviewPolicy =
            serde_json::from_str(&raw).map_err(|source| ConfigError::PolicyParse {
                path: path.clone(),
                source,
            })?;
        policy.validate().map_err(ConfigError::InvalidPolicy)?;
        Ok(Some(policy))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty_var(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var: name, value: raw }),
        None => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidNumber {
        var: &'static str,
        value: String,
    },
    PolicyRead {
        path: PathBuf,
        source: std::io::Error,
    },
    PolicyParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidPolicy(ValidationError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var, value } => {
                write!(f, "{var} has invalid numeric value '{value}'")
            }
            ConfigError::PolicyRead { path, .. } => {
                write!(f, "unable to read review policy {}", path.display())
            }
            ConfigError::PolicyParse { path, source } => {
                write!(f, "review policy {} is malformed: {source}", path.display())
            }
            ConfigError::InvalidPolicy(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::PolicyRead { source, .. } => Some(source),
            ConfigError::PolicyParse { source, .. } => Some(source),
            ConfigError::InvalidPolicy(err) => Some(err),
        }
    }
}
