use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::onboarding::{EligibilityConfig, OnboardingSettings};

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
    pub onboarding: OnboardingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            onboarding: OnboardingConfig::from_env()?,
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

/// How uploaded documents are turned into extraction results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// No extraction endpoint configured; every document yields the empty result.
    Disabled,
    /// Uploads are analyze responses produced ahead of time.
    AnalyzeResponse,
}

impl ExtractionMode {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "disabled" | "none" => Ok(Self::Disabled),
            "analyze-response" | "offline" | "fixture" => Ok(Self::AnalyzeResponse),
            _ => Err(ConfigError::InvalidValue {
                name: "ONBOARDING_EXTRACTION_MODE",
                value: value.to_string(),
            }),
        }
    }
}

/// Onboarding pipeline settings and collaborator locations.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    pub settings: OnboardingSettings,
    pub extraction_mode: ExtractionMode,
    pub roster_path: Option<PathBuf>,
    pub audit_dir: Option<PathBuf>,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            settings: OnboardingSettings::default(),
            extraction_mode: ExtractionMode::Disabled,
            roster_path: None,
            audit_dir: None,
        }
    }
}

impl OnboardingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = EligibilityConfig::default();

        let confidence_threshold = parse_env(
            "ONBOARDING_CONFIDENCE_THRESHOLD",
            defaults.confidence_threshold,
        )?;
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(ConfigError::InvalidValue {
                name: "ONBOARDING_CONFIDENCE_THRESHOLD",
                value: confidence_threshold.to_string(),
            });
        }

        let min_age = parse_env("ONBOARDING_MIN_AGE", defaults.min_age)?;
        let max_age = parse_env("ONBOARDING_MAX_AGE", defaults.max_age)?;
        if min_age > max_age {
            return Err(ConfigError::InvertedAgeBounds { min_age, max_age });
        }

        let income_ceiling = parse_env("ONBOARDING_INCOME_CEILING", defaults.income_ceiling)?;

        let settings = OnboardingSettings {
            eligibility: EligibilityConfig {
                confidence_threshold,
                min_age,
                max_age,
                income_ceiling,
            },
            demo_mode: parse_flag("ONBOARDING_DEMO_MODE")?,
            skip_rules: parse_flag("ONBOARDING_SKIP_RULES")?,
        };

        let extraction_mode =
            ExtractionMode::from_str(&env::var("ONBOARDING_EXTRACTION_MODE").unwrap_or_default())?;

        Ok(Self {
            settings,
            extraction_mode,
            roster_path: env_path("ONBOARDING_ROSTER_PATH"),
            audit_dir: env_path("ONBOARDING_AUDIT_DIR"),
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        _ => Ok(default),
    }
}

fn parse_flag(name: &'static str) -> Result<bool, ConfigError> {
    let value = env::var(name).unwrap_or_default();
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(ConfigError::InvalidValue { name, value }),
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { name: &'static str, value: String },
    InvertedAgeBounds { min_age: u32, max_age: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { name, value } => {
                write!(f, "{name} has an invalid value '{value}'")
            }
            ConfigError::InvertedAgeBounds { min_age, max_age } => write!(
                f,
                "ONBOARDING_MIN_AGE ({min_age}) must not exceed ONBOARDING_MAX_AGE ({max_age})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidValue { .. }
            | ConfigError::InvertedAgeBounds { .. } => None,
        }
    }
}
