use derive_more::Display;
use std::time::Duration;

/// Progress service used when `DASHBOARD_API_URL` is unset
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Time between participant fetches
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Upper bound on a single fetch. A stuck request would otherwise
/// hold the single in-flight slot forever
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

const API_URL_ENV: &str = "DASHBOARD_API_URL";
const POLL_INTERVAL_ENV: &str = "DASHBOARD_POLL_INTERVAL_MS";
const REQUEST_TIMEOUT_ENV: &str = "DASHBOARD_REQUEST_TIMEOUT_MS";

#[derive(Debug, Display, PartialEq, Eq)]
pub enum ConfigError {
    #[display(fmt = "{} must be a positive number of milliseconds, got {:?}", _0, _1)]
    InvalidDuration(&'static str, String),
}

impl std::error::Error for ConfigError {}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Dashboard settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the progress service, `/participants` is appended
    pub api_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    /// Reads the config from the process environment. Call `dotenv`
    /// beforehand to pick up a `.env` file
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the config through `lookup`, treating empty values as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Ok(Self {
            api_url: get(API_URL_ENV).unwrap_or(defaults.api_url),
            poll_interval: match get(POLL_INTERVAL_ENV) {
                Some(value) => parse_millis(POLL_INTERVAL_ENV, value)?,
                None => defaults.poll_interval,
            },
            request_timeout: match get(REQUEST_TIMEOUT_ENV) {
                Some(value) => parse_millis(REQUEST_TIMEOUT_ENV, value)?,
                None => defaults.request_timeout,
            },
        })
    }
}

fn parse_millis(key: &'static str, value: String) -> ConfigResult<Duration> {
    match value.parse::<u64>() {
        Ok(millis) if millis > 0 => Ok(Duration::from_millis(millis)),
        _ => Err(ConfigError::InvalidDuration(key, value)),
    }
}
