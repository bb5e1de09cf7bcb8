//! Configuration loading from environment.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

use exchange_rates::{
    DEFAULT_CONVERSION_RATES_URL, DEFAULT_LATEST_RATES_URL, DEFAULT_PTAX_URL, FeeSettings,
    HttpSettings, PtaxConfig, ProviderSettings,
};

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CACHE_TTL_SECS: i64 = 300;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => bail!("unknown log format {other:?}, expected \"text\" or \"json\""),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub http_addr: String,
    /// TTL of cached conversion results.
    pub cache_ttl: Duration,
    pub providers: ProviderSettings,
    pub fee: FeeSettings,
    pub log_format: LogFormat,
    pub log_level: String,
    /// OTLP collector endpoint; tracing export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let parse = |key: &str| -> anyhow::Result<Option<f64>> { parse_var(var(key), key) };
        let seconds = |key: &str| -> anyhow::Result<Duration> {
            let secs: Option<u64> = parse_var(var(key), key)?;
            Ok(Duration::from_secs(secs.unwrap_or(DEFAULT_TIMEOUT_SECS)))
        };

        let cache_ttl_secs: i64 =
            parse_var(var("CACHE_TTL_SECONDS"), "CACHE_TTL_SECONDS")?.unwrap_or(DEFAULT_CACHE_TTL_SECS);
        let cache_ttl_secs = if cache_ttl_secs > 0 {
            cache_ttl_secs
        } else {
            DEFAULT_CACHE_TTL_SECS
        };

        let exchange_timeout = seconds("EXCHANGE_TIMEOUT_SECONDS")?;
        let defaults = PtaxConfig::default();
        let ptax = PtaxConfig {
            base_url: var("BCB_API_BASE_URL").unwrap_or_else(|| DEFAULT_PTAX_URL.to_string()),
            timeout: seconds("BCB_TIMEOUT_SECONDS")?,
            max_retries: parse_var(var("BCB_MAX_RETRIES"), "BCB_MAX_RETRIES")?
                .unwrap_or(defaults.max_retries),
            max_back_days: parse_var(var("BCB_MAX_BACK_DAYS"), "BCB_MAX_BACK_DAYS")?
                .unwrap_or(defaults.max_back_days),
            backoff_base: defaults.backoff_base,
        };

        let providers = ProviderSettings {
            provider: var("EXCHANGE_PROVIDER").unwrap_or_else(|| "exchangerate.host".to_string()),
            api_key: var("EXCHANGE_API_KEY"),
            latest_rates: HttpSettings::new(
                var("EXCHANGERATE_HOST_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_LATEST_RATES_URL.to_string()),
                exchange_timeout,
            ),
            conversion_rates: HttpSettings::new(
                var("EXCHANGERATE_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_CONVERSION_RATES_URL.to_string()),
                exchange_timeout,
            ),
            ptax,
        };

        let fee = FeeSettings {
            api_url: var("FEE_API_URL"),
            percent: parse("EXCHANGE_FEE_PERCENT")?.unwrap_or(0.0),
        };

        let log_format = match var("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().context("invalid LOG_FORMAT")?,
            None => LogFormat::Text,
        };

        Ok(Self {
            http_addr: var("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string()),
            cache_ttl: Duration::from_secs(cache_ttl_secs.unsigned_abs()),
            providers,
            fee,
            log_format,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            otlp_endpoint: var("OTLP_ENDPOINT").or_else(|| var("OTEL_COLLECTOR_URL")),
        })
    }
}

fn parse_var<T>(raw: Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {key}={value:?}: {e}"))
    })
    .transpose()
}
