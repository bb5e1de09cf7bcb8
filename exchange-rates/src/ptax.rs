//! Central Bank of Brazil PTAX provider.
//!
//! PTAX publishes, per business day, how many BRL one unit of a foreign
//! currency costs. The provider looks up the *sell* quote (`cotacaoVenda`) for
//! the most recent day that has one and pivots every conversion through BRL.
//!
//! Fetching a quote is a two-level search:
//! - outer: candidate dates, from today back `max_back_days` calendar days;
//! - inner: up to `max_retries + 1` HTTP attempts per date, with exponential
//!   backoff after 5xx responses.
//!
//! Each attempt yields an [`Attempt`] and each date a [`DayOutcome`], so the
//! retry decision, the backoff sleep and the cancellation check stay separate
//! steps. A date whose quote list is empty moves the search one day back; any
//! other failure aborts the whole lookup.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use exchange_types::domain::money;
use exchange_types::{Cache, ConvertError, CurrencyCode, RateProvider};

use crate::http;
use crate::rates;

pub const PTAX_NAME: &str = "bcb";
pub const DEFAULT_PTAX_URL: &str = "https://olinda.bcb.gov.br/olinda/servico/PTAX/versao/v1/odata/";

/// Date format expected by the OData parameters (`MM-DD-YYYY`).
const PTAX_DATE_FORMAT: &str = "%m-%d-%Y";

/// Configuration for [`PtaxProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct PtaxConfig {
    /// OData service root.
    pub base_url: String,
    /// Timeout for each HTTP attempt.
    pub timeout: Duration,
    /// Extra attempts per date after a 5xx response.
    pub max_retries: u32,
    /// Calendar days to look back when a date has no quote.
    pub max_back_days: u32,
    /// First backoff delay; attempt `n` waits `backoff_base * 2^n`.
    pub backoff_base: Duration,
}

impl Default for PtaxConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PTAX_URL.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
            max_back_days: 0,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// A single PTAX bulletin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PtaxQuote {
    #[serde(rename = "cotacaoCompra", default)]
    pub buy: f64,
    #[serde(rename = "cotacaoVenda")]
    pub sell: f64,
    #[serde(rename = "dataHoraCotacao", default)]
    pub quoted_at: String,
}

#[derive(Debug, Deserialize)]
struct PtaxEnvelope {
    #[serde(default)]
    value: Vec<PtaxQuote>,
}

/// Outcome of one HTTP attempt.
#[derive(Debug)]
enum Attempt {
    Body(String),
    Retry { status: u16, body: String },
    Fatal(ConvertError),
}

/// Outcome of one candidate date.
#[derive(Debug)]
enum DayOutcome {
    /// Sell rate and the normalized body to cache.
    Found { rate: f64, body: String },
    Empty,
    Fatal(ConvertError),
}

/// Delay before retry number `attempt + 1`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(16))
}

/// Dates to try, newest first.
fn candidate_dates(today: NaiveDate, max_back_days: u32) -> impl Iterator<Item = NaiveDate> {
    (0..=max_back_days).filter_map(move |day| today.checked_sub_days(Days::new(day.into())))
}

/// Returns the JSON inside a `/* ... */` wrapper, if the body has one.
fn strip_comment_wrapper(body: &str) -> Option<&str> {
    body.trim()
        .strip_prefix("/*")?
        .strip_suffix("*/")
        .map(str::trim)
}

/// Decodes a PTAX body, retrying once without a comment wrapper.
///
/// Returns the envelope and the JSON text that decoded. When both attempts
/// fail, the error from the direct decode is returned.
fn decode_envelope(body: &str) -> Result<(PtaxEnvelope, &str), serde_json::Error> {
    match serde_json::from_str::<PtaxEnvelope>(body) {
        Ok(envelope) => Ok((envelope, body)),
        Err(err) => {
            let Some(inner) = strip_comment_wrapper(body) else {
                return Err(err);
            };
            serde_json::from_str::<PtaxEnvelope>(inner)
                .map(|envelope| (envelope, inner))
                .map_err(|_| err)
        }
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// PTAX provider with retry and lookback search.
pub struct PtaxProvider {
    http: reqwest::Client,
    config: PtaxConfig,
    cache: Arc<dyn Cache>,
    today: fn() -> NaiveDate,
}

impl PtaxProvider {
    pub fn new(http: reqwest::Client, mut config: PtaxConfig, cache: Arc<dyn Cache>) -> Self {
        if config.base_url.trim().is_empty() {
            config.base_url = DEFAULT_PTAX_URL.to_string();
        }
        config.base_url = format!("{}/", config.base_url.trim_end_matches('/'));
        Self {
            http,
            config,
            cache,
            today: local_today,
        }
    }

    /// Replaces the clock used to pick the first candidate date.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &PtaxConfig {
        &self.config
    }

    /// Builds the OData query for `currency` on `date`.
    ///
    /// The dollar has its own resource; every other currency goes through
    /// the opening/intermediate bulletin resource.
    pub fn build_url(&self, currency: &CurrencyCode, date: NaiveDate) -> String {
        let d = date.format(PTAX_DATE_FORMAT);
        if currency.as_str() == "USD" {
            format!(
                "{}CotacaoDolarPeriodo(dataInicial=@dataInicial,dataFinalCotacao=@dataFinalCotacao)\
                 ?@dataInicial='{d}'&@dataFinalCotacao='{d}'&$top=100&$format=json\
                 &$select=cotacaoCompra,cotacaoVenda,dataHoraCotacao",
                self.config.base_url
            )
        } else {
            format!(
                "{}CotacaoMoedaAberturaOuIntermediario(codigoMoeda=@codigoMoeda,dataCotacao=@dataCotacao)\
                 ?@codigoMoeda='{currency}'&@dataCotacao='{d}'&$format=json\
                 &$select=cotacaoCompra,cotacaoVenda,dataHoraCotacao,tipoBoletim",
                self.config.base_url
            )
        }
    }

    /// BRL per unit of `currency`, from cache or from the newest published day.
    pub async fn sell_rate(
        &self,
        cancel: &CancellationToken,
        currency: &CurrencyCode,
    ) -> Result<f64, ConvertError> {
        let key = rates::rates_cache_key(PTAX_NAME, currency);
        if let Some(rate) = self.cached_sell_rate(&key).await {
            debug!(currency = %currency, "using cached bcb rates");
            return Ok(rate);
        }

        let today = (self.today)();
        for (day, date) in candidate_dates(today, self.config.max_back_days).enumerate() {
            match self.try_day(cancel, currency, date).await {
                DayOutcome::Found { rate, body } => {
                    rates::store_body(self.cache.as_ref(), &key, &body).await;
                    return Ok(rate);
                }
                DayOutcome::Empty => {
                    debug!(currency = %currency, day, date = %date, "no bcb quote published");
                }
                DayOutcome::Fatal(e) => return Err(e),
            }
        }

        Err(ConvertError::RateWindowExhausted {
            currency: currency.clone(),
            days: self.config.max_back_days,
        })
    }

    async fn cached_sell_rate(&self, key: &str) -> Option<f64> {
        let body = rates::cached_body(self.cache.as_ref(), key).await?;
        match decode_envelope(&body) {
            Ok((envelope, _)) => envelope.value.first().map(|q| q.sell),
            Err(e) => {
                warn!(key, error = %e, "discarding unusable cached bcb body");
                None
            }
        }
    }

    async fn try_day(
        &self,
        cancel: &CancellationToken,
        currency: &CurrencyCode,
        date: NaiveDate,
    ) -> DayOutcome {
        let url = self.build_url(currency, date);
        debug!(url = %url, "bcb request");

        let body = match self.fetch_with_retry(cancel, &url).await {
            Ok(body) => body,
            Err(e) => return DayOutcome::Fatal(e),
        };

        match decode_envelope(&body) {
            Ok((envelope, json)) => match envelope.value.first() {
                Some(quote) => DayOutcome::Found {
                    rate: quote.sell,
                    body: json.to_string(),
                },
                None => DayOutcome::Empty,
            },
            Err(e) => DayOutcome::Fatal(e.into()),
        }
    }

    async fn fetch_with_retry(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<String, ConvertError> {
        let mut attempt = 0;
        loop {
            match self.attempt(cancel, url).await {
                Attempt::Body(body) => return Ok(body),
                Attempt::Retry { status, .. } if attempt < self.config.max_retries => {
                    let delay = backoff_delay(self.config.backoff_base, attempt);
                    warn!(
                        status,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "bcb server error, retrying"
                    );
                    http::sleep_or_cancel(cancel, delay).await?;
                    attempt += 1;
                }
                Attempt::Retry { status, body } => {
                    return Err(ConvertError::upstream_status(status, &body));
                }
                Attempt::Fatal(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, cancel: &CancellationToken, url: &str) -> Attempt {
        let request = self.http.get(url).timeout(self.config.timeout);
        let (status, body) = match http::fetch(cancel, request).await {
            Ok(response) => response,
            Err(e) => return Attempt::Fatal(e),
        };

        if status.is_success() {
            Attempt::Body(body)
        } else if status.is_server_error() {
            Attempt::Retry {
                status: status.as_u16(),
                body,
            }
        } else {
            Attempt::Fatal(ConvertError::upstream_status(status.as_u16(), &body))
        }
    }
}

fn usable_divisor(currency: &CurrencyCode, rate: f64) -> Result<f64, ConvertError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(rate)
    } else {
        Err(ConvertError::InvalidRate {
            currency: currency.clone(),
            rate,
        })
    }
}

#[async_trait]
impl RateProvider for PtaxProvider {
    fn name(&self) -> &str {
        PTAX_NAME
    }

    #[instrument(skip(self, cancel), fields(provider = PTAX_NAME))]
    async fn convert(
        &self,
        cancel: &CancellationToken,
        from: &CurrencyCode,
        to: &CurrencyCode,
        amount: i64,
    ) -> Result<i64, ConvertError> {
        if from == to {
            return Ok(amount);
        }

        if from.is_brl() {
            let to_brl = usable_divisor(to, self.sell_rate(cancel, to).await?)?;
            return Ok(money::apply_inverse_rate(amount, to_brl)?);
        }

        if to.is_brl() {
            let from_brl = self.sell_rate(cancel, from).await?;
            return Ok(money::apply_rate(amount, from_brl)?);
        }

        let from_brl = self.sell_rate(cancel, from).await?;
        let to_brl = usable_divisor(to, self.sell_rate(cancel, to).await?)?;
        Ok(money::apply_rate(amount, from_brl / to_brl)?)
    }
}
