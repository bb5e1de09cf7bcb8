//! # Exchange Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize logging and optional OTLP trace export
//! - Build the cache, rate provider and fee provider
//! - Serve the HTTP API, or run a single conversion from the command line

mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace as sdktrace};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use exchange_cache::MemoryCache;
use exchange_hex::{ConversionService, inbound::HttpServer};
use exchange_rates::{build_fee_provider, build_provider};
use exchange_types::{Cache, ConvertQuery};

use config::{Config, LogFormat};

#[derive(Parser)]
#[command(name = "exchange-server")]
#[command(author, version, about = "Currency conversion service", long_about = None)]
struct Cli {
    /// Rate provider: exchangerate.host, exchangerate-api, bcb
    #[arg(long, env = "EXCHANGE_PROVIDER", global = true)]
    provider: Option<String>,

    /// API key for the configured rate provider
    #[arg(long, env = "EXCHANGE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve {
        /// Listen address (overrides HTTP_ADDR)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Convert once and print the result as JSON
    Convert {
        /// Source currency code
        from: String,
        /// Target currency code
        to: String,
        /// Integer cents, or decimal units when it contains a '.'
        amount: String,
    },
}

fn init_tracer(endpoint: &str) -> anyhow::Result<(sdktrace::Tracer, sdktrace::SdkTracerProvider)> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    // Use gRPC exporter with batch processing (non-blocking)
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("failed to create OTLP span exporter")?;

    let provider = sdktrace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    global::set_tracer_provider(provider.clone());

    use opentelemetry::trace::TracerProvider as _;
    Ok((provider.tracer("exchange-service"), provider))
}

/// Installs the global subscriber; returns the OTLP provider to flush on exit.
fn init_tracing(config: &Config) -> anyhow::Result<Option<sdktrace::SdkTracerProvider>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;

    let (text, json) = match config.log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    let (telemetry, otel_provider) = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let (tracer, provider) = init_tracer(endpoint)?;
            (
                Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                Some(provider),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .with(telemetry)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(otel_provider)
}

fn build_service(config: &Config) -> anyhow::Result<ConversionService<Arc<MemoryCache>>> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("exchange-server/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let cache = Arc::new(MemoryCache::new());
    let shared: Arc<dyn Cache> = cache.clone();

    let provider = build_provider(&config.providers, http.clone(), shared);
    let fee = build_fee_provider(&config.fee, http);

    Ok(ConversionService::new(cache, provider)
        .with_fee_provider(fee)
        .with_result_ttl(config.cache_ttl))
}

async fn convert_once(
    service: &ConversionService<Arc<MemoryCache>>,
    from: String,
    to: String,
    amount: String,
) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let query = ConvertQuery {
        from: Some(from),
        to: Some(to),
        amount: Some(amount),
    };
    let response = service.convert(&cancel, query).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(provider) = cli.provider.filter(|p| !p.trim().is_empty()) {
        config.providers.provider = provider;
    }
    if let Some(key) = cli.api_key.filter(|k| !k.trim().is_empty()) {
        config.providers.api_key = Some(key);
    }

    let otel_provider = init_tracing(&config)?;

    let service = build_service(&config)?;

    let result = match cli.command.unwrap_or(Command::Serve { addr: None }) {
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.http_addr.clone());
            tracing::info!(
                provider = service.provider_name(),
                cache_ttl_secs = config.cache_ttl.as_secs(),
                "Starting exchange server on {}",
                addr
            );
            HttpServer::new(service).run(&addr).await
        }
        Command::Convert { from, to, amount } => convert_once(&service, from, to, amount).await,
    };

    // Ensure traces are flushed before exit
    if let Some(provider) = otel_provider {
        let _ = provider.shutdown();
    }
    result
}
