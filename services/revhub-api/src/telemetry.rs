//! Logging and OpenTelemetry setup
//!
//! - `tracing-subscriber` fmt layer, text or JSON
//! - `EnvFilter` from `RUST_LOG`, falling back to `telemetry.log_level`
//! - OTLP span export when `telemetry.otlp_endpoint` is set

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};
use opentelemetry_sdk::Resource;
use revhub_core::config::TelemetryConfig;
use std::time::Duration;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub type TelemetryError = Box<dyn std::error::Error + Send + Sync>;

/// Initialize logging, plus span export when an OTLP endpoint is configured.
///
/// # Returns
///
/// A guard that should be kept alive for the duration of the application.
/// Dropping the guard flushes pending spans and shuts the tracer down.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let tracer = if config.export_enabled() {
        Some(init_tracer(config)?)
    } else {
        None
    };
    let exporting = tracer.is_some();
    let otel_layer = tracer.map(|tracer| tracing_opentelemetry::layer().with_tracer(tracer));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer(&config.log_format))
        .with(otel_layer)
        .try_init()?;

    if exporting {
        tracing::info!(
            service = %config.service_name,
            endpoint = ?config.otlp_endpoint,
            "OpenTelemetry initialized"
        );
    } else {
        tracing::info!("Logging initialized (OpenTelemetry disabled)");
    }

    Ok(TelemetryGuard { exporting })
}

fn init_tracer(config: &TelemetryConfig) -> Result<opentelemetry_sdk::trace::Tracer, TelemetryError> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let endpoint = config.otlp_endpoint.clone().unwrap_or_default();
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .with_timeout(Duration::from_secs(config.export_timeout_secs));

    // Installs the global tracer provider as a side effect.
    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            opentelemetry_sdk::trace::config()
                .with_sampler(Sampler::TraceIdRatioBased(config.sampling_ratio))
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", config.service_name.clone()),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ])),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    Ok(tracer)
}

fn fmt_layer<S>(format: &str) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        "json" => layer.json().boxed(),
        _ => layer.boxed(),
    }
}

/// Guard to ensure telemetry is properly shutdown
pub struct TelemetryGuard {
    exporting: bool,
}

impl TelemetryGuard {
    pub fn is_exporting(&self) -> bool {
        self.exporting
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.exporting {
            tracing::info!("Shutting down OpenTelemetry...");
            global::shutdown_tracer_provider();
        }
    }
}
