//! Logging initialization and shutdown management.

use std::{io, sync::OnceLock};

use opentelemetry::{
    global::{self, set_text_map_propagator},
    trace::TracerProvider,
};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    runtime::Tokio,
    trace::{Config, TracerProvider as SdkTracerProvider},
};
use tracing::*;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
    fmt::{format::FmtSpan, layer, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use super::{errors::LoggingError, types::LoggerConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Tracer provider kept so [`finalize`] can flush it.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

fn fmt_layer<W>(writer: W, json: bool, ansi: bool, spans: FmtSpan, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let base = layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_span_events(spans);
    if json {
        base.json().with_filter(filter).boxed()
    } else {
        base.compact().with_filter(filter).boxed()
    }
}

fn otlp_tracer_provider(config: &LoggerConfig, url: &str) -> Result<SdkTracerProvider, LoggingError> {
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(url)
        .with_timeout(config.otlp_timeout);

    let provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(Config::default().with_resource(config.build_resource()))
        .install_batch(Tokio)?;
    Ok(provider)
}

/// Initializes the logging subsystem with the provided config.
///
/// Must be called from within a tokio runtime if an OTLP endpoint is set.
pub fn init(config: LoggerConfig) -> Result<(), LoggingError> {
    set_text_map_propagator(TraceContextPropagator::new());

    // INFO by default, overridable via RUST_LOG. sled is chatty at debug.
    let filt = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy()
        .add_directive("sled=warn".parse()?);

    let mut layers = vec![fmt_layer(
        io::stdout,
        config.json_format,
        true,
        config.fmt_span.clone(),
        filt.clone(),
    )];

    if let Some(file_config) = &config.file_logging_config {
        let appender = RollingFileAppender::new(
            file_config.rotation.clone(),
            &file_config.directory,
            &file_config.file_name_prefix,
        );
        layers.push(fmt_layer(
            appender,
            file_config.json_format,
            false,
            FmtSpan::NONE,
            filt.clone(),
        ));
    }

    if let Some(url) = &config.otel_url {
        let provider = otlp_tracer_provider(&config, url)?;
        let tracer = provider.tracer("rabbits-tracer");
        if TRACER_PROVIDER.set(provider).is_err() {
            error!("tracer provider already set");
        }
        layers.push(
            tracing_opentelemetry::layer()
                .with_tracer(tracer)
                .with_filter(filt)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    info!(
        service_name = %config.service_name,
        service_version = ?config.service_version,
        "logging initialized"
    );
    Ok(())
}

/// Shuts down the logging subsystem, flushing pending spans.
pub fn finalize() {
    info!("shutting down logging");

    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            error!(?e, "failed to shut down tracer provider");
        }
    }

    global::shutdown_tracer_provider();
}
