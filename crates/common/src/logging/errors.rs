use opentelemetry::trace::TraceError;
use thiserror::Error;
use tracing_subscriber::{filter::ParseError, util::TryInitError};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log directive: {0}")]
    Directive(#[from] ParseError),

    #[error("failed to initialize opentelemetry pipeline: {0}")]
    Otlp(#[from] TraceError),

    #[error("global subscriber already set: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}
