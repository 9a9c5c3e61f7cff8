//! Configuration types for the logging subsystem.

use std::{path::PathBuf, time::Duration};

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::format::FmtSpan;

/// Configuration for file-based logging with rotation
#[derive(Debug, Clone)]
pub struct FileLoggingConfig {
    /// Directory where log files will be written
    pub directory: PathBuf,
    /// Base filename prefix (e.g., "rabbits" -> "rabbits.2024-01-01")
    pub file_name_prefix: String,
    pub rotation: Rotation,
    pub json_format: bool,
}

impl FileLoggingConfig {
    pub fn new(directory: PathBuf, file_name_prefix: String) -> Self {
        Self {
            directory,
            file_name_prefix,
            rotation: Rotation::DAILY,
            json_format: false,
        }
    }
}

/// Main logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub service_name: String,
    pub service_version: Option<String>,
    /// OTLP endpoint URL. Spans are only exported when set.
    pub otel_url: Option<String>,
    /// Timeout for OTLP export requests
    pub otlp_timeout: Duration,
    /// Use JSON format on stdout instead of compact format
    pub json_format: bool,
    /// Span events written to stdout. Files never get span events.
    pub fmt_span: FmtSpan,
    pub file_logging_config: Option<FileLoggingConfig>,
}

impl LoggerConfig {
    pub fn new(service_name: String) -> Self {
        Self {
            service_name,
            service_version: None,
            otel_url: None,
            otlp_timeout: Duration::from_secs(10),
            json_format: false,
            fmt_span: FmtSpan::NONE,
            file_logging_config: None,
        }
    }

    pub fn with_service_version(mut self, version: String) -> Self {
        self.service_version = Some(version);
        self
    }

    pub fn with_otlp_url(mut self, url: String) -> Self {
        self.otel_url = Some(url);
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    pub fn with_file_logging(mut self, config: FileLoggingConfig) -> Self {
        self.file_logging_config = Some(config);
        self
    }

    /// Build OpenTelemetry Resource from config
    pub fn build_resource(&self) -> Resource {
        let mut attributes = vec![KeyValue::new("service.name", self.service_name.clone())];
        if let Some(version) = &self.service_version {
            attributes.push(KeyValue::new("service.version", version.clone()));
        }
        Resource::new(attributes)
    }
}
