//! Common logging service initialization for binaries.

use std::path::Path;

use tracing::info;

use super::{errors::LoggingError, format_service_name, init, FileLoggingConfig, LoggerConfig};

/// Configuration parameters for logging initialization.
#[derive(Debug)]
pub struct LoggingInitConfig<'a> {
    pub service_base_name: &'a str,
    /// Optional service label to append like prod or dev
    pub service_label: Option<&'a str>,
    pub otlp_url: Option<&'a str>,
    pub log_dir: Option<&'a Path>,
    pub log_file_prefix: Option<&'a str>,
    pub json_format: Option<bool>,
    /// Used when no log file prefix is configured
    pub default_log_prefix: &'a str,
}

impl LoggingInitConfig<'_> {
    pub fn to_logger_config(&self) -> LoggerConfig {
        let service_name = format_service_name(self.service_base_name, self.service_label);
        let mut lconfig = LoggerConfig::new(service_name)
            .with_service_version(env!("CARGO_PKG_VERSION").to_owned());

        if let Some(url) = self.otlp_url {
            lconfig = lconfig.with_otlp_url(url.to_owned());
        }

        if let Some(dir) = self.log_dir {
            let prefix = self.log_file_prefix.unwrap_or(self.default_log_prefix);
            let mut file_config = FileLoggingConfig::new(dir.to_path_buf(), prefix.to_owned());
            file_config.json_format = self.json_format.unwrap_or(false);
            lconfig = lconfig.with_file_logging(file_config);
        }

        if let Some(json_format) = self.json_format {
            lconfig = lconfig.with_json_logging(json_format);
        }

        lconfig
    }
}

/// Initializes logging from the binary's configuration.
pub fn init_logging_from_config(config: LoggingInitConfig<'_>) -> Result<(), LoggingError> {
    let lconfig = config.to_logger_config();
    let file_logging = lconfig.file_logging_config.clone();
    init(lconfig)?;

    if let Some(url) = config.otlp_url {
        info!(%url, "using OpenTelemetry tracing output");
    }
    if let Some(file_config) = file_logging {
        info!(
            log_dir = %file_config.directory.display(),
            log_prefix = %file_config.file_name_prefix,
            "file logging enabled"
        );
    }
    Ok(())
}
