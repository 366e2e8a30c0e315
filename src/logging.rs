// ABOUTME: Logging configuration and tracing subscriber setup for the coach service and CLI
// ABOUTME: Chooses level, output format, detail, and output stream, then logs a startup record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

//! Structured logging setup
//!
//! The service logs to stdout. The CLI logs to stderr, because stdout carries
//! the JSON it prints.

use std::env;
use std::io;

use anyhow::Result;
use serde_json::json;
use tracing::{info, Level, Subscriber};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Service name used when `SERVICE_NAME` is unset
pub const SERVICE_NAME: &str = "crux-coach";

/// Level the CLI uses without `--verbose` or `RUST_LOG`
const CLI_LEVEL: &str = "warn";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive, a bare level or `target=level` pairs
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Stream receiving the records
    pub target: LogTarget,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include thread ids and names
    pub include_thread: bool,
    /// Include span open and close events
    pub include_spans: bool,
    /// Service name for the startup record
    pub service_name: String,
    /// Service version for the startup record
    pub service_version: String,
    /// Deployment environment; `production` turns on every detail
    pub environment: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` lines for log shipping
    Json,
    /// Full human-readable lines
    Pretty,
    /// Short lines without targets
    Compact,
}

impl LogFormat {
    fn from_env_value(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("json") => Self::Json,
            Some("compact") => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Stream the subscriber writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard output
    Stdout,
    /// Standard error
    Stderr,
}

impl LogTarget {
    fn make_writer(self) -> BoxMakeWriter {
        match self {
            Self::Stdout => BoxMakeWriter::new(io::stdout),
            Self::Stderr => BoxMakeWriter::new(io::stderr),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO.as_str().to_lowercase(),
            format: LogFormat::Pretty,
            target: LogTarget::Stdout,
            include_location: false,
            include_thread: false,
            include_spans: false,
            service_name: SERVICE_NAME.to_owned(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: "development".to_owned(),
        }
    }
}

impl LoggingConfig {
    /// Configuration from `RUST_LOG`, `LOG_FORMAT`, `ENVIRONMENT`,
    /// `LOG_INCLUDE_LOCATION`, `LOG_INCLUDE_THREAD`, `LOG_INCLUDE_SPANS`,
    /// `SERVICE_NAME`, and `SERVICE_VERSION`
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let detailed = |flag: &str| environment == "production" || env::var(flag).is_ok();

        Self {
            level: env::var("RUST_LOG").unwrap_or(defaults.level),
            format: LogFormat::from_env_value(env::var("LOG_FORMAT").ok().as_deref()),
            target: defaults.target,
            include_location: detailed("LOG_INCLUDE_LOCATION"),
            include_thread: detailed("LOG_INCLUDE_THREAD"),
            include_spans: detailed("LOG_INCLUDE_SPANS"),
            service_name: env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
            service_version: env::var("SERVICE_VERSION").unwrap_or(defaults.service_version),
            environment,
        }
    }

    /// Configuration for `crux-cli`: stderr, `warn` unless `RUST_LOG` says
    /// otherwise, and `debug` with `--verbose`
    #[must_use]
    pub fn for_cli(verbose: bool) -> Self {
        let mut config = Self::from_env();
        config.target = LogTarget::Stderr;
        if verbose {
            config.level = Level::DEBUG.as_str().to_lowercase();
        } else if env::var("RUST_LOG").is_err() {
            CLI_LEVEL.clone_into(&mut config.level);
        }
        config
    }

    /// Filter from `level`; an unparseable directive falls back to `info`
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"))
    }

    fn span_events(&self) -> FmtSpan {
        if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        let layer = fmt::layer()
            .with_writer(self.target.make_writer())
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_thread_ids(self.include_thread)
            .with_thread_names(self.include_thread)
            .with_span_events(self.span_events());
        match self.format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Pretty => layer.boxed(),
            LogFormat::Compact => layer.compact().with_target(false).boxed(),
        }
    }

    /// Install the global tracing subscriber and log the startup record
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(self.fmt_layer())
            .try_init()?;
        self.log_startup_info();
        Ok(())
    }

    fn log_startup_info(&self) {
        let summary = json!({
            "service": {
                "name": self.service_name,
                "version": self.service_version,
                "environment": self.environment,
            },
            "logging": {
                "level": self.level,
                "format": format!("{:?}", self.format),
                "target": format!("{:?}", self.target),
                "location": self.include_location,
                "thread": self.include_thread,
                "spans": self.include_spans,
            }
        });
        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            config = %summary,
            "logging initialized"
        );
    }
}

/// Initialize logging with default configuration
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_default() -> Result<()> {
    LoggingConfig::default().init()
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_format_parsing_defaults_to_pretty() {
        assert_eq!(LogFormat::from_env_value(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value(Some(" compact ")), LogFormat::Compact);
        assert_eq!(LogFormat::from_env_value(Some("xml")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_env_value(None), LogFormat::Pretty);
    }

    #[test]
    fn test_default_config_logs_info_to_stdout() {
        let config = LoggingConfig::default();
        assert_eq!(config.service_name, SERVICE_NAME);
        assert_eq!(config.level, "info");
        assert_eq!(config.target, LogTarget::Stdout);
        assert_eq!(config.span_events(), FmtSpan::NONE);
    }

    #[test]
    #[serial]
    fn test_cli_config_writes_to_stderr_at_warn_or_debug() {
        env::remove_var("RUST_LOG");
        env::set_var("LOG_FORMAT", "compact");

        let quiet = LoggingConfig::for_cli(false);
        assert_eq!(quiet.target, LogTarget::Stderr);
        assert_eq!(quiet.level, "warn");
        assert_eq!(quiet.format, LogFormat::Compact);
        assert_eq!(LoggingConfig::for_cli(true).level, "debug");

        env::set_var("RUST_LOG", "crux_intelligence=trace");
        assert_eq!(LoggingConfig::for_cli(false).level, "crux_intelligence=trace");
        assert_eq!(LoggingConfig::for_cli(true).level, "debug");

        env::remove_var("RUST_LOG");
        env::remove_var("LOG_FORMAT");
    }

    #[test]
    #[serial]
    fn test_production_turns_on_every_detail() {
        env::set_var("ENVIRONMENT", "production");
        let config = LoggingConfig::from_env();
        env::remove_var("ENVIRONMENT");

        assert!(config.include_location && config.include_thread && config.include_spans);
        assert_eq!(config.span_events(), FmtSpan::NEW | FmtSpan::CLOSE);
    }
}
