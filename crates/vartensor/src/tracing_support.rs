//! Structured logging setup for applications using vartensor
//!
//! The library crates emit `tracing` events while arrays are built, decoded
//! and rejected, and while metadata JSON is encoded and parsed. Nothing is
//! printed until a subscriber is installed; [`init_tracing`] installs one.
//!
//! # Example
//!
//! ```no_run
//! use vartensor::tracing_support::{init_tracing, TracingConfig, TracingFormat};
//!
//! init_tracing(TracingConfig {
//!     format: TracingFormat::Compact,
//!     filter: "vartensor_arrow=debug,warn".to_string(),
//!     ..TracingConfig::default()
//! })?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directive (e.g., `RUST_LOG=vartensor_arrow=debug`)
//! - `VARTENSOR_LOG_FORMAT`: output format (`pretty`, `json` or `compact`,
//!   default: `pretty`)

use anyhow::Result;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "VARTENSOR_LOG_FORMAT";

const DEFAULT_FILTER: &str = "vartensor_core=info,vartensor_arrow=info,warn";

/// Tracing output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Pretty-printed human-readable format
    Pretty,
    /// JSON format for structured logging
    Json,
    /// Compact format (single line per event)
    Compact,
}

impl TracingFormat {
    /// Parse from string; unknown values fall back to `Pretty`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => TracingFormat::Json,
            "compact" => TracingFormat::Compact,
            _ => TracingFormat::Pretty,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub format: TracingFormat,
    /// Filter directive (e.g., "vartensor_arrow=debug,info")
    pub filter: String,
    /// Enable ANSI colors (ignored by the JSON format)
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    pub with_thread_names: bool,
    pub with_file: bool,
    pub with_line_number: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let format = std::env::var(LOG_FORMAT_ENV)
            .map(|s| TracingFormat::parse(&s))
            .unwrap_or(TracingFormat::Pretty);
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());

        Self {
            format,
            filter,
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_thread_names: false,
            with_file: false,
            with_line_number: false,
        }
    }
}

/// Install a global subscriber built from `config`.
///
/// # Errors
///
/// Fails if the filter directive does not parse or a global subscriber is
/// already installed.
#[cfg(feature = "tracing")]
pub fn init_tracing(config: TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)?;

    match config.format {
        TracingFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_thread_names(config.with_thread_names)
                .with_file(config.with_file)
                .with_line_number(config.with_line_number)
                .with_filter(filter);

            tracing_subscriber::registry().with(fmt_layer).try_init()?;
        }
        TracingFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_thread_names(config.with_thread_names)
                .with_file(config.with_file)
                .with_line_number(config.with_line_number)
                .with_filter(filter);

            tracing_subscriber::registry().with(fmt_layer).try_init()?;
        }
        TracingFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_ansi(config.with_ansi)
                .with_target(config.with_target)
                .with_thread_ids(config.with_thread_ids)
                .with_thread_names(config.with_thread_names)
                .with_file(config.with_file)
                .with_line_number(config.with_line_number)
                .with_filter(filter);

            tracing_subscriber::registry().with(fmt_layer).try_init()?;
        }
    }

    tracing::debug!(format = ?config.format, filter = %config.filter, "tracing initialized");
    Ok(())
}

/// No-op when the `tracing` feature is disabled
#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_config: TracingConfig) -> Result<()> {
    Ok(())
}

/// Initialize with [`TracingConfig::default`], i.e. from the environment
pub fn init_tracing_from_env() -> Result<()> {
    init_tracing(TracingConfig::default())
}
