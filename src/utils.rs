//! Utils
//!
//! Command line configuration and logging setup for the quote binary.

use std::{error::Error, path::PathBuf};

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// What the quote binary prints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One table per order line, then quotation totals.
    Table,

    /// Test calculation lines per order line.
    Diagnostics,

    /// Resolved BOMs and quotation totals as JSON.
    Json,
}

/// Arguments for the quote binary
#[derive(Debug, Parser)]
#[command(about = "Resolve and price a quotation from YAML fixtures")]
pub struct QuoteArgs {
    /// Order fixture to quote
    #[arg(short, long, env = "FENESTRA_ORDER", default_value = "sample")]
    pub order: String,

    /// Directory holding `templates/` and `orders/`
    #[arg(long, env = "FENESTRA_FIXTURES", default_value = "./fixtures")]
    pub fixtures: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Abort on the first formula error, overriding the order's mode
    #[arg(long)]
    pub strict: bool,

    /// Leave prices out even if the order has them
    #[arg(long)]
    pub no_prices: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl QuoteArgs {
    /// Parse arguments, reading a `.env` file first if there is one.
    ///
    /// # Errors
    ///
    /// Returns a [`clap::Error`] if the arguments are invalid.
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

/// Install a global `tracing` subscriber writing to stderr.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(
    log_level: &str,
    log_format: LogFormat,
) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match log_format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}
