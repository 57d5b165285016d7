//! Command-line interface parsing for the traffic dashboard
//!
//! This module handles parsing of CLI arguments using clap, with environment
//! variable fallbacks for the backend address and log file, and validates
//! them into a `StartupConfig`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::data::DEFAULT_BASE_URL;
use crate::refresh::RefreshConfig;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The backend URL is not an absolute http(s) URL
    #[error("Invalid base URL: '{0}'. Expected something like http://127.0.0.1:5000")]
    InvalidBaseUrl(String),

    /// A polling interval of zero was requested
    #[error("Invalid interval for --{0}: must be at least 1 second")]
    InvalidInterval(&'static str),
}

/// Page shown at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Page {
    /// Live dashboard with KPIs, tables, map, history chart and weekly report
    #[default]
    Dashboard,
    /// Event log and event submission form
    Events,
}

/// Traffic Dashboard - live road conditions, events and alerts in the terminal
#[derive(Parser, Debug)]
#[command(name = "trafficdash")]
#[command(about = "Terminal dashboard for road traffic monitoring")]
#[command(version)]
pub struct Cli {
    /// Base URL of the traffic monitoring backend
    #[arg(long, env = "TRAFFICDASH_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Page to open at startup
    #[arg(long, value_enum, default_value_t = Page::Dashboard)]
    pub page: Page,

    /// Seconds between live data refreshes on the dashboard
    #[arg(long, value_name = "SECONDS", default_value_t = 30)]
    pub refresh_secs: u64,

    /// Seconds between weekly report refreshes on the dashboard
    #[arg(long, value_name = "SECONDS", default_value_t = 300)]
    pub report_secs: u64,

    /// Disable automatic polling; data is only loaded at startup and on demand
    #[arg(long)]
    pub no_refresh: bool,

    /// Directory the weekly report export is written to (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// File to write logs to (defaults to the platform data directory)
    #[arg(long, env = "TRAFFICDASH_LOG", value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Backend base URL, without a trailing slash
    pub base_url: String,
    /// Page to open first
    pub start_page: Page,
    /// Polling intervals for the dashboard
    pub refresh: RefreshConfig,
    /// Where `weekly_report.json` is saved
    pub export_dir: PathBuf,
    /// Explicit log file, if one was given
    pub log_file: Option<PathBuf>,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            start_page: Page::Dashboard,
            refresh: RefreshConfig::default(),
            export_dir: PathBuf::from("."),
            log_file: None,
        }
    }
}

/// Checks that `raw` is an absolute http or https URL
///
/// # Returns
/// * `Ok(String)` with any trailing slash removed
/// * `Err(CliError::InvalidBaseUrl)` otherwise
pub fn parse_base_url(raw: &str) -> Result<String, CliError> {
    let url = reqwest::Url::parse(raw).map_err(|_| CliError::InvalidBaseUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(CliError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if the URL or an interval is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let base_url = parse_base_url(&cli.base_url)?;

        if cli.refresh_secs == 0 {
            return Err(CliError::InvalidInterval("refresh-secs"));
        }
        if cli.report_secs == 0 {
            return Err(CliError::InvalidInterval("report-secs"));
        }

        Ok(StartupConfig {
            base_url,
            start_page: cli.page,
            refresh: RefreshConfig {
                live_interval: Duration::from_secs(cli.refresh_secs),
                report_interval: Duration::from_secs(cli.report_secs),
                enabled: !cli.no_refresh,
            },
            export_dir: cli.export_dir.clone().unwrap_or_else(|| PathBuf::from(".")),
            log_file: cli.log_file.clone(),
        })
    }
}
