//! Configuration management for herakles-top.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use clap::ValueEnum;
use herakles_top::{Column, SortKey, SortOrder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9216;
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_WARMUP_DELAY_MS: u64 = 100;
pub const DEFAULT_TOP_N: usize = 25;
pub const MIN_REFRESH_INTERVAL_MS: u64 = 100;

/// Enhanced configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,
    #[serde(alias = "enable-http")]
    pub enable_http: Option<bool>,

    // Sampling
    #[serde(alias = "refresh-interval-ms")]
    pub refresh_interval_ms: Option<u64>,
    #[serde(alias = "warmup-delay-ms")]
    pub warmup_delay_ms: Option<u64>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "sys-root")]
    pub sys_root: Option<PathBuf>,
    /// Overrides sysconf(_SC_CLK_TCK)
    #[serde(alias = "ticks-per-second")]
    pub ticks_per_second: Option<f64>,
    /// Overrides the logical CPU count used to normalize process CPU %
    #[serde(alias = "cpu-count")]
    pub cpu_count: Option<usize>,
    #[serde(alias = "enable-thermal")]
    pub enable_thermal: Option<bool>,

    // Presentation
    #[serde(alias = "sort-column")]
    pub sort_column: Option<Column>,
    #[serde(alias = "sort-order")]
    pub sort_order: Option<SortOrder>,
    /// Rows shown by the text renderers
    #[serde(alias = "top-n")]
    pub top_n: Option<usize>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    /// Path to JSON test data file (replays scripted frames instead of /proc)
    #[serde(alias = "test-data-file")]
    pub test_data_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            enable_http: Some(true),
            refresh_interval_ms: Some(DEFAULT_REFRESH_INTERVAL_MS),
            warmup_delay_ms: Some(DEFAULT_WARMUP_DELAY_MS),
            proc_root: Some(PathBuf::from(herakles_top::source::procfs::DEFAULT_PROC_ROOT)),
            sys_root: Some(PathBuf::from(herakles_top::source::procfs::DEFAULT_SYS_ROOT)),
            ticks_per_second: None,
            cpu_count: None,
            enable_thermal: Some(true),
            sort_column: None,
            sort_order: None,
            top_n: Some(DEFAULT_TOP_N),
            log_level: Some("info".into()),
            test_data_file: None,
        }
    }
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(
            self.refresh_interval_ms
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS),
        )
    }

    pub fn warmup_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_delay_ms.unwrap_or(DEFAULT_WARMUP_DELAY_MS))
    }

    pub fn top_n(&self) -> usize {
        self.top_n.unwrap_or(DEFAULT_TOP_N)
    }

    pub fn http_enabled(&self) -> bool {
        self.enable_http.unwrap_or(true)
    }

    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort_column
            .map(|column| SortKey::new(column, self.sort_order.unwrap_or_default()))
    }

    /// Log level from the config file; `None` when unset or unknown.
    pub fn log_level(&self) -> Option<LogLevel> {
        self.log_level
            .as_deref()
            .and_then(|s| LogLevel::from_str(s, true).ok())
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let interval = cfg
        .refresh_interval_ms
        .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS);
    if interval < MIN_REFRESH_INTERVAL_MS {
        return Err(format!(
            "refresh_interval_ms must be at least {} (got {})",
            MIN_REFRESH_INTERVAL_MS, interval
        )
        .into());
    }

    let warmup = cfg.warmup_delay_ms.unwrap_or(DEFAULT_WARMUP_DELAY_MS);
    if warmup >= interval {
        return Err(format!(
            "warmup_delay_ms ({}) must be shorter than refresh_interval_ms ({})",
            warmup, interval
        )
        .into());
    }

    if cfg.http_enabled() && cfg.port == Some(0) {
        return Err("port must not be 0 when the HTTP API is enabled".into());
    }

    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address '{}'", bind).into());
        }
    }

    if let Some(tps) = cfg.ticks_per_second {
        if !(tps > 0.0) {
            return Err(format!("ticks_per_second must be positive (got {})", tps).into());
        }
    }

    if cfg.cpu_count == Some(0) {
        return Err("cpu_count must be positive".into());
    }

    if cfg.top_n == Some(0) {
        return Err("top_n must be positive".into());
    }

    if cfg.sort_order.is_some() && cfg.sort_column.is_none() {
        return Err("sort_order is set but sort_column is not".into());
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::from_str(level, true).is_err() {
            return Err(format!(
                "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
                level
            )
            .into());
        }
    }

    if let Some(path) = &cfg.test_data_file {
        if !path.exists() {
            return Err(format!("Test data file not found: {}", path.display()).into());
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    // Override with CLI args
    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }

    // Only override port if the user supplied it on the CLI.
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }

    if let Some(interval) = args.interval_ms {
        config.refresh_interval_ms = Some(interval);
    }

    if let Some(column) = args.sort {
        config.sort_column = Some(column);
    }
    if let Some(order) = args.order {
        config.sort_order = Some(order);
    }

    if args.no_http {
        config.enable_http = Some(false);
    }

    // Test data file: CLI wins if provided
    if let Some(test_file) = &args.test_data_file {
        config.test_data_file = Some(test_file.clone());
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(format!("Config file not found: {}", p.display()).into());
            }
            p.to_path_buf()
        }
        None => {
            // Try default locations
            let defaults = [
                "/etc/herakles/top.yaml",
                "/etc/herakles/top.yml",
                "/etc/herakles/top.json",
                "./herakles-top.yaml",
                "./herakles-top.yml",
                "./herakles-top.json",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(found) => PathBuf::from(found),
                None => return Ok(Config::default()),
            }
        }
    };

    let content = fs::read_to_string(&path)?;
    parse_config(&content, &path)
}

fn parse_config(content: &str, path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format
pub fn render_config(
    config: &Config,
    format: ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(
    config: &Config,
    format: ConfigFormat,
    user_config: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = render_config(config, format)?;

    if user_config {
        println!("User configuration (effective values):");
    }
    println!("{output}");
    Ok(())
}
