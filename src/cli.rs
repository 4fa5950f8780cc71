//! CLI arguments and subcommands for herakles-top.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use herakles_top::{Column, SortOrder};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format of the `snapshot` subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SnapshotFormat {
    Text,
    Json,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-top",
    about = "Live per-process CPU, memory and disk monitor",
    long_about = "Live per-process CPU, memory and disk monitor.\n\n\
                  Samples /proc on a fixed interval, derives per-process rates and a \
                  system summary, and serves a sortable process table over HTTP or \
                  renders it in the terminal.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    propagate_version = true,
    after_help = "Project: https://github.com/cansp-dev/herakles-top — More info: https://www.herakles.now — Support: exporter@herakles.now"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides the config file, default: info)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Print only the loaded user config file + full path and exit
    #[arg(long)]
    pub show_user_config: bool,

    /// Output format for --show-config*
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Refresh interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Initial sort column (name, pid, cpu, memory, disk, network)
    #[arg(long)]
    pub sort: Option<Column>,

    /// Initial sort order (asc, desc)
    #[arg(long)]
    pub order: Option<SortOrder>,

    /// Path to JSON test data file (replays scripted frames instead of /proc)
    #[arg(short = 't', long)]
    pub test_data_file: Option<PathBuf>,

    /// Run the sampler without the HTTP API
    #[arg(long)]
    pub no_http: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the system summary and process table after every refresh
    Top {
        /// Stop after N refreshes (default: run until interrupted)
        #[arg(short = 'n', long)]
        iterations: Option<usize>,

        /// Number of process rows to show (default: top_n from config)
        #[arg(short = 'l', long)]
        limit: Option<usize>,
    },

    /// Take two samples and print the table once
    Snapshot {
        /// Number of process rows to show (default: top_n from config)
        #[arg(short = 'l', long)]
        limit: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: SnapshotFormat,
    },

    /// Request termination (SIGTERM) of a process
    Kill {
        /// Process ID
        pid: u32,
    },

    /// Validate configuration and system requirements
    Check {
        /// Also check optional sources (disk counters, thermal sensors)
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Generate a synthetic test data JSON file for --test-data-file
    GenerateTestdata {
        /// Output file path
        #[arg(short = 'o', long, default_value = "testdata.json")]
        output: PathBuf,

        /// Number of processes per frame
        #[arg(long, default_value_t = 20)]
        processes: usize,

        /// Number of frames
        #[arg(long, default_value_t = 10)]
        frames: usize,
    },
}
