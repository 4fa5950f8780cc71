//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("herakles-top.yaml"),
    };

    let mut content = render_config(&config, format)?;
    if commented && format == ConfigFormat::Yaml {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Top Configuration
# ==========================
#
# Server Configuration
# --------------------
# bind: "127.0.0.1"            # Bind IP (0.0.0.0 = all interfaces)
# port: 9216                   # HTTP port
# enable_http: true            # Serve the HTTP API
#
# Sampling
# --------
# refresh_interval_ms: 1000    # Refresh period (minimum 100)
# warmup_delay_ms: 100         # Extra refresh after startup so rates appear quickly
# proc_root: "/proc"           # Process filesystem root
# sys_root: "/sys"             # Sysfs root (thermal sensors)
# ticks_per_second: null       # Override clock ticks per second (null = sysconf)
# cpu_count: null              # Override logical CPU count (null = /proc/stat)
# enable_thermal: true         # Read thermal zones and hwmon sensors
#
# Presentation
# ------------
# sort_column: null            # name, pid, cpu, memory, disk, network
# sort_order: null             # ascending, descending (requires sort_column)
# top_n: 25                    # Rows shown by text renderers
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# Testing
# -------
# test_data_file: null         # Replay a JSON scenario instead of reading /proc
"#;

    format!("{comments}\n{yaml}")
}
