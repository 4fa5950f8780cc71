//! herakles-top - version 0.1.0
//!
//! Live per-process and system resource monitor with tracing logging.
//! This is the main entry point that starts the refresh loop and the HTTP API
//! and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod render;
mod startup_checks;
mod state;
mod ticker;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, level_filters::LevelFilter, warn};

use cli::{Args, Commands, LogLevel};
use commands::{
    command_check, command_config, command_generate_testdata, command_kill, command_snapshot,
    command_top,
};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR, DEFAULT_PORT,
};
use handlers::{
    health_handler, kill_handler, processes_handler, processes_text_handler, root_handler,
    sort_handler, system_handler,
};
use state::{build_monitor, AppState};

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr so they never interleave with rendered tables on stdout.
fn setup_logging(config: &Config, args: &Args) {
    let level = args
        .log_level
        .or_else(|| config.log_level())
        .unwrap_or(LogLevel::Info);
    let log_level = match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {:?}", level);
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.show_user_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        if args.show_config {
            return show_config(&config, args.config_format, false);
        }

        if args.show_user_config {
            return show_config(&config, args.config_format, true);
        }
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        // Config generation and test data generation don't need a valid config
        match command {
            Commands::Config {
                output,
                format,
                commented,
            } => return command_config(output.clone(), *format, *commented),
            Commands::GenerateTestdata {
                output,
                processes,
                frames,
            } => return command_generate_testdata(output, *processes, *frames),
            // check reports an invalid config instead of exiting on it
            Commands::Check { all } => {
                let config = resolve_config(&args)?;
                setup_logging(&config, &args);
                return command_check(*all, &config);
            }
            _ => {
                // Other commands need config validation
            }
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config, &args);

        match command {
            Commands::Top { iterations, limit } => command_top(config, *iterations, *limit).await?,
            Commands::Snapshot { limit, format } => {
                command_snapshot(config, *limit, *format).await?
            }
            Commands::Kill { pid } => command_kill(&config, *pid)?,
            Commands::Config { .. } => unreachable!("Config handled above"),
            Commands::GenerateTestdata { .. } => unreachable!("GenerateTestdata handled above"),
            Commands::Check { .. } => unreachable!("Check handled above"),
        }
        return Ok(());
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;

    setup_logging(&config, &args);

    info!("Starting herakles-top");

    if let Err(e) = startup_checks::validate_requirements(&config, true) {
        error!("❌ Startup requirements not met: {}", e);
        std::process::exit(1);
    }

    let monitor = build_monitor(&config)?;
    let (state, events) = AppState::new(monitor, config);

    tokio::spawn(ticker::run(state.clone(), events));

    if !state.config.http_enabled() {
        warn!("HTTP API disabled, sampling until interrupted");
        shutdown_signal().await;
        info!("herakles-top stopped gracefully");
        return Ok(());
    }

    let bind_ip_str = state
        .config
        .bind
        .clone()
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let port = state.config.port.unwrap_or(DEFAULT_PORT);

    // Configure HTTP server routes
    let addr = SocketAddr::new(bind_ip_str.parse::<IpAddr>()?, port);

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/system", get(system_handler))
        .route("/processes", get(processes_handler))
        .route("/processes.txt", get(processes_text_handler))
        .route("/sort", post(sort_handler))
        .route("/processes/{pid}/kill", post(kill_handler))
        .with_state(state.clone());

    let listener = TcpListener::bind(addr).await?;
    info!("herakles-top listening on http://{}", addr);

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting...");
        }
    }

    info!("herakles-top stopped gracefully");
    Ok(())
}
