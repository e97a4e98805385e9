/*!
 * Logging Module
 * Centralized logging configuration and utilities
 */
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::Environment;

/// Directory holding the rolling log files.
pub const LOG_DIR: &str = "logs";

/// Background writer guards. Dropping them flushes and stops the log
/// writers, so they must live as long as the process.
#[must_use = "dropping the guards stops the log writers"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Default directive set when `RUST_LOG` is not given.
pub fn default_filter(log_level: &str) -> String {
    format!(
        "sochlabs_backend={},tower_http=debug,axum=debug",
        log_level
    )
}

/// Initialize the logging system
pub fn init(environment: Environment, log_level: &str) -> LogGuards {
    let is_production = environment.is_production();

    // Create log directory if it doesn't exist
    std::fs::create_dir_all(LOG_DIR).ok();

    // File appender for all logs
    let file_appender = rolling::daily(LOG_DIR, "app.log");
    let (file_writer, file_guard) = non_blocking(file_appender);

    // File appender for errors only
    let error_appender = rolling::daily(LOG_DIR, "error.log");
    let (error_writer, error_guard) = non_blocking(error_appender);

    // Console writer
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    // Build the subscriber
    let subscriber = tracing_subscriber::registry().with(env_filter);

    let installed = if is_production {
        // JSON format for production
        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .try_init()
    } else {
        // Pretty format for development
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let error_layer = fmt::layer()
            .with_writer(error_writer)
            .with_target(true)
            .with_ansi(false)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty()
            .with_thread_ids(false)
            .with_thread_names(false);

        subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .try_init()
    };

    match installed {
        Ok(()) => tracing::info!("Logging initialized for {} environment", environment.as_str()),
        Err(e) => eprintln!("Logging already initialized: {}", e),
    }

    LogGuards {
        _guards: vec![file_guard, error_guard, console_guard],
    }
}
