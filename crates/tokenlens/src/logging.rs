//! Tracing setup
//!
//! Logs go to stderr so command output on stdout stays machine-readable. When a
//! log directory is configured, or the command is `serve`, a daily-rotated file
//! is written as well. `RUST_LOG` wins over the configured level.

use std::path::PathBuf;
use tokenlens_config::TelemetryConfig;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

const LOG_FILE_PREFIX: &str = "tokenlens.log";

/// Keeps the non-blocking writers flushing; hold it until `main` returns
pub struct LoggingGuards {
    _stderr: WorkerGuard,
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber
///
/// # Errors
/// Returns an IO error if the log directory cannot be created
pub fn init(telemetry: &TelemetryConfig, always_log_to_file: bool) -> std::io::Result<LoggingGuards> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.tracing_level));

    let (stderr_writer, stderr_guard): (NonBlocking, WorkerGuard) =
        tracing_appender::non_blocking(std::io::stderr());

    let log_dir = telemetry
        .log_dir
        .clone()
        .or_else(|| always_log_to_file.then(default_log_dir));

    let Some(log_dir) = log_dir else {
        install(telemetry.json_logs, filter, stderr_writer);
        return Ok(LoggingGuards {
            _stderr: stderr_guard,
            _file: None,
        });
    };

    std::fs::create_dir_all(&log_dir)?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    install(telemetry.json_logs, filter, file_writer.and(stderr_writer));

    Ok(LoggingGuards {
        _stderr: stderr_guard,
        _file: Some(file_guard),
    })
}

fn install<W>(json: bool, filter: EnvFilter, writer: W)
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// OS-specific default log directory
pub fn default_log_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        if let Some(home) = dirs::home_dir() {
            return home.join("Library").join("Logs").join("tokenlens");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let system_log_dir = std::path::Path::new("/var/log/tokenlens");
        if system_log_dir.exists() && is_writable(system_log_dir) {
            return system_log_dir.to_path_buf();
        }
    }

    dirs::data_local_dir()
        .map(|dir| dir.join("tokenlens").join("logs"))
        .or_else(|| dirs::home_dir().map(|home| home.join(".tokenlens").join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn is_writable(path: &std::path::Path) -> bool {
    tempfile::tempfile_in(path).is_ok()
}
