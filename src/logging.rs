//! Tracing initialisation for the host process.
//!
//! Stdout is reserved for the wire protocol, so diagnostics always go to
//! stderr, optionally mirrored into a daily-rotated file under the
//! platform data directory for long-lived host sessions.

use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Keeps the background log writer alive; dropping it flushes and stops
/// file logging. Hold it for the lifetime of the process.
pub struct LogGuard {
    _worker: Option<tracing_appender::non_blocking::WorkerGuard>,
}

/// Initialise tracing with an env-filter (default `info`), writing to
/// stderr and, when `file_logs` is set, to a rolling file as well.
pub fn init(file_logs: bool) -> LogGuard {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter).with(stderr_layer);

    let file_target = if file_logs { default_log_dir() } else { None };
    match file_target {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "kubedeck-host.log");
            let (writer, worker) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false),
                )
                .init();
            LogGuard {
                _worker: Some(worker),
            }
        }
        None => {
            registry.init();
            if file_logs {
                tracing::warn!("cannot determine log directory; file logging disabled");
            }
            LogGuard { _worker: None }
        }
    }
}

/// Log directory under the platform data dir
/// (`{data_local_dir}/kubedeck/logs`).
#[must_use]
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("kubedeck").join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_is_under_kubedeck() {
        let dir = default_log_dir().expect("data dir available");
        let dir_str = dir.to_string_lossy().to_string();
        assert!(dir_str.contains("kubedeck"));
        assert!(dir_str.ends_with("logs"));
    }
}
