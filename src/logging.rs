//! Logging setup.
//!
//! Diagnostics never go to stdout, which carries the file listing. On Linux
//! they go to systemd-journald when it is reachable, otherwise to a daily
//! rolling file under the local data directory.

use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use tracing_subscriber::{fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the filter directive, e.g. `RVM_LOG=debug`.
pub const LOG_ENV: &str = "RVM_LOG";

/// Where log lines ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogBackend {
    Journald,
    File(PathBuf),
}

impl fmt::Display for LogBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogBackend::Journald => f.write_str("journald"),
            LogBackend::File(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Level used when `RVM_LOG` is unset. `list --debug` also turns on the
/// compiled-query traces.
pub fn default_level(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "warn"
    }
}

fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level(debug)))
}

/// Install the global subscriber and report which backend it writes to.
pub fn init(log_dir: Option<PathBuf>, debug: bool) -> Result<LogBackend> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(journald_layer) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(env_filter(debug))
                .with(journald_layer)
                .try_init()?;
            return Ok(LogBackend::Journald);
        }
    }

    let log_dir = log_dir.unwrap_or_else(default_log_dir);
    std::fs::create_dir_all(&log_dir)?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "rvm.log"));

    // Flushes pending lines when the process exits.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(tracing_fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()?;

    Ok(LogBackend::File(log_dir))
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rvm")
        .join("logs")
}
