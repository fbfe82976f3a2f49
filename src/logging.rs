use std::io;
use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_PREFIX: &str = "coalesce.log";

/// Install the global subscriber.
///
/// Stderr honors `RUST_LOG` and falls back to `info`. When `log_dir` is set a
/// daily rolling file also receives entity-level debug output.
pub fn configure_logging(log_dir: Option<&Path>) {
    // Stderr keeps stdout free for `score` output
    let stderr_log = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let file_log = log_dir.map(|dir| {
        let file_appender = rolling::daily(dir, LOG_FILE_PREFIX);
        fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender)
            .with_filter(EnvFilter::new("entity=debug,info"))
    });

    // Ignore a second install, e.g. from tests
    let _ = tracing_subscriber::Registry::default()
        .with(stderr_log)
        .with(file_log)
        .try_init();
}
