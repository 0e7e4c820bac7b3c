use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes logging with a human-readable console layer on stderr and a
/// JSON layer written to a daily rolling file under `log_dir`.
///
/// The returned guard flushes the file writer when dropped, so keep it alive
/// for the lifetime of the process.
pub fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tracker_harvester=info,warn"));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    // An unwritable log dir only loses the file layer
    let (file_layer, guard) = match fs::create_dir_all(log_dir) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "harvester.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().json().with_writer(non_blocking_writer);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_logging_creates_dir_and_keeps_guard() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");

        let guard = init_logging(&log_dir);
        tracing::info!("logging initialized");

        assert!(guard.is_some());
        assert!(log_dir.is_dir());
    }
}
