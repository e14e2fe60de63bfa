use std::io;

use chrono::Local;
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

use super::paths::AppPaths;

/// Initialize tracing with a file logger writing to a timestamp-named file
/// under the user data directory. Falls back to stderr when no data
/// directory is available. The filter comes from RUST_LOG.
pub fn init_tracing() -> io::Result<()> {
    let filter = EnvFilter::from_default_env();

    let Some(log_dir) = AppPaths::log_dir() else {
        let subscriber = tracing_subscriber::registry()
            .with(
                fmt::Layer::default()
                    .with_writer(io::stderr)
                    .with_target(true),
            )
            .with(filter);
        set_global_default(subscriber)?;
        tracing::debug!(
            target: "helm::utils::tracing",
            "Tracing initialized with stderr output"
        );
        return Ok(());
    };

    std::fs::create_dir_all(&log_dir)?;
    let file_name = format!("{}.log", Local::now().format("%Y%m%d_%H%M%S"));
    let file_appender = rolling::never(&log_dir, &file_name);

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::Layer::new()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter);
    set_global_default(subscriber)?;

    tracing::debug!(
        target: "helm::utils::tracing",
        path = %log_dir.join(&file_name).display(),
        "Tracing initialized with file output"
    );
    Ok(())
}

fn set_global_default<S>(subscriber: S) -> io::Result<()>
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| io::Error::other(format!("Failed to set global subscriber: {e}")))
}
