use anyhow::Result;
use configuration::Logging;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Console output goes
/// to stderr so converted data written to stdout stays clean. When a log
/// directory is configured a daily rolling file is added; keep the returned
/// guard alive until exit so buffered lines are flushed.
pub fn init_tracing(logging: &Logging) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.level))?;

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;
    Ok(guard)
}
