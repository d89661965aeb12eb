use color_eyre::{eyre::eyre, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE: &str = "comicdex.log";

/// Install the global subscriber.
///
/// Logs go to `{log_dir}/comicdex.log` so stdout stays clean for command
/// output; `verbose` mirrors them to stderr. The filter comes from
/// COMICDEX_LOG, then RUST_LOG, defaulting to `comicdex=info`.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the program.
pub fn init(log_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
  std::fs::create_dir_all(log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let (writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));

  let filter = EnvFilter::try_from_env("COMICDEX_LOG")
    .or_else(|_| EnvFilter::try_from_default_env())
    .unwrap_or_else(|_| EnvFilter::new("comicdex=info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .with(verbose.then(|| fmt::layer().with_writer(std::io::stderr)))
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
