//! Tracing subscriber setup

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use factory_line_core::Error;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug` with
/// `verbose`. With a log file every unit writes through one non-blocking
/// worker, so records never interleave. The returned guard flushes that
/// worker on drop and must live until the process exits.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>, Error> {
    let default_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(default_level.into()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let (directory, file_name) = log_target(path)?;
            std::fs::create_dir_all(&directory).map_err(|e| {
                Error::resource(format!(
                    "cannot create log directory {}: {e}",
                    directory.display()
                ))
            })?;

            let file_appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            builder.with_writer(non_blocking).with_ansi(false).init();
            Ok(Some(guard))
        }
        None => {
            builder.init();
            Ok(None)
        }
    }
}

/// Split a log file path into its directory and file name
fn log_target(path: &Path) -> Result<(PathBuf, OsString), Error> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::resource(format!("log file {} has no file name", path.display())))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, file_name.to_os_string()))
}
