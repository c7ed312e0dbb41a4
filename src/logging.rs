use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::LoggingError;

pub const LOG_ENV: &str = "GRIDCAL_LOG";
pub const LOG_FILE: &str = "gridcal.log";

#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    /// Appends to a file; used while the dashboard owns the terminal.
    File(PathBuf),
}

/// Installs the global subscriber. `GRIDCAL_LOG` overrides `default_level`.
pub fn init_logging(default_level: &str, target: LogTarget) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .map_err(|_| LoggingError::Filter(default_level.to_string()))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match target {
        LogTarget::Stderr => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| LoggingError::Init(err.to_string())),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|err| LoggingError::Init(err.to_string()))
        }
    }
}
