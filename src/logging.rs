use crate::config::Config;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive that overrides the
/// configured log level
pub(crate) const LOG_ENV_VAR: &str = "GRIDSNAKE_LOG";

const DEFAULT_LEVEL: &str = "info";

/// Install a global subscriber that writes log messages to the configured
/// log file.  The terminal is owned by the game, so nothing is logged there.
pub(crate) fn init(config: &Config) -> Result<(), LoggingError> {
    let Some(path) = config.log_file() else {
        return Err(LoggingError::NoPath);
    };
    let filter = filter(config.logging.level.as_deref())?;
    let file = open(&path).map_err(LoggingError::Open)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))
}

fn filter(level: Option<&str>) -> Result<EnvFilter, LoggingError> {
    match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.is_empty() => {
            EnvFilter::try_new(directives).map_err(LoggingError::Filter)
        }
        _ => EnvFilter::try_new(level.unwrap_or(DEFAULT_LEVEL)).map_err(LoggingError::Filter),
    }
}

fn open(path: &Path) -> std::io::Result<fs_err::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }
    fs_err::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
}

#[derive(Debug, Error)]
pub(crate) enum LoggingError {
    #[error("failed to determine path to log file")]
    NoPath,
    #[error("invalid log filter")]
    Filter(#[source] tracing_subscriber::filter::ParseError),
    #[error("failed to open log file")]
    Open(#[source] std::io::Error),
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn configured_level() {
        if std::env::var_os(LOG_ENV_VAR).is_some() {
            return;
        }
        assert!(filter(None).is_ok());
        assert!(filter(Some("gridsnake=debug")).is_ok());
        assert!(matches!(
            filter(Some("gridsnake=notalevel")),
            Err(LoggingError::Filter(_))
        ));
    }

    #[test]
    fn open_creates_parent() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("logs").join("gridsnake.log");
        open(&path).unwrap();
        assert!(path.exists());
    }
}
