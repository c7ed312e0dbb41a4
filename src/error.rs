use thiserror::Error;

/// Errors raised by the calendar core and event creation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("event title is required")]
    EmptyTitle,

    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid time `{0}`, expected HH:MM")]
    InvalidTime(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse event list: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid log filter `{0}`")]
    Filter(String),

    #[error("failed to install log subscriber: {0}")]
    Init(String),
}
