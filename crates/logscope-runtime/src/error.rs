use std::fmt;

/// Result type for logscope-runtime operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the runtime layer
#[derive(Debug)]
pub enum Error {
    /// Session corpus error
    Sessions(logscope_sessions::Error),

    /// Data directory resolution failed
    Core(logscope_core::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// JSON parsing of a tool's output failed
    Json(serde_json::Error),

    /// Configuration error
    Config(String),

    /// External command exited unsuccessfully
    Command { program: String, message: String },

    /// A background task panicked or was aborted
    Task(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Sessions(err) => write!(f, "Session error: {}", err),
            Error::Core(err) => write!(f, "{}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Json(err) => write!(f, "JSON error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Command { program, message } => write!(f, "{} failed: {}", program, message),
            Error::Task(msg) => write!(f, "Task error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Sessions(err) => Some(err),
            Error::Core(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Config(_) | Error::Command { .. } | Error::Task(_) => None,
        }
    }
}

impl From<logscope_sessions::Error> for Error {
    fn from(err: logscope_sessions::Error) -> Self {
        Error::Sessions(err)
    }
}

impl From<logscope_core::Error> for Error {
    fn from(err: logscope_core::Error) -> Self {
        Error::Core(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Task(err.to_string())
    }
}
