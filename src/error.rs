use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, StateError>;

/// Errors raised by snapshot operations. Every variant is fatal to the call
/// that produced it.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The connection's driver is not in the sqlite allow-list
    #[error("unsupported driver '{driver}': only sqlite and sqlite2 are supported")]
    UnsupportedDriver { driver: String },

    /// The connection string has no `driver:path` separator or no filename
    #[error("malformed connection string '{connection}': expected driver:path/to/file")]
    MalformedConnectionString { connection: String },

    /// A copy, delete or listing on disk failed
    #[error("failed to {action} {}: {source}", path.display())]
    FileOperation {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{feature} is not implemented")]
    NotImplemented { feature: &'static str },

    /// A caller-supplied key that cannot name a file in the storage directory
    #[error("invalid snapshot key '{key}'")]
    InvalidKey { key: String },

    /// The connection collaborator failed to open or close
    #[error("connection error: {source}")]
    Connection {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl StateError {
    pub(crate) fn file(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StateError::FileOperation {
            action,
            path: path.into(),
            source,
        }
    }
}

impl From<rusqlite::Error> for StateError {
    fn from(err: rusqlite::Error) -> Self {
        StateError::Connection {
            source: Box::new(err),
        }
    }
}
