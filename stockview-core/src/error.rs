//! Error types for stockview-core

use thiserror::Error;

/// Errors reading datasets or configuration from disk
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures reported by the remote query transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server error: {0}")]
    Server(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// The refetch a filter change needed did not succeed; nothing was committed
    #[error("refetch for base '{base_id}' failed")]
    Refetch {
        base_id: String,
        #[source]
        source: TransportError,
    },
}
