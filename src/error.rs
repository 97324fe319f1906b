use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::models::filter::{BlockWindow, FilterSpec};

/// Error type returned by a transport implementation.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// A call that may block and is therefore bounded by a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Connect,
    Subscribe,
    Query(BlockWindow),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Connect => write!(f, "connect"),
            Operation::Subscribe => write!(f, "subscribe"),
            Operation::Query(window) => write!(f, "query {}", window),
        }
    }
}

/// Whether the caller should give up or try the same thing again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Retryable,
}

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("only supports running a single mode, both subscribe and get-logs were selected")]
    ConflictingModes,

    #[error("page size must be greater than 0, got {0}")]
    InvalidPageSize(i64),

    #[error("invalid address {0:?}: expected 20 hex-encoded bytes")]
    InvalidAddress(String),

    #[error("invalid timeout {0:?}: expected a duration such as 60s, 500ms or 2m")]
    InvalidTimeout(String),

    #[error("endpoint must be set to run {0}")]
    MissingEndpoint(&'static str),

    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: TransportError,
    },

    #[error("failed to subscribe with {filter}: {source}")]
    Subscribe {
        filter: FilterSpec,
        #[source]
        source: TransportError,
    },

    #[error("{0}")]
    Stream(#[source] TransportError),

    #[error("subscription closed without an error")]
    StreamClosed,

    #[error("failed to query logs in {window}: {source}")]
    Query {
        window: BlockWindow,
        #[source]
        source: TransportError,
    },

    #[error("{operation}: deadline exceeded after {after:?}")]
    Timeout { operation: Operation, after: Duration },
}

impl WatchError {
    pub fn severity(&self) -> Severity {
        match self {
            WatchError::Query { .. } => Severity::Retryable,
            WatchError::Timeout { operation: Operation::Query(_), .. } => Severity::Retryable,
            _ => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

pub type Result<T, E = WatchError> = std::result::Result<T, E>;
