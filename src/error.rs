//! Error types for registry-dl
//!
//! This module provides the error taxonomy of the retrieval pipeline:
//! - Query errors (not found, transport, malformed envelope, incomplete payload)
//! - Storage errors (decode and write failures)
//! - Delivery errors from notification channels (logged, never returned by
//!   the pipeline)
//! - Machine-readable error codes for events and logs

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for registry-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for registry-dl
///
/// Per-document failures never surface through this type from a batch run;
/// they are logged and reported as events instead. This type reaches the
/// caller only for single-document runs, input validation and local I/O
/// problems that make the whole run impossible.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "registry.endpoint")
        key: Option<String>,
    },

    /// Required inputs missing at the boundary (access token, identifiers)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Registry query failed
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// Local persistence failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors returned by the registry query layer
#[derive(Debug, Error)]
pub enum QueryError {
    /// The envelope carried no data for the requested case or document
    #[error("{kind} {id} not found")]
    NotFound {
        /// What was queried ("case" or "document")
        kind: &'static str,
        /// The queried identifier
        id: String,
    },

    /// Network failure or non-success HTTP status
    #[error("transport failure: {0}")]
    Transport(String),

    /// Response body was not a valid envelope
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Document payload lacks a file name or content
    #[error("document {id} payload is missing {missing}")]
    IncompletePayload {
        /// The document identifier
        id: String,
        /// Which field was missing ("fileName" or "data")
        missing: &'static str,
    },
}

/// Errors returned by the persistence store
#[derive(Debug, Error)]
pub enum StorageError {
    /// Content could not be decoded from its transport encoding
    #[error("failed to decode content for {}: {}", .path.display(), .reason)]
    Decode {
        /// The target path
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// The case JSON could not be serialized
    #[error("failed to encode {}: {}", .path.display(), .source)]
    Encode {
        /// The target path
        path: PathBuf,
        /// Serializer error
        #[source]
        source: serde_json::Error,
    },

    /// Writing or renaming the file failed
    #[error("failed to write {}: {}", .path.display(), .source)]
    Write {
        /// The target path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors returned by notification forwarders
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The channel could not be reached (network error, timeout)
    #[error("transport failure: {0}")]
    Transport(String),

    /// The channel answered but refused the document
    #[error("rejected with status {status}: {description}")]
    Rejected {
        /// HTTP status returned by the channel
        status: u16,
        /// Description returned by the channel
        description: String,
    },
}

impl Error {
    /// Machine-readable error code, used in events and log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::Query(e) => e.error_code(),
            Error::Storage(e) => match e {
                StorageError::Decode { .. } => "decode_failed",
                StorageError::Encode { .. } => "encode_failed",
                StorageError::Write { .. } => "write_failed",
            },
            Error::Io(_) => "io_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl QueryError {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::NotFound { .. } => "not_found",
            QueryError::Transport(_) => "transport_failure",
            QueryError::Malformed(_) => "malformed_response",
            QueryError::IncompletePayload { .. } => "incomplete_payload",
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            QueryError::Malformed(e.to_string())
        } else {
            QueryError::Transport(e.to_string())
        }
    }
}
