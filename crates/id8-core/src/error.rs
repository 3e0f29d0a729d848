//! Error types for id8-core.
//!
//! A single error enum is shared by the library crates (catalog, stack,
//! rate limiting). Surfaces such as the HTTP service map the variants onto
//! their own status codes.

use std::path::{Path, PathBuf};

/// Result type alias for ID8 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur across the ID8 marketplace crates.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Input failed validation (missing identifiers, malformed bodies).
    #[error("Validation error: {message}")]
    Validation {
        /// Field that failed validation, when known.
        field: Option<String>,
        /// What went wrong.
        message: String,
    },

    /// Configuration is missing or invalid (including absent credentials).
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic.
        message: String,
    },

    /// A requested record does not exist.
    #[error("{what} not found: {id}")]
    NotFound {
        /// Kind of record ("item", "saved stack", ...).
        what: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// An external service (managed database) failed or returned an error.
    #[error("Upstream error from {service}: {message}")]
    Upstream {
        /// Service name, e.g. "catalog-db".
        service: String,
        /// Human-readable error message.
        message: String,
        /// HTTP status returned by the service, if any.
        status: Option<u16>,
    },

    /// I/O error without path context.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error on a specific file.
    #[error("I/O error on {}: {source}", path.display())]
    IoWithPath {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a new validation error with a field name.
    pub fn validation_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a new not-found error.
    pub fn not_found<W, I>(what: W, id: I) -> Self
    where
        W: Into<String>,
        I: Into<String>,
    {
        Error::NotFound {
            what: what.into(),
            id: id.into(),
        }
    }

    /// Creates a new upstream error without a status code.
    pub fn upstream<S, M>(service: S, message: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Error::Upstream {
            service: service.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Creates a new upstream error carrying the HTTP status of the response.
    pub fn upstream_status<S, M>(service: S, status: u16, message: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Error::Upstream {
            service: service.into(),
            message: message.into(),
            status: Some(status),
        }
    }

    /// Wraps an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether the caller is at fault (bad input or unknown record).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Validation { .. } | Error::NotFound { .. })
    }

    /// Whether retrying the same operation could succeed.
    ///
    /// Upstream 4xx responses are permanent; everything else from the
    /// network or filesystem may be transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Upstream { status, .. } => !matches!(status, Some(400..=499)),
            Error::Io(_) | Error::IoWithPath { .. } => true,
            Error::Validation { .. }
            | Error::Config { .. }
            | Error::NotFound { .. }
            | Error::Serialization(_) => false,
        }
    }
}
