//! Error types and handling for vidpage-core operations.
//!
//! This module provides the crate-wide error type. Errors are categorized for
//! logging and carry a recoverability hint that callers may use for their own
//! retry decisions; the core itself never retries.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: File system operations behind the file page store
//! - **Network Errors**: HTTP transport failures talking to the remote API
//! - **API Errors**: Non-success responses from the remote API (quota, 5xx)
//! - **Storage Errors**: Page store reads and writes
//! - **Configuration Errors**: Invalid settings or config files
//! - **Timeouts**: Remote calls exceeding the configured request timeout
//!
//! Per-item detail failures never surface as an [`Error`] to callers of the
//! page fetcher; they are classified by [`crate::classifier`] and replaced by
//! fallback records. Only a failed list call with no cache history does.
//!
//! ```rust
//! use vidpage_core::Error;
//!
//! let err = Error::Timeout("list call exceeded 10s".to_string());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "timeout");
//! ```

use thiserror::Error;

/// The main error type for vidpage-core operations.
///
/// `Display` output is what the error classifier matches against when a
/// detail call fails, so variant prefixes are kept stable.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failed.
    ///
    /// Connection and timeout errors are recoverable; builder and decode
    /// errors are not.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote API answered with a non-success status.
    ///
    /// ## Common Causes
    ///
    /// - Daily quota exhausted ("quotaExceeded")
    /// - Rate limit exceeded
    /// - Upstream server errors
    #[error("API error: {0}")]
    Api(String),

    /// Requested resource was not found.
    ///
    /// Used when the remote API reports a missing playlist, channel or video.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Page store operation failed.
    ///
    /// ## Common Causes
    ///
    /// - Unwritable cache directory
    /// - Corrupted page files
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source descriptor cannot be used (empty id or locator).
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Operation timed out.
    ///
    /// Raised when a remote call exceeds the request timeout. Recoverable.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use vidpage_core::Error;
    /// use std::io;
    ///
    /// assert!(Error::Timeout("slow".to_string()).is_recoverable());
    /// assert!(Error::Api("quotaExceeded".to_string()).is_recoverable());
    /// assert!(Error::Io(io::Error::new(io::ErrorKind::Interrupted, "x")).is_recoverable());
    ///
    /// assert!(!Error::NotFound("video".to_string()).is_recoverable());
    /// assert!(!Error::Config("bad".to_string()).is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout(_) | Self::Api(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Useful for structured logging and grouping failures in metrics.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Api(_) => "api",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::InvalidSource(_) => "invalid_source",
            Self::Timeout(_) => "timeout",
            Self::Serialization(_) => "serialization",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
