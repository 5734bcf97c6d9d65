//! Failure classification for per-item detail lookups.
//!
//! Maps any failure (a typed error, a bare message, or nothing at all) to a
//! closed [`ErrorKind`] taxonomy with a retryability hint. Classification is
//! pure and total: every input yields exactly one kind and nothing panics.
//!
//! Rules are first-match, case-insensitive substring checks on the rendered
//! failure message, in priority order:
//!
//! | Message contains                              | Kind           | Retryable |
//! |-----------------------------------------------|----------------|-----------|
//! | `not found`                                   | `Deleted`      | no        |
//! | `private`                                     | `Private`      | no        |
//! | `restrict`                                    | `Restricted`   | no        |
//! | `quota`, `rate limit`                         | `ApiError`     | yes       |
//! | `timeout`, `network`, `enotfound`, `econnreset` | `NetworkError` | yes     |
//! | anything else, or no failure value            | `Unknown`      | yes       |
//!
//! ```rust
//! use vidpage_core::classifier::{classify, classify_message, ErrorKind};
//! use vidpage_core::Error;
//!
//! let c = classify(Some(&Error::NotFound("video abc".into())), "abc");
//! assert_eq!(c.kind, ErrorKind::Deleted);
//! assert!(!c.retryable);
//!
//! let c = classify_message(None, "abc");
//! assert_eq!(c.kind, ErrorKind::Unknown);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message recorded when no failure value was supplied.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Closed taxonomy of item failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The video no longer exists.
    Deleted,
    /// The video is private.
    Private,
    /// The video is region- or age-restricted.
    Restricted,
    /// Quota or rate limit reported by the remote API.
    ApiError,
    /// Transport failure or timeout.
    NetworkError,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// All kinds, in rule priority order.
    pub const ALL: [Self; 6] = [
        Self::Deleted,
        Self::Private,
        Self::Restricted,
        Self::ApiError,
        Self::NetworkError,
        Self::Unknown,
    ];

    /// Whether a later attempt could plausibly succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        !matches!(self, Self::Deleted | Self::Private | Self::Restricted)
    }

    /// Stable identifier used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deleted => "DELETED",
            Self::Private => "PRIVATE",
            Self::Restricted => "RESTRICTED",
            Self::ApiError => "API_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorClassification {
    /// Failure kind.
    pub kind: ErrorKind,
    /// Rendered failure message.
    pub message: String,
    /// Informational retry hint; the pager never retries on its own.
    pub retryable: bool,
    /// Item the failure belongs to.
    pub subject_id: String,
    /// When the failure was classified.
    pub timestamp: DateTime<Utc>,
}

// (needles, kind) in priority order; needles are lowercase.
const RULES: &[(&[&str], ErrorKind)] = &[
    (&["not found"], ErrorKind::Deleted),
    (&["private"], ErrorKind::Private),
    (&["restrict"], ErrorKind::Restricted),
    (&["quota", "rate limit"], ErrorKind::ApiError),
    (
        &["timeout", "network", "enotfound", "econnreset"],
        ErrorKind::NetworkError,
    ),
];

/// Determine the kind for a failure message without stamping a result.
#[must_use]
pub fn kind_for_message(message: &str) -> ErrorKind {
    let lowered = message.to_lowercase();
    RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| lowered.contains(needle)))
        .map_or(ErrorKind::Unknown, |(_, kind)| *kind)
}

/// Classify a failure value.
///
/// Accepts anything printable (typed errors, strings) or `None` when the
/// failure carried no value.
#[must_use]
pub fn classify(raw: Option<&dyn fmt::Display>, subject_id: &str) -> ErrorClassification {
    let message = raw.map(|r| r.to_string());
    classify_message(message.as_deref(), subject_id)
}

/// Classify a failure message.
#[must_use]
pub fn classify_message(message: Option<&str>, subject_id: &str) -> ErrorClassification {
    let kind = message.map_or(ErrorKind::Unknown, kind_for_message);
    ErrorClassification {
        kind,
        message: message.map_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string(), str::to_string),
        retryable: kind.is_retryable(),
        subject_id: subject_id.to_string(),
        timestamp: Utc::now(),
    }
}
