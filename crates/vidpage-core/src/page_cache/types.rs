//! Core types for the page cache.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SourceKind, VideoSummary};

/// Identifies one cached page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageKey {
    /// Source the page belongs to.
    pub source_id: String,
    /// 1-based page number.
    pub page_number: u32,
}

impl PageKey {
    /// Create a key.
    #[must_use]
    pub fn new(source_id: impl Into<String>, page_number: u32) -> Self {
        Self {
            source_id: source_id.into(),
            page_number,
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.source_id, self.page_number)
    }
}

/// A resolved page as stored in the cache.
///
/// Records are replaced wholesale on refetch; nothing merges fields.
///
/// ## Example
///
/// ```rust
/// use vidpage_core::page_cache::PageRecord;
/// use vidpage_core::SourceKind;
///
/// let record = PageRecord::new("PL1", 1, Vec::new(), 0, SourceKind::Playlist);
/// assert_eq!(record.key().to_string(), "PL1#1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// Source the page belongs to.
    pub source_id: String,
    /// 1-based page number.
    pub page_number: u32,
    /// Entries in remote list order.
    pub videos: Vec<VideoSummary>,
    /// Total results reported by the list call that produced this page.
    pub total_results_at_fetch: u64,
    /// When the page was fetched.
    pub fetched_at: DateTime<Utc>,
    /// Channel or playlist.
    pub source_kind: SourceKind,
    /// Page size the page was cut with. Records without one match any size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

impl PageRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(
        source_id: impl Into<String>,
        page_number: u32,
        videos: Vec<VideoSummary>,
        total_results_at_fetch: u64,
        source_kind: SourceKind,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            page_number,
            videos,
            total_results_at_fetch,
            fetched_at: Utc::now(),
            source_kind,
            page_size: None,
        }
    }

    /// Record the page size the page was cut with.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Whether this page lines up with pages of `page_size` items.
    ///
    /// Page N at one size covers different items than page N at another, so
    /// a record cut with another size must not answer the request.
    #[must_use]
    pub fn matches_page_size(&self, page_size: usize) -> bool {
        self.page_size.is_none_or(|size| size == page_size)
    }

    /// Key this record is stored under.
    #[must_use]
    pub fn key(&self) -> PageKey {
        PageKey::new(self.source_id.clone(), self.page_number)
    }

    /// Age of the record at `now`.
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.fetched_at)
    }
}
