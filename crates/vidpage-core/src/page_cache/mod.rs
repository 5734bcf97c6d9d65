//! Page cache for resolved list pages.
//!
//! Pages are keyed by `(source_id, page_number)` and carry the time they were
//! fetched. A page younger than the TTL is *fresh* and served by
//! [`PageCache::get`]; older pages are withheld from `get` but stay available
//! through [`PageCache::get_fallback`] until swept, so a caller can still
//! answer when the remote API is down.
//!
//! ## Key Types
//!
//! - [`PageCache`]: TTL-aware facade injected into the page fetcher
//! - [`PageStore`]: storage port the cache persists through
//! - [`PageRecord`]: one cached page
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vidpage_core::page_cache::{MemoryPageStore, PageCache};
//! use vidpage_core::SourceKind;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache = PageCache::new(Arc::new(MemoryPageStore::new()), chrono::Duration::minutes(60));
//! cache.put("PL1", 1, Vec::new(), 0, SourceKind::Playlist).await.unwrap();
//! assert!(cache.get("PL1", 1).await.unwrap().is_some());
//! # }
//! ```

mod store;
mod types;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::Result;
use crate::types::{SourceKind, VideoSummary};

pub use store::{
    FilePageStore, MemoryPageStore, PageStore, sanitize_source_id, source_dir_name,
};
pub use types::{PageKey, PageRecord};

/// TTL-aware page cache over an injected [`PageStore`].
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct PageCache {
    store: Arc<dyn PageStore>,
    ttl: Duration,
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache").field("ttl", &self.ttl).finish()
    }
}

impl PageCache {
    /// Create a cache over `store` with the given time-to-live.
    #[must_use]
    pub fn new(store: Arc<dyn PageStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Create a cache over a fresh [`MemoryPageStore`].
    #[must_use]
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryPageStore::new()), ttl)
    }

    /// Time-to-live applied by [`get`](Self::get).
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether `record` is younger than the TTL.
    #[must_use]
    pub fn is_fresh(&self, record: &PageRecord) -> bool {
        self.is_fresh_at(record, Utc::now())
    }

    fn is_fresh_at(&self, record: &PageRecord, now: DateTime<Utc>) -> bool {
        record.age_at(now) < self.ttl
    }

    /// Fresh record for a page.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    pub async fn get(&self, source_id: &str, page_number: u32) -> Result<Option<PageRecord>> {
        let key = PageKey::new(source_id, page_number);
        let record = self.store.get(&key).await?;
        match record {
            Some(record) if self.is_fresh(&record) => {
                debug!("Cache hit for {key}");
                Ok(Some(record))
            },
            Some(_) => {
                debug!("Cache entry for {key} is stale");
                Ok(None)
            },
            None => {
                debug!("Cache miss for {key}");
                Ok(None)
            },
        }
    }

    /// Record for a page regardless of age.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    pub async fn get_fallback(
        &self,
        source_id: &str,
        page_number: u32,
    ) -> Result<Option<PageRecord>> {
        self.store
            .get(&PageKey::new(source_id, page_number))
            .await
    }

    /// Replace the record for a page, stamping it with the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    pub async fn put(
        &self,
        source_id: &str,
        page_number: u32,
        videos: Vec<VideoSummary>,
        total_results: u64,
        source_kind: SourceKind,
    ) -> Result<PageRecord> {
        let record = PageRecord::new(source_id, page_number, videos, total_results, source_kind);
        self.put_record(&record).await?;
        Ok(record)
    }

    /// Store a fully formed record as is, keeping its `fetched_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    pub async fn put_record(&self, record: &PageRecord) -> Result<()> {
        self.store.put(&record.key(), record).await
    }

    /// Drop every page of a source and return how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    pub async fn clear_source(&self, source_id: &str) -> Result<usize> {
        let removed = self.store.delete_by_prefix(source_id).await?;
        debug!("Cleared {removed} cached pages for {source_id}");
        Ok(removed)
    }

    /// Delete every page older than the TTL and return how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    pub async fn clear_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let mut removed = 0;
        for record in self.store.scan_all().await? {
            if !self.is_fresh_at(&record, now) {
                self.store.delete(&record.key()).await?;
                removed += 1;
            }
        }
        debug!("Swept {removed} expired pages");
        Ok(removed)
    }
}
