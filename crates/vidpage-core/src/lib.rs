//! # vidpage-core
//!
//! Page-numbered, cached access to quota-limited video list APIs.
//!
//! Remote list APIs for channels and playlists are cursor based and every
//! call costs quota. This crate turns them into a stable "page N of source S"
//! view that avoids remote calls wherever a cached answer exists and keeps
//! answering with stale data when the remote API is down.
//!
//! ## Architecture
//!
//! - **Page fetcher**: cache lookup, gap filling, live fetch, detail fan-out
//!   and background prefetch ([`PageFetcher`])
//! - **Page cache**: TTL-aware store of resolved pages over a pluggable
//!   storage port ([`PageCache`], [`page_cache::PageStore`])
//! - **Cursor store**: process-local continuation tokens ([`TokenStore`])
//! - **Classification**: per-item failures mapped to a closed taxonomy and
//!   replaced by placeholders ([`classifier`], [`fallback`])
//! - **Remote ports**: list and detail traits plus an HTTP adapter ([`remote`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vidpage_core::page_cache::FilePageStore;
//! use vidpage_core::{Config, HttpVideoApi, PageCache, PageFetcher, Source};
//!
//! # #[tokio::main]
//! # async fn main() -> vidpage_core::Result<()> {
//! let config = Config::load()?;
//! let api = Arc::new(HttpVideoApi::from_config(&config)?);
//! let cache = PageCache::new(
//!     Arc::new(FilePageStore::new(&config.paths.root)),
//!     config.pagination.cache_ttl(),
//! );
//!
//! let fetcher = PageFetcher::new(api.clone(), api, cache, Arc::new(config));
//! let page = fetcher.fetch(&Source::playlist("PLxyz"), 1).await?;
//! println!("{} of {} videos", page.videos.len(), page.total_results);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Item failures never surface as errors; they become placeholder entries
//! with an [`ErrorClassification`]. Only a failed list call with no cached
//! copy of the page returns an [`Error`]:
//!
//! ```rust,no_run
//! # use vidpage_core::{Error, PageFetcher, Source};
//! # async fn demo(fetcher: PageFetcher) {
//! match fetcher.fetch(&Source::channel("UCxyz"), 2).await {
//!     Ok(page) if page.fallback => eprintln!("showing cached page"),
//!     Ok(page) => println!("{} videos", page.videos.len()),
//!     Err(e) if e.is_recoverable() => eprintln!("try again later: {e}"),
//!     Err(e) => eprintln!("failed: {e}"),
//! }
//! # }
//! ```

/// Failure classification for per-item lookups
pub mod classifier;
/// Configuration loading and pagination settings
pub mod config;
/// Error types and result aliases
pub mod error;
/// Placeholder records for unresolvable items
pub mod fallback;
/// Per-fetch metrics and sinks
pub mod metrics;
/// Page cache and its storage port
pub mod page_cache;
/// Page fetcher orchestrating cache, cursors and remote calls
pub mod pager;
/// Remote list and detail ports with an HTTP adapter
pub mod remote;
/// Process-local continuation cursors
pub mod token_store;
/// Core data types
pub mod types;

pub use classifier::{ErrorClassification, ErrorKind, classify};
pub use config::{Config, PaginationConfig, PaginationConfigProvider};
pub use error::{Error, Result};
pub use fallback::create_fallback;
pub use metrics::{FetchMetrics, MetricsRecorder, MetricsSink, TracingMetricsSink};
pub use page_cache::{PageCache, PageRecord};
pub use pager::{FetcherOptions, PageFetcher};
pub use remote::{DetailApi, HttpVideoApi, ListApi};
pub use token_store::TokenStore;
pub use types::*;
