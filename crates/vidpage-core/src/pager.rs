//! Page-numbered access over a cursor-paginated remote list.
//!
//! [`PageFetcher::fetch_page`] answers "page N of source S" with as few
//! remote calls as possible:
//!
//! 1. A fresh cache entry is returned as is.
//! 2. Otherwise the fetcher walks forward from the first missing or expired
//!    page (or the nearest page whose cursor it still knows) up to N,
//!    fetching each page once, in ascending order.
//! 3. Every live fetch lists item ids, then resolves details for all of them
//!    concurrently. Items that fail are replaced in place by placeholders.
//! 4. The page is cached, the cursor for N+1 is remembered and metrics are
//!    emitted.
//!
//! Cached pages and cursors are tied to the page size they were produced
//! with; a request with another size ignores them and refetches.
//!
//! When the list call fails, an expired cache entry is served instead and the
//! result is flagged as `fallback`. Only when no entry exists at all does the
//! original error reach the caller.
//!
//! After page 1 is served, page 2 is resolved in a detached background task
//! so the next request is usually a cache hit.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::classifier::{classify, classify_message};
use crate::config::{FetchSettings, MAX_FETCH_PAGE_SIZE, MAX_PAGE_SIZE, PaginationConfigProvider};
use crate::fallback::create_fallback;
use crate::metrics::{FetchMetrics, MetricsSink, NoopMetricsSink};
use crate::page_cache::{PageCache, PageRecord};
use crate::remote::{DetailApi, ListApi};
use crate::token_store::TokenStore;
use crate::types::{PageResult, Source, VideoSummary, total_pages};
use crate::{Error, Result};

/// Message used to classify a detail call that returned no video.
const EMPTY_DETAIL_MESSAGE: &str = "Video not found";

/// Tuning knobs for [`PageFetcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetcherOptions {
    /// Timeout applied to every remote call.
    pub request_timeout: Duration,
    /// Upper bound on detail calls in flight for one page.
    pub max_concurrent_details: usize,
    /// Resolve page 2 in the background after serving page 1.
    pub prefetch: bool,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        FetchSettings::default().into()
    }
}

impl From<FetchSettings> for FetcherOptions {
    fn from(settings: FetchSettings) -> Self {
        Self {
            request_timeout: settings.request_timeout(),
            max_concurrent_details: settings.max_concurrent_details.max(1),
            prefetch: settings.prefetch,
        }
    }
}

/// Result of one live page fetch.
struct LivePage {
    result: PageResult,
    next_token: Option<String>,
}

/// Orchestrates cache, cursors and remote calls.
///
/// Cloning is cheap; clones share the cache, the cursor store and the
/// remote clients.
#[derive(Clone)]
pub struct PageFetcher {
    list_api: Arc<dyn ListApi>,
    detail_api: Arc<dyn DetailApi>,
    cache: PageCache,
    tokens: TokenStore,
    metrics: Arc<dyn MetricsSink>,
    config: Arc<dyn PaginationConfigProvider>,
    options: FetcherOptions,
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("cache", &self.cache)
            .field("tokens", &self.tokens.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PageFetcher {
    /// Create a fetcher with a private cursor store, no metrics sink and
    /// default options.
    #[must_use]
    pub fn new(
        list_api: Arc<dyn ListApi>,
        detail_api: Arc<dyn DetailApi>,
        cache: PageCache,
        config: Arc<dyn PaginationConfigProvider>,
    ) -> Self {
        Self {
            list_api,
            detail_api,
            cache,
            tokens: TokenStore::new(),
            metrics: Arc::new(NoopMetricsSink),
            config,
            options: FetcherOptions::default(),
        }
    }

    /// Use a shared cursor store.
    #[must_use]
    pub fn with_tokens(mut self, tokens: TokenStore) -> Self {
        self.tokens = tokens;
        self
    }

    /// Send fetch metrics to `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replace the tuning options.
    #[must_use]
    pub fn with_options(mut self, options: FetcherOptions) -> Self {
        self.options = options;
        self
    }

    /// The page cache this fetcher reads and writes.
    #[must_use]
    pub const fn cache(&self) -> &PageCache {
        &self.cache
    }

    /// The cursor store this fetcher reads and writes.
    #[must_use]
    pub const fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Fetch a page using the configured page size.
    ///
    /// # Errors
    ///
    /// See [`fetch_page`](Self::fetch_page).
    pub async fn fetch(&self, source: &Source, page_number: u32) -> Result<PageResult> {
        let page_size = self.config.pagination().page_size;
        self.fetch_page(source, page_number, page_size).await
    }

    /// Fetch one page of `source`.
    ///
    /// Item order always matches the remote list order, and the page never
    /// holds more than `page_size` entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the source or the arguments are invalid (page 0,
    /// or a page size outside `1..=MAX_FETCH_PAGE_SIZE`), or if the
    /// remote list call fails and no cache entry exists for the page. Per-item
    /// detail failures never produce an error.
    pub async fn fetch_page(
        &self,
        source: &Source,
        page_number: u32,
        page_size: usize,
    ) -> Result<PageResult> {
        source.validate()?;
        if page_number == 0 {
            return Err(Error::Other("page numbers start at 1".to_string()));
        }
        if page_size == 0 || page_size > MAX_FETCH_PAGE_SIZE {
            return Err(Error::Other(format!(
                "page size must be between 1 and {MAX_FETCH_PAGE_SIZE}, got {page_size}"
            )));
        }
        if self.tokens.bind_page_size(&source.id, page_size) {
            debug!("{} is now read with page size {page_size}", source.id);
        }

        let result = self.resolve_page(source, page_number, page_size).await?;

        let more_pages = result.total_results > page_size as u64
            || self.tokens.get_token(&source.id, 2).is_some();
        if page_number == 1 && !result.fallback && self.options.prefetch && more_pages {
            self.spawn_prefetch(source, page_size);
        }

        Ok(result)
    }

    /// Drop every cached page and cursor of a source.
    ///
    /// # Errors
    ///
    /// Returns an error if the page store fails.
    pub async fn clear_source(&self, source_id: &str) -> Result<usize> {
        self.tokens.clear(source_id);
        self.cache.clear_source(source_id).await
    }

    /// Delete expired pages from the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the page store fails.
    pub async fn clear_expired(&self) -> Result<usize> {
        self.cache.clear_expired().await
    }

    /// Cache lookup, then live fetch, then stale fallback.
    async fn resolve_page(
        &self,
        source: &Source,
        page_number: u32,
        page_size: usize,
    ) -> Result<PageResult> {
        if let Some(record) = self.fresh_record(&source.id, page_number, page_size).await {
            debug!("Serving {} page {page_number} from cache", source.id);
            return Ok(Self::from_record(record, page_size, false));
        }

        match self.walk_to(source, page_number, page_size).await {
            Ok(result) => Ok(result),
            Err(err) => match self.cache.get_fallback(&source.id, page_number).await {
                Ok(Some(record)) if record.matches_page_size(page_size) => {
                    warn!(
                        "Serving stale {} page {page_number} after list failure: {err}",
                        source.id
                    );
                    Ok(Self::from_record(record, page_size, true))
                },
                Ok(_) => Err(err),
                Err(store_err) => {
                    warn!("Fallback read failed for {} page {page_number}: {store_err}", source.id);
                    Err(err)
                },
            },
        }
    }

    /// Fresh cache entry cut with `page_size`, treating store failures as a
    /// miss.
    async fn fresh_record(
        &self,
        source_id: &str,
        page_number: u32,
        page_size: usize,
    ) -> Option<PageRecord> {
        match self.cache.get(source_id, page_number).await {
            Ok(Some(record)) if !record.matches_page_size(page_size) => {
                debug!(
                    "Ignoring {source_id} page {page_number} cached at page size {:?}",
                    record.page_size
                );
                None
            },
            Ok(record) => record,
            Err(e) => {
                warn!("Cache read failed for {source_id} page {page_number}: {e}");
                None
            },
        }
    }

    /// First page the walk towards `target` must fetch.
    ///
    /// That is the first missing or expired page before `target`, moved back
    /// until a page whose cursor is known (page 1 needs none).
    async fn walk_start(&self, source_id: &str, target: u32, page_size: usize) -> u32 {
        let mut start = target;
        for page in 1..target {
            if self.fresh_record(source_id, page, page_size).await.is_none() {
                start = page;
                break;
            }
        }
        while start > 1 && self.tokens.get_token(source_id, start).is_none() {
            start -= 1;
        }
        start
    }

    /// Fetch pages in ascending order up to and including `target`.
    async fn walk_to(&self, source: &Source, target: u32, page_size: usize) -> Result<PageResult> {
        let start = self.walk_start(&source.id, target, page_size).await;
        if start < target {
            debug!(
                "Filling {} pages {start}..{target} before page {target}",
                source.id
            );
        }

        let mut token = if start == 1 {
            None
        } else {
            self.tokens.get_token(&source.id, start)
        };
        let mut last_total = 0;

        for page in start..=target {
            if page < target {
                let next_known = self.tokens.get_token(&source.id, page + 1);
                if next_known.is_some()
                    && self
                        .fresh_record(&source.id, page, page_size)
                        .await
                        .is_some()
                {
                    token = next_known;
                    continue;
                }
            }

            let live = self
                .fetch_live(source, page, page_size, token.as_deref())
                .await?;
            if page == target {
                return Ok(live.result);
            }

            last_total = live.result.total_results;
            match live.next_token {
                Some(next) => token = Some(next),
                None => {
                    debug!("{} ends at page {page}, before page {target}", source.id);
                    break;
                },
            }
        }

        Ok(PageResult {
            videos: Vec::new(),
            total_results: last_total,
            page_number: target,
            total_pages: total_pages(last_total, page_size),
            from_cache: false,
            fallback: false,
        })
    }

    /// List, resolve, persist and report one page.
    async fn fetch_live(
        &self,
        source: &Source,
        page_number: u32,
        page_size: usize,
        token: Option<&str>,
    ) -> Result<LivePage> {
        let started = Instant::now();
        let (ids, total_results, next_token) = self.list_ids(source, page_size, token).await?;

        let videos = self.resolve_items(ids).await;

        let record = PageRecord::new(
            &source.id,
            page_number,
            videos.clone(),
            total_results,
            source.kind,
        )
        .with_page_size(page_size);
        let cached = match self.cache.put_record(&record).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to cache {} page {page_number}: {e}", source.id);
                false
            },
        };

        if cached {
            match &next_token {
                Some(next) => self.tokens.set_token(&source.id, page_number + 1, next.clone()),
                None => self.tokens.remove_token(&source.id, page_number + 1),
            }
        }

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let metrics = FetchMetrics::from_videos(&source.id, page_number, &videos, elapsed_ms);
        info!(
            "Fetched {} page {page_number}: {}/{} available in {elapsed_ms}ms",
            source.id, metrics.successful, metrics.total
        );
        self.metrics.record(&metrics);

        Ok(LivePage {
            result: PageResult {
                videos,
                total_results,
                page_number,
                total_pages: total_pages(total_results, page_size),
                from_cache: false,
                fallback: false,
            },
            next_token,
        })
    }

    /// Collect up to `page_size` unique ids, following cursors across
    /// per-call caps.
    async fn list_ids(
        &self,
        source: &Source,
        page_size: usize,
        token: Option<&str>,
    ) -> Result<(Vec<String>, u64, Option<String>)> {
        let mut ids: Vec<String> = Vec::with_capacity(page_size.min(MAX_PAGE_SIZE));
        let mut seen = HashSet::new();
        let mut cursor = token.map(str::to_string);
        let mut total_results;

        loop {
            let remaining = page_size - ids.len();
            let call = self.list_api.list(source, remaining, cursor.as_deref());
            let page = timeout(self.options.request_timeout, call)
                .await
                .map_err(|_| {
                    Error::Timeout(format!(
                        "list call for {} exceeded {:?}",
                        source.id, self.options.request_timeout
                    ))
                })??;

            total_results = page.total_results;
            let before = ids.len();
            for id in page.item_ids {
                if ids.len() == page_size {
                    break;
                }
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }

            cursor = page.next_token;
            if ids.len() == page_size || cursor.is_none() || ids.len() == before {
                break;
            }
        }

        Ok((ids, total_results, cursor))
    }

    /// Resolve details for every id, keeping list order.
    ///
    /// Waits for every call; a failed or empty lookup becomes a placeholder
    /// at the same position.
    async fn resolve_items(&self, ids: Vec<String>) -> Vec<VideoSummary> {
        let request_timeout = self.options.request_timeout;
        stream::iter(ids.into_iter().map(|id| {
            let api = Arc::clone(&self.detail_api);
            async move {
                match timeout(request_timeout, api.detail(&id)).await {
                    Ok(Ok(Some(mut details))) => {
                        details.id = id;
                        VideoSummary::from_details(details)
                    },
                    Ok(Ok(None)) => {
                        let classification = classify_message(Some(EMPTY_DETAIL_MESSAGE), &id);
                        create_fallback(&id, Some(classification))
                    },
                    Ok(Err(e)) => {
                        debug!("Detail lookup failed for {id}: {e}");
                        create_fallback(&id, Some(classify(Some(&e), &id)))
                    },
                    Err(_) => {
                        let message = format!("Detail request timeout after {request_timeout:?}");
                        create_fallback(&id, Some(classify_message(Some(&message), &id)))
                    },
                }
            }
        }))
        .buffered(self.options.max_concurrent_details.max(1))
        .collect()
        .await
    }

    /// Resolve page 2 in a detached task; errors are logged and dropped.
    fn spawn_prefetch(&self, source: &Source, page_size: usize) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime for prefetch of {} page 2", source.id);
            return;
        };
        let fetcher = self.clone();
        let source = source.clone();
        handle.spawn(async move {
            if let Err(e) = fetcher.resolve_page(&source, 2, page_size).await {
                debug!("Prefetch of {} page 2 failed: {e}", source.id);
            }
        });
    }

    fn from_record(record: PageRecord, page_size: usize, fallback: bool) -> PageResult {
        let mut videos = record.videos;
        videos.truncate(page_size);
        PageResult {
            videos,
            total_results: record.total_results_at_fetch,
            page_number: record.page_number,
            total_pages: total_pages(record.total_results_at_fetch, page_size),
            from_cache: true,
            fallback,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::classifier::ErrorKind;
    use crate::config::PaginationConfig;
    use crate::metrics::MetricsRecorder;
    use crate::types::{ListPage, VideoDetails};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    // --------------------------------------------------------
    // Mocks
    // --------------------------------------------------------

    /// Serves `ids` with cursors of the form `tok-<offset>`.
    struct MockListApi {
        ids: Vec<String>,
        per_call_cap: usize,
        failing: AtomicBool,
        offsets: Mutex<Vec<usize>>,
    }

    impl MockListApi {
        fn with_ids(ids: &[&str]) -> Self {
            Self {
                ids: ids.iter().map(|s| (*s).to_string()).collect(),
                per_call_cap: usize::MAX,
                failing: AtomicBool::new(false),
                offsets: Mutex::new(Vec::new()),
            }
        }

        fn numbered(count: usize) -> Self {
            let ids: Vec<String> = (0..count).map(|i| format!("v{i}")).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            Self::with_ids(&refs)
        }

        fn with_cap(mut self, cap: usize) -> Self {
            self.per_call_cap = cap;
            self
        }

        fn fail(&self) {
            self.failing.store(true, Ordering::SeqCst);
        }

        fn offsets(&self) -> Vec<usize> {
            self.offsets.lock().expect("lock poisoned").clone()
        }
    }

    #[async_trait]
    impl ListApi for MockListApi {
        async fn list(
            &self,
            _source: &Source,
            page_size: usize,
            token: Option<&str>,
        ) -> Result<ListPage> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(Error::Api("quotaExceeded".to_string()));
            }
            let offset = token
                .map(|t| t.trim_start_matches("tok-").parse::<usize>().unwrap())
                .unwrap_or(0);
            self.offsets.lock().expect("lock poisoned").push(offset);

            let end = (offset + page_size.min(self.per_call_cap)).min(self.ids.len());
            Ok(ListPage {
                item_ids: self.ids[offset..end].to_vec(),
                total_results: self.ids.len() as u64,
                next_token: (end < self.ids.len()).then(|| format!("tok-{end}")),
            })
        }
    }

    enum Outcome {
        Fail(&'static str),
        Missing,
        Slow,
    }

    #[derive(Default)]
    struct MockDetailApi {
        outcomes: HashMap<String, Outcome>,
    }

    impl MockDetailApi {
        fn with(mut self, id: &str, outcome: Outcome) -> Self {
            self.outcomes.insert(id.to_string(), outcome);
            self
        }
    }

    #[async_trait]
    impl DetailApi for MockDetailApi {
        async fn detail(&self, video_id: &str) -> Result<Option<VideoDetails>> {
            match self.outcomes.get(video_id) {
                Some(Outcome::Fail(message)) => Err(Error::Api((*message).to_string())),
                Some(Outcome::Missing) => Ok(None),
                Some(Outcome::Slow) => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(None)
                },
                None => Ok(Some(VideoDetails {
                    id: video_id.to_string(),
                    title: format!("Title {video_id}"),
                    thumbnail_url: None,
                    duration_seconds: 60,
                })),
            }
        }
    }

    struct Harness {
        list: Arc<MockListApi>,
        fetcher: PageFetcher,
        metrics: MetricsRecorder,
    }

    fn harness(list: MockListApi, detail: MockDetailApi, prefetch: bool) -> Harness {
        let list = Arc::new(list);
        let metrics = MetricsRecorder::new();
        let config = PaginationConfig {
            page_size: 10,
            cache_duration_minutes: 60,
        };
        let fetcher = PageFetcher::new(
            Arc::clone(&list) as Arc<dyn ListApi>,
            Arc::new(detail),
            PageCache::in_memory(config.cache_ttl()),
            Arc::new(config),
        )
        .with_metrics(Arc::new(metrics.clone()))
        .with_options(FetcherOptions {
            request_timeout: Duration::from_millis(200),
            max_concurrent_details: 4,
            prefetch,
        });
        Harness {
            list,
            fetcher,
            metrics,
        }
    }

    fn ids(result: &PageResult) -> Vec<&str> {
        result.videos.iter().map(|v| v.id.as_str()).collect()
    }

    // --------------------------------------------------------
    // Cache behavior
    // --------------------------------------------------------

    #[tokio::test]
    async fn test_live_fetch_then_cache_hit() {
        let h = harness(MockListApi::numbered(5), MockDetailApi::default(), false);
        let source = Source::playlist("PL1");

        let first = h.fetcher.fetch_page(&source, 1, 10).await.unwrap();
        assert!(!first.from_cache);
        assert!(!first.fallback);
        assert_eq!(first.videos.len(), 5);
        assert_eq!(first.total_pages, 1);

        let second = h.fetcher.fetch_page(&source, 1, 10).await.unwrap();
        assert!(second.from_cache);
        assert!(!second.fallback);
        assert_eq!(second.videos, first.videos);
        assert_eq!(h.list.offsets(), vec![0]);
    }

    #[tokio::test]
    async fn test_fetch_uses_configured_page_size() {
        let h = harness(MockListApi::numbered(25), MockDetailApi::default(), false);
        let result = h.fetcher.fetch(&Source::playlist("PL1"), 1).await.unwrap();
        assert_eq!(result.videos.len(), 10);
        assert_eq!(result.total_pages, 3);
        assert!(result.has_more());
    }

    // --------------------------------------------------------
    // Gap filling
    // --------------------------------------------------------

    #[tokio::test]
    async fn test_gap_fill_fetches_preceding_pages_in_order() {
        let h = harness(MockListApi::numbered(100), MockDetailApi::default(), false);
        let source = Source::playlist("PL1");

        let page5 = h.fetcher.fetch_page(&source, 5, 10).await.unwrap();
        assert_eq!(h.list.offsets(), vec![0, 10, 20, 30, 40]);
        assert_eq!(page5.page_number, 5);
        assert_eq!(ids(&page5)[0], "v40");

        for page in 1..=4 {
            let cached = h.fetcher.cache().get("PL1", page).await.unwrap();
            assert!(cached.is_some(), "page {page} should be cached");
        }
        assert_eq!(h.fetcher.tokens().get_token("PL1", 6).as_deref(), Some("tok-50"));
    }

    #[tokio::test]
    async fn test_known_cursor_skips_walk() {
        let h = harness(MockListApi::numbered(100), MockDetailApi::default(), false);
        let source = Source::playlist("PL1");

        h.fetcher.fetch_page(&source, 2, 10).await.unwrap();
        h.fetcher.fetch_page(&source, 3, 10).await.unwrap();
        assert_eq!(h.list.offsets(), vec![0, 10, 20]);
    }

    #[tokio::test]
    async fn test_lost_cursors_walk_from_first_page() {
        let h = harness(MockListApi::numbered(100), MockDetailApi::default(), false);
        let source = Source::playlist("PL1");
        h.fetcher.fetch_page(&source, 3, 10).await.unwrap();

        // Same cache, fresh cursor store, as after a restart.
        let restarted = h.fetcher.clone().with_tokens(TokenStore::new());
        let page4 = restarted.fetch_page(&source, 4, 10).await.unwrap();

        assert_eq!(ids(&page4)[0], "v30");
        assert_eq!(h.list.offsets(), vec![0, 10, 20, 0, 10, 20, 30]);
    }

    #[tokio::test]
    async fn test_page_size_change_refetches_instead_of_slicing_cache() {
        let h = harness(MockListApi::numbered(40), MockDetailApi::default(), false);
        let source = Source::playlist("PL1");

        let at_ten = h.fetcher.fetch_page(&source, 2, 10).await.unwrap();
        assert_eq!(ids(&at_ten)[0], "v10");
        assert_eq!(at_ten.videos.len(), 10);

        let at_five = h.fetcher.fetch_page(&source, 2, 5).await.unwrap();
        assert!(!at_five.from_cache);
        assert_eq!(ids(&at_five), vec!["v5", "v6", "v7", "v8", "v9"]);
        assert_eq!(at_five.total_pages, 8);
        assert_eq!(h.list.offsets(), vec![0, 10, 0, 5]);
        assert_eq!(h.fetcher.tokens().get_token("PL1", 3).as_deref(), Some("tok-10"));

        let cached = h.fetcher.fetch_page(&source, 2, 5).await.unwrap();
        assert!(cached.from_cache);
        assert_eq!(cached.videos, at_five.videos);
    }

    #[tokio::test]
    async fn test_stale_page_of_other_size_is_not_a_fallback() {
        let h = harness(MockListApi::numbered(40), MockDetailApi::default(), false);
        let mut record = PageRecord::new(
            "PL1",
            1,
            vec![create_fallback("old", None)],
            40,
            crate::types::SourceKind::Playlist,
        )
        .with_page_size(20);
        record.fetched_at = chrono::Utc::now() - chrono::Duration::hours(3);
        h.fetcher.cache().put_record(&record).await.unwrap();
        h.list.fail();

        assert!(
            h.fetcher
                .fetch_page(&Source::playlist("PL1"), 1, 10)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_page_past_end_is_empty_and_not_cached() {
        let h = harness(MockListApi::numbered(15), MockDetailApi::default(), false);
        let source = Source::playlist("PL1");

        let page3 = h.fetcher.fetch_page(&source, 3, 10).await.unwrap();
        assert!(page3.videos.is_empty());
        assert_eq!(page3.total_results, 15);
        assert_eq!(page3.total_pages, 2);
        assert!(!page3.from_cache && !page3.fallback);
        assert!(h.fetcher.cache().get_fallback("PL1", 3).await.unwrap().is_none());
        assert_eq!(h.fetcher.tokens().get_token("PL1", 3), None);
    }

    // --------------------------------------------------------
    // Live fetch
    // --------------------------------------------------------

    #[tokio::test]
    async fn test_per_call_cap_is_followed_until_page_is_full() {
        let h = harness(
            MockListApi::numbered(30).with_cap(3),
            MockDetailApi::default(),
            false,
        );
        let page1 = h
            .fetcher
            .fetch_page(&Source::playlist("PL1"), 1, 10)
            .await
            .unwrap();

        assert_eq!(page1.videos.len(), 10);
        assert_eq!(h.list.offsets(), vec![0, 3, 6, 9]);
        assert_eq!(h.fetcher.tokens().get_token("PL1", 2).as_deref(), Some("tok-10"));
    }

    #[tokio::test]
    async fn test_duplicate_ids_keep_first_position() {
        let h = harness(
            MockListApi::with_ids(&["a", "b", "a", "c"]),
            MockDetailApi::default(),
            false,
        );
        let page = h
            .fetcher
            .fetch_page(&Source::playlist("PL1"), 1, 10)
            .await
            .unwrap();
        assert_eq!(ids(&page), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_end_of_list_removes_stale_cursor() {
        let h = harness(MockListApi::numbered(5), MockDetailApi::default(), false);
        h.fetcher.tokens().set_token("PL1", 2, "tok-999");

        h.fetcher
            .fetch_page(&Source::playlist("PL1"), 1, 10)
            .await
            .unwrap();
        assert_eq!(h.fetcher.tokens().get_token("PL1", 2), None);
    }

    // --------------------------------------------------------
    // Item failures
    // --------------------------------------------------------

    #[tokio::test]
    async fn test_partial_failure_keeps_order_and_counts() {
        let detail = MockDetailApi::default()
            .with("B", Outcome::Fail("Video is private"))
            .with("D", Outcome::Fail("network unreachable"));
        let h = harness(MockListApi::with_ids(&["A", "B", "C", "D"]), detail, false);

        let page = h
            .fetcher
            .fetch_page(&Source::playlist("PL1"), 1, 10)
            .await
            .unwrap();

        assert_eq!(ids(&page), vec!["A", "B", "C", "D"]);
        let fallback: Vec<bool> = page.videos.iter().map(|v| v.is_fallback).collect();
        assert_eq!(fallback, vec![false, true, false, true]);
        assert_eq!(
            page.videos[1].error_info.as_ref().unwrap().kind,
            ErrorKind::Private
        );
        assert_eq!(
            page.videos[3].error_info.as_ref().unwrap().kind,
            ErrorKind::NetworkError
        );

        assert_eq!(h.metrics.pages(), 1);
        assert_eq!(h.metrics.successful(), 2);
        assert_eq!(h.metrics.failed(), 2);
    }

    #[tokio::test]
    async fn test_empty_detail_is_classified_as_deleted() {
        let detail = MockDetailApi::default().with("gone", Outcome::Missing);
        let h = harness(MockListApi::with_ids(&["gone", "here"]), detail, false);

        let page = h
            .fetcher
            .fetch_page(&Source::playlist("PL1"), 1, 10)
            .await
            .unwrap();
        let info = page.videos[0].error_info.as_ref().unwrap();
        assert_eq!(info.kind, ErrorKind::Deleted);
        assert!(!info.retryable);
        assert!(page.videos[1].is_available);
    }

    #[tokio::test]
    async fn test_detail_timeout_is_network_error() {
        let detail = MockDetailApi::default().with("slow", Outcome::Slow);
        let h = harness(MockListApi::with_ids(&["slow", "fast"]), detail, false);

        let page = h
            .fetcher
            .fetch_page(&Source::playlist("PL1"), 1, 10)
            .await
            .unwrap();
        assert_eq!(
            page.videos[0].error_info.as_ref().unwrap().kind,
            ErrorKind::NetworkError
        );
        assert!(page.videos[1].is_available);
    }

    // --------------------------------------------------------
    // Failure path
    // --------------------------------------------------------

    #[tokio::test]
    async fn test_expired_page_served_as_fallback() {
        let h = harness(MockListApi::numbered(20), MockDetailApi::default(), false);
        let stale_videos = vec![create_fallback("old", None)];
        let mut record = PageRecord::new(
            "PL1",
            1,
            stale_videos.clone(),
            20,
            crate::types::SourceKind::Playlist,
        );
        record.fetched_at = chrono::Utc::now() - chrono::Duration::hours(3);
        h.fetcher.cache().put_record(&record).await.unwrap();
        h.list.fail();

        let page = h
            .fetcher
            .fetch_page(&Source::playlist("PL1"), 1, 10)
            .await
            .unwrap();
        assert!(page.from_cache);
        assert!(page.fallback);
        assert_eq!(page.videos, stale_videos);
        assert_eq!(page.total_results, 20);
    }

    #[tokio::test]
    async fn test_list_failure_without_cache_propagates() {
        let h = harness(MockListApi::numbered(20), MockDetailApi::default(), false);
        h.list.fail();

        let err = h
            .fetcher
            .fetch_page(&Source::playlist("PL1"), 1, 10)
            .await
            .unwrap_err();
        match err {
            Error::Api(msg) => assert_eq!(msg, "quotaExceeded"),
            other => panic!("Expected Api error, got {other:?}"),
        }
        assert_eq!(h.metrics.pages(), 0);
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let h = harness(MockListApi::numbered(1), MockDetailApi::default(), false);
        let source = Source::playlist("PL1");
        assert!(h.fetcher.fetch_page(&source, 0, 10).await.is_err());
        assert!(h.fetcher.fetch_page(&source, 1, 0).await.is_err());
        assert!(
            h.fetcher
                .fetch_page(&Source::playlist(""), 1, 10)
                .await
                .is_err()
        );
        assert!(h.list.offsets().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_page_size_is_rejected_without_remote_calls() {
        let h = harness(MockListApi::numbered(10), MockDetailApi::default(), false);
        let source = Source::playlist("PL1");

        for page_size in [MAX_FETCH_PAGE_SIZE + 1, usize::MAX] {
            match h.fetcher.fetch_page(&source, 1, page_size).await {
                Err(Error::Other(msg)) => assert!(msg.contains("page size")),
                other => panic!("Expected page size error, got {other:?}"),
            }
        }
        assert!(h.list.offsets().is_empty());
    }

    #[tokio::test]
    async fn test_page_larger_than_api_cap_is_assembled() {
        let h = harness(
            MockListApi::numbered(200).with_cap(MAX_PAGE_SIZE),
            MockDetailApi::default(),
            false,
        );
        let page = h
            .fetcher
            .fetch_page(&Source::playlist("PL1"), 1, 120)
            .await
            .unwrap();
        assert_eq!(page.videos.len(), 120);
        assert_eq!(h.list.offsets(), vec![0, 50, 100]);
    }

    // --------------------------------------------------------
    // Prefetch and clearing
    // --------------------------------------------------------

    #[tokio::test]
    async fn test_prefetch_populates_second_page() {
        let h = harness(MockListApi::numbered(30), MockDetailApi::default(), true);
        h.fetcher
            .fetch_page(&Source::playlist("PL1"), 1, 10)
            .await
            .unwrap();

        let mut cached = None;
        for _ in 0..100 {
            cached = h.fetcher.cache().get("PL1", 2).await.unwrap();
            if cached.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let cached = cached.expect("page 2 should be prefetched");
        assert_eq!(cached.videos[0].id, "v10");
    }

    #[tokio::test]
    async fn test_no_prefetch_when_disabled_or_single_page() {
        let h = harness(MockListApi::numbered(30), MockDetailApi::default(), false);
        h.fetcher
            .fetch_page(&Source::playlist("PL1"), 1, 10)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.list.offsets(), vec![0]);

        let h = harness(MockListApi::numbered(5), MockDetailApi::default(), true);
        h.fetcher
            .fetch_page(&Source::playlist("PL1"), 1, 10)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(h.list.offsets(), vec![0]);
    }

    #[tokio::test]
    async fn test_clear_source_drops_pages_and_cursors() {
        let h = harness(MockListApi::numbered(30), MockDetailApi::default(), false);
        let source = Source::playlist("PL1");
        h.fetcher.fetch_page(&source, 2, 10).await.unwrap();

        assert_eq!(h.fetcher.clear_source("PL1").await.unwrap(), 2);
        assert!(h.fetcher.tokens().is_empty());
        assert!(h.fetcher.cache().get_fallback("PL1", 1).await.unwrap().is_none());
    }

    // --------------------------------------------------------
    // Properties
    // --------------------------------------------------------

    proptest::proptest! {
        #[test]
        fn page_never_exceeds_page_size(
            total in 0usize..120,
            page_size in 1usize..=50,
            page in 1u32..=4,
            cap in 1usize..=60,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let h = harness(MockListApi::numbered(total).with_cap(cap), MockDetailApi::default(), false);
            let result = runtime
                .block_on(h.fetcher.fetch_page(&Source::playlist("PL1"), page, page_size))
                .unwrap();
            proptest::prop_assert!(result.videos.len() <= page_size);

            let start = (page as usize - 1) * page_size;
            let expected = total.saturating_sub(start).min(page_size);
            proptest::prop_assert_eq!(result.videos.len(), expected);
        }
    }
}
