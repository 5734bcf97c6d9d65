#![allow(clippy::cast_precision_loss)] // Averages are approximate by nature

//! Per-fetch metrics and the sinks that receive them.
//!
//! The page fetcher emits one [`FetchMetrics`] per live fetch. Sinks must not
//! block or fail: recording is fire-and-forget.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classifier::ErrorKind;
use crate::types::VideoSummary;

/// Summary of one live page fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchMetrics {
    /// Items on the page.
    pub total: usize,
    /// Items whose detail lookup succeeded.
    pub successful: usize,
    /// Items replaced by placeholders.
    pub failed: usize,
    /// Failed items per kind.
    pub failure_breakdown: BTreeMap<ErrorKind, usize>,
    /// Wall time of the fetch in milliseconds.
    pub load_time_ms: u64,
    /// Source the page belongs to.
    pub source_id: String,
    /// 1-based page number.
    pub page_number: u32,
}

impl FetchMetrics {
    /// Summarize a resolved page.
    ///
    /// Placeholders without a classification count as [`ErrorKind::Unknown`].
    #[must_use]
    pub fn from_videos(
        source_id: &str,
        page_number: u32,
        videos: &[VideoSummary],
        load_time_ms: u64,
    ) -> Self {
        let mut failure_breakdown = BTreeMap::new();
        for video in videos.iter().filter(|v| v.is_fallback) {
            let kind = video
                .error_info
                .as_ref()
                .map_or(ErrorKind::Unknown, |info| info.kind);
            *failure_breakdown.entry(kind).or_insert(0) += 1;
        }
        let failed = failure_breakdown.values().sum();
        Self {
            total: videos.len(),
            successful: videos.len() - failed,
            failed,
            failure_breakdown,
            load_time_ms,
            source_id: source_id.to_string(),
            page_number,
        }
    }

    /// Fraction of items resolved, 1.0 for an empty page.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.successful as f64 / self.total as f64
        }
    }
}

/// Receives fetch metrics.
pub trait MetricsSink: Send + Sync {
    /// Record one fetch. Must not block.
    fn record(&self, metrics: &FetchMetrics);
}

/// Emits each fetch as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetricsSink;

impl MetricsSink for TracingMetricsSink {
    fn record(&self, metrics: &FetchMetrics) {
        let breakdown = metrics
            .failure_breakdown
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect::<Vec<_>>()
            .join(",");
        info!(
            source_id = %metrics.source_id,
            page = metrics.page_number,
            total = metrics.total,
            successful = metrics.successful,
            failed = metrics.failed,
            breakdown = %breakdown,
            load_time_ms = metrics.load_time_ms,
            "page fetched"
        );
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _metrics: &FetchMetrics) {}
}

/// Aggregates fetch metrics in shared atomic counters.
///
/// Clones share the same counters, so a handle can be kept for reading while
/// another is handed to the fetcher.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder {
    pages: Arc<AtomicU64>,
    videos: Arc<AtomicU64>,
    successful: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    total_load_ms: Arc<AtomicU64>,
    failures_by_kind: Arc<[AtomicU64; ErrorKind::ALL.len()]>,
}

impl MetricsRecorder {
    /// Create a recorder with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages recorded.
    #[must_use]
    pub fn pages(&self) -> u64 {
        self.pages.load(Ordering::Relaxed)
    }

    /// Items recorded across all pages.
    #[must_use]
    pub fn videos(&self) -> u64 {
        self.videos.load(Ordering::Relaxed)
    }

    /// Items resolved across all pages.
    #[must_use]
    pub fn successful(&self) -> u64 {
        self.successful.load(Ordering::Relaxed)
    }

    /// Items replaced by placeholders across all pages.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Failures recorded for one kind.
    #[must_use]
    pub fn failures_of(&self, kind: ErrorKind) -> u64 {
        Self::slot(kind).map_or(0, |i| self.failures_by_kind[i].load(Ordering::Relaxed))
    }

    /// Average fetch time in milliseconds.
    #[must_use]
    pub fn avg_load_time_ms(&self) -> f64 {
        let pages = self.pages();
        if pages == 0 {
            0.0
        } else {
            self.total_load_ms.load(Ordering::Relaxed) as f64 / pages as f64
        }
    }

    fn slot(kind: ErrorKind) -> Option<usize> {
        ErrorKind::ALL.iter().position(|k| *k == kind)
    }
}

impl MetricsSink for MetricsRecorder {
    fn record(&self, metrics: &FetchMetrics) {
        self.pages.fetch_add(1, Ordering::Relaxed);
        self.videos.fetch_add(metrics.total as u64, Ordering::Relaxed);
        self.successful
            .fetch_add(metrics.successful as u64, Ordering::Relaxed);
        self.failed.fetch_add(metrics.failed as u64, Ordering::Relaxed);
        self.total_load_ms
            .fetch_add(metrics.load_time_ms, Ordering::Relaxed);
        for (kind, count) in &metrics.failure_breakdown {
            if let Some(i) = Self::slot(*kind) {
                self.failures_by_kind[i].fetch_add(*count as u64, Ordering::Relaxed);
            }
        }
    }
}
