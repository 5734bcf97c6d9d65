//! Placeholder records for videos whose detail lookup failed.
//!
//! Placeholders keep their original position in a page, so totals and page
//! math stay consistent even when part of a page cannot be resolved.

use crate::classifier::ErrorClassification;
use crate::types::{VideoSummary, watch_url};

/// Thumbnail reference used for every placeholder.
pub const PLACEHOLDER_THUMBNAIL: &str = "/placeholder-thumbnail.svg";

/// Title shown for a placeholder.
#[must_use]
pub fn fallback_title(video_id: &str) -> String {
    format!("Video {video_id} (Unavailable)")
}

/// Build a placeholder summary for `video_id`.
///
/// Two calls with the same id produce identical records apart from the
/// timestamp inside `classification`.
///
/// ```rust
/// use vidpage_core::fallback::{create_fallback, PLACEHOLDER_THUMBNAIL};
///
/// let video = create_fallback("dQw4w9WgXcQ", None);
/// assert_eq!(video.title, "Video dQw4w9WgXcQ (Unavailable)");
/// assert_eq!(video.thumbnail_url, PLACEHOLDER_THUMBNAIL);
/// assert!(video.is_fallback && !video.is_available);
/// ```
#[must_use]
pub fn create_fallback(
    video_id: &str,
    classification: Option<ErrorClassification>,
) -> VideoSummary {
    VideoSummary {
        id: video_id.to_string(),
        title: fallback_title(video_id),
        thumbnail_url: PLACEHOLDER_THUMBNAIL.to_string(),
        duration_seconds: 0,
        publish_url: watch_url(video_id),
        is_available: false,
        is_fallback: true,
        error_info: classification,
    }
}
