use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classifier::ErrorClassification;
use crate::{Error, Result};

/// Base URL used to build canonical watch links.
pub const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// Canonical watch URL for a video id.
#[must_use]
pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL_BASE}{video_id}")
}

/// What kind of list a [`Source`] paginates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// All uploads of a channel.
    Channel,
    /// Items of a playlist.
    Playlist,
}

impl SourceKind {
    /// Lowercase identifier used in config files and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Playlist => "playlist",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "channel" => Ok(Self::Channel),
            "playlist" => Ok(Self::Playlist),
            other => Err(Error::InvalidSource(format!(
                "unknown source kind '{other}' (expected 'channel' or 'playlist')"
            ))),
        }
    }
}

/// Identifies what is being paginated.
///
/// `id` keys the cache and the continuation cursors; `locator` is what the
/// remote API understands (a playlist id or a channel id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    /// Stable cache key for this source.
    pub id: String,
    /// Channel or playlist.
    pub kind: SourceKind,
    /// Remote identifier passed to the list API.
    pub locator: String,
}

impl Source {
    /// Create a source descriptor.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: SourceKind, locator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            locator: locator.into(),
        }
    }

    /// A playlist source keyed by its playlist id.
    #[must_use]
    pub fn playlist(playlist_id: impl Into<String>) -> Self {
        let id = playlist_id.into();
        Self::new(id.clone(), SourceKind::Playlist, id)
    }

    /// A channel source keyed by its channel id.
    #[must_use]
    pub fn channel(channel_id: impl Into<String>) -> Self {
        let id = channel_id.into();
        Self::new(id.clone(), SourceKind::Channel, id)
    }

    /// Reject descriptors the cache and the remote API cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidSource("source id is empty".to_string()));
        }
        if self.locator.trim().is_empty() {
            return Err(Error::InvalidSource(format!(
                "source '{}' has an empty locator",
                self.id
            )));
        }
        Ok(())
    }
}

/// Detail payload returned by the remote detail API for one video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    /// Video id.
    pub id: String,
    /// Video title.
    pub title: String,
    /// Preferred thumbnail, if the API reported one.
    pub thumbnail_url: Option<String>,
    /// Duration in whole seconds.
    pub duration_seconds: u64,
}

/// One entry of a resolved page.
///
/// Either a fully resolved video (`is_available`) or a placeholder produced
/// by [`crate::fallback::create_fallback`] (`is_fallback`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    /// Video id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Thumbnail reference.
    pub thumbnail_url: String,
    /// Duration in whole seconds (0 for placeholders).
    pub duration_seconds: u64,
    /// Canonical watch URL.
    pub publish_url: String,
    /// Whether the detail lookup succeeded.
    pub is_available: bool,
    /// Whether this entry is a synthesized placeholder.
    pub is_fallback: bool,
    /// Why the detail lookup failed, for placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_info: Option<ErrorClassification>,
}

impl VideoSummary {
    /// Map a resolved detail payload into an available summary.
    #[must_use]
    pub fn from_details(details: VideoDetails) -> Self {
        let thumbnail_url = details
            .thumbnail_url
            .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", details.id));
        Self {
            publish_url: watch_url(&details.id),
            id: details.id,
            title: details.title,
            thumbnail_url,
            duration_seconds: details.duration_seconds,
            is_available: true,
            is_fallback: false,
            error_info: None,
        }
    }
}

/// Response of a single remote list call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    /// Item ids in remote order.
    pub item_ids: Vec<String>,
    /// Total number of items the remote reports for the whole list.
    pub total_results: u64,
    /// Cursor for the next call, absent at the end of the list.
    pub next_token: Option<String>,
}

/// Page returned to callers of [`crate::PageFetcher::fetch_page`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// Entries in remote list order.
    pub videos: Vec<VideoSummary>,
    /// Total results the remote reported when the page was fetched.
    pub total_results: u64,
    /// 1-based page number.
    pub page_number: u32,
    /// Number of pages implied by `total_results` and the page size.
    pub total_pages: u32,
    /// Served from the page cache.
    pub from_cache: bool,
    /// Served from an expired cache entry because the remote call failed.
    pub fallback: bool,
}

impl PageResult {
    /// Whether more pages follow this one.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.page_number < self.total_pages
    }
}

/// Number of pages needed for `total_results` items.
#[must_use]
pub fn total_pages(total_results: u64, page_size: usize) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_results.div_ceil(page_size as u64);
    u32::try_from(pages).unwrap_or(u32::MAX)
}
