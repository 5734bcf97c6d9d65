//! Remote list and detail APIs.
//!
//! The page fetcher only sees the [`ListApi`] and [`DetailApi`] ports.
//! [`HttpVideoApi`] implements both against a YouTube Data API shaped JSON
//! service:
//!
//! | Port                    | Endpoint                       | Ids from                      |
//! |-------------------------|--------------------------------|-------------------------------|
//! | `list` (playlist)       | `GET {base}/playlistItems`     | `items[].contentDetails.videoId` |
//! | `list` (channel)        | `GET {base}/search`            | `items[].id.videoId`          |
//! | `detail`                | `GET {base}/videos`            | `items[0]`                    |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{Config, MAX_PAGE_SIZE};
use crate::types::{ListPage, Source, SourceKind, VideoDetails};
use crate::{Error, Result};

/// One call against the remote list API.
#[async_trait]
pub trait ListApi: Send + Sync {
    /// List up to `page_size` item ids of `source`, resuming at `token`.
    ///
    /// Implementations may return fewer ids than requested together with a
    /// next token when the remote caps results per call.
    async fn list(
        &self,
        source: &Source,
        page_size: usize,
        token: Option<&str>,
    ) -> Result<ListPage>;
}

/// One call against the remote detail API.
#[async_trait]
pub trait DetailApi: Send + Sync {
    /// Details for one video, or `None` when the remote knows no such video.
    async fn detail(&self, video_id: &str) -> Result<Option<VideoDetails>>;
}

/// HTTP adapter for both remote ports.
#[derive(Debug, Clone)]
pub struct HttpVideoApi {
    client: Client,
    base_url: String,
    key: Option<String>,
}

impl HttpVideoApi {
    /// Create an adapter for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vidpage/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            key,
        })
    }

    /// Create an adapter from the `[api]` and `[fetch]` settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.api.base_url.clone(),
            config.api.key.clone(),
            config.fetch.request_timeout(),
        )
    }

    fn request(&self, endpoint: &str) -> RequestBuilder {
        let request = self.client.get(format!("{}/{endpoint}", self.base_url));
        match &self.key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder, subject: &str) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("{subject} not found")));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or(body);
            debug!("Remote API returned {status} for {subject}: {message}");
            return Err(Error::Api(format!("HTTP {status}: {message}")));
        }

        // A 200 with an unreadable body is a payload problem, not a
        // transport one.
        response.json().await.map_err(|e| {
            if e.is_decode() {
                Error::Serialization(format!("Malformed response for {subject}: {e}"))
            } else {
                Error::Network(e)
            }
        })
    }
}

#[async_trait]
impl ListApi for HttpVideoApi {
    async fn list(
        &self,
        source: &Source,
        page_size: usize,
        token: Option<&str>,
    ) -> Result<ListPage> {
        let max_results = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut request = match source.kind {
            SourceKind::Playlist => self.request("playlistItems").query(&[
                ("part", "contentDetails"),
                ("playlistId", source.locator.as_str()),
                ("maxResults", max_results.as_str()),
            ]),
            SourceKind::Channel => self.request("search").query(&[
                ("part", "id"),
                ("channelId", source.locator.as_str()),
                ("type", "video"),
                ("order", "date"),
                ("maxResults", max_results.as_str()),
            ]),
        };
        if let Some(token) = token {
            request = request.query(&[("pageToken", token)]);
        }

        let subject = format!("{} {}", source.kind, source.locator);
        let response: ListResponse = Self::send(request, &subject).await?;
        let page = response.into_list_page();
        debug!(
            "Listed {} ids for {subject} (total {}, more: {})",
            page.item_ids.len(),
            page.total_results,
            page.next_token.is_some()
        );
        Ok(page)
    }
}

#[async_trait]
impl DetailApi for HttpVideoApi {
    async fn detail(&self, video_id: &str) -> Result<Option<VideoDetails>> {
        let request = self
            .request("videos")
            .query(&[("part", "snippet,contentDetails"), ("id", video_id)]);
        let subject = format!("video {video_id}");
        let response: VideosResponse = Self::send(request, &subject).await?;
        Ok(response.items.into_iter().next().map(VideoResource::into_details))
    }
}

/// Pull `error.message` out of an API error body.
fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Envelope {
        error: ErrorBody,
    }
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }
    serde_json::from_str::<Envelope>(body)
        .ok()
        .map(|envelope| envelope.error.message)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<ListItem>,
    #[serde(default)]
    page_info: PageInfo,
    next_page_token: Option<String>,
}

impl ListResponse {
    fn into_list_page(self) -> ListPage {
        ListPage {
            item_ids: self.items.into_iter().filter_map(ListItem::video_id).collect(),
            total_results: self.page_info.total_results,
            next_token: self.next_page_token.filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    total_results: u64,
}

/// Playlist items carry the id in `contentDetails`; search results in `id`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListItem {
    content_details: Option<VideoIdHolder>,
    id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoIdHolder {
    video_id: Option<String>,
}

impl ListItem {
    fn video_id(self) -> Option<String> {
        if let Some(id) = self.content_details.and_then(|details| details.video_id) {
            return Some(id);
        }
        self.id
            .as_ref()
            .and_then(|id| id.get("videoId"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    content_details: ContentDetails,
}

#[derive(Debug, Default, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    maxres: Option<Thumbnail>,
    standard: Option<Thumbnail>,
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    /// Largest available thumbnail URL.
    fn best(self) -> Option<String> {
        [self.maxres, self.standard, self.high, self.medium, self.default]
            .into_iter()
            .flatten()
            .map(|t| t.url)
            .next()
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: String,
}

impl VideoResource {
    fn into_details(self) -> VideoDetails {
        let duration_seconds = parse_iso8601_duration(&self.content_details.duration)
            .unwrap_or_else(|| {
                debug!(
                    "Unparseable duration '{}' for {}",
                    self.content_details.duration, self.id
                );
                0
            });
        VideoDetails {
            id: self.id,
            title: self.snippet.title,
            thumbnail_url: self.snippet.thumbnails.best(),
            duration_seconds,
        }
    }
}

/// Parse an ISO-8601 duration such as `PT1H2M3S` or `P1DT30M` into seconds.
///
/// Fractional seconds are truncated. Years and months are rejected since
/// their length is ambiguous.
///
/// ```rust
/// use vidpage_core::remote::parse_iso8601_duration;
///
/// assert_eq!(parse_iso8601_duration("PT1H2M3S"), Some(3723));
/// assert_eq!(parse_iso8601_duration("P0D"), Some(0));
/// assert_eq!(parse_iso8601_duration("1:02:03"), None);
/// ```
#[must_use]
pub fn parse_iso8601_duration(value: &str) -> Option<u64> {
    let rest = value.trim().strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let mut seconds: u64 = 0;
    let mut number = String::new();
    let mut in_time = false;
    let mut saw_component = false;

    for c in rest.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            'T' if !in_time && number.is_empty() => in_time = true,
            unit => {
                if number.is_empty() {
                    return None;
                }
                let whole: u64 = number.split('.').next()?.parse().ok()?;
                let factor = match (in_time, unit) {
                    (false, 'W') => 7 * 86_400,
                    (false, 'D') => 86_400,
                    (true, 'H') => 3_600,
                    (true, 'M') => 60,
                    (true, 'S') => 1,
                    _ => return None,
                };
                seconds = seconds.checked_add(whole.checked_mul(factor)?)?;
                number.clear();
                saw_component = true;
            },
        }
    }

    (number.is_empty() && saw_component).then_some(seconds)
}
