//! Storage port for the page cache and its adapters.
//!
//! The cache never touches storage directly; it talks to a [`PageStore`].
//! Two adapters ship with the crate:
//!
//! - [`MemoryPageStore`]: a process-local map, isolated per instance
//! - [`FilePageStore`]: one JSON file per page, survives restarts
//!
//! ## File Layout
//!
//! ```text
//! <root>/sources/<sanitized_id>-<hash>/
//!   pages/
//!     page-1.json
//!     page-2.json
//! ```
//!
//! The directory name pairs a readable form of the source id with a short
//! SHA-256 prefix of the raw id, so ids that sanitize alike still get
//! separate directories. Every record also carries its own key, and reads
//! or deletes skip records whose key does not match.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{PageKey, PageRecord};
use crate::{Error, Result};

/// Durable key-value storage for page records.
///
/// Implementations must replace records wholesale on `put` so a concurrent
/// reader sees either the old record or the new one, never a mix.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Load the record stored under `key`, if any.
    async fn get(&self, key: &PageKey) -> Result<Option<PageRecord>>;

    /// Store `record` under `key`, replacing any previous record.
    async fn put(&self, key: &PageKey, record: &PageRecord) -> Result<()>;

    /// Delete the record under `key`. Missing keys are not an error.
    async fn delete(&self, key: &PageKey) -> Result<()>;

    /// Delete every record of `source_id` and return how many were removed.
    async fn delete_by_prefix(&self, source_id: &str) -> Result<usize>;

    /// Load every stored record.
    async fn scan_all(&self) -> Result<Vec<PageRecord>>;
}

/// In-memory page store.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    records: RwLock<HashMap<PageKey, PageRecord>>,
}

impl MemoryPageStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageStore for MemoryPageStore {
    async fn get(&self, key: &PageKey) -> Result<Option<PageRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: &PageKey, record: &PageRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(key.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, key: &PageKey) -> Result<()> {
        self.records.write().await.remove(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, source_id: &str) -> Result<usize> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|key, _| key.source_id != source_id);
        Ok(before - records.len())
    }

    async fn scan_all(&self) -> Result<Vec<PageRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }
}

/// File-backed page store with atomic writes.
///
/// Operations are not coordinated across processes; two processes writing
/// the same page resolve as last-write-wins.
#[derive(Debug, Clone)]
pub struct FilePageStore {
    root: PathBuf,
}

impl FilePageStore {
    /// Create a store rooted at `root` (usually the vidpage data directory).
    ///
    /// ```rust
    /// use vidpage_core::page_cache::FilePageStore;
    ///
    /// let store = FilePageStore::new("/tmp/vidpage");
    /// assert_eq!(store.root().to_str(), Some("/tmp/vidpage"));
    /// ```
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sources_dir(&self) -> PathBuf {
        self.root.join("sources")
    }

    /// Returns `sources/<source_dir_name>`.
    fn source_dir(&self, source_id: &str) -> PathBuf {
        self.sources_dir().join(source_dir_name(source_id))
    }

    /// Returns `sources/<source_dir_name>/pages`.
    fn pages_dir(&self, source_id: &str) -> PathBuf {
        self.source_dir(source_id).join("pages")
    }

    fn page_path(&self, key: &PageKey) -> PathBuf {
        self.pages_dir(&key.source_id)
            .join(format!("page-{}.json", key.page_number))
    }

    async fn read_record(path: &Path) -> Result<PageRecord> {
        let json = fs::read_to_string(path).await.map_err(|e| {
            Error::Storage(format!("Failed to read page file {}: {e}", path.display()))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            Error::Storage(format!("Failed to parse page file {}: {e}", path.display()))
        })
    }

    /// Read every page file in one source's `pages/` directory.
    async fn scan_pages_dir(dir: &Path) -> Result<Vec<(PathBuf, PageRecord)>> {
        let mut out = Vec::new();
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(out),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to read pages directory: {e}"
                )));
            },
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Storage(format!("Failed to read directory entry: {e}")))?
        {
            let path = entry.path();

            // Skip non-JSON files and temp files
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            match Self::read_record(&path).await {
                Ok(record) => out.push((path, record)),
                Err(e) => warn!("Skipping unreadable page file: {e}"),
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl PageStore for FilePageStore {
    async fn get(&self, key: &PageKey) -> Result<Option<PageRecord>> {
        let path = self.page_path(key);
        match fs::try_exists(&path).await {
            Ok(true) => {},
            Ok(false) => return Ok(None),
            Err(e) => return Err(Error::Storage(format!("Failed to stat page {key}: {e}"))),
        }
        let record = Self::read_record(&path).await?;
        if record.key() != *key {
            warn!("Page file for {key} holds {}; ignoring it", record.key());
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn put(&self, key: &PageKey, record: &PageRecord) -> Result<()> {
        let pages_dir = self.pages_dir(&key.source_id);
        fs::create_dir_all(&pages_dir)
            .await
            .map_err(|e| Error::Storage(format!("Failed to create pages directory: {e}")))?;

        let path = self.page_path(key);
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| Error::Storage(format!("Failed to serialize page: {e}")))?;

        // Atomic write: temp file + rename
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write temp page file: {e}")))?;

        // Handle Windows: remove target before rename
        #[cfg(target_os = "windows")]
        if fs::try_exists(&path).await.unwrap_or(false) {
            fs::remove_file(&path)
                .await
                .map_err(|e| Error::Storage(format!("Failed to remove existing page: {e}")))?;
        }

        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| Error::Storage(format!("Failed to commit page file: {e}")))?;

        debug!("Saved page {key}");
        Ok(())
    }

    async fn delete(&self, key: &PageKey) -> Result<()> {
        match fs::remove_file(self.page_path(key)).await {
            Ok(()) => {
                debug!("Deleted page {key}");
                Ok(())
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("Failed to delete page {key}: {e}"))),
        }
    }

    async fn delete_by_prefix(&self, source_id: &str) -> Result<usize> {
        let mut count = 0;
        let mut foreign = 0;
        for (path, record) in Self::scan_pages_dir(&self.pages_dir(source_id)).await? {
            if record.source_id != source_id {
                foreign += 1;
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => count += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {},
                Err(e) => {
                    return Err(Error::Storage(format!(
                        "Failed to delete page file {}: {e}",
                        path.display()
                    )));
                },
            }
        }

        // Leftover temp or corrupt files go with the directory, foreign
        // records stay.
        if foreign == 0 {
            match fs::remove_dir_all(self.source_dir(source_id)).await {
                Ok(()) => {},
                Err(e) if e.kind() == ErrorKind::NotFound => {},
                Err(e) => {
                    return Err(Error::Storage(format!(
                        "Failed to delete source directory for {source_id}: {e}"
                    )));
                },
            }
        } else {
            warn!("Kept {foreign} page files of other sources in the directory of {source_id}");
        }

        debug!("Deleted {count} pages for {source_id}");
        Ok(count)
    }

    async fn scan_all(&self) -> Result<Vec<PageRecord>> {
        let mut records = Vec::new();
        let mut sources = match fs::read_dir(self.sources_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(records),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "Failed to read sources directory: {e}"
                )));
            },
        };

        while let Some(entry) = sources
            .next_entry()
            .await
            .map_err(|e| Error::Storage(format!("Failed to read directory entry: {e}")))?
        {
            let pages = Self::scan_pages_dir(&entry.path().join("pages")).await?;
            records.extend(pages.into_iter().map(|(_, record)| record));
        }

        debug!("Scanned {} cached pages", records.len());
        Ok(records)
    }
}

/// Directory name for a source: `<sanitized>-<12 hex chars of SHA-256>`.
///
/// ```rust
/// use vidpage_core::page_cache::source_dir_name;
///
/// assert!(source_dir_name("PL1").starts_with("PL1-"));
/// assert_ne!(source_dir_name("a/b"), source_dir_name("a_b"));
/// ```
#[must_use]
pub fn source_dir_name(source_id: &str) -> String {
    let digest = Sha256::digest(source_id.as_bytes());
    let hash = digest.iter().take(6).fold(String::new(), |mut acc, b| {
        // write! to String is infallible
        let _ = write!(acc, "{b:02x}");
        acc
    });
    format!("{}-{hash}", sanitize_source_id(source_id))
}

/// Readable, filesystem-safe form of a source id.
///
/// Only ASCII alphanumerics, `_` and `-` survive; everything else becomes
/// `_`. An empty id maps to `_`. Distinct ids can sanitize alike; see
/// [`source_dir_name`] for the collision-free directory name.
#[must_use]
pub fn sanitize_source_id(source_id: &str) -> String {
    let sanitized: String = source_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}
