//! Configuration management for vidpage.
//!
//! Settings live in a single TOML file with one table per concern. Every
//! field has a default, so a missing file or a partial file is fine.
//!
//! ## Resolution Order
//!
//! 1. **Defaults**: [`Config::default`]
//! 2. **Config file**: `<config_dir>/config.toml` (see [`Config::config_path`])
//! 3. **Environment variables**: `VIDPAGE_*` overrides
//!
//! ## Example Configuration File
//!
//! ```toml
//! [pagination]
//! page_size = 50
//! cache_duration_minutes = 60
//!
//! [fetch]
//! request_timeout_secs = 10
//! max_concurrent_details = 10
//! prefetch = true
//!
//! [api]
//! base_url = "https://www.googleapis.com/youtube/v3"
//! key = "..."
//!
//! [paths]
//! root = "/home/user/.local/share/vidpage"
//! ```
//!
//! ## Example
//!
//! ```rust
//! use vidpage_core::config::{Config, PaginationConfigProvider};
//!
//! let config = Config::default();
//! assert_eq!(config.pagination().page_size, 50);
//! assert_eq!(config.pagination().cache_duration_minutes, 60);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Largest page the remote list API serves in one call.
pub const MAX_PAGE_SIZE: usize = 50;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page size [`crate::PageFetcher::fetch_page`] accepts. Sizes above
/// [`MAX_PAGE_SIZE`] are assembled from several list calls.
pub const MAX_FETCH_PAGE_SIZE: usize = 1_000;

/// Default cache time-to-live in minutes.
pub const DEFAULT_CACHE_DURATION_MINUTES: u32 = 60;

/// Default base URL of the remote API.
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Overrides the directory `config.toml` is read from.
pub const ENV_CONFIG_DIR: &str = "VIDPAGE_CONFIG_DIR";
/// Overrides `paths.root`.
pub const ENV_DATA_DIR: &str = "VIDPAGE_DATA_DIR";
/// Overrides `pagination.page_size`.
pub const ENV_PAGE_SIZE: &str = "VIDPAGE_PAGE_SIZE";
/// Overrides `pagination.cache_duration_minutes`.
pub const ENV_CACHE_MINUTES: &str = "VIDPAGE_CACHE_MINUTES";
/// Overrides `api.key`.
pub const ENV_API_KEY: &str = "VIDPAGE_API_KEY";

const CONFIG_FILE_NAME: &str = "config.toml";

/// Page size and cache lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Items per page (1 to [`MAX_PAGE_SIZE`]).
    pub page_size: usize,
    /// How long a cached page counts as fresh. Typical values are 30 to 90.
    pub cache_duration_minutes: u32,
}

impl PaginationConfig {
    /// Cache time-to-live as a `chrono` duration.
    #[must_use]
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.cache_duration_minutes))
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            cache_duration_minutes: DEFAULT_CACHE_DURATION_MINUTES,
        }
    }
}

/// Supplies pagination settings to the cache and the fetcher.
pub trait PaginationConfigProvider: Send + Sync {
    /// Current pagination settings.
    fn pagination(&self) -> PaginationConfig;
}

impl PaginationConfigProvider for PaginationConfig {
    fn pagination(&self) -> PaginationConfig {
        *self
    }
}

impl PaginationConfigProvider for Config {
    fn pagination(&self) -> PaginationConfig {
        self.pagination
    }
}

/// Remote call behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Timeout applied to every remote call, in seconds.
    pub request_timeout_secs: u64,
    /// Upper bound on detail calls in flight for one page.
    pub max_concurrent_details: usize,
    /// Resolve page 2 in the background after serving page 1.
    pub prefetch: bool,
}

impl FetchSettings {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            max_concurrent_details: 10,
            prefetch: true,
        }
    }
}

/// Remote API endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL the HTTP adapter appends endpoint names to.
    pub base_url: String,
    /// Request key sent as the `key` query parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            key: None,
        }
    }
}

/// File system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root directory of the file page store.
    pub root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let root = directories::ProjectDirs::from("dev", "vidpage", "vidpage").map_or_else(
            || {
                directories::BaseDirs::new().map_or_else(
                    || PathBuf::from(".vidpage"),
                    |base| base.home_dir().join(".vidpage"),
                )
            },
            |dirs| dirs.data_dir().to_path_buf(),
        );
        Self { root }
    }
}

/// Complete vidpage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page size and cache lifetime.
    pub pagination: PaginationConfig,
    /// Remote call behavior.
    pub fetch: FetchSettings,
    /// Remote API endpoint.
    pub api: ApiConfig,
    /// File system locations.
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Falls back to defaults when no file exists, then applies `VIDPAGE_*`
    /// environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, if
    /// an environment override is malformed, or if validation fails.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            debug!("No config at {}, using defaults", config_path.display());
            Self::default()
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file without applying overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the config cannot
    /// be serialized, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content).map_err(|e| Error::Config(format!("Failed to write config: {e}")))
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))
    }

    /// Path of the config file.
    ///
    /// `$VIDPAGE_CONFIG_DIR/config.toml` when set, otherwise the platform
    /// config directory (for example `~/.config/vidpage/config.toml` on Linux).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir).join(CONFIG_FILE_NAME));
        }
        let project_dirs = directories::ProjectDirs::from("dev", "vidpage", "vidpage")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(project_dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Apply `VIDPAGE_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric override does not parse.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup; empty values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(root) = get(ENV_DATA_DIR) {
            self.paths.root = PathBuf::from(root);
        }
        if let Some(size) = get(ENV_PAGE_SIZE) {
            self.pagination.page_size = size.trim().parse().map_err(|e| {
                Error::Config(format!("Invalid {ENV_PAGE_SIZE} value '{size}': {e}"))
            })?;
        }
        if let Some(minutes) = get(ENV_CACHE_MINUTES) {
            self.pagination.cache_duration_minutes = minutes.trim().parse().map_err(|e| {
                Error::Config(format!("Invalid {ENV_CACHE_MINUTES} value '{minutes}': {e}"))
            })?;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.api.key = Some(key);
        }
        Ok(())
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        let page_size = self.pagination.page_size;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }
        if self.pagination.cache_duration_minutes == 0 {
            return Err(Error::Config(
                "cache_duration_minutes must be at least 1".to_string(),
            ));
        }
        if self.fetch.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.fetch.max_concurrent_details == 0 {
            return Err(Error::Config(
                "max_concurrent_details must be at least 1".to_string(),
            ));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(Error::Config("api.base_url is empty".to_string()));
        }
        Ok(())
    }
}
