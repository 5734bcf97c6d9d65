//! Config resolution from CLI flags.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use vidpage_core::Config;
use vidpage_core::page_cache::{FilePageStore, PageCache};

/// Load the effective configuration.
///
/// `--config` replaces autodiscovery, `VIDPAGE_*` variables apply on top and
/// `--data-dir` wins over both for the cache root.
pub fn load_config(config_file: Option<&Path>, data_dir: Option<&Path>) -> Result<Config> {
    let mut config = match config_file {
        Some(path) => {
            let mut config = Config::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.apply_env_overrides()?;
            config
        },
        None => Config::load()?,
    };

    if let Some(dir) = data_dir {
        config.paths.root = dir.to_path_buf();
    }
    config.validate()?;
    Ok(config)
}

/// Location of the config file that applies to this invocation.
pub fn config_location(config_file: Option<&Path>) -> Result<PathBuf> {
    match config_file {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(Config::config_path()?),
    }
}

/// File-backed page cache rooted at `paths.root`.
pub fn open_cache(config: &Config) -> PageCache {
    PageCache::new(
        Arc::new(FilePageStore::new(&config.paths.root)),
        config.pagination.cache_ttl(),
    )
}
