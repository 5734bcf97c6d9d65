//! Removal of expired cache entries

use std::io::{self, Write};

use anyhow::Result;
use colored::Colorize;
use vidpage_core::{Config, PageCache};

use crate::utils::formatting::pages;
use crate::utils::settings::open_cache;

/// Delete every cached page older than the cache duration.
pub async fn execute(config: &Config) -> Result<()> {
    let cache = open_cache(config);
    execute_sweep(&cache, io::stdout()).await?;
    Ok(())
}

/// Core sweep implementation with an injectable writer.
pub async fn execute_sweep<W: Write>(cache: &PageCache, mut writer: W) -> Result<usize> {
    let removed = cache.clear_expired().await?;
    writeln!(
        writer,
        "{} Removed {} older than {} minutes",
        "✓".green(),
        pages(removed),
        cache.ttl().num_minutes()
    )?;
    Ok(removed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use vidpage_core::{PageRecord, PaginationConfig, SourceKind};

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        colored::control::set_override(false);
        let cache = PageCache::in_memory(PaginationConfig::default().cache_ttl());

        cache
            .put("PL1", 1, Vec::new(), 0, SourceKind::Playlist)
            .await
            .unwrap();
        let mut old = PageRecord::new("PL1", 2, Vec::new(), 0, SourceKind::Playlist);
        old.fetched_at = old.fetched_at - cache.ttl() - cache.ttl();
        cache.put_record(&old).await.unwrap();

        let mut out = Vec::new();
        assert_eq!(execute_sweep(&cache, &mut out).await.unwrap(), 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "✓ Removed 1 page older than 60 minutes\n"
        );
        assert!(cache.get("PL1", 1).await.unwrap().is_some());
    }
}
