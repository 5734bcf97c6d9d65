//! Cache clearing for a single source

use std::io::{self, Write};

use anyhow::Result;
use colored::Colorize;
use vidpage_core::{Config, PageCache};

use crate::utils::formatting::pages;
use crate::utils::settings::open_cache;

/// Remove every cached page of `source_id`.
pub async fn execute(source_id: &str, config: &Config) -> Result<()> {
    let cache = open_cache(config);
    execute_clear(&cache, source_id, io::stdout()).await?;
    Ok(())
}

/// Core clear implementation with an injectable writer. Returns the number
/// of pages removed.
pub async fn execute_clear<W: Write>(
    cache: &PageCache,
    source_id: &str,
    mut writer: W,
) -> Result<usize> {
    let removed = cache.clear_source(source_id).await?;
    if removed == 0 {
        writeln!(writer, "{} No cached pages for {source_id}", "ℹ".blue())?;
    } else {
        writeln!(
            writer,
            "{} Removed {} for {source_id}",
            "✓".green(),
            pages(removed)
        )?;
    }
    Ok(removed)
}
