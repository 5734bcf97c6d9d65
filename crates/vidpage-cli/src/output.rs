//! Rendering of fetched pages.

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use vidpage_core::PageResult;

use crate::utils::formatting::format_duration;

/// Output format for commands that print a page.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Write `page` in the requested format.
pub fn render_page<W: Write>(page: &PageResult, format: OutputFormat, writer: &mut W) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, page)?;
            writeln!(writer)?;
        },
        OutputFormat::Text => render_text(page, writer)?,
    }
    Ok(())
}

fn render_text<W: Write>(page: &PageResult, writer: &mut W) -> Result<()> {
    let origin = if page.fallback {
        " (stale cache, remote unavailable)".yellow().to_string()
    } else if page.from_cache {
        " (cached)".dimmed().to_string()
    } else {
        String::new()
    };
    writeln!(
        writer,
        "{} {}/{} · {} videos{origin}",
        "Page".bold(),
        page.page_number,
        page.total_pages,
        page.total_results
    )?;

    if page.videos.is_empty() {
        writeln!(writer, "  (no videos on this page)")?;
        return Ok(());
    }

    for (index, video) in page.videos.iter().enumerate() {
        let position = index + 1;
        if video.is_available {
            writeln!(
                writer,
                "{position:>3}. {} [{}]",
                video.title,
                format_duration(video.duration_seconds)
            )?;
            writeln!(writer, "     {}", video.publish_url.dimmed())?;
        } else {
            let kind = video
                .error_info
                .as_ref()
                .map_or_else(|| "UNKNOWN".to_string(), |info| info.kind.to_string());
            writeln!(
                writer,
                "{position:>3}. {} {}",
                video.title.red(),
                format!("[{kind}]").dimmed()
            )?;
        }
    }
    Ok(())
}
