//! Page fetch command

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use vidpage_core::{
    Config, FetcherOptions, HttpVideoApi, PageFetcher, Source, TracingMetricsSink,
};

use crate::cli::FetchArgs;
use crate::output::render_page;
use crate::utils::settings::open_cache;

/// Resolve one page and print it to stdout.
pub async fn execute(args: FetchArgs, config: &Config) -> Result<()> {
    let api = Arc::new(HttpVideoApi::from_config(config)?);
    let cache = open_cache(config);

    // The process exits right after printing, so a background prefetch would
    // be cancelled before it finishes.
    let options = FetcherOptions {
        prefetch: false,
        ..FetcherOptions::from(config.fetch)
    };
    let fetcher = PageFetcher::new(api.clone(), api, cache, Arc::new(config.clone()))
        .with_metrics(Arc::new(TracingMetricsSink))
        .with_options(options);

    let source = source_from_args(&args);
    let page_size = page_size_from_args(&args, config);
    let page = fetcher
        .fetch_page(&source, args.page, page_size)
        .await
        .with_context(|| format!("Failed to fetch page {} of {}", args.page, source.id))?;

    let mut stdout = io::stdout().lock();
    render_page(&page, args.format, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn source_from_args(args: &FetchArgs) -> Source {
    let id = args.id.clone().unwrap_or_else(|| args.locator.clone());
    Source::new(id, args.kind.into(), args.locator.clone())
}

fn page_size_from_args(args: &FetchArgs, config: &Config) -> usize {
    args.page_size
        .map_or(config.pagination.page_size, usize::from)
}
