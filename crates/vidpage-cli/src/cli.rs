//! # CLI Structure and Argument Parsing
//!
//! `vidpage` is built with `clap` derive macros. Global options apply to every
//! subcommand.
//!
//! ## Usage Patterns
//!
//! ```bash
//! # First page of a playlist
//! vidpage fetch PLxyz
//!
//! # Page 3 of a channel's uploads as JSON
//! vidpage fetch UCxyz --kind channel --page 3 --format json
//!
//! # Cache maintenance
//! vidpage clear PLxyz
//! vidpage sweep
//!
//! # Effective configuration
//! vidpage config
//! ```
//!
//! ## Output Formats
//!
//! - **text**: Human-readable listing (default)
//! - **json**: The page as JSON on stdout; logs stay on stderr

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use vidpage_core::SourceKind;

use crate::output::OutputFormat;

/// Main CLI structure for the `vidpage` command.
#[derive(Parser, Clone, Debug)]
#[command(name = "vidpage")]
#[command(version)]
#[command(about = "vidpage - cached, page-numbered browsing of channel and playlist videos", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Root directory of the page cache (overrides `paths.root`)
    #[arg(long = "data-dir", global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to configuration file (overrides autodiscovery). Also via `VIDPAGE_CONFIG`.
    #[arg(long, global = true, value_name = "FILE", env = "VIDPAGE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Fetch one page of a playlist or channel
    Fetch(FetchArgs),

    /// Remove every cached page of a source
    Clear {
        /// Source id the pages were cached under
        source_id: String,
    },

    /// Delete cached pages older than the cache duration
    Sweep,

    /// Print the effective configuration as TOML
    Config {
        /// Print the config file location instead
        #[arg(long)]
        path: bool,
    },
}

/// Arguments for `vidpage fetch`.
#[derive(Args, Clone, Debug)]
pub struct FetchArgs {
    /// Playlist id or channel id
    pub locator: String,

    /// What the locator refers to
    #[arg(long, value_enum, default_value_t = KindArg::Playlist)]
    pub kind: KindArg,

    /// Cache key for the source (defaults to the locator)
    #[arg(long)]
    pub id: Option<String>,

    /// 1-based page number
    #[arg(short = 'p', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Items per page (defaults to `pagination.page_size`)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub page_size: Option<u16>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Source kind as accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    Playlist,
    Channel,
}

impl From<KindArg> for SourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Playlist => Self::Playlist,
            KindArg::Channel => Self::Channel,
        }
    }
}
