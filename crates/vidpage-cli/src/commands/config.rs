//! Effective configuration display

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use vidpage_core::Config;

use crate::utils::settings::config_location;

/// Print the effective configuration, or the config file path with `--path`.
pub fn execute(config: &Config, config_file: Option<&Path>, show_path: bool) -> Result<()> {
    execute_config(config, config_file, show_path, io::stdout())
}

/// Core implementation with an injectable writer.
pub fn execute_config<W: Write>(
    config: &Config,
    config_file: Option<&Path>,
    show_path: bool,
    mut writer: W,
) -> Result<()> {
    if show_path {
        writeln!(writer, "{}", config_location(config_file)?.display())?;
        return Ok(());
    }

    let mut shown = config.clone();
    if shown.api.key.is_some() {
        shown.api.key = Some("<redacted>".to_string());
    }
    write!(writer, "{}", shown.to_toml()?)?;
    Ok(())
}
