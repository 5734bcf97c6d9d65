#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

#[allow(dead_code)]
fn shared_dir() -> &'static Path {
    static DIR: OnceLock<TempDir> = OnceLock::new();
    DIR.get_or_init(|| tempfile::tempdir().expect("failed to create data dir for tests"))
        .path()
}

/// Create a configured `vidpage` command isolated from the user's config
/// and cache.
#[allow(dead_code)]
pub fn vidpage_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vidpage"));
    cmd.timeout(CMD_TIMEOUT);
    let dir = shared_dir();
    cmd.env("VIDPAGE_DATA_DIR", dir);
    cmd.env("VIDPAGE_CONFIG_DIR", dir);
    cmd.env_remove("VIDPAGE_CONFIG");
    cmd.env_remove("VIDPAGE_PAGE_SIZE");
    cmd.env_remove("VIDPAGE_CACHE_MINUTES");
    cmd.env_remove("VIDPAGE_API_KEY");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[allow(dead_code)]
pub fn vidpage_cmd_with_dirs(data_dir: &Path, config_dir: &Path) -> Command {
    let mut cmd = vidpage_cmd();
    cmd.env("VIDPAGE_DATA_DIR", data_dir);
    cmd.env("VIDPAGE_CONFIG_DIR", config_dir);
    cmd
}

/// Write a `config.toml` pointing the HTTP adapter at `base_url`.
#[allow(dead_code)]
pub fn write_config(config_dir: &Path, base_url: &str, page_size: usize) {
    let contents = format!(
        "[pagination]\npage_size = {page_size}\ncache_duration_minutes = 60\n\n\
         [fetch]\nrequest_timeout_secs = 5\n\n\
         [api]\nbase_url = \"{base_url}\"\nkey = \"test-key\"\n"
    );
    std::fs::write(config_dir.join("config.toml"), contents).expect("write config");
}
