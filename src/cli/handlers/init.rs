use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::storage::atomic_write;

const CONFIG_TOML_TEMPLATE: &str = r##"# listmachine configuration. Every setting is optional.

[undo]
# Deleted items kept for `lm undo`, oldest dropped first
limit = {undo_limit}

[export]
# Line width in characters, checkbox included
width = {width}
lines_per_page = {lines_per_page}

[remote]
base_url = "{base_url}"
timeout_secs = {timeout_secs}
# Tries per request; transport errors, 429 and 5xx are retried
attempts = {attempts}
# First retry delay, doubled for each further retry
backoff_ms = {backoff_ms}
"##;

/// Render the template with the built-in defaults filled in.
fn render_config_toml() -> String {
    let defaults = crate::model::config::Config::default();
    CONFIG_TOML_TEMPLATE
        .replace("{undo_limit}", &defaults.undo.limit.to_string())
        .replace("{width}", &defaults.export.width.to_string())
        .replace("{lines_per_page}", &defaults.export.lines_per_page.to_string())
        .replace("{base_url}", &defaults.remote.base_url)
        .replace("{timeout_secs}", &defaults.remote.timeout_secs.to_string())
        .replace("{attempts}", &defaults.remote.attempts.to_string())
        .replace("{backoff_ms}", &defaults.remote.backoff_ms.to_string())
}

/// Write a commented config.toml. Refuses to overwrite unless `--force`.
pub fn cmd_init(config_path: &Path, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if config_path.exists() && !args.force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }
    if let Some(dir) = config_path.parent() {
        fs::create_dir_all(dir)?;
    }
    atomic_write(config_path, render_config_toml().as_bytes())?;
    println!("wrote {}", config_path.display());
    Ok(())
}
