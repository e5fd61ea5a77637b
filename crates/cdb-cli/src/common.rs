//! Helpers shared by the subcommands.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cdb_pm::{Config, ContentDbClient, InstallConfig, Installer, PackageSpec};
use indicatif::{ProgressBar, ProgressStyle};

/// Load configuration, applying a `--mods-dir` override
pub fn load_config(mods_dir: Option<&Path>) -> Result<Config> {
    let mut config = Config::build(true).context("Failed to load configuration")?;
    if let Some(dir) = mods_dir {
        config.set_mods_dir(dir);
    }
    log::debug!("Registry: {}, mods directory: {}", config.host, config.mods_dir.display());
    Ok(config)
}

pub fn registry(config: &Config) -> Result<ContentDbClient> {
    ContentDbClient::with_config(config.http_config()).context("Failed to create registry client")
}

pub fn installer(config: &Config, overwrite: bool) -> Result<Installer> {
    Ok(Installer::new(
        Arc::new(registry(config)?),
        InstallConfig {
            install_root: config.mods_dir.clone(),
            overwrite,
        },
    ))
}

/// Parse an exact `author/name` identifier
pub fn parse_author_name(identifier: &str) -> Result<(String, String)> {
    let spec = PackageSpec::parse(identifier)?;
    match (spec.author, spec.release) {
        (Some(author), None) => Ok((author, spec.name)),
        _ => bail!("Expected a package as author/name, got \"{}\"", identifier),
    }
}

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message.into());
    spinner
}

/// Cut `text` to at most `max_len` characters, marking the cut with "..."
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(3);
    format!("{}...", text.chars().take(keep).collect::<String>())
}

pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(80)
}
