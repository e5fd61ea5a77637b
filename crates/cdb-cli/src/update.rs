//! Update command - reinstall installed packages at their latest release.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::{Path, PathBuf};

use cdb_pm::installer::lookup_mod;
use cdb_pm::Config;

use crate::common;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Installed mod directories or mod names
    #[arg(required = true)]
    pub mods: Vec<String>,

    /// Look in this directory before the game directories
    #[arg(long)]
    pub mods_dir: Option<PathBuf>,
}

/// Find the directory of an installed mod.
///
/// An existing path is used as is, then a directory of that name in the
/// mods directory, then the game directories are searched.
fn locate(target: &str, config: &Config) -> cdb_pm::Result<PathBuf> {
    let path = Path::new(target);
    if path.is_dir() {
        return Ok(path.to_path_buf());
    }

    let in_mods_dir = config.mods_dir.join(target);
    if in_mods_dir.is_dir() {
        return Ok(in_mods_dir);
    }

    lookup_mod(target, &config.game_dirs)
}

pub async fn execute(args: UpdateArgs) -> Result<i32> {
    let config = common::load_config(args.mods_dir.as_deref())?;
    let installer = common::installer(&config, true)?;

    println!("{} Updating packages", style("ContentDB").green().bold());

    let mut failed = 0;
    for target in &args.mods {
        let result = match locate(target, &config) {
            Ok(dir) => {
                log::debug!("Updating {} at {}", target, dir.display());
                let spinner = common::spinner(format!("Updating {}", target));
                let result = installer.update_one(&dir).await;
                spinner.finish_and_clear();
                result
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(report) => println!(
                "  {} {} (release {}) -> {}",
                style("~").green(),
                style(report.package.id()).white().bold(),
                style(report.package.release_string()).yellow(),
                report.path.display()
            ),
            Err(e) => {
                failed += 1;
                eprintln!(
                    "  {} {}: {}",
                    style("Error:").red().bold(),
                    style(target).white().bold(),
                    e
                );
            }
        }
    }

    Ok(if failed > 0 { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_with(mods_dir: &Path, game_dir: &Path) -> Config {
        let mut config = Config::default();
        config.mods_dir = mods_dir.to_path_buf();
        config.game_dirs = vec![game_dir.to_path_buf()];
        config
    }

    #[test]
    fn test_locate_prefers_existing_path() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("somewhere");
        std::fs::create_dir_all(&dir).unwrap();

        let config = config_with(&temp.path().join("mods"), &temp.path().join("game"));
        let target = dir.to_string_lossy().to_string();
        assert_eq!(locate(&target, &config).unwrap(), dir);
    }

    #[test]
    fn test_locate_in_mods_dir_then_game_dirs() {
        let temp = TempDir::new().unwrap();
        let mods = temp.path().join("mods");
        let game = temp.path().join("game");
        std::fs::create_dir_all(mods.join("local")).unwrap();
        std::fs::create_dir_all(game.join("mods").join("shipped")).unwrap();

        let config = config_with(&mods, &game);
        assert_eq!(locate("local", &config).unwrap(), mods.join("local"));
        assert_eq!(
            locate("shipped", &config).unwrap(),
            game.join("mods").join("shipped")
        );
        assert!(locate("missing", &config).unwrap_err().is_not_found());
    }
}
