//! Install command - download packages into the mods directory.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use cdb_pm::InstallReport;

use crate::common;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Packages to install: `author/name`, `author/name@release` or a search term
    #[arg(required = true)]
    pub packages: Vec<String>,

    /// Replace packages that are already installed
    #[arg(short = 'u', long)]
    pub update: bool,

    /// Install into this directory instead of the configured one
    #[arg(long)]
    pub mods_dir: Option<PathBuf>,
}

fn print_report(report: &InstallReport) {
    println!(
        "  {} {} ({}, release {}) -> {}",
        style("+").green(),
        style(report.package.id()).white().bold(),
        report.kind,
        style(report.package.release_string()).yellow(),
        report.path.display()
    );
    for entry in &report.skipped {
        println!(
            "    {} Skipped unsafe entry {}",
            style("Warning:").yellow().bold(),
            entry
        );
    }
}

pub async fn execute(args: InstallArgs) -> Result<i32> {
    let config = common::load_config(args.mods_dir.as_deref())?;
    let installer = common::installer(&config, args.update)?;

    println!("{} Installing packages", style("ContentDB").green().bold());
    if args.update {
        println!("{} Existing packages will be replaced", style("Info:").cyan());
    }

    let spinner = common::spinner(format!("Installing {} package(s)", args.packages.len()));
    let results = installer.install_many(&args.packages).await;
    spinner.finish_and_clear();

    let mut failed = 0;
    for (identifier, result) in &results {
        match result {
            Ok(report) => print_report(report),
            Err(e) => {
                failed += 1;
                eprintln!(
                    "  {} {}: {}",
                    style("Error:").red().bold(),
                    style(identifier).white().bold(),
                    e
                );
            }
        }
    }

    if failed > 0 {
        eprintln!(
            "{} {} of {} package(s) failed",
            style("Error:").red().bold(),
            failed,
            results.len()
        );
        return Ok(1);
    }

    println!("{} Installed into {}", style("Success:").green().bold(), config.mods_dir.display());
    Ok(0)
}
