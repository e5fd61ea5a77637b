mod common;
mod install;
mod releases;
mod search;
mod show;
mod update;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "cdb")]
#[command(about = "Install Minetest mods and modpacks from ContentDB")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install packages into the mods directory
    Install(install::InstallArgs),

    /// Reinstall installed packages at their latest release
    Update(update::UpdateArgs),

    /// Search the registry
    Search(search::SearchArgs),

    /// Show details about a package
    Show(show::ShowArgs),

    /// List the releases of a package
    Releases(releases::ReleasesArgs),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    // RUST_LOG still wins when set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run() -> Result<i32> {
    let args = Args::parse();
    init_logging(args.verbose);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::anyhow!("Failed to create async runtime: {}", e))?;

    match args.command {
        Commands::Install(install_args) => rt.block_on(install::execute(install_args)),
        Commands::Update(update_args) => rt.block_on(update::execute(update_args)),
        Commands::Search(search_args) => rt.block_on(search::execute(search_args)),
        Commands::Show(show_args) => rt.block_on(show::execute(show_args)),
        Commands::Releases(releases_args) => rt.block_on(releases::execute(releases_args)),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_install() {
        let args = Args::try_parse_from(["cdb", "-vv", "install", "sfinv", "a/b@3", "--update"]).unwrap();
        assert_eq!(args.verbose, 2);
        match args.command {
            Commands::Install(install) => {
                assert_eq!(install.packages, vec!["sfinv", "a/b@3"]);
                assert!(install.update);
                assert!(install.mods_dir.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_install_requires_a_package() {
        assert!(Args::try_parse_from(["cdb", "install"]).is_err());
    }

    #[test]
    fn test_parse_search_filters() {
        let args = Args::try_parse_from([
            "cdb", "search", "map", "server", "--tag", "mapgen", "--tag", "tools", "--format", "json",
        ])
        .unwrap();
        match args.command {
            Commands::Search(search) => {
                assert_eq!(search.terms, vec!["map", "server"]);
                assert_eq!(search.tag, vec!["mapgen", "tools"]);
                assert_eq!(search.r#type, "mod");
                assert_eq!(search.format, "json");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
