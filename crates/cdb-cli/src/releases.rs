//! Releases command - list the releases of a package.

use anyhow::Result;
use clap::Args;
use console::style;

use cdb_pm::Registry;

use crate::common;

#[derive(Args, Debug)]
pub struct ReleasesArgs {
    /// Package as `author/name`
    pub package: String,

    /// Output format: text or json
    #[arg(short = 'f', long, default_value = "text")]
    pub format: String,
}

pub async fn execute(args: ReleasesArgs) -> Result<i32> {
    if args.format != "text" && args.format != "json" {
        eprintln!("Unsupported format \"{}\". See help for supported formats.", args.format);
        return Ok(1);
    }

    let (author, name) = common::parse_author_name(&args.package)?;
    let config = common::load_config(None)?;
    let registry = common::registry(&config)?;

    let releases = registry.list_releases(&author, &name).await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string(&releases)?);
        return Ok(0);
    }

    if releases.is_empty() {
        println!("{} {} has no releases", style("Info:").cyan(), args.package);
        return Ok(0);
    }

    let id_width = releases.iter().map(|r| r.id.to_string().len()).max().unwrap_or(0);
    for release in &releases {
        println!(
            "{}  {}  {}",
            style(format!("{:>width$}", release.id, width = id_width)).yellow(),
            release.release_date.as_deref().unwrap_or("-"),
            release.title
        );
    }

    Ok(0)
}
