//! Show command - print a package's registry record.

use anyhow::Result;
use clap::Args;
use console::style;

use cdb_pm::{Package, Registry};

use crate::common;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Package as `author/name`
    pub package: String,

    /// Output format: text or json
    #[arg(short = 'f', long, default_value = "text")]
    pub format: String,
}

fn detail_lines(package: &Package) -> Vec<(&'static str, String)> {
    let mut lines = vec![
        ("name", package.id()),
        ("title", package.title.clone()),
        ("descrip.", package.short_description.clone()),
    ];

    let optional = [
        ("type", package.package_type.clone()),
        ("release", package.release.map(|r| r.to_string())),
        ("license", package.license.clone()),
        ("media", package.media_license.clone()),
        ("source", package.repo.clone()),
        ("issues", package.issue_tracker.clone()),
        ("website", package.url.clone()),
        ("downloads", package.downloads.map(|d| d.to_string())),
    ];
    lines.extend(
        optional
            .into_iter()
            .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v))),
    );

    if !package.tags.is_empty() {
        lines.push(("tags", package.tags.join(", ")));
    }
    if !package.provides.is_empty() {
        lines.push(("provides", package.provides.join(", ")));
    }

    lines
}

pub async fn execute(args: ShowArgs) -> Result<i32> {
    if args.format != "text" && args.format != "json" {
        eprintln!("Unsupported format \"{}\". See help for supported formats.", args.format);
        return Ok(1);
    }

    let (author, name) = common::parse_author_name(&args.package)?;
    let config = common::load_config(None)?;
    let registry = common::registry(&config)?;

    let package = registry.get_package(&author, &name).await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&package)?);
        return Ok(0);
    }

    for (key, value) in detail_lines(&package) {
        println!("{} : {}", style(format!("{:<9}", key)).cyan(), value);
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_lines_skip_missing_fields() {
        let mut package = Package::new("rubenwardy", "sfinv");
        package.title = "Simple Fast Inventory".to_string();
        package.release = Some(42);
        package.license = Some(String::new());
        package.tags = vec!["inventory".to_string(), "library".to_string()];

        let lines = detail_lines(&package);
        let keys: Vec<_> = lines.iter().map(|(k, _)| *k).collect();

        assert_eq!(keys, vec!["name", "title", "descrip.", "release", "tags"]);
        assert_eq!(lines[0].1, "rubenwardy/sfinv");
        assert_eq!(lines[3].1, "42");
        assert_eq!(lines[4].1, "inventory, library");
    }
}
