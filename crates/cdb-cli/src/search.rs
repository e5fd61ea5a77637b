//! Search command - query ContentDB for packages.

use anyhow::Result;
use clap::Args;

use cdb_pm::{Package, Query, Registry};

use crate::common;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search terms
    #[arg(required = true)]
    pub terms: Vec<String>,

    /// Package type to search for (mod, game, txp)
    #[arg(short = 't', long, default_value = "mod")]
    pub r#type: String,

    /// Only list packages by this author
    #[arg(short = 'a', long)]
    pub author: Option<String>,

    /// Require a tag (repeatable)
    #[arg(long)]
    pub tag: Vec<String>,

    /// Maximum number of results
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Output format: text or json
    #[arg(short = 'f', long, default_value = "text")]
    pub format: String,
}

fn is_valid_format(format: &str) -> bool {
    format == "text" || format == "json"
}

fn build_query(args: &SearchArgs) -> Query {
    let mut query = Query::new(args.terms.join(" "))
        .with_type(args.r#type.as_str())
        .with_tags(args.tag.iter())
        .sort_by("score")
        .order_by("desc");

    if let Some(author) = &args.author {
        query = query.with_author(author.as_str());
    }
    if let Some(limit) = args.limit {
        query = query.with_limit(limit);
    }

    query
}

fn format_line(package: &Package, id_length: usize, terminal_width: usize) -> String {
    let id = package.id();
    let padding = " ".repeat(id_length.saturating_sub(id.len()));
    let description = if package.short_description.is_empty() {
        package.title.as_str()
    } else {
        package.short_description.as_str()
    };

    let remaining = terminal_width.saturating_sub(id_length + 2);
    format!("{}{}{}", id, padding, common::truncate(description, remaining))
}

pub async fn execute(args: SearchArgs) -> Result<i32> {
    if !is_valid_format(&args.format) {
        eprintln!("Unsupported format \"{}\". See help for supported formats.", args.format);
        return Ok(1);
    }

    let config = common::load_config(None)?;
    let registry = common::registry(&config)?;
    let query = build_query(&args);

    let results = registry.list_packages(Some(&query)).await?;
    log::info!("{} result(s) for \"{}\"", results.len(), args.terms.join(" "));

    if results.is_empty() {
        return Ok(0);
    }

    if args.format == "json" {
        let json: Vec<_> = results
            .iter()
            .map(|p| {
                serde_json::json!({
                    "id": p.id(),
                    "title": p.title,
                    "description": p.short_description,
                    "release": p.release,
                })
            })
            .collect();
        println!("{}", serde_json::to_string(&json)?);
    } else {
        let terminal_width = common::terminal_width();
        let id_length = results.iter().map(|p| p.id().len()).max().unwrap_or(0) + 1;

        for package in &results {
            println!("{}", format_line(package, id_length, terminal_width));
        }
    }

    Ok(0)
}
