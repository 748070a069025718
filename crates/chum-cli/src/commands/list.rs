//! List command implementation

use anyhow::Result;
use chum_core::{Category, Package};
use chum_index::PipelineConfig;
use colored::Colorize;

use crate::helpers::{build_catalog, parse_since};
use crate::output::{styled_table, PackageRow};

/// Lists packages, newest first
pub fn cmd_list(
    config: PipelineConfig,
    since: Option<String>,
    category: Option<String>,
    apps: bool,
    with_debug: bool,
) -> Result<()> {
    let since = since.as_deref().map(parse_since).transpose()?;
    let category = category.as_deref().map(Category::resolve);
    if let Some(Category::Unrecognized(name)) = &category {
        log::warn!("'{}' is not a known category", name);
    }

    let output = build_catalog(config)?;
    let catalog = &output.catalog;

    let mut packages: Vec<&Package> = match since {
        Some(since) => catalog.updated_after(since),
        None => catalog.iter().collect(),
    };
    packages.retain(|pkg| {
        (with_debug || !pkg.is_debug())
            && (!apps || pkg.is_app())
            && category.as_ref().map_or(true, |c| pkg.in_category(c))
    });

    if packages.is_empty() {
        println!("{} No packages match the specified filters", "❌".red());
        return Ok(());
    }

    packages.sort_by(|a, b| b.updated.cmp(&a.updated).then_with(|| a.name.cmp(&b.name)));

    println!("{} {} packages", "📦".bright_cyan(), packages.len().to_string().bold());
    let rows: Vec<PackageRow> = packages.into_iter().map(PackageRow::from).collect();
    println!("{}", styled_table(rows));

    Ok(())
}
