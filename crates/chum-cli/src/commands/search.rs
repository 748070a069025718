//! Search command implementation

use anyhow::Result;
use chum_core::Package;
use chum_index::PipelineConfig;
use colored::Colorize;

use crate::helpers::{build_catalog, search_rank, Matcher};
use crate::output::{styled_table, PackageRow};

/// Searches the catalog by name, title and summary
pub fn cmd_search(
    config: PipelineConfig,
    query: String,
    regex: bool,
    limit: usize,
    show_all: bool,
) -> Result<()> {
    let matcher = Matcher::new(&query, regex)?;
    let output = build_catalog(config)?;

    let mut hits: Vec<&Package> = output
        .catalog
        .iter()
        .filter(|pkg| matcher.is_match(pkg))
        .collect();

    if hits.is_empty() {
        println!("{} No packages match '{}'", "❌".red(), query.bold());
        return Ok(());
    }

    // Debug companions sink below the packages they belong to
    hits.sort_by_key(|pkg| (pkg.is_debug(), search_rank(pkg, &query), pkg.name.clone()));

    let total_count = hits.len();
    let display_limit = if show_all { total_count } else { limit.min(total_count) };

    println!("\n{} {} matching '{}'", "📦".bright_cyan(), total_count.to_string().bold(), query);
    let rows: Vec<PackageRow> = hits.iter().take(display_limit).map(|pkg| PackageRow::from(*pkg)).collect();
    println!("{}", styled_table(rows));

    if display_limit < total_count {
        println!("\n  {} and {} more packages (use {} to see all)",
            "...".dimmed(),
            (total_count - display_limit).to_string().bold(),
            "-a".bright_cyan()
        );
    }

    Ok(())
}
