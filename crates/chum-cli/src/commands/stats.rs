//! Stats command implementation

use anyhow::Result;
use chum_index::formatting::{format_number, format_timestamp};
use chum_index::PipelineConfig;
use colored::Colorize;

use crate::helpers::build_catalog;
use crate::output::{styled_table, CountRow};

/// Displays catalog statistics
pub fn cmd_stats(config: PipelineConfig, limit: usize) -> Result<()> {
    let output = build_catalog(config)?;
    let stats = output.catalog.statistics();

    println!("{}", "Catalog Statistics:".bright_cyan().bold());
    println!("  {}: {}", "Packages".bright_yellow(), format_number(stats.package_count).bold());
    println!("  {}: {}", "Applications".bright_yellow(), format_number(stats.app_count).bold());
    println!("  {}: {}", "Debug packages".bright_yellow(), format_number(stats.debug_count).bold());
    if let Some(last) = stats.last_updated {
        println!("  {}: {}", "Last update".bright_yellow(), format_timestamp(last));
    }

    let archs: Vec<CountRow> = stats
        .per_arch
        .iter()
        .map(|(name, count)| CountRow { name: name.clone(), count: format_number(*count) })
        .collect();
    println!("\n{}", "Architectures:".bright_cyan());
    println!("{}", styled_table(archs));

    let categories: Vec<CountRow> = stats
        .per_category
        .iter()
        .map(|(name, count)| CountRow { name: name.clone(), count: format_number(*count) })
        .collect();
    println!("\n{}", "Categories:".bright_cyan());
    println!("{}", styled_table(categories));

    print_names("Packages with metadata errors", &stats.with_metadata_errors, limit);
    print_names("Applications without icon", &stats.apps_without_icon, limit);

    Ok(())
}

fn print_names(heading: &str, names: &[String], limit: usize) {
    if names.is_empty() {
        return;
    }
    println!("\n{} ({})", heading.bright_cyan(), names.len());
    for name in names.iter().take(limit) {
        println!("  {}", name);
    }
    if names.len() > limit {
        println!("  {} and {} more", "...".dimmed(), (names.len() - limit).to_string().bold());
    }
}
