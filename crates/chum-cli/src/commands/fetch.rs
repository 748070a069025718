//! Fetch command implementation

use anyhow::Result;
use chum_index::formatting::{format_duration, format_number};
use chum_index::PipelineConfig;
use colored::Colorize;

use crate::helpers::build_catalog;
use crate::output::{styled_table, TargetRow};

/// Builds the catalog and reports how each repository went
pub fn cmd_fetch(config: PipelineConfig) -> Result<()> {
    let snapshot_dir = config.snapshot_dir.clone();
    let output = build_catalog(config)?;
    let stats = &output.stats;

    let rows: Vec<TargetRow> = stats.targets.iter().map(TargetRow::from).collect();
    println!("{}", styled_table(rows));

    println!("\n{}", "Run Summary:".bright_cyan().bold());
    println!("  {}: {}", "Packages".bright_yellow(), format_number(stats.packages).bold());
    println!("  {}: {} of {}", "Repositories".bright_yellow(),
        stats.succeeded().to_string().bold(), stats.targets.len());
    println!("  {}: {}", "Records read".bright_yellow(), format_number(stats.records()));
    if stats.remote_descriptions > 0 {
        println!("  {}: {}", "Remote descriptions".bright_yellow(), stats.remote_descriptions);
    }
    println!("  {}: {}", "Time".bright_yellow(), format_duration(stats.elapsed_time));

    for conflict in &output.conflicts {
        eprintln!("{} {}", "⚠️".yellow(), conflict);
    }
    if let Some(dir) = snapshot_dir {
        println!("\n{} Indexes saved to {:?}", "💾".bright_cyan(), dir);
    }

    Ok(())
}
