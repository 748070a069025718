//! Show command implementation

use anyhow::{bail, Result};
use chum_core::{Catalog, DescriptionKind, Package};
use chum_index::formatting::{format_size, format_timestamp};
use chum_index::PipelineConfig;
use colored::Colorize;

use crate::helpers::{build_catalog, suggest_names};

/// Displays one package
pub fn cmd_show(config: PipelineConfig, name: String, debug: bool) -> Result<()> {
    let output = build_catalog(config)?;
    let catalog = &output.catalog;

    let Some(pkg) = catalog.get(&name) else {
        eprintln!("{} Package {} not found in catalog", "❌".red(), name.bold());
        let suggestions = suggest_names(catalog, &name, 5);
        if !suggestions.is_empty() {
            eprintln!("\n{} Did you mean:", "💡".yellow());
            for suggestion in suggestions {
                eprintln!("  {}", suggestion);
            }
        }
        bail!("unknown package '{}'", name);
    };

    print_package(catalog, pkg);
    if debug {
        print_debug(pkg);
    }
    Ok(())
}

fn print_package(catalog: &Catalog, pkg: &Package) {
    println!("\n{} {}", "📦 Package:".bright_cyan(), format!("{} {}", pkg.name, pkg.version).bold());
    println!("{}", "━".repeat(60).bright_black());
    println!("  {}       {}", "Title:".bright_yellow(), pkg.details.title);
    if let Some(summary) = &pkg.details.summary {
        println!("  {}     {}", "Summary:".bright_yellow(), summary);
    }
    println!("  {}     {}", "Updated:".bright_yellow(), format_timestamp(pkg.updated));
    println!("  {}        {}", "Page:".bright_yellow(), pkg.web_url());
    if let Some(license) = &pkg.details.license {
        println!("  {}     {}", "License:".bright_yellow(), license);
    }
    if let Some(developer) = &pkg.details.developer_name {
        println!("  {}   {}", "Developer:".bright_yellow(), developer);
    }
    if let Some(packager) = &pkg.details.packager_name {
        println!("  {}    {}", "Packager:".bright_yellow(), packager);
    }
    let categories: Vec<&str> = pkg.categories.iter().map(|c| c.as_str()).collect();
    println!("  {}  {}", "Categories:".bright_yellow(), categories.join(", "));
    if pkg.is_app() {
        println!("  {}", "Application".green());
    }

    println!("\n{}", "⬇️  Downloads:".bright_cyan());
    println!("{}", "━".repeat(60).bright_black());
    for (arch, entry) in &pkg.arch_entries {
        println!("  {:<10} {} ({})", arch.bright_yellow(), entry.download_url, format_size(entry.download_size));
    }

    for (label, companion) in [("Debug info", catalog.debuginfo_of(pkg)), ("Debug source", catalog.debugsource_of(pkg))] {
        if let Some(companion) = companion {
            println!("  {}: {}", label.bright_black(), companion.name);
        }
    }

    if !pkg.links.is_empty() {
        println!("\n{}", "🔗 Links:".bright_cyan());
        for (name, url) in &pkg.links {
            println!("  {:<12} {}", name.bright_yellow(), url);
        }
    }

    println!("\n{}", "📝 Description:".bright_cyan());
    println!("{}", "━".repeat(60).bright_black());
    match (&pkg.remote_description, pkg.details.description_kind()) {
        (Some(text), _) => println!("{}", text),
        (None, DescriptionKind::Markdown(url)) => println!("  (see {})", url),
        (None, DescriptionKind::PlainText) => println!("{}", pkg.details.description),
    }

    // Changelog is kept newest first
    if let Some(latest) = pkg.changelog.first() {
        println!("\n{} {} ({}, {})", "🕑 Latest change:".bright_cyan(),
            latest.version, latest.author, format_timestamp(latest.timestamp));
        println!("{}", latest.text);
    }
}

fn print_debug(pkg: &Package) {
    let view = pkg.debug_view();
    println!("\n{}", "🔧 Extension metadata:".bright_cyan());
    println!("{}", "━".repeat(60).bright_black());
    match view.raw_metadata {
        Some(raw) => println!("{}", raw),
        None => println!("  {}", "(none)".dimmed()),
    }
    for error in view.errors {
        println!("  {} {}", "⚠️".yellow(), error);
    }
}
