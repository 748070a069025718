//! Helper functions for CLI operations

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chum_core::{Catalog, Package};
use chum_index::{Indexer, PipelineConfig, PipelineOutput};
use regex::{Regex, RegexBuilder};

/// Runs the pipeline
pub fn build_catalog(config: PipelineConfig) -> Result<PipelineOutput> {
    let indexer = Indexer::new(config).context("Failed to set up the indexer")?;
    indexer.run().context("Failed to build the catalog")
}

/// How `search` matches packages
pub enum Matcher {
    /// Lowercased needle
    Substring(String),
    Pattern(Regex),
}

impl Matcher {
    pub fn new(query: &str, regex: bool) -> Result<Self> {
        if regex {
            let re = RegexBuilder::new(query)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("Invalid regex pattern: {}", query))?;
            Ok(Matcher::Pattern(re))
        } else {
            Ok(Matcher::Substring(query.to_lowercase()))
        }
    }

    fn matches_text(&self, text: &str) -> bool {
        match self {
            Matcher::Substring(needle) => text.to_lowercase().contains(needle),
            Matcher::Pattern(re) => re.is_match(text),
        }
    }

    /// Checks name, title and summary
    pub fn is_match(&self, pkg: &Package) -> bool {
        self.matches_text(&pkg.name)
            || self.matches_text(&pkg.details.title)
            || pkg
                .details
                .summary
                .as_deref()
                .is_some_and(|summary| self.matches_text(summary))
    }
}

/// Ranks search hits: exact name, name prefix, name contains, rest
pub fn search_rank(pkg: &Package, query: &str) -> u8 {
    let name = pkg.name.to_lowercase();
    let query = query.to_lowercase();
    if name == query {
        0
    } else if name.starts_with(&query) {
        1
    } else if name.contains(&query) {
        2
    } else {
        3
    }
}

/// Package names closest to `name`, best first
pub fn suggest_names<'a>(catalog: &'a Catalog, name: &str, limit: usize) -> Vec<&'a str> {
    let mut scored: Vec<(f64, &str)> = catalog
        .names()
        .map(|candidate| (strsim::jaro_winkler(name, candidate), candidate))
        .filter(|(score, _)| *score >= 0.8)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().take(limit).map(|(_, n)| n).collect()
}

/// Parses YYYY-MM-DD as midnight UTC
pub fn parse_since(since: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(since, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {}. Expected YYYY-MM-DD", since))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

/// Formats timestamp as relative time (e.g., "2 days ago")
pub fn format_relative_time(dt: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(dt);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        let mins = duration.num_minutes();
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if duration.num_hours() < 24 {
        let hours = duration.num_hours();
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if duration.num_days() < 30 {
        let days = duration.num_days();
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else if duration.num_days() < 365 {
        let months = duration.num_days() / 30;
        format!("{} month{} ago", months, if months == 1 { "" } else { "s" })
    } else {
        let years = duration.num_days() / 365;
        format!("{} year{} ago", years, if years == 1 { "" } else { "s" })
    }
}

/// Cuts `text` to at most `width` characters
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
