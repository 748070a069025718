//! Output formatting structures for CLI display

use chum_core::Package;
use chum_index::formatting::format_number;
use chum_index::{TargetStatus, TargetSummary};
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};

use crate::helpers::{format_relative_time, truncate};

/// Table row for displaying packages
#[derive(Tabled)]
pub struct PackageRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Version")]
    pub version: String,
    #[tabled(rename = "Summary")]
    pub summary: String,
    #[tabled(rename = "Archs")]
    pub archs: String,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

impl From<&Package> for PackageRow {
    fn from(pkg: &Package) -> Self {
        Self {
            name: pkg.name.clone(),
            version: pkg.version.to_short_str().to_string(),
            summary: truncate(pkg.details.summary.as_deref().unwrap_or("-"), 50),
            archs: pkg.archs().collect::<Vec<_>>().join(", "),
            updated: format_relative_time(pkg.updated),
        }
    }
}

/// Table row for one repository of a run
#[derive(Tabled)]
pub struct TargetRow {
    #[tabled(rename = "Repository")]
    pub repo: String,
    #[tabled(rename = "Arch")]
    pub arch: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Records")]
    pub records: String,
    #[tabled(rename = "Skipped")]
    pub skipped: usize,
    #[tabled(rename = "Rejected")]
    pub rejected: usize,
}

impl From<&TargetSummary> for TargetRow {
    fn from(summary: &TargetSummary) -> Self {
        let status = match &summary.status {
            TargetStatus::Succeeded => "ok".to_string(),
            TargetStatus::Failed(reason) => format!("failed: {}", truncate(reason, 60)),
            TargetStatus::Cancelled => "cancelled".to_string(),
        };
        Self {
            repo: summary.repo.clone(),
            arch: summary.arch.clone(),
            status,
            records: format_number(summary.records),
            skipped: summary.skipped,
            rejected: summary.anomalies,
        }
    }
}

/// Table row for a name and a count
#[derive(Tabled)]
pub struct CountRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Packages")]
    pub count: String,
}

/// Rounded table with a highlighted header
pub fn styled_table<T: Tabled>(rows: Vec<T>) -> Table {
    let mut table = Table::new(rows);
    table.with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Color::FG_BRIGHT_CYAN));
    table
}
