//! Run statistics

use std::fmt;
use std::time::Duration;

use crate::formatting::{format_duration, format_number};

/// How one repository target ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    Succeeded,
    Failed(String),
    Cancelled,
}

/// Per-target counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSummary {
    pub repo: String,
    pub arch: String,
    pub status: TargetStatus,
    /// Records yielded by the primary index
    pub records: usize,
    /// Records skipped because they did not fit the schema
    pub skipped: usize,
    /// Records rejected during normalization
    pub anomalies: usize,
    /// Package views produced
    pub views: usize,
}

/// Statistics of a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub targets: Vec<TargetSummary>,
    pub packages: usize,
    pub conflicts: usize,
    pub remote_descriptions: usize,
    pub elapsed_time: Duration,
}

impl PipelineStats {
    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, TargetStatus::Succeeded))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, TargetStatus::Failed(_)))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|s| matches!(s, TargetStatus::Cancelled))
    }

    fn count(&self, f: impl Fn(&TargetStatus) -> bool) -> usize {
        self.targets.iter().filter(|t| f(&t.status)).count()
    }

    pub fn records(&self) -> usize {
        self.targets.iter().map(|t| t.records).sum()
    }

    pub fn skipped(&self) -> usize {
        self.targets.iter().map(|t| t.skipped).sum()
    }

    pub fn anomalies(&self) -> usize {
        self.targets.iter().map(|t| t.anomalies).sum()
    }

    pub fn views(&self) -> usize {
        self.targets.iter().map(|t| t.views).sum()
    }
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repositories: {} ok, {} failed, {} cancelled | Records: {} read, {} skipped, {} rejected | Packages: {} ({} conflicts) | Time: {}",
            self.succeeded(),
            self.failed(),
            self.cancelled(),
            format_number(self.records()),
            format_number(self.skipped()),
            self.anomalies(),
            format_number(self.packages),
            self.conflicts,
            format_duration(self.elapsed_time)
        )
    }
}
