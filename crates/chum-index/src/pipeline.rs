//! The fetch → parse → normalize → merge pipeline

use chum_core::{Catalog, MergeError, PartialPackage};
use chum_store::SnapshotStore;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{FetchError, PipelineError, TargetError};
use crate::fetch::{Fetcher, RepoTarget, Source, DEFAULT_USER_AGENT};
use crate::formatting::{format_duration, format_number};
use crate::merge::{CatalogMerger, MergePolicy};
use crate::normalize::{normalize, RecordContext};
use crate::parsers::{ChangelogIndex, ChangelogReader, PrimaryReader};
use crate::stats::{PipelineStats, TargetStatus, TargetSummary};

/// Settings of one catalog run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub targets: Vec<RepoTarget>,
    pub source: Source,
    pub user_agent: String,
    /// Download Markdown descriptions referenced by packages
    pub fetch_extra_metadata: bool,
    /// Stop the run once this many targets have failed
    pub abort_after_failures: Option<usize>,
    pub merge_policy: MergePolicy,
    /// Keep remotely fetched indexes here for later replay
    pub snapshot_dir: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn new(targets: Vec<RepoTarget>, source: Source) -> Self {
        Self {
            targets,
            source,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_extra_metadata: false,
            abort_after_failures: None,
            merge_policy: MergePolicy::default(),
            snapshot_dir: None,
        }
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.targets.is_empty() {
            return Err(PipelineError::Config("no repositories to index".to_string()));
        }
        if self.abort_after_failures == Some(0) {
            return Err(PipelineError::Config(
                "abort_after_failures must be at least 1".to_string(),
            ));
        }
        if self.fetch_extra_metadata && !self.source.is_remote() {
            log::warn!("Remote descriptions are only fetched from remote sources; ignoring");
        }
        Ok(())
    }
}

/// Everything a run produces
#[derive(Debug)]
pub struct PipelineOutput {
    pub catalog: Catalog,
    pub stats: PipelineStats,
    /// Views dropped because of incomparable versions
    pub conflicts: Vec<MergeError>,
}

/// Views and counters of one successful target
struct TargetReport {
    views: Vec<PartialPackage>,
    records: usize,
    skipped: usize,
    anomalies: usize,
}

/// Runs the catalog pipeline.
///
/// Targets are processed in parallel on the rayon pool; each one is fetched,
/// parsed and normalized on its own. The merge waits for all of them.
pub struct Indexer {
    config: PipelineConfig,
    fetcher: Fetcher,
    cancel: Arc<AtomicBool>,
    failures: AtomicUsize,
}

impl Indexer {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let mut fetcher = Fetcher::new(config.source.clone(), &config.user_agent)?;
        if let (Some(dir), true) = (&config.snapshot_dir, config.source.is_remote()) {
            let store = SnapshotStore::open(dir)
                .map_err(|e| FetchError::Snapshot(format!("{:#}", e)))?;
            fetcher = fetcher.with_snapshot(Arc::new(store));
        }

        Ok(Self {
            config,
            fetcher,
            cancel: Arc::new(AtomicBool::new(false)),
            failures: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Flag that stops in-flight targets once raised
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn record_failure(&self, target: &RepoTarget, err: &TargetError) {
        let failed = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
        log::warn!("Repository {} failed: {}", target, err);

        if let Some(limit) = self.config.abort_after_failures {
            if failed >= limit && !self.cancel.swap(true, Ordering::SeqCst) {
                log::warn!("{} repositories failed, cancelling the remaining ones", failed);
            }
        }
    }

    /// Runs the whole pipeline and returns the catalog
    pub fn run(&self) -> Result<PipelineOutput, PipelineError> {
        let start_time = Instant::now();
        let total = self.config.targets.len();
        log::info!(
            "Indexing {} repositories from {}",
            total,
            if self.config.source.is_remote() { "the network" } else { "a local snapshot" }
        );

        let results: Vec<(RepoTarget, Result<TargetReport, TargetError>)> = self
            .config
            .targets
            .par_iter()
            .map(|target| {
                let result = self.process_target(target);
                if let Err(err) = &result {
                    if !matches!(err, TargetError::Cancelled) {
                        self.record_failure(target, err);
                    }
                }
                (target.clone(), result)
            })
            .collect();

        if let Some(store) = self.fetcher.snapshot() {
            if let Err(e) = store.flush() {
                log::warn!("Failed to write snapshot manifest: {:#}", e);
            }
        }

        let mut stats = PipelineStats::default();
        let mut views = Vec::new();
        for (target, result) in results {
            let mut summary = TargetSummary {
                repo: target.repo.clone(),
                arch: target.arch.clone(),
                status: TargetStatus::Succeeded,
                records: 0,
                skipped: 0,
                anomalies: 0,
                views: 0,
            };
            match result {
                Ok(report) => {
                    summary.records = report.records;
                    summary.skipped = report.skipped;
                    summary.anomalies = report.anomalies;
                    summary.views = report.views.len();
                    views.extend(report.views);
                }
                Err(TargetError::Cancelled) => summary.status = TargetStatus::Cancelled,
                Err(err) => summary.status = TargetStatus::Failed(err.to_string()),
            }
            stats.targets.push(summary);
        }

        let failed = stats.failed();
        if let Some(limit) = self.config.abort_after_failures {
            if failed >= limit {
                return Err(PipelineError::TooManyFailures { failed, limit });
            }
        }
        if views.is_empty() {
            return Err(PipelineError::NoUsableData { failed, total });
        }

        let merger = CatalogMerger::new(self.config.merge_policy);
        let outcome = merger.merge(views)?;
        let mut catalog = outcome.catalog;

        if self.config.fetch_extra_metadata && self.config.source.is_remote() {
            let (with_descriptions, loaded) = self.load_remote_descriptions(catalog);
            catalog = with_descriptions;
            stats.remote_descriptions = loaded;
        }

        stats.packages = catalog.len();
        stats.conflicts = outcome.conflicts.len();
        stats.elapsed_time = start_time.elapsed();

        log::info!("✅ Catalog ready: {} packages from {} repositories ({} failed) in {}",
            format_number(stats.packages),
            stats.succeeded(),
            failed,
            format_duration(stats.elapsed_time)
        );

        Ok(PipelineOutput {
            catalog,
            stats,
            conflicts: outcome.conflicts,
        })
    }

    /// Fetch, parse and normalize one target
    fn process_target(&self, target: &RepoTarget) -> Result<TargetReport, TargetError> {
        if self.is_cancelled() {
            return Err(TargetError::Cancelled);
        }

        let fetched = self.fetcher.fetch(target)?;
        log::debug!("Fetched {} ({} bytes)", target, fetched.primary.len());

        if self.is_cancelled() {
            return Err(TargetError::Cancelled);
        }

        let changelogs: ChangelogIndex = match &fetched.other {
            Some(bytes) => match ChangelogReader::new(bytes.as_slice()).into_index() {
                Ok(index) => index,
                Err(e) => {
                    log::warn!("Ignoring changelogs of {}: {}", target, e);
                    ChangelogIndex::new()
                }
            },
            None => ChangelogIndex::new(),
        };

        let ctx = RecordContext {
            repo: &target.repo,
            base_url: &fetched.base_url,
        };
        let mut reader = PrimaryReader::new(fetched.primary.as_slice());
        let mut views = Vec::new();
        let mut anomalies = 0;

        for item in reader.by_ref() {
            if self.is_cancelled() {
                return Err(TargetError::Cancelled);
            }

            let record = item?;
            let changelog = changelogs
                .get(&(record.name.clone(), record.arch.clone()))
                .cloned()
                .unwrap_or_default();

            match normalize(record, &ctx, changelog) {
                Ok(view) => views.push(view),
                Err(anomaly) => {
                    anomalies += 1;
                    log::warn!("{}: dropping record: {}", target, anomaly);
                }
            }
        }

        if let Some(declared) = reader.declared() {
            let seen = reader.records() + reader.skipped();
            if declared != seen {
                log::debug!("{}: index announces {} packages, found {}", target, declared, seen);
            }
        }
        log::info!(
            "{}: {} packages ({} skipped, {} rejected)",
            target,
            format_number(views.len()),
            reader.skipped(),
            anomalies
        );

        Ok(TargetReport {
            records: reader.records(),
            skipped: reader.skipped(),
            anomalies,
            views,
        })
    }

    /// Downloads Markdown descriptions. Failures leave the plain description.
    fn load_remote_descriptions(&self, catalog: Catalog) -> (Catalog, usize) {
        let wanted: Vec<(String, String)> = catalog
            .iter()
            .filter_map(|pkg| {
                pkg.details
                    .markdown_url
                    .as_ref()
                    .map(|url| (pkg.name.clone(), url.clone()))
            })
            .collect();
        log::info!("Loading {} remote descriptions", wanted.len());

        let mut texts: HashMap<String, String> = wanted
            .par_iter()
            .filter_map(|(name, url)| match self.fetcher.fetch_text(url) {
                Ok(text) => Some((name.clone(), text)),
                Err(e) => {
                    log::warn!("Description of {} unavailable: {}", name, e);
                    None
                }
            })
            .collect();

        let loaded = texts.len();
        let catalog = catalog.map_packages(|pkg| {
            if let Some(text) = texts.remove(&pkg.name) {
                pkg.remote_description = Some(text);
            }
        });
        (catalog, loaded)
    }
}
