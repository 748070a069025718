//! Command-line options describing where the catalog comes from

use anyhow::{bail, Context, Result};
use chum_index::fetch::{ObsClient, DEFAULT_USER_AGENT};
use chum_index::{Credentials, MergePolicy, PipelineConfig, RepoTarget, Source};
use chum_store::SnapshotStore;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Source and pipeline options shared by every command
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Read indexes from this snapshot directory instead of the network
    #[arg(long, env = "CHUM_REPO_DATA_DIR")]
    pub repo_data_dir: Option<PathBuf>,

    /// Repositories to index, comma separated (e.g. "4.5.0.24_aarch64").
    /// Defaults to the newest release of the OBS project, or every
    /// repository of the snapshot directory.
    #[arg(long, env = "CHUM_REPOS", value_delimiter = ',')]
    pub repos: Vec<String>,

    /// OBS API used to discover repositories
    #[arg(long, env = "CHUM_OBS_URL", default_value = "https://build.sailfishos.org/")]
    pub obs_url: String,

    /// OBS project holding the repositories
    #[arg(long, env = "CHUM_OBS_PROJECT", default_value = "sailfishos:chum")]
    pub obs_project: String,

    #[arg(long, env = "CHUM_OBS_USER")]
    pub obs_user: Option<String>,

    #[arg(long, env = "CHUM_OBS_PASS", hide_env_values = true)]
    pub obs_pass: Option<String>,

    /// Base URL of the published repositories
    #[arg(
        long,
        env = "CHUM_REPO_URL_PREFIX",
        default_value = "https://repo.sailfishos.org/obs/sailfishos:/chum/"
    )]
    pub repo_url_prefix: String,

    /// User-Agent header for HTTP requests
    #[arg(long, env = "CHUM_USER_AGENT")]
    pub user_agent: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, env = "CHUM_TIMEOUT", default_value = "60")]
    pub timeout: u64,

    /// Download Markdown descriptions referenced by packages
    #[arg(long, env = "CHUM_DOWNLOAD_EXTRA_METADATA")]
    pub download_extra_metadata: bool,

    /// Save downloaded indexes here for later offline runs
    #[arg(long, env = "CHUM_SNAPSHOT_DIR")]
    pub snapshot_dir: Option<PathBuf>,

    /// Abort once this many repositories have failed
    #[arg(long)]
    pub abort_after_failures: Option<usize>,

    /// Drop conflicting package views instead of aborting the merge
    #[arg(long)]
    pub drop_conflicting: bool,
}

impl SourceArgs {
    fn credentials(&self) -> Option<Credentials> {
        match (&self.obs_user, &self.obs_pass) {
            (Some(user), Some(password)) => Some(Credentials {
                user: user.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    /// Resolves the repository list and builds the pipeline settings
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig> {
        let timeout = Duration::from_secs(self.timeout);

        let (source, repos) = match &self.repo_data_dir {
            Some(dir) => {
                let repos = if self.repos.is_empty() {
                    let store = SnapshotStore::open_existing(dir)
                        .with_context(|| format!("Failed to open snapshot at {:?}", dir))?;
                    let repos = store.list_repos()?;
                    if repos.is_empty() {
                        bail!("No repository indexes found in {:?}", dir);
                    }
                    repos
                } else {
                    self.repos.clone()
                };
                let source = Source::Local {
                    dir: dir.clone(),
                    repo_url_prefix: self.repo_url_prefix.clone(),
                };
                (source, repos)
            }
            None => {
                let auth = self.credentials();
                let repos = if !self.repos.is_empty() {
                    self.repos.clone()
                } else if let Some(auth) = auth.clone() {
                    log::info!("Listing repositories of {}", self.obs_project);
                    ObsClient::new(&self.obs_url, &self.obs_project, auth, &self.user_agent(), timeout)?
                        .newest_repos()
                        .context("Failed to list OBS repositories")?
                } else {
                    bail!(
                        "Either --repos or OBS credentials (--obs-user/--obs-pass) are needed to fetch from the network"
                    );
                };
                let source = Source::Remote {
                    repo_url_prefix: self.repo_url_prefix.clone(),
                    auth,
                    timeout,
                };
                (source, repos)
            }
        };

        log::info!("Repositories: {}", repos.join(", "));

        let targets = repos.into_iter().map(RepoTarget::new).collect();
        let mut config = PipelineConfig::new(targets, source);
        config.user_agent = self.user_agent();
        config.fetch_extra_metadata = self.download_extra_metadata;
        config.abort_after_failures = self.abort_after_failures;
        config.merge_policy = if self.drop_conflicting {
            MergePolicy::DropConflicting
        } else {
            MergePolicy::Abort
        };
        config.snapshot_dir = self.snapshot_dir.clone();
        config.validate()?;

        Ok(config)
    }
}
