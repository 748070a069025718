//! Retrieval of repository index documents
//!
//! - Remote repositories over HTTP(S), located through `repomd.xml` (remote.rs)
//! - Local snapshot directories (local.rs)
//! - Repository discovery on the Open Build Service (obs.rs)

mod local;
mod obs;
mod remote;
mod repomd;

pub use obs::{filter_newest_repos, ObsClient};
pub use remote::{HttpClient, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use repomd::{parse_repomd, RepoData};

use chum_store::SnapshotStore;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchError;

/// One repository of the build service, e.g. `4.5.0.24_aarch64`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoTarget {
    /// Repository name
    pub repo: String,
    /// Architecture the repository is built for
    pub arch: String,
}

impl RepoTarget {
    /// Derives the architecture from the part after the last `_`;
    /// a name without `_` is its own architecture.
    pub fn new(repo: impl Into<String>) -> Self {
        let repo = repo.into();
        let arch = match repo.rsplit_once('_') {
            Some((_, arch)) if !arch.is_empty() => arch.to_string(),
            _ => repo.clone(),
        };
        Self { repo, arch }
    }

    /// Release part of the name (before the last `_`), if any
    pub fn release(&self) -> Option<&str> {
        self.repo.rsplit_once('_').map(|(release, _)| release)
    }
}

impl FromStr for RepoTarget {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.contains('/') {
            return Err(FetchError::InvalidTarget(s.to_string()));
        }
        Ok(Self::new(s))
    }
}

impl fmt::Display for RepoTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repo)
    }
}

/// Basic-auth credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Where index documents come from
#[derive(Debug, Clone)]
pub enum Source {
    /// Download from `{repo_url_prefix}{repo}/repodata/`
    Remote {
        repo_url_prefix: String,
        auth: Option<Credentials>,
        timeout: Duration,
    },
    /// Read `{dir}/{repo}-primary.xml.gz` and `{dir}/{repo}-other.xml.gz`.
    /// Download links still point at `repo_url_prefix`.
    Local {
        dir: PathBuf,
        repo_url_prefix: String,
    },
}

impl Source {
    pub fn repo_url_prefix(&self) -> &str {
        match self {
            Source::Remote { repo_url_prefix, .. } | Source::Local { repo_url_prefix, .. } => {
                repo_url_prefix
            }
        }
    }

    /// Base URL of a repository, with a trailing `/`
    pub fn base_url(&self, target: &RepoTarget) -> String {
        let prefix = self.repo_url_prefix();
        if prefix.ends_with('/') {
            format!("{}{}/", prefix, target.repo)
        } else {
            format!("{}/{}/", prefix, target.repo)
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Source::Remote { .. })
    }
}

/// The raw documents of one repository
#[derive(Debug, Clone)]
pub struct FetchedIndex {
    pub target: RepoTarget,
    /// Where package locations are resolved against
    pub base_url: String,
    /// Compressed `primary.xml.gz`
    pub primary: Vec<u8>,
    /// Compressed `other.xml.gz`, when the repository has one
    pub other: Option<Vec<u8>>,
}

/// Retrieves index documents for repository targets.
///
/// Safe to share between threads; each call only touches its own target.
pub struct Fetcher {
    source: Source,
    http: Option<HttpClient>,
    snapshot: Option<Arc<SnapshotStore>>,
}

impl Fetcher {
    pub fn new(source: Source, user_agent: &str) -> Result<Self, FetchError> {
        let http = match &source {
            Source::Remote { auth, timeout, .. } => {
                Some(HttpClient::new(user_agent, *timeout, auth.clone())?)
            }
            Source::Local { .. } => None,
        };

        Ok(Self {
            source,
            http,
            snapshot: None,
        })
    }

    /// Also writes remotely fetched documents into `store`
    pub fn with_snapshot(mut self, store: Arc<SnapshotStore>) -> Self {
        self.snapshot = Some(store);
        self
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn snapshot(&self) -> Option<&SnapshotStore> {
        self.snapshot.as_deref()
    }

    /// Retrieves the documents of one target. Failures only concern this target.
    pub fn fetch(&self, target: &RepoTarget) -> Result<FetchedIndex, FetchError> {
        let base_url = self.source.base_url(target);

        let (primary, other) = match (&self.source, &self.http) {
            (Source::Remote { .. }, Some(http)) => {
                let fetched = remote::fetch_repo(http, target, &base_url)?;
                if let Some(store) = &self.snapshot {
                    local::persist(store, target, &fetched.0, fetched.1.as_deref());
                }
                fetched
            }
            (Source::Local { dir, .. }, _) => local::fetch_repo(dir, target)?,
            (Source::Remote { .. }, None) => {
                return Err(FetchError::Client("no HTTP client configured".to_string()))
            }
        };

        Ok(FetchedIndex {
            target: target.clone(),
            base_url,
            primary,
            other,
        })
    }

    /// Downloads a text document, e.g. a Markdown description.
    /// Only available for remote sources.
    pub fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        match &self.http {
            Some(http) => http.get_text(url),
            None => Err(FetchError::Client(
                "remote documents need a remote source".to_string(),
            )),
        }
    }
}
