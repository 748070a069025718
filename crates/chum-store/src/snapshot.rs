//! Snapshot directory management

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Name of the manifest inside a snapshot directory
pub const MANIFEST_FILE: &str = "snapshot.json";

/// Which repository index a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// Package list (`primary.xml.gz`)
    Primary,
    /// Changelogs (`other.xml.gz`)
    Other,
}

impl IndexKind {
    /// The `type` attribute of the matching `<data>` element in repomd.xml
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Primary => "primary",
            IndexKind::Other => "other",
        }
    }

    /// File name for a repository: `{repo}-{kind}.xml.gz`
    pub fn file_name(&self, repo: &str) -> String {
        format!("{}-{}.xml.gz", repo, self.as_str())
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Manifest record for one stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Lowercase hex SHA-256 of the file
    pub sha256: String,
    pub size: u64,
    pub fetched_at: DateTime<Utc>,
}

/// Stored bytes no longer match the digest recorded when they were saved
#[derive(Debug, thiserror::Error)]
#[error("checksum mismatch for {file}: manifest has {expected}, file has {actual}")]
pub struct ChecksumMismatch {
    pub file: String,
    pub expected: String,
    pub actual: String,
}

/// Lowercase hex SHA-256 digest of `bytes`
pub fn sha256_hex(bytes: &[u8]) -> String {
    HEXLOWER.encode(&Sha256::digest(bytes))
}

/// A directory of index files plus its manifest.
///
/// Safe to share between threads: files are written directly, manifest
/// updates are kept in memory until [`SnapshotStore::flush`].
pub struct SnapshotStore {
    root: PathBuf,
    manifest: Mutex<BTreeMap<String, ManifestEntry>>,
}

impl SnapshotStore {
    /// Opens a snapshot directory, creating it if needed
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)
            .with_context(|| format!("Failed to create snapshot directory {:?}", root))?;
        Self::open_existing(root)
    }

    /// Opens a snapshot directory that must already exist
    pub fn open_existing<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            anyhow::bail!("Snapshot directory {:?} does not exist", root);
        }

        let manifest_path = root.join(MANIFEST_FILE);
        let manifest = if manifest_path.exists() {
            let content = fs::read(&manifest_path)
                .with_context(|| format!("Failed to read {:?}", manifest_path))?;
            match serde_json::from_slice(&content) {
                Ok(manifest) => manifest,
                Err(e) => {
                    log::warn!("Corrupted snapshot manifest {:?} ({}), starting empty", manifest_path, e);
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            root: root.to_path_buf(),
            manifest: Mutex::new(manifest),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path where the file for `repo` and `kind` lives
    pub fn path_for(&self, repo: &str, kind: IndexKind) -> PathBuf {
        self.root.join(kind.file_name(repo))
    }

    pub fn contains(&self, repo: &str, kind: IndexKind) -> bool {
        self.path_for(repo, kind).is_file()
    }

    fn manifest(&self) -> MutexGuard<'_, BTreeMap<String, ManifestEntry>> {
        // A panic while holding the lock leaves a plain map behind; keep using it.
        self.manifest.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Writes index bytes and records their digest
    pub fn save(&self, repo: &str, kind: IndexKind, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(repo, kind);
        fs::write(&path, bytes).with_context(|| format!("Failed to write {:?}", path))?;

        let entry = ManifestEntry {
            sha256: sha256_hex(bytes),
            size: bytes.len() as u64,
            fetched_at: Utc::now(),
        };
        log::debug!("Saved {} ({} bytes, sha256 {})", kind.file_name(repo), entry.size, &entry.sha256[..12]);
        self.manifest().insert(kind.file_name(repo), entry);

        Ok(path)
    }

    /// Reads index bytes, or `None` when the file is not in the snapshot.
    ///
    /// Files listed in the manifest are checked against their recorded
    /// digest; a mismatch is an error. Files copied in by hand (no manifest
    /// record) are returned as they are.
    pub fn load(&self, repo: &str, kind: IndexKind) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(repo, kind);
        if !path.is_file() {
            return Ok(None);
        }

        let bytes = fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
        let file_name = kind.file_name(repo);
        if let Some(entry) = self.manifest().get(&file_name) {
            let actual = sha256_hex(&bytes);
            if actual != entry.sha256 {
                return Err(ChecksumMismatch {
                    file: file_name,
                    expected: entry.sha256.clone(),
                    actual,
                }
                .into());
            }
        }

        Ok(Some(bytes))
    }

    /// Re-hashes a stored file and compares it with the manifest.
    /// Returns `false` for files without a manifest record.
    pub fn verify(&self, repo: &str, kind: IndexKind) -> Result<bool> {
        let file_name = kind.file_name(repo);
        let Some(expected) = self.manifest().get(&file_name).map(|e| e.sha256.clone()) else {
            return Ok(false);
        };

        let path = self.path_for(repo, kind);
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {:?}", path))?;
        Ok(sha256_hex(&bytes) == expected)
    }

    pub fn manifest_entry(&self, repo: &str, kind: IndexKind) -> Option<ManifestEntry> {
        self.manifest().get(&kind.file_name(repo)).cloned()
    }

    /// Repositories that have a primary index in this snapshot, sorted
    pub fn list_repos(&self) -> Result<Vec<String>> {
        let suffix = format!("-{}.xml.gz", IndexKind::Primary.as_str());
        let mut repos = Vec::new();

        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("Failed to list {:?}", self.root))?
        {
            let entry = entry.context("Failed to read snapshot directory entry")?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else { continue };
            if let Some(repo) = file_name.strip_suffix(&suffix) {
                if !repo.is_empty() {
                    repos.push(repo.to_string());
                }
            }
        }

        repos.sort();
        Ok(repos)
    }

    /// Number of files recorded in the manifest
    pub fn file_count(&self) -> usize {
        self.manifest().len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest().is_empty()
    }

    /// Writes the manifest to disk
    pub fn flush(&self) -> Result<()> {
        let manifest_path = self.root.join(MANIFEST_FILE);
        let tmp_path = self.root.join(format!("{MANIFEST_FILE}.tmp"));

        let content = serde_json::to_vec_pretty(&*self.manifest())
            .context("Failed to serialize snapshot manifest")?;
        fs::write(&tmp_path, content).with_context(|| format!("Failed to write {:?}", tmp_path))?;
        fs::rename(&tmp_path, &manifest_path)
            .with_context(|| format!("Failed to replace {:?}", manifest_path))?;
        Ok(())
    }
}
