//! Index documents from a snapshot directory

use chum_store::{ChecksumMismatch, IndexKind, SnapshotStore};
use std::path::Path;

use super::RepoTarget;
use crate::error::FetchError;

fn snapshot_error(store: &SnapshotStore, target: &RepoTarget, kind: IndexKind, err: anyhow::Error) -> FetchError {
    match err.downcast_ref::<ChecksumMismatch>() {
        Some(mismatch) => FetchError::ChecksumMismatch {
            url: store.path_for(&target.repo, kind).display().to_string(),
            expected: mismatch.expected.clone(),
            actual: mismatch.actual.clone(),
        },
        None => FetchError::Snapshot(format!("{:#}", err)),
    }
}

/// Reads `{repo}-primary.xml.gz` (required) and `{repo}-other.xml.gz`
/// (optional) from `dir`
pub(crate) fn fetch_repo(dir: &Path, target: &RepoTarget) -> Result<(Vec<u8>, Option<Vec<u8>>), FetchError> {
    let primary_path = dir.join(IndexKind::Primary.file_name(&target.repo));
    if !dir.is_dir() {
        return Err(FetchError::Missing(primary_path));
    }

    let store = SnapshotStore::open_existing(dir).map_err(|e| FetchError::Snapshot(format!("{:#}", e)))?;

    let primary = store
        .load(&target.repo, IndexKind::Primary)
        .map_err(|e| snapshot_error(&store, target, IndexKind::Primary, e))?
        .ok_or(FetchError::Missing(primary_path))?;

    let other = store
        .load(&target.repo, IndexKind::Other)
        .map_err(|e| snapshot_error(&store, target, IndexKind::Other, e))?;
    if other.is_none() {
        log::debug!("No changelog index for {} in {:?}", target, dir);
    }

    Ok((primary, other))
}

/// Stores downloaded documents for later replay. Failures are logged only.
pub(crate) fn persist(store: &SnapshotStore, target: &RepoTarget, primary: &[u8], other: Option<&[u8]>) {
    if let Err(e) = store.save(&target.repo, IndexKind::Primary, primary) {
        log::warn!("Failed to store primary index of {}: {:#}", target, e);
    }
    if let Some(other) = other {
        if let Err(e) = store.save(&target.repo, IndexKind::Other, other) {
            log::warn!("Failed to store changelog index of {}: {:#}", target, e);
        }
    }
}
