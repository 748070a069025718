//! Tests for snapshot storage

use anyhow::Result;
use chum_store::{sha256_hex, IndexKind, SnapshotStore, MANIFEST_FILE};
use std::fs;
use tempfile::TempDir;

const REPO: &str = "4.5.0.24_aarch64";

// ── save / load ──────────────────────────────────────────────────────────────

#[test]
fn test_save_and_load() -> Result<()> {
    let tmp = TempDir::new()?;
    let store = SnapshotStore::open(tmp.path())?;

    let path = store.save(REPO, IndexKind::Primary, b"primary bytes")?;
    assert_eq!(path, tmp.path().join("4.5.0.24_aarch64-primary.xml.gz"));
    assert_eq!(store.load(REPO, IndexKind::Primary)?, Some(b"primary bytes".to_vec()));
    Ok(())
}

#[test]
fn test_load_missing_returns_none() -> Result<()> {
    let tmp = TempDir::new()?;
    let store = SnapshotStore::open(tmp.path())?;
    assert_eq!(store.load(REPO, IndexKind::Other)?, None);
    assert!(!store.contains(REPO, IndexKind::Other));
    Ok(())
}

#[test]
fn test_open_existing_requires_directory() {
    let tmp = TempDir::new().unwrap();
    assert!(SnapshotStore::open_existing(tmp.path().join("nope")).is_err());
}

// ── manifest ─────────────────────────────────────────────────────────────────

#[test]
fn test_manifest_survives_reopen() -> Result<()> {
    let tmp = TempDir::new()?;
    {
        let store = SnapshotStore::open(tmp.path())?;
        store.save(REPO, IndexKind::Primary, b"abc")?;
        store.flush()?;
    }

    assert!(tmp.path().join(MANIFEST_FILE).exists());
    let store = SnapshotStore::open(tmp.path())?;
    let entry = store.manifest_entry(REPO, IndexKind::Primary).unwrap();
    assert_eq!(entry.sha256, sha256_hex(b"abc"));
    assert_eq!(entry.size, 3);
    assert!(store.verify(REPO, IndexKind::Primary)?);
    Ok(())
}

#[test]
fn test_tampered_file_fails_to_load() -> Result<()> {
    let tmp = TempDir::new()?;
    let store = SnapshotStore::open(tmp.path())?;
    store.save(REPO, IndexKind::Primary, b"original")?;

    fs::write(store.path_for(REPO, IndexKind::Primary), b"tampered")?;
    assert!(!store.verify(REPO, IndexKind::Primary)?);
    assert!(store.load(REPO, IndexKind::Primary).is_err());
    Ok(())
}

#[test]
fn test_hand_copied_file_loads_without_manifest() -> Result<()> {
    let tmp = TempDir::new()?;
    fs::write(tmp.path().join("aarch64-primary.xml.gz"), b"copied")?;

    let store = SnapshotStore::open_existing(tmp.path())?;
    assert_eq!(store.load("aarch64", IndexKind::Primary)?, Some(b"copied".to_vec()));
    assert!(!store.verify("aarch64", IndexKind::Primary)?);
    Ok(())
}

#[test]
fn test_corrupted_manifest_starts_empty() -> Result<()> {
    let tmp = TempDir::new()?;
    fs::write(tmp.path().join(MANIFEST_FILE), b"{ not json")?;
    let store = SnapshotStore::open(tmp.path())?;
    assert!(store.is_empty());
    Ok(())
}

// ── listing ──────────────────────────────────────────────────────────────────

#[test]
fn test_list_repos_only_counts_primary() -> Result<()> {
    let tmp = TempDir::new()?;
    let store = SnapshotStore::open(tmp.path())?;
    store.save("4.5.0.24_i486", IndexKind::Primary, b"x")?;
    store.save(REPO, IndexKind::Primary, b"y")?;
    store.save(REPO, IndexKind::Other, b"z")?;
    fs::write(tmp.path().join("README"), b"unrelated")?;

    assert_eq!(
        store.list_repos()?,
        vec![REPO.to_string(), "4.5.0.24_i486".to_string()]
    );
    assert_eq!(store.file_count(), 3);
    Ok(())
}
