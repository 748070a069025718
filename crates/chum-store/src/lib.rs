//! Chum Store - Local snapshots of repository indexes
//!
//! Downloaded `primary.xml.gz` / `other.xml.gz` files are kept on disk as
//! `{repo}-{kind}.xml.gz` next to a small JSON manifest recording their
//! SHA-256 digest, so later runs can replay a snapshot instead of hitting
//! the build service again.

mod snapshot;

pub use snapshot::{
    sha256_hex, ChecksumMismatch, IndexKind, ManifestEntry, SnapshotStore, MANIFEST_FILE,
};
