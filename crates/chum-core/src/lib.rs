//! Chum Core - Shared data models for the repository catalog
//!
//! This crate defines the package model used throughout the project:
//! versions and their ordering, the per-architecture partial views produced
//! while reading repository indexes, merged packages and the read-only
//! [`Catalog`] handed to renderers and search indexing.

mod catalog;
mod category;
mod error;
mod models;
mod version;

pub use catalog::{Catalog, CatalogStatistics};
pub use category::{AppType, Category};
pub use error::{CoreError, MergeError, MetadataError};
pub use models::{
    dedup_changelog, ArchEntry, ChangelogEntry, Companions, DebugView, DescriptionKind, Package,
    PackageDetails, PartialPackage, SearchDocument, DEBUGINFO_SUFFIX, DEBUGSOURCE_SUFFIX,
};
pub use version::{rpmvercmp, PackageVersion};
