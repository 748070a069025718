//! Chum Index - Building the package catalog from repository indexes
//!
//! This crate is responsible for:
//! - Fetching per-architecture `primary.xml.gz` / `other.xml.gz` documents
//!   from a remote repository or a local snapshot
//! - Streaming them into raw package records
//! - Normalizing records and their embedded YAML metadata into
//!   per-architecture package views
//! - Merging the views into one [`chum_core::Catalog`]

mod error;
pub mod fetch;
pub mod formatting;
mod merge;
pub mod normalize;
pub mod parsers;
mod pipeline;
mod stats;

pub use error::{FetchError, ParseError, PipelineError, RecordAnomaly, TargetError};
pub use fetch::{Credentials, FetchedIndex, Fetcher, RepoTarget, Source};
pub use merge::{CatalogMerger, MergeOutcome, MergePolicy};
pub use normalize::{normalize, RecordContext};
pub use parsers::{ChangelogReader, PrimaryReader, RawRecord};
pub use pipeline::{Indexer, PipelineConfig, PipelineOutput};
pub use stats::{PipelineStats, TargetStatus, TargetSummary};
