//! Error types for chum-core

use crate::version::PackageVersion;

/// Errors specific to chum-core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid package entry: {0}")]
    InvalidEntry(String),

    #[error("Version parsing error: {0}")]
    VersionParsing(String),
}

/// A non-fatal problem found while reading a package's extension metadata.
///
/// These never abort normalization; they are attached to the package and
/// surface through [`crate::Package::debug_view`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum MetadataError {
    #[error("extension block is not valid YAML: {0}")]
    InvalidYaml(String),

    #[error("field '{field}' has an unexpected shape: expected {expected}")]
    UnexpectedShape { field: String, expected: String },

    #[error("unrecognized category '{0}'")]
    UnrecognizedCategory(String),

    #[error("unknown application type '{0}'")]
    UnknownAppType(String),
}

/// Raised when the views of one package cannot be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("package '{name}': version {left} ({left_arch}) is not comparable with {right} ({right_arch})")]
    IncomparableVersions {
        name: String,
        left: PackageVersion,
        left_arch: String,
        right: PackageVersion,
        right_arch: String,
    },
}
