//! Core data models for the catalog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::category::{AppType, Category};
use crate::error::MetadataError;
use crate::version::{rpmvercmp, PackageVersion};

/// Suffix of the package carrying debug symbols
pub const DEBUGINFO_SUFFIX: &str = "-debuginfo";

/// Suffix of the package carrying the sources used for debugging
pub const DEBUGSOURCE_SUFFIX: &str = "-debugsource";

/// Download information for one architecture of a package
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArchEntry {
    /// Repository the entry was read from (e.g. "4.5.0.24_aarch64")
    pub repo: String,

    /// Absolute URL of the RPM file
    pub download_url: String,

    /// Size of the RPM file in bytes
    pub download_size: u64,

    /// Size once installed in bytes
    pub install_size: u64,

    /// Checksum algorithm (e.g. "sha256")
    pub checksum_type: Option<String>,

    /// Checksum of the RPM file
    pub checksum_value: Option<String>,
}

/// One changelog entry of a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Author line without the trailing version
    pub author: String,

    /// Version the entry was written for, as it appears in the author line
    pub version: String,

    pub timestamp: DateTime<Utc>,

    pub text: String,
}

impl ChangelogEntry {
    /// Splits an RPM changelog author attribute
    /// (`Jane Doe <jane@example.org> - 1.0-1`) into author and version.
    pub fn new(author_line: &str, timestamp: DateTime<Utc>, text: impl Into<String>) -> Self {
        let (author, version) = match author_line.rsplit_once(" - ") {
            Some((author, version)) => (author.trim(), version.trim()),
            None => (author_line.trim(), ""),
        };

        Self {
            author: author.to_string(),
            version: version.to_string(),
            timestamp,
            text: text.into(),
        }
    }

    /// De-duplication key
    pub fn key(&self) -> (String, DateTime<Utc>) {
        (self.version.clone(), self.timestamp)
    }
}

/// Combines changelog entries into one list, newest first.
///
/// Entries sharing (version, timestamp) collapse into one; the later one in
/// iteration order wins. Applying it to its own output changes nothing.
pub fn dedup_changelog<I>(entries: I) -> Vec<ChangelogEntry>
where
    I: IntoIterator<Item = ChangelogEntry>,
{
    let mut by_key: HashMap<(String, DateTime<Utc>), ChangelogEntry> = HashMap::new();
    for entry in entries {
        by_key.insert(entry.key(), entry);
    }

    let mut result: Vec<ChangelogEntry> = by_key.into_values().collect();
    result.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| rpmvercmp(&b.version, &a.version))
    });
    result
}

/// Names of the debug companions a package may have
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Companions {
    pub debuginfo: String,
    pub debugsource: String,
}

impl Companions {
    /// Companion names derived from the naming convention
    pub fn for_name(name: &str) -> Self {
        Self {
            debuginfo: format!("{name}{DEBUGINFO_SUFFIX}"),
            debugsource: format!("{name}{DEBUGSOURCE_SUFFIX}"),
        }
    }
}

/// Scalar descriptive fields of a package.
///
/// When views disagree these are taken as a whole from one view.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageDetails {
    pub title: String,
    pub summary: Option<String>,
    /// Plain-text description, paragraphs separated by blank lines
    pub description: String,
    /// Markdown document that replaces the plain description when available
    pub markdown_url: Option<String>,
    pub license: Option<String>,
    pub developer_name: Option<String>,
    pub packager_name: Option<String>,
    /// Upstream homepage
    pub url: Option<String>,
    /// Source code repository
    pub repo_url: Option<String>,
    /// Repository holding the packaging files
    pub packaging_repo_url: Option<String>,
    pub icon: Option<String>,
    pub app_type: AppType,
}

/// Which path a renderer should take for the description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionKind<'a> {
    /// Fetch and render the referenced Markdown document
    Markdown(&'a str),
    /// Wrap the plain-text paragraphs
    PlainText,
}

impl PackageDetails {
    pub fn description_kind(&self) -> DescriptionKind<'_> {
        match &self.markdown_url {
            Some(url) => DescriptionKind::Markdown(url),
            None => DescriptionKind::PlainText,
        }
    }
}

/// A package as known from a single architecture's index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialPackage {
    pub name: String,
    pub version: PackageVersion,
    /// Architecture of the record (may be "noarch")
    pub arch: String,
    pub entry: ArchEntry,
    pub details: PackageDetails,
    pub categories: BTreeSet<Category>,
    pub screenshots: Vec<String>,
    pub links: BTreeMap<String, String>,
    pub changelog: Vec<ChangelogEntry>,
    /// Time the RPM file was added to the repository
    pub file_time: Option<DateTime<Utc>>,
    pub companions: Companions,
    /// Raw extension-metadata text
    pub debug_metadata: Option<String>,
    pub metadata_errors: Vec<MetadataError>,
}

impl PartialPackage {
    /// Latest of the file time and changelog timestamps
    pub fn updated(&self) -> DateTime<Utc> {
        self.changelog
            .iter()
            .map(|entry| entry.timestamp)
            .chain(self.file_time)
            .max()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// A package of the catalog, merged over all architectures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: PackageVersion,
    /// Download data per architecture; the keys are the package's architectures
    pub arch_entries: BTreeMap<String, ArchEntry>,
    pub details: PackageDetails,
    pub categories: BTreeSet<Category>,
    pub screenshots: Vec<String>,
    pub links: BTreeMap<String, String>,
    /// Newest first
    pub changelog: Vec<ChangelogEntry>,
    pub updated: DateTime<Utc>,
    /// Resolved debug-info companion, if it exists in the catalog
    pub debuginfo_package: Option<String>,
    /// Resolved debug-source companion, if it exists in the catalog
    pub debugsource_package: Option<String>,
    /// Companion names this package would have by convention
    pub companions: Companions,
    pub debug_metadata: Option<String>,
    pub metadata_errors: Vec<MetadataError>,
    /// Markdown text fetched from `details.markdown_url`
    pub remote_description: Option<String>,
}

/// Extension-metadata diagnostics of a package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugView<'a> {
    pub raw_metadata: Option<&'a str>,
    pub errors: &'a [MetadataError],
}

impl Package {
    /// Starts a package from a single view
    pub fn from_partial(view: PartialPackage) -> Self {
        let updated = view.updated();
        let mut arch_entries = BTreeMap::new();
        arch_entries.insert(view.arch, view.entry);

        Self {
            name: view.name,
            version: view.version,
            arch_entries,
            details: view.details,
            categories: view.categories,
            screenshots: view.screenshots,
            links: view.links,
            changelog: dedup_changelog(view.changelog),
            updated,
            debuginfo_package: None,
            debugsource_package: None,
            companions: view.companions,
            debug_metadata: view.debug_metadata,
            metadata_errors: view.metadata_errors,
            remote_description: None,
        }
    }

    /// Architectures this package is available for
    pub fn archs(&self) -> impl Iterator<Item = &str> {
        self.arch_entries.keys().map(String::as_str)
    }

    pub fn has_arch(&self, arch: &str) -> bool {
        self.arch_entries.contains_key(arch)
    }

    pub fn download_url(&self, arch: &str) -> Option<&str> {
        self.arch_entries
            .get(arch)
            .map(|entry| entry.download_url.as_str())
    }

    pub fn is_debug(&self) -> bool {
        self.name.ends_with(DEBUGINFO_SUFFIX) || self.name.ends_with(DEBUGSOURCE_SUFFIX)
    }

    /// Heuristic for graphical apps users would like to install
    pub fn is_app(&self) -> bool {
        !self.is_debug()
            && (self.details.app_type == AppType::DesktopApplication
                || self.name.starts_with("harbour-"))
    }

    /// Path of the package page relative to the site root
    pub fn web_url(&self) -> String {
        if self.is_app() {
            format!("apps/{}/", self.name)
        } else {
            format!("pkgs/{}/", self.name)
        }
    }

    pub fn debug_view(&self) -> DebugView<'_> {
        DebugView {
            raw_metadata: self.debug_metadata.as_deref(),
            errors: &self.metadata_errors,
        }
    }

    pub fn in_category(&self, category: &Category) -> bool {
        self.categories.contains(category)
    }

    /// Entry for the search index
    pub fn to_search_document(&self) -> SearchDocument {
        SearchDocument {
            name: self.name.clone(),
            title: self.details.title.clone(),
            url: self.web_url(),
            icon: self.details.icon.clone(),
            summary: self.details.summary.clone(),
            description: self
                .remote_description
                .clone()
                .unwrap_or_else(|| self.details.description.clone()),
            version: self.version.to_full_str(),
            version_short: self.version.to_short_str().to_string(),
            is_app: self.is_app(),
            is_debug: self.is_debug(),
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let archs: Vec<&str> = self.archs().collect();
        write!(f, "{} {} [{}]", self.name, self.version, archs.join(", "))
    }
}

/// A package as exported for full-text search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub name: String,
    pub title: String,
    pub url: String,
    pub icon: Option<String>,
    pub summary: Option<String>,
    pub description: String,
    pub version: String,
    pub version_short: String,
    pub is_app: bool,
    pub is_debug: bool,
}
