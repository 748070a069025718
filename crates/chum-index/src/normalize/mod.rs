//! Turning raw index records into per-architecture package views

mod metadata;

pub use metadata::{name_to_title, parse_extension, ExtensionMetadata, Parsed};

use chrono::{DateTime, Utc};
use chum_core::{
    ArchEntry, Category, ChangelogEntry, Companions, MetadataError, PackageDetails,
    PackageVersion, PartialPackage,
};
use std::collections::BTreeSet;

use crate::error::RecordAnomaly;
use crate::parsers::RawRecord;

/// Where a record was read from
#[derive(Debug, Clone, Copy)]
pub struct RecordContext<'a> {
    /// Repository name, e.g. `4.5.0.24_aarch64`
    pub repo: &'a str,
    /// Repository base URL with a trailing `/`
    pub base_url: &'a str,
}

/// Joins paragraphs into a description, each on a single line
fn join_paragraphs(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .map(|p| {
            p.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds the partial view of one record.
///
/// `changelog` holds the entries the changelog index has for this record's
/// (name, arch).
pub fn normalize(
    record: RawRecord,
    ctx: &RecordContext<'_>,
    changelog: Vec<ChangelogEntry>,
) -> Result<PartialPackage, RecordAnomaly> {
    if record.name.is_empty() {
        return Err(RecordAnomaly::MissingName);
    }
    if record.ver.trim().is_empty() {
        return Err(RecordAnomaly::MissingVersion(record.name));
    }

    let mut paragraphs = record.paragraphs();
    let mut details = PackageDetails {
        title: name_to_title(&record.name),
        summary: record.summary.clone(),
        license: record.license.clone(),
        url: record.url.clone(),
        ..PackageDetails::default()
    };
    let mut categories = BTreeSet::from([Category::Other]);
    let mut screenshots = Vec::new();
    let mut links = Default::default();
    let mut metadata_errors = Vec::new();

    // The last paragraph is kept verbatim for the debug view, whether or not
    // it turns out to be metadata
    let debug_metadata = paragraphs.last().cloned();
    let extension = match debug_metadata.as_deref().map(parse_extension) {
        Some(Ok(parsed)) => parsed,
        Some(Err(e)) => {
            log::debug!("{}: extension block is not YAML: {}", record.name, e);
            metadata_errors.push(MetadataError::InvalidYaml(e.to_string()));
            None
        }
        None => None,
    };
    if let Some(parsed) = extension {
        paragraphs.pop();
        let meta = parsed.value;

        if let Some(title) = meta.title {
            details.title = title;
        }
        details.app_type = meta.app_type.unwrap_or_default();
        details.icon = meta.icon;
        details.developer_name = meta.developer_name;
        details.packager_name = meta.packager_name;
        details.repo_url = meta.repo_url;
        details.packaging_repo_url = meta.packaging_repo_url;
        details.markdown_url = meta.markdown_url;
        screenshots = meta.screenshots;
        links = meta.links;
        if let Some(found) = meta.categories {
            categories = found;
        }

        metadata_errors = parsed.errors;
        if !metadata_errors.is_empty() {
            log::debug!("{}: {} metadata problem(s)", record.name, metadata_errors.len());
        }
    }
    details.description = join_paragraphs(&paragraphs);

    if record.name.starts_with("lib") {
        categories.insert(Category::Library);
    }

    let entry = ArchEntry {
        repo: ctx.repo.to_string(),
        download_url: format!("{}{}", ctx.base_url, record.location.trim_start_matches('/')),
        download_size: record.package_size,
        install_size: record.installed_size,
        checksum_type: record.checksum_type,
        checksum_value: record.checksum_value,
    };

    Ok(PartialPackage {
        version: PackageVersion::new(record.epoch, record.ver, record.rel),
        arch: record.arch,
        entry,
        details,
        categories,
        screenshots,
        links,
        changelog,
        file_time: record.file_time.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        companions: Companions::for_name(&record.name),
        debug_metadata,
        metadata_errors,
        name: record.name,
    })
}
