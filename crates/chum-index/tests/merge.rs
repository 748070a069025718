//! Tests for merging package views into a catalog

use chrono::{DateTime, TimeZone, Utc};
use chum_core::{
    ArchEntry, Category, ChangelogEntry, Companions, MergeError, MetadataError, PackageDetails,
    PackageVersion, PartialPackage,
};
use chum_index::{CatalogMerger, MergePolicy};
use std::collections::{BTreeMap, BTreeSet};

// ── fixtures ─────────────────────────────────────────────────────────────────

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn view(name: &str, arch: &str, version: &str, updated: i64) -> PartialPackage {
    PartialPackage {
        name: name.to_string(),
        version: version.parse().unwrap(),
        arch: arch.to_string(),
        entry: ArchEntry {
            repo: format!("4.5.0.24_{arch}"),
            download_url: format!("https://repo.example.org/{arch}/{name}-{version}.{arch}.rpm"),
            download_size: 100,
            install_size: 200,
            checksum_type: Some("sha256".to_string()),
            checksum_value: Some(format!("{name}-{arch}")),
        },
        details: PackageDetails {
            title: name.to_string(),
            summary: Some(format!("{name} on {arch}")),
            ..PackageDetails::default()
        },
        categories: BTreeSet::from([Category::Other]),
        screenshots: Vec::new(),
        links: BTreeMap::new(),
        changelog: Vec::new(),
        file_time: Some(ts(updated)),
        companions: Companions::for_name(name),
        debug_metadata: None,
        metadata_errors: Vec::new(),
    }
}

fn merge(views: Vec<PartialPackage>) -> chum_core::Catalog {
    CatalogMerger::new(MergePolicy::Abort).merge(views).unwrap().catalog
}

// ── arch union ───────────────────────────────────────────────────────────────

#[test]
fn test_single_view_single_arch() {
    let catalog = merge(vec![view("foo", "aarch64", "1.0-1", 10)]);
    let archs: Vec<&str> = catalog.get("foo").unwrap().archs().collect();
    assert_eq!(archs, vec!["aarch64"]);
}

#[test]
fn test_two_archs_are_united() {
    let catalog = merge(vec![
        view("foo", "aarch64", "1.0-1", 10),
        view("foo", "armv7hl", "1.0-1", 10),
    ]);
    let foo = catalog.get("foo").unwrap();
    let archs: Vec<&str> = foo.archs().collect();
    assert_eq!(archs, vec!["aarch64", "armv7hl"]);
    assert!(foo.download_url("armv7hl").unwrap().contains("armv7hl"));
}

#[test]
fn test_latest_view_wins_scalars() {
    let catalog = merge(vec![
        view("foo", "aarch64", "1.0-1", 100),
        view("foo", "armv7hl", "1.0-1", 200),
    ]);
    let foo = catalog.get("foo").unwrap();
    assert_eq!(foo.details.summary.as_deref(), Some("foo on armv7hl"));
    assert_eq!(foo.archs().count(), 2);
    assert_eq!(foo.updated, ts(200));
}

#[test]
fn test_input_order_does_not_matter() {
    let views = vec![
        view("foo", "aarch64", "1.0-1", 100),
        view("foo", "armv7hl", "1.0-1", 100),
        view("foo", "i486", "1.0-1", 100),
        view("bar", "noarch", "2.0-1", 50),
    ];
    let mut reversed = views.clone();
    reversed.reverse();

    assert_eq!(merge(views), merge(reversed));
}

#[test]
fn test_tie_broken_by_arch() {
    let catalog = merge(vec![
        view("foo", "i486", "1.0-1", 100),
        view("foo", "aarch64", "1.0-1", 100),
    ]);
    assert_eq!(
        catalog.get("foo").unwrap().details.summary.as_deref(),
        Some("foo on i486")
    );
}

#[test]
fn test_highest_version_wins() {
    let catalog = merge(vec![
        view("foo", "aarch64", "1.2.1-2", 100),
        view("foo", "armv7hl", "1.2.0-1", 200),
    ]);
    let foo = catalog.get("foo").unwrap();
    assert_eq!(foo.version, PackageVersion::new("", "1.2.1", "2"));
    // scalars still come from the most recently updated view
    assert_eq!(foo.details.summary.as_deref(), Some("foo on armv7hl"));
}

#[test]
fn test_same_arch_collision_keeps_newer_version() {
    let mut old = view("foo", "noarch", "1.0-1", 300);
    old.entry.repo = "4.5.0.24_aarch64".to_string();
    let mut new = view("foo", "noarch", "1.1-1", 100);
    new.entry.repo = "4.5.0.24_i486".to_string();

    let catalog = merge(vec![old, new]);
    let foo = catalog.get("foo").unwrap();
    assert_eq!(foo.arch_entries.len(), 1);
    assert_eq!(foo.arch_entries["noarch"].repo, "4.5.0.24_i486");
}

#[test]
fn test_rebuild_in_same_repository_is_order_independent() {
    let mut old = view("foo", "aarch64", "1.0-1", 100);
    old.details.summary = Some("old build".to_string());
    let mut new = view("foo", "aarch64", "1.1-1", 100);
    new.details.summary = Some("new build".to_string());

    let forward = merge(vec![old.clone(), new.clone()]);
    let backward = merge(vec![new, old]);
    assert_eq!(forward, backward);

    let foo = forward.get("foo").unwrap();
    assert_eq!(foo.version, PackageVersion::new("", "1.1", "1"));
    assert_eq!(foo.details.summary.as_deref(), Some("new build"));
    assert!(foo.download_url("aarch64").unwrap().contains("1.1-1"));
}

#[test]
fn test_identical_builds_settle_on_download_url() {
    let mut a = view("foo", "aarch64", "1.0-1", 100);
    a.entry.download_url = "https://repo.example.org/a/foo.rpm".to_string();
    a.details.summary = Some("from a".to_string());
    let mut b = view("foo", "aarch64", "1.0-1", 100);
    b.entry.download_url = "https://repo.example.org/b/foo.rpm".to_string();
    b.details.summary = Some("from b".to_string());

    let forward = merge(vec![a.clone(), b.clone()]);
    assert_eq!(forward, merge(vec![b, a]));
    assert_eq!(
        forward.get("foo").unwrap().details.summary.as_deref(),
        Some("from b")
    );
}

#[test]
fn test_merging_view_with_itself() {
    let mut foo = view("foo", "aarch64", "1.0-1", 100);
    foo.changelog = vec![
        ChangelogEntry::new("A - 1.0-1", ts(90), "- second"),
        ChangelogEntry::new("A - 0.9-1", ts(50), "- first"),
    ];

    let catalog = merge(vec![foo.clone(), foo]);
    let merged = catalog.get("foo").unwrap();
    let archs: Vec<&str> = merged.archs().collect();
    assert_eq!(archs, vec!["aarch64"]);
    assert_eq!(merged.arch_entries.len(), 1);
    assert_eq!(merged.changelog.len(), 2);
}

// ── unions ───────────────────────────────────────────────────────────────────

#[test]
fn test_collections_are_united() {
    let mut a = view("foo", "aarch64", "1.0-1", 100);
    a.categories = BTreeSet::from([Category::Game]);
    a.screenshots = vec!["https://x/1.png".to_string(), "https://x/2.png".to_string()];
    a.links.insert("homepage".to_string(), "https://old".to_string());
    a.changelog = vec![ChangelogEntry::new("A - 1.0-1", ts(50), "- init")];

    let mut b = view("foo", "armv7hl", "1.0-1", 200);
    b.categories = BTreeSet::from([Category::Utility]);
    b.screenshots = vec!["https://x/2.png".to_string(), "https://x/3.png".to_string()];
    b.links.insert("homepage".to_string(), "https://new".to_string());
    b.changelog = vec![ChangelogEntry::new("A - 1.0-1", ts(50), "- init")];

    let catalog = merge(vec![b, a]);
    let foo = catalog.get("foo").unwrap();
    assert_eq!(foo.categories, BTreeSet::from([Category::Game, Category::Utility]));
    assert_eq!(
        foo.screenshots,
        vec!["https://x/1.png", "https://x/2.png", "https://x/3.png"]
    );
    assert_eq!(foo.links["homepage"], "https://new");
    assert_eq!(foo.changelog.len(), 1);
}

#[test]
fn test_debug_metadata_and_errors_come_from_winner() {
    let mut lower = view("foo", "aarch64", "1.0-1", 100);
    lower.debug_metadata = Some("Categories:\n  - Chat".to_string());
    lower.metadata_errors = vec![MetadataError::UnrecognizedCategory("Chat".to_string())];
    let mut winner = view("foo", "armv7hl", "1.0-1", 200);
    winner.debug_metadata = Some("Title: Foo".to_string());

    let catalog = merge(vec![lower, winner]);
    let debug = catalog.get("foo").unwrap().debug_view();
    assert_eq!(debug.raw_metadata, Some("Title: Foo"));
    assert!(debug.errors.is_empty());
}

// ── companions ───────────────────────────────────────────────────────────────

#[test]
fn test_companions_resolve_across_archs() {
    let catalog = merge(vec![
        view("foo", "aarch64", "1.0-1", 10),
        view("foo-debuginfo", "armv7hl", "1.0-1", 10),
    ]);
    let foo = catalog.get("foo").unwrap();
    assert_eq!(foo.debuginfo_package.as_deref(), Some("foo-debuginfo"));
    assert_eq!(foo.debugsource_package, None);
}

// ── conflicts ────────────────────────────────────────────────────────────────

#[test]
fn test_incomparable_versions_abort() {
    let views = vec![
        view("foo", "aarch64", "1.0-1", 100),
        view("foo", "armv7hl", "abc:1.0-1", 200),
    ];
    let err = CatalogMerger::new(MergePolicy::Abort).merge(views).unwrap_err();
    assert!(matches!(err, MergeError::IncomparableVersions { ref name, .. } if name == "foo"));
}

#[test]
fn test_incomparable_versions_drop_lower_precedence() {
    let views = vec![
        view("foo", "aarch64", "1.0-1", 100),
        view("foo", "armv7hl", "abc:1.0-1", 200),
        view("bar", "aarch64", "1.0-1", 100),
    ];
    let outcome = CatalogMerger::new(MergePolicy::DropConflicting)
        .merge(views)
        .unwrap();

    assert_eq!(outcome.conflicts.len(), 1);
    let foo = outcome.catalog.get("foo").unwrap();
    let archs: Vec<&str> = foo.archs().collect();
    assert_eq!(archs, vec!["armv7hl"]);
    assert!(outcome.catalog.contains("bar"));
}
