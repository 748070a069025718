//! Tests for catalog queries

use chrono::{DateTime, TimeZone, Utc};
use chum_core::{
    ArchEntry, Catalog, Category, Companions, MetadataError, Package, PackageDetails,
    PackageVersion, PartialPackage,
};
use std::collections::{BTreeMap, BTreeSet};
use std::thread;

// ── fixtures ─────────────────────────────────────────────────────────────────

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn pkg(name: &str, updated: i64, categories: &[Category]) -> Package {
    Package::from_partial(PartialPackage {
        name: name.to_string(),
        version: PackageVersion::new("", "1.0", "1"),
        arch: "aarch64".to_string(),
        entry: ArchEntry {
            repo: "4.5.0.24_aarch64".to_string(),
            download_url: format!("https://repo.example.org/aarch64/{name}.rpm"),
            ..ArchEntry::default()
        },
        details: PackageDetails::default(),
        categories: categories.iter().cloned().collect::<BTreeSet<_>>(),
        screenshots: Vec::new(),
        links: BTreeMap::new(),
        changelog: Vec::new(),
        file_time: Some(ts(updated)),
        companions: Companions::for_name(name),
        debug_metadata: None,
        metadata_errors: Vec::new(),
    })
}

fn sample() -> Catalog {
    Catalog::new(vec![
        pkg("harbour-foo", 300, &[Category::Game]),
        pkg("harbour-foo-debuginfo", 300, &[Category::Other]),
        pkg("libbar", 100, &[Category::Library]),
        pkg("baz", 200, &[Category::Game, Category::Utility]),
    ])
}

// ── lookup ───────────────────────────────────────────────────────────────────

#[test]
fn test_lookup_and_iteration_order() {
    let catalog = sample();
    assert_eq!(catalog.len(), 4);
    assert!(catalog.get("libbar").is_some());
    assert!(catalog.get("missing").is_none());

    let names: Vec<&str> = catalog.names().collect();
    assert_eq!(names, vec!["baz", "harbour-foo", "harbour-foo-debuginfo", "libbar"]);
}

// ── companions ───────────────────────────────────────────────────────────────

#[test]
fn test_existing_companion_is_resolved() {
    let catalog = sample();
    let foo = catalog.get("harbour-foo").unwrap();
    assert_eq!(foo.debuginfo_package.as_deref(), Some("harbour-foo-debuginfo"));
    assert_eq!(
        catalog.debuginfo_of(foo).map(|p| p.name.as_str()),
        Some("harbour-foo-debuginfo")
    );
}

#[test]
fn test_missing_companion_resolves_to_absent() {
    let catalog = sample();
    let foo = catalog.get("harbour-foo").unwrap();
    assert_eq!(foo.debugsource_package, None);
    assert!(catalog.debugsource_of(foo).is_none());

    let bar = catalog.get("libbar").unwrap();
    assert!(catalog.debuginfo_of(bar).is_none());
}

// ── queries ──────────────────────────────────────────────────────────────────

#[test]
fn test_updated_after() {
    let catalog = sample();
    let recent: Vec<&str> = catalog
        .updated_after(ts(150))
        .into_iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(recent, vec!["harbour-foo", "harbour-foo-debuginfo", "baz"]);
}

#[test]
fn test_in_category() {
    let catalog = sample();
    let games: Vec<&str> = catalog
        .in_category(&Category::Game)
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(games, vec!["baz", "harbour-foo"]);
}

#[test]
fn test_statistics() {
    let mut broken = pkg("harbour-broken", 50, &[Category::Other]);
    broken
        .metadata_errors
        .push(MetadataError::UnrecognizedCategory("Chat".to_string()));
    let catalog = Catalog::new(vec![broken, pkg("libbar", 100, &[Category::Library])]);

    let stats = catalog.statistics();
    assert_eq!(stats.package_count, 2);
    assert_eq!(stats.app_count, 1);
    assert_eq!(stats.with_metadata_errors, vec!["harbour-broken".to_string()]);
    assert_eq!(stats.apps_without_icon, vec!["harbour-broken".to_string()]);
    assert_eq!(stats.per_arch.get("aarch64"), Some(&2));
    assert_eq!(stats.last_updated, Some(ts(100)));
}

#[test]
fn test_map_packages_before_handoff() {
    let catalog = sample().map_packages(|pkg| {
        pkg.remote_description = Some(format!("about {}", pkg.name));
    });
    assert_eq!(
        catalog.get("baz").unwrap().remote_description.as_deref(),
        Some("about baz")
    );
    // companions survive the rebuild
    assert!(catalog.get("harbour-foo").unwrap().debuginfo_package.is_some());
}

// ── sharing ──────────────────────────────────────────────────────────────────

#[test]
fn test_catalog_shared_across_threads() {
    let catalog = sample();
    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| catalog.search_documents().len()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 4);
        }
    });
}
