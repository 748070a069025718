//! The merged, read-only package catalog

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::category::Category;
use crate::models::{Package, SearchDocument};

/// All packages of one generation run, keyed by name.
///
/// Built once by the merger. Readers only get shared references, so a
/// catalog can be handed to any number of threads at the same time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    packages: BTreeMap<String, Package>,
}

impl Catalog {
    /// Builds a catalog and resolves debug companions against the complete
    /// set of names. Later packages replace earlier ones with the same name.
    pub fn new<I>(packages: I) -> Self
    where
        I: IntoIterator<Item = Package>,
    {
        let packages = packages
            .into_iter()
            .map(|pkg| (pkg.name.clone(), pkg))
            .collect();

        let mut catalog = Self { packages };
        catalog.resolve_companions();
        catalog
    }

    fn resolve_companions(&mut self) {
        let names: BTreeSet<String> = self.packages.keys().cloned().collect();

        for pkg in self.packages.values_mut() {
            pkg.debuginfo_package = names
                .get(&pkg.companions.debuginfo)
                .filter(|name| **name != pkg.name)
                .cloned();
            pkg.debugsource_package = names
                .get(&pkg.companions.debugsource)
                .filter(|name| **name != pkg.name)
                .cloned();
        }
    }

    /// Applies `f` to every package and re-resolves companions.
    ///
    /// Takes the catalog by value: only the owner can change it, before
    /// handing it out.
    pub fn map_packages<F>(mut self, mut f: F) -> Self
    where
        F: FnMut(&mut Package),
    {
        self.packages.values_mut().for_each(|pkg| f(pkg));
        self.resolve_companions();
        self
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Packages in name order
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// Packages updated strictly after `since`, most recent first
    pub fn updated_after(&self, since: DateTime<Utc>) -> Vec<&Package> {
        let mut result: Vec<&Package> = self.iter().filter(|pkg| pkg.updated > since).collect();
        result.sort_by(|a, b| b.updated.cmp(&a.updated).then_with(|| a.name.cmp(&b.name)));
        result
    }

    /// Packages tagged with `category`, in name order
    pub fn in_category<'a>(&'a self, category: &'a Category) -> impl Iterator<Item = &'a Package> + 'a {
        self.iter().filter(move |pkg| pkg.in_category(category))
    }

    pub fn apps(&self) -> impl Iterator<Item = &Package> {
        self.iter().filter(|pkg| pkg.is_app())
    }

    pub fn debuginfo_of(&self, pkg: &Package) -> Option<&Package> {
        pkg.debuginfo_package
            .as_deref()
            .and_then(|name| self.get(name))
    }

    pub fn debugsource_of(&self, pkg: &Package) -> Option<&Package> {
        pkg.debugsource_package
            .as_deref()
            .and_then(|name| self.get(name))
    }

    /// Every architecture any package is available for
    pub fn archs(&self) -> BTreeSet<&str> {
        self.iter().flat_map(|pkg| pkg.archs()).collect()
    }

    /// Machine-readable export for building a search index
    pub fn search_documents(&self) -> Vec<SearchDocument> {
        self.iter().map(Package::to_search_document).collect()
    }

    pub fn statistics(&self) -> CatalogStatistics {
        let mut stats = CatalogStatistics {
            package_count: self.len(),
            ..CatalogStatistics::default()
        };

        for pkg in self.iter() {
            if pkg.is_app() {
                stats.app_count += 1;
                if pkg.details.icon.is_none() {
                    stats.apps_without_icon.push(pkg.name.clone());
                }
            }
            if pkg.is_debug() {
                stats.debug_count += 1;
            }
            if !pkg.metadata_errors.is_empty() {
                stats.with_metadata_errors.push(pkg.name.clone());
            }
            for arch in pkg.archs() {
                *stats.per_arch.entry(arch.to_string()).or_default() += 1;
            }
            for category in &pkg.categories {
                *stats.per_category.entry(category.to_string()).or_default() += 1;
            }
            stats.last_updated = stats.last_updated.max(Some(pkg.updated));
        }

        stats
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Package;
    type IntoIter = std::collections::btree_map::Values<'a, String, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.values()
    }
}

/// Summary numbers about a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStatistics {
    pub package_count: usize,
    pub app_count: usize,
    pub debug_count: usize,
    /// Names of packages whose extension metadata had problems
    pub with_metadata_errors: Vec<String>,
    /// Apps without an icon usually mean the metadata block did not parse
    pub apps_without_icon: Vec<String>,
    pub per_arch: BTreeMap<String, usize>,
    pub per_category: BTreeMap<String, usize>,
    pub last_updated: Option<DateTime<Utc>>,
}
