//! Folding per-architecture views into catalog packages

use chum_core::{
    dedup_changelog, ArchEntry, Catalog, MergeError, Package, PackageVersion, PartialPackage,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// What to do when two views of a package have versions that cannot be ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Stop and return the error
    #[default]
    Abort,
    /// Leave out the view with lower precedence and keep going
    DropConflicting,
}

/// Result of a merge
#[derive(Debug)]
pub struct MergeOutcome {
    pub catalog: Catalog,
    /// Conflicts resolved by dropping a view
    pub conflicts: Vec<MergeError>,
}

/// Orders views of one package from lowest to highest precedence:
/// latest update wins, ties go to the greater architecture, then the
/// greater repository name, then the newer version. The download URL and
/// checksum settle builds that agree on all of those.
fn precedence(a: &PartialPackage, b: &PartialPackage) -> Ordering {
    a.updated()
        .cmp(&b.updated())
        .then_with(|| a.arch.cmp(&b.arch))
        .then_with(|| a.entry.repo.cmp(&b.entry.repo))
        .then_with(|| a.version.try_cmp(&b.version).unwrap_or(Ordering::Equal))
        .then_with(|| a.entry.download_url.cmp(&b.entry.download_url))
        .then_with(|| a.entry.checksum_value.cmp(&b.entry.checksum_value))
}

fn conflict(name: &str, a: &PartialPackage, b: &PartialPackage) -> Option<MergeError> {
    if a.version == b.version || a.version.try_cmp(&b.version).is_some() {
        return None;
    }
    Some(MergeError::IncomparableVersions {
        name: name.to_string(),
        left: a.version.clone(),
        left_arch: a.arch.clone(),
        right: b.version.clone(),
        right_arch: b.arch.clone(),
    })
}

/// `true` when `a` is strictly older than `b`
fn older(a: &PackageVersion, b: &PackageVersion) -> bool {
    a.try_cmp(b) == Some(Ordering::Less)
}

/// Builds the catalog out of partial package views
#[derive(Debug, Clone, Default)]
pub struct CatalogMerger {
    policy: MergePolicy,
}

impl CatalogMerger {
    pub fn new(policy: MergePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Groups views by name and folds every group into one package.
    /// The order of `views` does not matter.
    pub fn merge<I>(&self, views: I) -> Result<MergeOutcome, MergeError>
    where
        I: IntoIterator<Item = PartialPackage>,
    {
        let mut groups: BTreeMap<String, Vec<PartialPackage>> = BTreeMap::new();
        for view in views {
            groups.entry(view.name.clone()).or_default().push(view);
        }

        let mut conflicts = Vec::new();
        let mut packages = Vec::with_capacity(groups.len());
        for (name, group) in groups {
            let mut group = self.check_versions(&name, group, &mut conflicts)?;
            if let Some(winner) = group.pop() {
                packages.push(merge_group(group, winner));
            }
        }

        log::info!(
            "Merged {} packages ({} conflicting views dropped)",
            packages.len(),
            conflicts.len()
        );

        Ok(MergeOutcome {
            catalog: Catalog::new(packages),
            conflicts,
        })
    }

    /// Sorts a group by precedence and removes views whose version cannot be
    /// ordered against a view of higher precedence
    fn check_versions(
        &self,
        name: &str,
        mut group: Vec<PartialPackage>,
        conflicts: &mut Vec<MergeError>,
    ) -> Result<Vec<PartialPackage>, MergeError> {
        group.sort_by(precedence);

        let mut kept: Vec<PartialPackage> = Vec::with_capacity(group.len());
        while let Some(view) = group.pop() {
            match kept.iter().find_map(|other| conflict(name, other, &view)) {
                None => kept.push(view),
                Some(err) => match self.policy {
                    MergePolicy::Abort => return Err(err),
                    MergePolicy::DropConflicting => {
                        log::warn!("{}; dropping the {} view", err, view.arch);
                        conflicts.push(err);
                    }
                },
            }
        }

        kept.reverse();
        Ok(kept)
    }
}

/// Folds the views of one package. `lower` is sorted from lowest to highest
/// precedence and `winner` comes after all of them.
///
/// The raw metadata block and its errors both come from the winner.
fn merge_group(mut lower: Vec<PartialPackage>, mut winner: PartialPackage) -> Package {
    let mut version: Option<PackageVersion> = None;
    let mut arch_entries: BTreeMap<String, (ArchEntry, PackageVersion)> = BTreeMap::new();
    let mut categories = BTreeSet::new();
    let mut screenshots: Vec<String> = Vec::new();
    let mut links = BTreeMap::new();
    let mut changelog = Vec::new();
    let updated = lower
        .iter()
        .chain(std::iter::once(&winner))
        .map(PartialPackage::updated)
        .max();

    for view in lower.iter_mut().chain(std::iter::once(&mut winner)) {
        if version.as_ref().map_or(true, |v| older(v, &view.version)) {
            version = Some(view.version.clone());
        }

        let replace = match arch_entries.get(&view.arch) {
            Some((_, existing)) => !older(&view.version, existing),
            None => true,
        };
        if replace {
            arch_entries.insert(
                view.arch.clone(),
                (view.entry.clone(), view.version.clone()),
            );
        }

        categories.extend(view.categories.iter().cloned());
        for shot in &view.screenshots {
            if !screenshots.contains(shot) {
                screenshots.push(shot.clone());
            }
        }
        links.extend(std::mem::take(&mut view.links));
        changelog.append(&mut view.changelog);
    }

    let mut package = Package::from_partial(winner);

    if let Some(version) = version {
        package.version = version;
    }
    package.arch_entries = arch_entries
        .into_iter()
        .map(|(arch, (entry, _))| (arch, entry))
        .collect();
    package.categories = categories;
    package.screenshots = screenshots;
    package.links = links;
    package.changelog = dedup_changelog(changelog);
    if let Some(updated) = updated {
        package.updated = package.updated.max(updated);
    }

    package
}
