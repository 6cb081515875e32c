use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, HashSet};

use bucket_semver::compare_versions;

use super::pool::{InstalledMap, PackageId, Pool};
use super::rule::Literal;

/// Decides which candidate the solver tries first.
///
/// Implementations only reorder candidates; the solver keeps the rest as
/// branches to fall back on.
pub trait Policy {
    /// Candidates ordered best first
    fn select_preferred_packages(
        &self,
        pool: &Pool,
        installed: &InstalledMap,
        literals: &[Literal],
        required_package: Option<&str>,
    ) -> Vec<Literal>;

    /// Packages an installed package may be updated to: every other package
    /// carrying the same name
    fn find_update_packages(
        &self,
        pool: &Pool,
        _installed: &InstalledMap,
        package: PackageId,
    ) -> Vec<PackageId> {
        let Some(entry) = pool.entry(package) else {
            return Vec::new();
        };
        pool.what_provides(entry.name(), None, false, false)
            .into_iter()
            .filter(|&id| id != package)
            .collect()
    }
}

/// Policy for selecting between candidate packages.
///
/// Every candidate gets a sort key, compared field by field:
/// 1. Root aliases first
/// 2. Original packages before packages replacing another candidate's name
/// 3. Packages from the required package's vendor
/// 4. Repository priority; an installed package ranks with the best
///    repository offering a candidate of its name
/// 5. Stability (when `prefer_stable`)
/// 6. Version, highest first unless `prefer_lowest`
/// 7. Installed packages before identical versions from elsewhere
/// 8. Package id (pool insertion order)
///
/// An alias is keyed like the package it aliases and sorts right before it.
#[derive(Debug, Clone)]
pub struct DefaultPolicy {
    pub prefer_stable: bool,
    pub prefer_lowest: bool,
}

/// Precomputed ordering fields of one candidate
#[derive(Debug)]
struct SortKey {
    id: PackageId,
    not_root_alias: bool,
    replacer: bool,
    other_vendor: bool,
    priority: Reverse<i32>,
    stability: u8,
    version: String,
    not_installed: bool,
    /// The aliased package's id for aliases, the own id otherwise
    base: PackageId,
    not_alias: bool,
}

impl Default for DefaultPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultPolicy {
    pub fn new() -> Self {
        Self {
            prefer_stable: true,
            prefer_lowest: false,
        }
    }

    pub fn prefer_stable(mut self, prefer: bool) -> Self {
        self.prefer_stable = prefer;
        self
    }

    pub fn prefer_lowest(mut self, prefer: bool) -> Self {
        self.prefer_lowest = prefer;
        self
    }

    fn sort_key(
        &self,
        pool: &Pool,
        installed: &InstalledMap,
        id: PackageId,
        candidate_names: &HashSet<String>,
        best_priority: &BTreeMap<String, i32>,
        required_vendor: Option<&str>,
    ) -> Option<SortKey> {
        let entry = pool.entry(id)?;
        let base = pool.alias_base_id(id).unwrap_or(id);
        let base_entry = pool.entry(base).unwrap_or_else(|| entry.clone());

        let replacer = entry
            .replaces()
            .iter()
            .any(|link| link.target != entry.name() && candidate_names.contains(&link.target));
        let other_vendor = required_vendor.map_or(false, |vendor| {
            !base_entry
                .name()
                .split_once('/')
                .map_or(false, |(own, _)| own == vendor)
        });

        let base_installed = installed.contains_key(&base);
        let priority = if base_installed {
            best_priority
                .get(base_entry.name())
                .copied()
                .unwrap_or_else(|| pool.priority(base))
        } else {
            pool.priority(base)
        };

        Some(SortKey {
            id,
            not_root_alias: !entry.is_root_package_alias(),
            replacer,
            other_vendor,
            priority: Reverse(priority),
            stability: if self.prefer_stable { base_entry.stability().priority() } else { 0 },
            version: base_entry.version().to_string(),
            not_installed: !base_installed,
            base,
            not_alias: !entry.is_alias(),
        })
    }

    fn compare_keys(&self, a: &SortKey, b: &SortKey) -> Ordering {
        let version_cmp = compare_versions(&a.version, &b.version);
        let version_cmp = if self.prefer_lowest { version_cmp } else { version_cmp.reverse() };

        a.not_root_alias
            .cmp(&b.not_root_alias)
            .then(a.replacer.cmp(&b.replacer))
            .then(a.other_vendor.cmp(&b.other_vendor))
            .then(a.priority.cmp(&b.priority))
            .then(a.stability.cmp(&b.stability))
            .then(version_cmp)
            .then(a.not_installed.cmp(&b.not_installed))
            .then(a.base.cmp(&b.base))
            .then(a.not_alias.cmp(&b.not_alias))
            .then(a.id.cmp(&b.id))
    }
}

impl Policy for DefaultPolicy {
    fn select_preferred_packages(
        &self,
        pool: &Pool,
        installed: &InstalledMap,
        literals: &[Literal],
        required_package: Option<&str>,
    ) -> Vec<Literal> {
        if literals.is_empty() {
            return Vec::new();
        }

        let mut candidate_names = HashSet::new();
        // best priority among the candidates not installed, per name
        let mut best_priority: BTreeMap<String, i32> = BTreeMap::new();
        for &literal in literals {
            let id = literal.abs();
            let Some(entry) = pool.entry(id) else {
                continue;
            };
            candidate_names.insert(entry.name().to_string());

            let base = pool.alias_base_id(id).unwrap_or(id);
            if !installed.contains_key(&base) {
                let priority = pool.priority(base);
                best_priority
                    .entry(entry.name().to_string())
                    .and_modify(|best| *best = (*best).max(priority))
                    .or_insert(priority);
            }
        }

        let required_vendor = required_package.and_then(|name| name.split_once('/')).map(|(vendor, _)| vendor);

        let mut keys: Vec<SortKey> = Vec::with_capacity(literals.len());
        let mut unknown: Vec<PackageId> = Vec::new();
        for &literal in literals {
            let id = literal.abs();
            match self.sort_key(pool, installed, id, &candidate_names, &best_priority, required_vendor) {
                Some(key) => keys.push(key),
                None => unknown.push(id),
            }
        }

        keys.sort_by(|a, b| self.compare_keys(a, b));
        unknown.sort_unstable();

        keys.into_iter().map(|key| key.id).chain(unknown).collect()
    }
}
