use indexmap::IndexMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::package::{AliasPackage, Package};
use crate::solver::PoolEntry;

use super::{AcceptableFn, Repository, RepositoryKind};

/// Lazy repository that only hands out packages for names it is asked about.
///
/// Packages are indexed under every name they carry, so a query for a
/// virtual name also yields its providers and replacers.
#[derive(Debug)]
pub struct ProviderRepository {
    name: String,
    providers: RwLock<IndexMap<String, Vec<PoolEntry>>>,
    loaded: Mutex<Vec<String>>,
}

impl ProviderRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            providers: RwLock::new(IndexMap::new()),
            loaded: Mutex::new(Vec::new()),
        }
    }

    pub fn add_package(&self, package: Package) -> Arc<Package> {
        let package = Arc::new(package);
        self.index(PoolEntry::Package(package.clone()));
        package
    }

    pub fn with_packages(self, packages: impl IntoIterator<Item = Package>) -> Self {
        for package in packages {
            self.add_package(package);
        }
        self
    }

    /// Names queried so far, in query order
    pub fn loaded_names(&self) -> Vec<String> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn index(&self, entry: PoolEntry) {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        for name in entry.names(true) {
            providers.entry(name).or_default().push(entry.clone());
        }
    }
}

impl Repository for ProviderRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> RepositoryKind {
        RepositoryKind::Remote
    }

    fn packages(&self) -> Vec<PoolEntry> {
        Vec::new()
    }

    fn is_lazy(&self) -> bool {
        true
    }

    fn what_provides(
        &self,
        name: &str,
        acceptable: &AcceptableFn<'_>,
        bypass_filters: bool,
    ) -> Vec<PoolEntry> {
        {
            let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
            if !loaded.iter().any(|n| n == name) {
                loaded.push(name.to_string());
            }
        }

        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let candidates: Vec<PoolEntry> = providers
            .get(name)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| bypass_filters || acceptable(&entry.names(true), entry.stability()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        log::debug!(
            "Loaded {} candidates for {} from {}",
            candidates.len(),
            name,
            self.name
        );
        candidates
    }

    fn add_alias(&self, alias: Arc<AliasPackage>) {
        self.index(PoolEntry::Alias(alias));
    }

    fn count(&self) -> usize {
        // every entry is indexed under its own name exactly once
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, entries)| entries.iter().filter(|e| e.name() == name.as_str()).count())
            .sum()
    }
}
