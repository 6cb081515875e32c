use std::sync::{Arc, PoisonError, RwLock};

use crate::package::{AliasPackage, Package};
use crate::solver::PoolEntry;

use super::{Repository, RepositoryKind};

/// Eager in-memory repository
#[derive(Debug)]
pub struct ArrayRepository {
    name: String,
    kind: RepositoryKind,
    packages: RwLock<Vec<PoolEntry>>,
}

impl ArrayRepository {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, RepositoryKind::Remote)
    }

    /// Repository of the packages currently installed
    pub fn installed() -> Self {
        Self::with_kind("installed", RepositoryKind::Installed)
    }

    /// Repository of platform packages (`php`, `ext-*`, ...)
    pub fn platform() -> Self {
        Self::with_kind("platform", RepositoryKind::Platform)
    }

    pub fn with_kind(name: impl Into<String>, kind: RepositoryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            packages: RwLock::new(Vec::new()),
        }
    }

    /// Adds a package and returns the shared handle the pool will see
    pub fn add_package(&self, package: Package) -> Arc<Package> {
        let package = Arc::new(package);
        self.add_entry(PoolEntry::Package(package.clone()));
        package
    }

    pub fn add_entry(&self, entry: PoolEntry) {
        self.packages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    pub fn with_packages(self, packages: impl IntoIterator<Item = Package>) -> Self {
        for package in packages {
            self.add_package(package);
        }
        self
    }
}

impl Repository for ArrayRepository {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> RepositoryKind {
        self.kind
    }

    fn packages(&self) -> Vec<PoolEntry> {
        self.packages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn add_alias(&self, alias: Arc<AliasPackage>) {
        self.add_entry(PoolEntry::Alias(alias));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_repository_packages() {
        let repo = ArrayRepository::new("test").with_packages([
            Package::new("a/a", "1.0"),
            Package::new("a/a", "2.0"),
        ]);
        assert_eq!(repo.name(), "test");
        assert_eq!(repo.kind(), RepositoryKind::Remote);
        assert_eq!(repo.count(), 2);
        assert!(!repo.is_lazy());
    }

    #[test]
    fn test_add_alias_registers_entry() {
        let repo = ArrayRepository::installed();
        let base = repo.add_package(Package::new("a/a", "dev-main"));
        repo.add_alias(Arc::new(AliasPackage::new(base, "1.0.0.0", "1.0.0")));

        let packages = repo.packages();
        assert_eq!(packages.len(), 2);
        assert!(packages[1].is_alias());
        assert!(repo.kind().is_exempt_from_stability());
    }
}
