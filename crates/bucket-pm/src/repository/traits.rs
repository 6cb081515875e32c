use std::sync::Arc;

use bucket_semver::Stability;

use crate::package::AliasPackage;
use crate::solver::PoolEntry;

/// Where a repository's packages come from.
///
/// Installed and platform repositories describe what already exists on the
/// system, so the pool never filters them by stability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RepositoryKind {
    #[default]
    Remote,
    Installed,
    Platform,
}

impl RepositoryKind {
    pub fn is_exempt_from_stability(&self) -> bool {
        matches!(self, RepositoryKind::Installed | RepositoryKind::Platform)
    }
}

/// Predicate deciding whether a package with the given names and stability
/// may enter the pool
pub type AcceptableFn<'a> = dyn Fn(&[String], Stability) -> bool + 'a;

/// Repository interface - read-only package source for the pool
pub trait Repository: Send + Sync {
    /// Get a unique name for this repository
    fn name(&self) -> &str;

    fn kind(&self) -> RepositoryKind {
        RepositoryKind::Remote
    }

    /// All packages of an eager repository
    fn packages(&self) -> Vec<PoolEntry>;

    /// Lazy repositories are queried per name through `what_provides`
    fn is_lazy(&self) -> bool {
        false
    }

    /// Packages providing `name`, loaded on demand.
    ///
    /// Unless `bypass_filters` is set only packages passing `acceptable`
    /// are returned.
    fn what_provides(
        &self,
        _name: &str,
        _acceptable: &AcceptableFn<'_>,
        _bypass_filters: bool,
    ) -> Vec<PoolEntry> {
        Vec::new()
    }

    /// Registers an alias the pool synthesized for a package of this repository
    fn add_alias(&self, alias: Arc<AliasPackage>);

    fn count(&self) -> usize {
        self.packages().len()
    }
}
