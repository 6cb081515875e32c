use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use bucket_semver::{Constraint, ConstraintInterface, ConstraintKey, Operator, VersionParser};

use crate::package::{AliasPackage, Link, Package, Stability};
use crate::repository::Repository;
use crate::util::is_platform_package;

/// A package id inside the pool; 1-based, never 0.
///
/// Literals in SAT clauses are signed package ids: positive means
/// "install", negative means "don't install".
pub type PackageId = i32;

/// Installed packages by pool id, in installed-repository order
pub type InstalledMap = indexmap::IndexMap<PackageId, PoolEntry>;

/// Represents an entry in the pool - either a regular package or an alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEntry {
    Package(Arc<Package>),
    Alias(Arc<AliasPackage>),
}

impl PoolEntry {
    pub fn name(&self) -> &str {
        match self {
            PoolEntry::Package(p) => p.name(),
            PoolEntry::Alias(a) => a.name(),
        }
    }

    pub fn pretty_name(&self) -> &str {
        match self {
            PoolEntry::Package(p) => p.pretty_name(),
            PoolEntry::Alias(a) => a.pretty_name(),
        }
    }

    /// Returns the normalized version
    pub fn version(&self) -> &str {
        match self {
            PoolEntry::Package(p) => p.version(),
            PoolEntry::Alias(a) => a.version(),
        }
    }

    pub fn pretty_version(&self) -> &str {
        match self {
            PoolEntry::Package(p) => p.pretty_version(),
            PoolEntry::Alias(a) => a.pretty_version(),
        }
    }

    pub fn stability(&self) -> Stability {
        match self {
            PoolEntry::Package(p) => p.stability(),
            PoolEntry::Alias(a) => a.stability(),
        }
    }

    pub fn is_dev(&self) -> bool {
        self.stability() == Stability::Dev
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, PoolEntry::Alias(_))
    }

    pub fn is_root_package_alias(&self) -> bool {
        matches!(self, PoolEntry::Alias(a) if a.is_root_package_alias())
    }

    pub fn as_alias(&self) -> Option<&Arc<AliasPackage>> {
        match self {
            PoolEntry::Alias(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_package(&self) -> Option<&Arc<Package>> {
        match self {
            PoolEntry::Package(p) => Some(p),
            _ => None,
        }
    }

    /// The concrete package behind this entry
    pub fn base_package(&self) -> &Arc<Package> {
        match self {
            PoolEntry::Package(p) => p,
            PoolEntry::Alias(a) => a.alias_of(),
        }
    }

    pub fn names(&self, include_provides: bool) -> Vec<String> {
        match self {
            PoolEntry::Package(p) => p.names(include_provides),
            PoolEntry::Alias(a) => a.names(include_provides),
        }
    }

    pub fn requires(&self) -> Vec<Link> {
        match self {
            PoolEntry::Package(p) => p.requires(),
            PoolEntry::Alias(a) => a.requires(),
        }
    }

    pub fn conflicts(&self) -> Vec<Link> {
        match self {
            PoolEntry::Package(p) => p.conflicts(),
            PoolEntry::Alias(a) => a.conflicts(),
        }
    }

    pub fn provides(&self) -> Vec<Link> {
        match self {
            PoolEntry::Package(p) => p.provides(),
            PoolEntry::Alias(a) => a.provides(),
        }
    }

    pub fn replaces(&self) -> Vec<Link> {
        match self {
            PoolEntry::Package(p) => p.replaces(),
            PoolEntry::Alias(a) => a.replaces(),
        }
    }

    pub fn unique_name(&self) -> String {
        match self {
            PoolEntry::Package(p) => p.unique_name(),
            PoolEntry::Alias(a) => a.unique_name(),
        }
    }

    pub fn pretty_string(&self) -> String {
        match self {
            PoolEntry::Package(p) => p.pretty_string(),
            PoolEntry::Alias(a) => a.pretty_string(),
        }
    }

    /// Address of the shared allocation; one pool id per allocation
    fn identity(&self) -> usize {
        match self {
            PoolEntry::Package(p) => Arc::as_ptr(p) as *const () as usize,
            PoolEntry::Alias(a) => Arc::as_ptr(a) as *const () as usize,
        }
    }
}

impl fmt::Display for PoolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolEntry::Package(p) => write!(f, "{}", p),
            PoolEntry::Alias(a) => write!(f, "{}", a),
        }
    }
}

/// How a candidate relates to a requested name and constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolMatch {
    /// Unrelated to the name
    None,
    /// Same name, version outside the constraint
    Name,
    /// Same name, version inside the constraint
    Match,
    /// Provides the name with a matching constraint
    Provide,
    /// Replaces the name with a matching constraint
    Replace,
    /// Would match, but a require filter rejects it
    Filtered,
}

/// An alias declared in the root requirements (`dev-main as 1.0.0`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootAlias {
    /// Alias version as written
    pub alias: String,
    /// Normalized alias version
    pub alias_normalized: String,
}

/// Root aliases by package name, then by normalized aliased version
pub type RootAliases = HashMap<String, HashMap<String, RootAlias>>;

type ProviderCacheKey = (String, bool, Option<ConstraintKey>);

/// Pool of all available packages for dependency resolution.
///
/// Every package instance gets a unique 1-based id that is used as literal
/// in SAT clauses. Entries from lazy repositories are assigned ids as they
/// are discovered, so lookups take `&self` and keep their state in cells.
pub struct Pool {
    /// All entries; id `n` lives at index `n - 1`
    entries: RefCell<Vec<PoolEntry>>,

    /// Repository index of every entry, parallel to `entries`
    entry_repositories: RefCell<Vec<usize>>,

    ids_by_identity: RefCell<HashMap<usize, PackageId>>,

    /// Ids of eager entries by their own name
    packages_by_exact_name: RefCell<HashMap<String, Vec<PackageId>>>,

    /// Ids of eager entries by every name they carry (name, provides, replaces)
    packages_by_name: RefCell<HashMap<String, Vec<PackageId>>>,

    repositories: Vec<Arc<dyn Repository>>,

    /// Lazy repositories (index into `repositories`) and the root aliases
    /// to apply to what they return
    lazy_repositories: Vec<(usize, RootAliases)>,

    minimum_stability: Stability,

    /// Per-package stability overrides
    stability_flags: HashMap<String, Stability>,

    /// Constraints every provider of a name must also satisfy
    filter_requires: HashMap<String, Box<dyn ConstraintInterface>>,

    whitelist: RefCell<Option<HashSet<PackageId>>>,

    provider_cache: RefCell<HashMap<ProviderCacheKey, Vec<PackageId>>>,

    /// Cached parsed constraints (constraint string -> parsed constraint)
    parsed_constraints: RefCell<HashMap<String, Option<Box<dyn ConstraintInterface>>>>,

    version_parser: VersionParser,
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("entries", &self.entries.borrow())
            .field(
                "repositories",
                &self.repositories.iter().map(|r| r.name().to_string()).collect::<Vec<_>>(),
            )
            .field("minimum_stability", &self.minimum_stability)
            .field("stability_flags", &self.stability_flags)
            .field("filter_requires", &self.filter_requires)
            .finish()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new(Stability::Stable, HashMap::new(), HashMap::new())
    }
}

impl Pool {
    /// Creates an empty pool.
    ///
    /// Platform package names are dropped from `filter_requires`; the
    /// platform is what it is and cannot be filtered.
    pub fn new(
        minimum_stability: Stability,
        stability_flags: HashMap<String, Stability>,
        filter_requires: HashMap<String, Box<dyn ConstraintInterface>>,
    ) -> Self {
        let filter_requires = filter_requires
            .into_iter()
            .filter(|(name, _)| !is_platform_package(name))
            .collect();

        Self {
            entries: RefCell::new(Vec::new()),
            entry_repositories: RefCell::new(Vec::new()),
            ids_by_identity: RefCell::new(HashMap::new()),
            packages_by_exact_name: RefCell::new(HashMap::new()),
            packages_by_name: RefCell::new(HashMap::new()),
            repositories: Vec::new(),
            lazy_repositories: Vec::new(),
            minimum_stability,
            stability_flags,
            filter_requires,
            whitelist: RefCell::new(None),
            provider_cache: RefCell::new(HashMap::new()),
            parsed_constraints: RefCell::new(HashMap::new()),
            version_parser: VersionParser::new(),
        }
    }

    pub fn with_minimum_stability(minimum_stability: Stability) -> Self {
        Self::new(minimum_stability, HashMap::new(), HashMap::new())
    }

    pub fn minimum_stability(&self) -> Stability {
        self.minimum_stability
    }

    pub fn add_repository(&mut self, repository: Arc<dyn Repository>) {
        self.add_repository_with_aliases(repository, &RootAliases::new());
    }

    /// Adds a repository; earlier repositories have higher priority.
    ///
    /// Eager repositories are indexed immediately, lazy ones are only
    /// consulted from `what_provides`.
    pub fn add_repository_with_aliases(
        &mut self,
        repository: Arc<dyn Repository>,
        root_aliases: &RootAliases,
    ) {
        let repo_index = self.repositories.len();
        self.repositories.push(repository.clone());
        self.provider_cache.borrow_mut().clear();

        if repository.is_lazy() {
            log::debug!("Registered lazy repository {}", repository.name());
            self.lazy_repositories.push((repo_index, root_aliases.clone()));
            return;
        }

        let exempt = repository.kind().is_exempt_from_stability();
        let mut added = 0usize;
        for entry in repository.packages() {
            if !exempt && !self.is_package_acceptable(&entry.names(true), entry.stability()) {
                continue;
            }

            let (id, is_new) = self.register(entry.clone(), repo_index);
            if !is_new {
                continue;
            }
            self.index(id, &entry);
            added += 1;

            if let Some(alias) = root_alias_for(&entry, root_aliases) {
                repository.add_alias(alias.clone());
                let alias_entry = PoolEntry::Alias(alias);
                let (alias_id, _) = self.register(alias_entry.clone(), repo_index);
                self.index(alias_id, &alias_entry);
                added += 1;
            }
        }

        log::debug!("Added {} packages from repository {}", added, repository.name());
    }

    /// Whether a package with these names and stability may enter the pool.
    ///
    /// A stability flag on any of the names overrides the minimum stability.
    pub fn is_package_acceptable(&self, names: &[String], stability: Stability) -> bool {
        names.iter().any(|name| match self.stability_flags.get(name) {
            Some(flag) => stability.priority() <= flag.priority(),
            None => stability.priority() <= self.minimum_stability.priority(),
        })
    }

    /// Number of entries in the pool
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entry(&self, id: PackageId) -> Option<PoolEntry> {
        if id <= 0 {
            return None;
        }
        self.entries.borrow().get(id as usize - 1).cloned()
    }

    pub fn literal_to_entry(&self, literal: i32) -> Option<PoolEntry> {
        self.entry(literal.abs())
    }

    /// The id this exact package instance was given, if any
    pub fn id_of(&self, entry: &PoolEntry) -> Option<PackageId> {
        self.ids_by_identity.borrow().get(&entry.identity()).copied()
    }

    /// For an alias entry, the id of the package it aliases
    pub fn alias_base_id(&self, id: PackageId) -> Option<PackageId> {
        let entry = self.entry(id)?;
        let alias = entry.as_alias()?;
        self.id_of(&PoolEntry::Package(alias.alias_of().clone()))
    }

    /// Repository priority of an entry; higher is preferred
    pub fn priority(&self, id: PackageId) -> i32 {
        if id <= 0 {
            return 0;
        }
        self.entry_repositories
            .borrow()
            .get(id as usize - 1)
            .map_or(0, |index| -(*index as i32))
    }

    /// Restricts `what_provides` to the given ids; `None` lifts the restriction
    pub fn set_whitelist(&self, whitelist: Option<HashSet<PackageId>>) {
        *self.whitelist.borrow_mut() = whitelist;
        self.provider_cache.borrow_mut().clear();
    }

    /// Parses constraint text, caching the result.
    ///
    /// Unparsable text yields `None` and matches nothing.
    pub fn parse_constraint(&self, text: &str) -> Option<Box<dyn ConstraintInterface>> {
        if let Some(cached) = self.parsed_constraints.borrow().get(text) {
            return cached.clone();
        }

        let parsed = match self.version_parser.parse_constraints(text) {
            Ok(constraint) => Some(constraint),
            Err(e) => {
                log::debug!("Ignoring unparsable constraint \"{}\": {}", text, e);
                None
            }
        };
        self.parsed_constraints
            .borrow_mut()
            .insert(text.to_string(), parsed.clone());
        parsed
    }

    /// Ids of every package satisfying `name` under `constraint`.
    ///
    /// When at least one candidate carries the name itself, only the direct
    /// matches are returned and providers/replacers are ignored. Results are
    /// cached per (name, must_match_name, constraint) unless filters are
    /// bypassed.
    pub fn what_provides(
        &self,
        name: &str,
        constraint: Option<&dyn ConstraintInterface>,
        must_match_name: bool,
        bypass_filters: bool,
    ) -> Vec<PackageId> {
        if bypass_filters {
            return self.compute_what_provides(name, constraint, must_match_name, true);
        }

        let key = (name.to_string(), must_match_name, constraint.map(|c| c.key()));
        if let Some(cached) = self.provider_cache.borrow().get(&key) {
            return cached.clone();
        }

        let result = self.compute_what_provides(name, constraint, must_match_name, false);
        self.provider_cache.borrow_mut().insert(key, result.clone());
        result
    }

    fn compute_what_provides(
        &self,
        name: &str,
        constraint: Option<&dyn ConstraintInterface>,
        must_match_name: bool,
        bypass_filters: bool,
    ) -> Vec<PackageId> {
        let mut matches = Vec::new();
        let mut replacers = Vec::new();
        let mut providers = Vec::new();
        let mut name_match = false;

        for id in self.candidates(name, must_match_name, bypass_filters) {
            let Some(entry) = self.entry(id) else { continue };
            if !bypass_filters && !self.is_whitelisted(id, &entry) {
                continue;
            }

            match self.match_entry(&entry, name, constraint, bypass_filters) {
                PoolMatch::None | PoolMatch::Filtered => {}
                PoolMatch::Name => name_match = true,
                PoolMatch::Match => {
                    name_match = true;
                    matches.push(id);
                }
                PoolMatch::Replace => replacers.push(id),
                PoolMatch::Provide => providers.push(id),
            }
        }

        if name_match {
            return matches;
        }

        replacers.extend(providers);
        replacers
    }

    /// Whitelisted entries replacing `name` under any version
    pub fn what_replaces(&self, name: &str) -> Vec<PackageId> {
        self.candidates(name, false, false)
            .into_iter()
            .filter(|&id| {
                self.entry(id).map_or(false, |entry| {
                    entry.name() != name
                        && self.is_whitelisted(id, &entry)
                        && self.match_entry(&entry, name, None, false) == PoolMatch::Replace
                })
            })
            .collect()
    }

    /// Classifies the entry with the given id against a name and constraint
    pub fn match_package(
        &self,
        id: PackageId,
        name: &str,
        constraint: Option<&dyn ConstraintInterface>,
        bypass_filters: bool,
    ) -> PoolMatch {
        self.entry(id).map_or(PoolMatch::None, |entry| {
            self.match_entry(&entry, name, constraint, bypass_filters)
        })
    }

    fn match_entry(
        &self,
        entry: &PoolEntry,
        name: &str,
        constraint: Option<&dyn ConstraintInterface>,
        bypass_filters: bool,
    ) -> PoolMatch {
        let require_filter = if bypass_filters || entry.is_dev() || entry.is_alias() {
            None
        } else {
            self.filter_requires.get(name)
        };
        let passes_filter = |version: &dyn ConstraintInterface| {
            require_filter.map_or(true, |filter| filter.matches(version))
        };

        if entry.name() == name {
            let package_constraint = Constraint::new(Operator::Equal, entry.version());
            if constraint.map_or(true, |c| c.matches(&package_constraint)) {
                return if passes_filter(&package_constraint) {
                    PoolMatch::Match
                } else {
                    PoolMatch::Filtered
                };
            }
            return PoolMatch::Name;
        }

        for (links, kind) in [
            (entry.provides(), PoolMatch::Provide),
            (entry.replaces(), PoolMatch::Replace),
        ] {
            for link in links.iter().filter(|link| link.target == name) {
                let Some(link_constraint) = self.parse_constraint(&link.constraint) else {
                    continue;
                };
                if constraint.map_or(true, |c| c.matches(link_constraint.as_ref())) {
                    return if passes_filter(link_constraint.as_ref()) {
                        kind
                    } else {
                        PoolMatch::Filtered
                    };
                }
            }
        }

        PoolMatch::None
    }

    /// Renders a literal as e.g. `install a/a 1.0` or `remove b/b 2.0`
    pub fn literal_to_pretty_string(&self, literal: i32, installed: &InstalledMap) -> String {
        let Some(entry) = self.literal_to_entry(literal) else {
            return format!("unknown package {}", literal);
        };
        let prefix = match (installed.contains_key(&literal.abs()), literal > 0) {
            (true, true) => "keep",
            (true, false) => "remove",
            (false, true) => "install",
            (false, false) => "don't install",
        };
        format!("{} {}", prefix, entry.pretty_string())
    }

    /// Ids to examine for `name`; materializes lazy repository results
    fn candidates(&self, name: &str, must_match_name: bool, bypass_filters: bool) -> Vec<PackageId> {
        let mut candidates = Vec::new();

        for (repo_index, root_aliases) in &self.lazy_repositories {
            let repository = &self.repositories[*repo_index];
            let acceptable =
                |names: &[String], stability: Stability| self.is_package_acceptable(names, stability);

            for entry in repository.what_provides(name, &acceptable, bypass_filters) {
                let (id, is_new) = self.register(entry.clone(), *repo_index);
                if !must_match_name || entry.name() == name {
                    candidates.push(id);
                }
                if !is_new {
                    continue;
                }
                if let Some(alias) = root_alias_for(&entry, root_aliases) {
                    repository.add_alias(alias.clone());
                    let (alias_id, _) = self.register(PoolEntry::Alias(alias), *repo_index);
                    if !must_match_name || entry.name() == name {
                        candidates.push(alias_id);
                    }
                }
            }
        }

        let index = if must_match_name {
            &self.packages_by_exact_name
        } else {
            &self.packages_by_name
        };
        if let Some(ids) = index.borrow().get(name) {
            candidates.extend(ids.iter().copied());
        }

        candidates
    }

    /// Aliases are whitelisted through the package they alias
    fn is_whitelisted(&self, id: PackageId, entry: &PoolEntry) -> bool {
        let whitelist = self.whitelist.borrow();
        let Some(whitelist) = whitelist.as_ref() else {
            return true;
        };
        match entry {
            PoolEntry::Package(_) => whitelist.contains(&id),
            PoolEntry::Alias(alias) => self
                .id_of(&PoolEntry::Package(alias.alias_of().clone()))
                .map_or(false, |base| whitelist.contains(&base)),
        }
    }

    /// Assigns an id unless this instance already has one
    fn register(&self, entry: PoolEntry, repo_index: usize) -> (PackageId, bool) {
        let identity = entry.identity();
        if let Some(&id) = self.ids_by_identity.borrow().get(&identity) {
            return (id, false);
        }

        let mut entries = self.entries.borrow_mut();
        entries.push(entry);
        let id = entries.len() as PackageId;
        self.entry_repositories.borrow_mut().push(repo_index);
        self.ids_by_identity.borrow_mut().insert(identity, id);
        (id, true)
    }

    fn index(&self, id: PackageId, entry: &PoolEntry) {
        self.packages_by_exact_name
            .borrow_mut()
            .entry(entry.name().to_string())
            .or_default()
            .push(id);

        let mut by_name = self.packages_by_name.borrow_mut();
        for name in entry.names(true) {
            by_name.entry(name).or_default().push(id);
        }
    }
}

fn root_alias_for(entry: &PoolEntry, root_aliases: &RootAliases) -> Option<Arc<AliasPackage>> {
    let alias = root_aliases.get(entry.name())?.get(entry.version())?;
    Some(Arc::new(
        AliasPackage::new(
            entry.base_package().clone(),
            alias.alias_normalized.clone(),
            alias.alias.clone(),
        )
        .with_root_package_alias(true),
    ))
}
