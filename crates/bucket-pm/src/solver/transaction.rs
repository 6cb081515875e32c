use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::package::{AliasPackage, Package};

use super::decisions::Decisions;
use super::policy::Policy;
use super::pool::{InstalledMap, PackageId, Pool, PoolEntry};
use super::rule::Rule;
use super::rule_set::RuleSet;

/// A single operation in a transaction.
///
/// Every operation carries the rule that caused its decision, when there
/// was one, so callers can explain why it happens.
#[derive(Debug, Clone)]
pub enum Operation {
    Install {
        package: Arc<Package>,
        reason: Option<Rule>,
    },
    /// Replace an installed package with another version of it
    Update {
        from: Arc<Package>,
        to: Arc<Package>,
        reason: Option<Rule>,
    },
    Uninstall {
        package: Arc<Package>,
        reason: Option<Rule>,
    },
    /// The alias itself has nothing to install; its requirements are
    /// satisfied by the aliased package
    MarkAliasInstalled {
        alias: Arc<AliasPackage>,
        reason: Option<Rule>,
    },
    MarkAliasUninstalled {
        alias: Arc<AliasPackage>,
        reason: Option<Rule>,
    },
}

impl Operation {
    pub fn job_type(&self) -> &'static str {
        match self {
            Operation::Install { .. } => "install",
            Operation::Update { .. } => "update",
            Operation::Uninstall { .. } => "remove",
            Operation::MarkAliasInstalled { .. } => "markAliasInstalled",
            Operation::MarkAliasUninstalled { .. } => "markAliasUninstalled",
        }
    }

    pub fn reason(&self) -> Option<&Rule> {
        match self {
            Operation::Install { reason, .. }
            | Operation::Update { reason, .. }
            | Operation::Uninstall { reason, .. }
            | Operation::MarkAliasInstalled { reason, .. }
            | Operation::MarkAliasUninstalled { reason, .. } => reason.as_ref(),
        }
    }

    /// Name of the package the operation ends up with (or removes)
    pub fn package_name(&self) -> &str {
        match self {
            Operation::Install { package, .. } | Operation::Uninstall { package, .. } => package.name(),
            Operation::Update { to, .. } => to.name(),
            Operation::MarkAliasInstalled { alias, .. } | Operation::MarkAliasUninstalled { alias, .. } => {
                alias.name()
            }
        }
    }

    /// Pretty version the operation ends up with (or removes)
    pub fn pretty_version(&self) -> &str {
        match self {
            Operation::Install { package, .. } | Operation::Uninstall { package, .. } => {
                package.pretty_version()
            }
            Operation::Update { to, .. } => to.pretty_version(),
            Operation::MarkAliasInstalled { alias, .. } | Operation::MarkAliasUninstalled { alias, .. } => {
                alias.pretty_version()
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Install { package, .. } => {
                write!(f, "Installing {} ({})", package.pretty_name(), package.pretty_version())
            }
            Operation::Update { from, to, .. } => write!(
                f,
                "Updating {} ({}) to {} ({})",
                from.pretty_name(),
                from.pretty_version(),
                to.pretty_name(),
                to.pretty_version()
            ),
            Operation::Uninstall { package, .. } => {
                write!(f, "Removing {} ({})", package.pretty_name(), package.pretty_version())
            }
            Operation::MarkAliasInstalled { alias, .. } => write!(
                f,
                "Marking {} ({}) as installed, alias of {} ({})",
                alias.pretty_name(),
                alias.pretty_version(),
                alias.alias_of().pretty_name(),
                alias.alias_of().pretty_version()
            ),
            Operation::MarkAliasUninstalled { alias, .. } => write!(
                f,
                "Marking {} ({}) as uninstalled, alias of {} ({})",
                alias.pretty_name(),
                alias.pretty_version(),
                alias.alias_of().pretty_name(),
                alias.alias_of().pretty_version()
            ),
        }
    }
}

struct PendingOperation {
    entry: PoolEntry,
    reason: Option<u32>,
    /// Installed package this one replaces
    source: Option<Arc<Package>>,
}

/// The operations turning the installed set into the solved set.
///
/// Installs and updates are ordered so every package comes after the
/// packages it requires, and an aliased package before its alias.
/// Removals follow in the order they were decided.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    operations: Vec<Operation>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the transaction from the solver's final decisions
    pub fn from_decisions(
        policy: &dyn Policy,
        pool: &Pool,
        installed: &InstalledMap,
        decisions: &Decisions,
        rules: &RuleSet,
    ) -> Self {
        let mut install_means_update = find_updates(policy, pool, installed, decisions);
        let mut install_map: IndexMap<PackageId, PendingOperation> = IndexMap::new();
        let mut update_map: IndexMap<PackageId, PendingOperation> = IndexMap::new();
        let mut ignore_remove: HashSet<PackageId> = HashSet::new();

        for &(literal, reason) in decisions.iter() {
            let id = literal.abs();
            // wanted and installed, or unwanted and not installed
            if literal <= 0 || installed.contains_key(&id) {
                continue;
            }
            let Some(entry) = pool.entry(id) else {
                continue;
            };

            match install_means_update.get(&id).cloned() {
                Some((source_id, source)) if !entry.is_alias() => {
                    update_map.insert(
                        id,
                        PendingOperation {
                            entry,
                            reason,
                            source: Some(source),
                        },
                    );
                    // one update per origin
                    install_means_update.shift_remove(&id);
                    ignore_remove.insert(source_id);
                }
                _ => {
                    install_map.insert(
                        id,
                        PendingOperation {
                            entry,
                            reason,
                            source: None,
                        },
                    );
                }
            }
        }

        let mut uninstall_map: IndexMap<PackageId, PendingOperation> = IndexMap::new();
        for &(literal, reason) in decisions.iter() {
            let id = literal.abs();
            if literal > 0 || ignore_remove.contains(&id) {
                continue;
            }
            if let Some(entry) = installed.get(&id) {
                uninstall_map.entry(id).or_insert_with(|| PendingOperation {
                    entry: entry.clone(),
                    reason,
                    source: None,
                });
            }
        }

        let mut transaction = Self::new();
        transaction.from_maps(pool, rules, install_map, update_map, uninstall_map);

        log::debug!("Transaction: {}", transaction.summary());
        transaction
    }

    fn from_maps(
        &mut self,
        pool: &Pool,
        rules: &RuleSet,
        mut install_map: IndexMap<PackageId, PendingOperation>,
        mut update_map: IndexMap<PackageId, PendingOperation>,
        uninstall_map: IndexMap<PackageId, PendingOperation>,
    ) {
        let reason_rule = |reason: Option<u32>| reason.and_then(|id| rules.get(id)).cloned();

        let mut stack = find_root_packages(pool, &install_map, &update_map);
        let mut visited: HashSet<PackageId> = HashSet::new();

        while let Some(id) = stack.pop() {
            if visited.insert(id) {
                // revisit once everything it needs has been emitted
                stack.push(id);
                let Some(entry) = pool.entry(id) else {
                    continue;
                };
                if entry.is_alias() {
                    stack.extend(pool.alias_base_id(id));
                } else {
                    stack.extend(requirement_providers(pool, &entry));
                }
                continue;
            }

            if let Some(pending) = install_map.shift_remove(&id) {
                self.push_install(pending.entry, reason_rule(pending.reason));
            }
            if let Some(pending) = update_map.shift_remove(&id) {
                if let (Some(from), Some(to)) = (pending.source, pending.entry.as_package()) {
                    self.operations.push(Operation::Update {
                        from,
                        to: to.clone(),
                        reason: reason_rule(pending.reason),
                    });
                }
            }
        }

        for pending in uninstall_map.into_values() {
            self.push_uninstall(pending.entry, reason_rule(pending.reason));
        }
    }

    fn push_install(&mut self, entry: PoolEntry, reason: Option<Rule>) {
        self.operations.push(match entry {
            PoolEntry::Package(package) => Operation::Install { package, reason },
            PoolEntry::Alias(alias) => Operation::MarkAliasInstalled { alias, reason },
        });
    }

    fn push_uninstall(&mut self, entry: PoolEntry, reason: Option<Rule>) {
        self.operations.push(match entry {
            PoolEntry::Package(package) => Operation::Uninstall { package, reason },
            PoolEntry::Alias(alias) => Operation::MarkAliasUninstalled { alias, reason },
        });
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Packages that will be installed, including update targets
    pub fn installs(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Install { package, .. } => Some(package),
            Operation::Update { to, .. } => Some(to),
            _ => None,
        })
    }

    pub fn updates(&self) -> impl Iterator<Item = (&Arc<Package>, &Arc<Package>)> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Update { from, to, .. } => Some((from, to)),
            _ => None,
        })
    }

    /// Packages that will be removed (not updated)
    pub fn removals(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Uninstall { package, .. } => Some(package),
            _ => None,
        })
    }

    pub fn alias_installs(&self) -> impl Iterator<Item = &Arc<AliasPackage>> {
        self.operations.iter().filter_map(|op| match op {
            Operation::MarkAliasInstalled { alias, .. } => Some(alias),
            _ => None,
        })
    }

    pub fn summary(&self) -> TransactionSummary {
        let mut summary = TransactionSummary::default();

        for op in &self.operations {
            match op {
                Operation::Install { .. } => summary.installs += 1,
                Operation::Update { .. } => summary.updates += 1,
                Operation::Uninstall { .. } => summary.uninstalls += 1,
                Operation::MarkAliasInstalled { .. } => summary.alias_installs += 1,
                Operation::MarkAliasUninstalled { .. } => summary.alias_uninstalls += 1,
            }
        }

        summary
    }
}

/// For every installed package decided against, the packages whose
/// install would really be an update of it
fn find_updates(
    policy: &dyn Policy,
    pool: &Pool,
    installed: &InstalledMap,
    decisions: &Decisions,
) -> IndexMap<PackageId, (PackageId, Arc<Package>)> {
    let mut install_means_update = IndexMap::new();

    for &(literal, _) in decisions.iter() {
        let id = literal.abs();
        if literal > 0 {
            continue;
        }
        let Some(PoolEntry::Package(package)) = installed.get(&id) else {
            continue;
        };

        for update in policy.find_update_packages(pool, installed, id) {
            if update != id {
                install_means_update.insert(update, (id, package.clone()));
            }
        }
    }

    install_means_update
}

/// Packages to install or update that no other such package requires
fn find_root_packages(
    pool: &Pool,
    install_map: &IndexMap<PackageId, PendingOperation>,
    update_map: &IndexMap<PackageId, PendingOperation>,
) -> Vec<PackageId> {
    let mut roots: IndexMap<PackageId, ()> = install_map
        .keys()
        .chain(update_map.keys())
        .map(|&id| (id, ()))
        .collect();

    for (&id, pending) in install_map.iter().chain(update_map.iter()) {
        if !roots.contains_key(&id) {
            continue;
        }
        for required in requirement_providers(pool, &pending.entry) {
            if required != id {
                roots.shift_remove(&required);
            }
        }
    }

    roots.into_keys().collect()
}

fn requirement_providers(pool: &Pool, entry: &PoolEntry) -> Vec<PackageId> {
    entry
        .requires()
        .iter()
        .filter_map(|link| {
            let constraint = pool.parse_constraint(&link.constraint)?;
            Some(pool.what_provides(&link.target, Some(constraint.as_ref()), false, false))
        })
        .flatten()
        .collect()
}

/// Counts of a transaction's operations by kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionSummary {
    pub installs: usize,
    pub updates: usize,
    pub uninstalls: usize,
    pub alias_installs: usize,
    pub alias_uninstalls: usize,
}

impl fmt::Display for TransactionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if self.installs > 0 {
            parts.push(format!("{} install(s)", self.installs));
        }
        if self.updates > 0 {
            parts.push(format!("{} update(s)", self.updates));
        }
        if self.uninstalls > 0 {
            parts.push(format!("{} removal(s)", self.uninstalls));
        }

        if parts.is_empty() {
            write!(f, "Nothing to do")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}
