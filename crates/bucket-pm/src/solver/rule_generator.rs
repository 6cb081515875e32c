use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use bucket_semver::{ConstraintInterface, MatchNoneConstraint};

use crate::package::Link;

use super::policy::Policy;
use super::pool::{InstalledMap, PackageId, Pool, PoolEntry, PoolMatch};
use super::request::{Job, JobCommand, Request};
use super::rule::{ReasonData, Rule, RuleReason, RuleType};
use super::rule_set::RuleSet;

/// Generates SAT rules from the pool and a request.
///
/// This converts the dependency relationships into SAT clauses:
/// - Requirements: if A is installed, then B|C|D must be installed
/// - Same-name and implicit obsoletes: two versions of a name, or a package
///   and its replacer, cannot both be installed
/// - Alias rules: if an alias is installed, its base package must be installed
/// - Jobs: one of the install candidates must be installed, remove
///   candidates must not be
/// - Conflicts: A and B cannot both be installed
///
/// Before emitting anything the generator whitelists every package reachable
/// from the installed packages and the install jobs, and installs that
/// whitelist into the pool.
pub struct RuleSetGenerator<'a> {
    pool: &'a Pool,
    policy: &'a dyn Policy,
    installed: &'a InstalledMap,
    rules: RuleSet,
    whitelisted: HashSet<PackageId>,
    /// Packages whose rules were already added
    added: HashSet<PackageId>,
    added_order: Vec<PackageId>,
    /// Added packages by every name they carry
    added_by_names: HashMap<String, Vec<PackageId>>,
}

impl<'a> RuleSetGenerator<'a> {
    pub fn new(pool: &'a Pool, policy: &'a dyn Policy, installed: &'a InstalledMap) -> Self {
        Self {
            pool,
            policy,
            installed,
            rules: RuleSet::new(),
            whitelisted: HashSet::new(),
            added: HashSet::new(),
            added_order: Vec::new(),
            added_by_names: HashMap::new(),
        }
    }

    /// Generate all rules for a request
    pub fn generate(mut self, request: &Request) -> RuleSet {
        let start = Instant::now();

        self.pool.set_whitelist(None);
        for &id in self.installed.keys() {
            self.whitelist_from_package(id);
            for update in self.same_name_packages(id) {
                self.whitelist_from_package(update);
            }
        }
        for job in request.jobs() {
            if matches!(job.command, JobCommand::Install | JobCommand::MarkAliasInstalled) {
                for id in job_candidates(self.pool, job, self.installed) {
                    self.whitelist_from_package(id);
                }
            }
        }
        log::debug!("Whitelisted {} packages", self.whitelisted.len());
        self.pool.set_whitelist(Some(std::mem::take(&mut self.whitelisted)));

        let installed: Vec<PackageId> = self.installed.keys().copied().collect();
        for id in installed {
            self.add_rules_for_package(id);
            for update in self.policy.find_update_packages(self.pool, self.installed, id) {
                self.add_rules_for_package(update);
            }
        }

        self.add_rules_for_jobs(request);
        self.add_conflict_rules();

        let stats = self.rules.stats();
        log::debug!(
            "Generated {} rules ({} package, {} job, {} assertions) in {:?}",
            stats.total,
            stats.package,
            stats.job,
            stats.assertions,
            start.elapsed()
        );

        self.rules
    }

    fn link_constraint(&self, link: &Link) -> Box<dyn ConstraintInterface> {
        self.pool
            .parse_constraint(&link.constraint)
            .unwrap_or_else(|| Box::new(MatchNoneConstraint::new()))
    }

    /// Every other package with the same exact name
    fn same_name_packages(&self, id: PackageId) -> Vec<PackageId> {
        let Some(entry) = self.pool.entry(id) else {
            return Vec::new();
        };
        self.pool
            .what_provides(entry.name(), None, true, false)
            .into_iter()
            .filter(|&other| other != id)
            .collect()
    }

    fn whitelist_from_package(&mut self, id: PackageId) {
        let mut queue = VecDeque::from([id]);

        while let Some(id) = queue.pop_front() {
            if !self.whitelisted.insert(id) {
                continue;
            }
            let Some(entry) = self.pool.entry(id) else {
                continue;
            };

            for link in entry.requires() {
                let constraint = self.link_constraint(&link);
                queue.extend(self.pool.what_provides(&link.target, Some(constraint.as_ref()), false, false));
            }

            if entry.is_alias() {
                queue.extend(self.pool.alias_base_id(id));
            }
        }
    }

    fn add_rules_for_package(&mut self, id: PackageId) {
        let mut queue = VecDeque::from([id]);

        while let Some(id) = queue.pop_front() {
            if !self.added.insert(id) {
                continue;
            }
            let Some(entry) = self.pool.entry(id) else {
                continue;
            };
            self.added_order.push(id);
            for name in entry.names(true) {
                self.added_by_names.entry(name).or_default().push(id);
            }

            for link in entry.requires() {
                let constraint = self.link_constraint(&link);
                let providers = self.pool.what_provides(&link.target, Some(constraint.as_ref()), false, false);

                // a package providing its own requirement needs no rule
                if !providers.contains(&id) {
                    self.rules.add(Rule::requires(id, &providers, link), RuleType::Package);
                }
                queue.extend(providers);
            }

            self.add_obsolete_rules(id, &entry);
            queue.extend(self.pool.alias_base_id(id));
        }
    }

    fn add_obsolete_rules(&mut self, id: PackageId, entry: &PoolEntry) {
        let name = entry.name();
        let alias_base = self.pool.alias_base_id(id);

        for provider in self.pool.what_provides(name, None, false, false) {
            if provider == id {
                continue;
            }
            // a base dropped by filter_requires never shows up here, so its
            // alias gets no alias rule
            if alias_base == Some(provider) {
                self.rules.add(Rule::alias(id, provider), RuleType::Package);
            } else if !self.obsolete_impossible_for_alias(id, provider) {
                let same_name = self.pool.entry(provider).map_or(false, |p| p.name() == name);
                let reason = if same_name {
                    RuleReason::PackageSameName
                } else {
                    RuleReason::PackageImplicitObsoletes
                };
                self.rules.add(
                    Rule::conflict(id, provider, reason, ReasonData::Package(id)),
                    RuleType::Package,
                );
            }
        }

        for replacer in self.pool.what_replaces(name) {
            if replacer == id || self.obsolete_impossible_for_alias(id, replacer) {
                continue;
            }
            self.rules.add(
                Rule::conflict(
                    id,
                    replacer,
                    RuleReason::PackageImplicitObsoletes,
                    ReasonData::Package(id),
                ),
                RuleType::Package,
            );
        }
    }

    /// A package and its alias, or two aliases of one package, may coexist
    fn obsolete_impossible_for_alias(&self, a: PackageId, b: PackageId) -> bool {
        let a_base = self.pool.alias_base_id(a);
        let b_base = self.pool.alias_base_id(b);
        a_base == Some(b) || b_base == Some(a) || (a_base.is_some() && a_base == b_base)
    }

    fn add_rules_for_jobs(&mut self, request: &Request) {
        for (index, job) in request.jobs().iter().enumerate() {
            match job.command {
                JobCommand::Install | JobCommand::MarkAliasInstalled => {
                    let candidates = job_candidates(self.pool, job, self.installed);
                    if candidates.is_empty() {
                        continue;
                    }
                    for &id in &candidates {
                        if !self.installed.contains_key(&id) {
                            self.add_rules_for_package(id);
                        }
                    }
                    self.rules.add(
                        Rule::install_one_of(&candidates, index, job.clone()),
                        RuleType::Job,
                    );
                }
                JobCommand::Uninstall | JobCommand::MarkAliasUninstalled => {
                    // every matching version, installed or not, so none gets reinstalled
                    for id in job_candidates(self.pool, job, self.installed) {
                        self.rules.add(Rule::uninstall(id, index, job.clone()), RuleType::Job);
                    }
                }
                JobCommand::Update | JobCommand::UpdateAll => {}
            }
        }
    }

    fn add_conflict_rules(&mut self) {
        for id in self.added_order.clone() {
            let Some(entry) = self.pool.entry(id) else {
                continue;
            };

            for link in entry.conflicts() {
                let Some(candidates) = self.added_by_names.get(&link.target).cloned() else {
                    continue;
                };
                let constraint = self.link_constraint(&link);

                for candidate in candidates {
                    if candidate == id {
                        continue;
                    }
                    let matched = self.pool.match_package(candidate, &link.target, Some(constraint.as_ref()), true);
                    if matches!(matched, PoolMatch::Match | PoolMatch::Provide | PoolMatch::Replace) {
                        self.rules.add(
                            Rule::conflict(
                                id,
                                candidate,
                                RuleReason::PackageConflict,
                                ReasonData::Link(link.clone()),
                            ),
                            RuleType::Package,
                        );
                    }
                }
            }
        }
    }
}

/// Packages a job applies to.
///
/// Alias jobs only see alias packages; a fixed job only sees the installed
/// version when one is installed.
pub(crate) fn job_candidates(pool: &Pool, job: &Job, installed: &InstalledMap) -> Vec<PackageId> {
    let Some(name) = job.package_name.as_deref() else {
        return Vec::new();
    };
    let mut candidates = pool.what_provides(name, job.constraint(), false, false);

    if matches!(
        job.command,
        JobCommand::MarkAliasInstalled | JobCommand::MarkAliasUninstalled
    ) {
        candidates.retain(|&id| pool.entry(id).map_or(false, |entry| entry.is_alias()));
    }

    if job.fixed && candidates.iter().any(|id| installed.contains_key(id)) {
        candidates.retain(|id| installed.contains_key(id));
    }

    candidates
}
