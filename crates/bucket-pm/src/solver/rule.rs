use std::fmt;

use indexmap::IndexMap;

use crate::package::Link;

use super::pool::{InstalledMap, PackageId, Pool};
use super::request::Job;

/// A literal in SAT terms - positive means "install", negative means "don't install"
pub type Literal = i32;

/// Which part of the rule set a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleType {
    /// Derived from package metadata
    Package,
    /// Derived from a request job
    Job,
    /// Learned from conflict analysis
    Learned,
}

impl RuleType {
    pub fn all() -> [RuleType; 3] {
        [RuleType::Package, RuleType::Job, RuleType::Learned]
    }
}

/// Why a rule exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleReason {
    Undefined,
    /// One of the job's candidates must be installed
    JobInstall,
    /// The job's candidate must not be installed
    JobUninstall,
    /// Two packages declare a conflict
    PackageConflict,
    /// If the package is installed, one of its providers must be
    PackageRequires,
    /// Two versions of the same package
    PackageSameName,
    /// A package and something replacing it
    PackageImplicitObsoletes,
    /// An alias needs the package it aliases
    PackageAlias,
    Learned,
}

/// Extra data attached to a rule for explaining it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasonData {
    None,
    /// Index of the originating job in the request
    Job(usize),
    Link(Link),
    Package(PackageId),
    /// Index into the solver's learned pool
    Learned(usize),
}

/// A SAT rule (clause) representing a dependency constraint.
///
/// Rules are disjunctions (OR) of literals, kept sorted ascending. A rule is
/// satisfied when at least one of its literals is true.
///
/// # Examples
///
/// - `[A]` - Package A must be installed (assertion)
/// - `[-A]` - Package A must not be installed
/// - `[-A, B, C]` - If A is installed, then B or C must be installed
/// - `[-A, -B]` - A and B cannot both be installed (conflict)
#[derive(Clone)]
pub struct Rule {
    literals: Vec<Literal>,
    rule_type: RuleType,
    reason: RuleReason,
    reason_data: ReasonData,
    job: Option<Job>,
    /// Rule ID (assigned by RuleSet)
    id: u32,
    disabled: bool,
}

impl Rule {
    pub fn new(mut literals: Vec<Literal>, reason: RuleReason, reason_data: ReasonData) -> Self {
        literals.sort_unstable();
        literals.dedup();
        Self {
            literals,
            rule_type: RuleType::Package,
            reason,
            reason_data,
            job: None,
            id: 0,
            disabled: false,
        }
    }

    pub fn with_job(mut self, job: Job) -> Self {
        self.job = Some(job);
        self
    }

    /// If source is installed, one of targets must be
    pub fn requires(source: PackageId, targets: &[PackageId], link: Link) -> Self {
        let mut literals = vec![-source];
        literals.extend_from_slice(targets);
        Self::new(literals, RuleReason::PackageRequires, ReasonData::Link(link))
    }

    /// Both packages cannot be installed together
    pub fn conflict(a: PackageId, b: PackageId, reason: RuleReason, reason_data: ReasonData) -> Self {
        Self::new(vec![-a, -b], reason, reason_data)
    }

    pub fn alias(alias: PackageId, base: PackageId) -> Self {
        Self::new(vec![-alias, base], RuleReason::PackageAlias, ReasonData::Package(base))
    }

    /// At least one of the candidates must be installed
    pub fn install_one_of(candidates: &[PackageId], job_index: usize, job: Job) -> Self {
        Self::new(candidates.to_vec(), RuleReason::JobInstall, ReasonData::Job(job_index)).with_job(job)
    }

    pub fn uninstall(package: PackageId, job_index: usize, job: Job) -> Self {
        Self::new(vec![-package], RuleReason::JobUninstall, ReasonData::Job(job_index)).with_job(job)
    }

    pub fn learned(literals: Vec<Literal>, learned_index: usize) -> Self {
        Self::new(literals, RuleReason::Learned, ReasonData::Learned(learned_index))
    }

    pub(crate) fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    pub(crate) fn set_type(&mut self, rule_type: RuleType) {
        self.rule_type = rule_type;
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    pub fn reason(&self) -> RuleReason {
        self.reason
    }

    pub fn reason_data(&self) -> &ReasonData {
        &self.reason_data
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    /// Package whose metadata produced the rule, if any
    pub fn required_package(&self) -> Option<&str> {
        match &self.reason_data {
            ReasonData::Link(link) if self.reason == RuleReason::PackageRequires => Some(&link.target),
            _ => self.job.as_ref().and_then(|job| job.package_name.as_deref()),
        }
    }

    pub fn is_assertion(&self) -> bool {
        self.literals.len() == 1
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    pub fn disable(&mut self) {
        self.disabled = true;
    }

    pub fn enable(&mut self) {
        self.disabled = false;
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Human readable explanation of the rule
    pub fn pretty_string(&self, pool: &Pool, installed: &InstalledMap) -> String {
        let rule_text = || {
            self.literals
                .iter()
                .map(|&literal| pool.literal_to_pretty_string(literal, installed))
                .collect::<Vec<_>>()
                .join(" | ")
        };

        match self.reason {
            RuleReason::JobInstall => format!("Install command rule ({})", rule_text()),
            RuleReason::JobUninstall => format!("Remove command rule ({})", rule_text()),
            RuleReason::PackageConflict if self.literals.len() == 2 => {
                let (mut first, mut second) = (self.literals[0], self.literals[1]);
                if let ReasonData::Link(link) = &self.reason_data {
                    let second_is_source = pool
                        .literal_to_entry(second)
                        .map_or(false, |entry| entry.name() == link.source);
                    if second_is_source {
                        std::mem::swap(&mut first, &mut second);
                    }
                }
                format!("{} conflicts with {}.", entry_string(pool, first), entry_string(pool, second))
            }
            RuleReason::PackageRequires => {
                let Some((&source, requires)) = self.literals.split_first() else {
                    return rule_text();
                };
                // sorted literals put the single negative source first
                let source_pretty = entry_string(pool, source);
                let mut text = match &self.reason_data {
                    ReasonData::Link(link) => link.pretty_string(&source_pretty),
                    _ => source_pretty,
                };
                if requires.is_empty() {
                    text.push_str(" -> no matching package found.");
                } else {
                    text.push_str(&format!(
                        " -> satisfiable by {}.",
                        format_packages_unique(pool, requires)
                    ));
                }
                text
            }
            RuleReason::PackageSameName => {
                format!("Can only install one of: {}.", format_packages_unique(pool, &self.literals))
            }
            RuleReason::PackageImplicitObsoletes | RuleReason::PackageAlias => rule_text(),
            RuleReason::Learned => format!("Conclusion: {}", rule_text()),
            _ => format!("({})", rule_text()),
        }
    }
}

fn entry_string(pool: &Pool, literal: Literal) -> String {
    pool.literal_to_entry(literal)
        .map_or_else(|| format!("#{}", literal.abs()), |entry| entry.pretty_string())
}

/// Groups packages by name: `a/a[1.0, 2.0], b/b[1.0]`
pub(crate) fn format_packages_unique(pool: &Pool, literals: &[Literal]) -> String {
    let mut prepared: IndexMap<String, (String, IndexMap<String, String>)> = IndexMap::new();
    for entry in literals.iter().filter_map(|&literal| pool.literal_to_entry(literal)) {
        let (_, versions) = prepared
            .entry(entry.name().to_string())
            .or_insert_with(|| (entry.pretty_name().to_string(), IndexMap::new()));
        versions.insert(entry.version().to_string(), entry.pretty_version().to_string());
    }

    prepared
        .values()
        .map(|(name, versions)| {
            format!("{}[{}]", name, versions.values().cloned().collect::<Vec<_>>().join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rule#{}({:?}, {:?}, {:?}{})",
            self.id,
            self.rule_type,
            self.reason,
            self.literals,
            if self.disabled { ", disabled" } else { "" }
        )
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literals: Vec<String> = self
            .literals
            .iter()
            .map(|&l| if l > 0 { format!("+{}", l) } else { format!("{}", l) })
            .collect();

        write!(f, "({}) [{}]", self.reason_str(), literals.join(" | "))
    }
}

impl Rule {
    fn reason_str(&self) -> &'static str {
        match self.reason {
            RuleReason::Undefined => "undefined",
            RuleReason::JobInstall => "job-install",
            RuleReason::JobUninstall => "job-remove",
            RuleReason::PackageConflict => "conflict",
            RuleReason::PackageRequires => "requires",
            RuleReason::PackageSameName => "same-name",
            RuleReason::PackageImplicitObsoletes => "implicit-obsoletes",
            RuleReason::PackageAlias => "alias",
            RuleReason::Learned => "learned",
        }
    }
}
