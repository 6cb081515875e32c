use std::collections::HashSet;
use std::fmt;

use super::pool::{InstalledMap, Pool};
use super::request::{Job, JobCommand};
use super::rule::{format_packages_unique, Rule};
use super::rule_generator::job_candidates;

/// A problem encountered during dependency resolution.
///
/// The rules explaining a problem are collected in sections; a new section
/// is opened whenever the analysis moves on to another cause. Rendering
/// shows the newest section first.
#[derive(Debug, Clone)]
pub struct Problem {
    sections: Vec<Vec<Rule>>,
    seen: HashSet<u32>,
}

impl Default for Problem {
    fn default() -> Self {
        Self::new()
    }
}

impl Problem {
    pub fn new() -> Self {
        Self {
            sections: vec![Vec::new()],
            seen: HashSet::new(),
        }
    }

    /// Add a rule to the current section; rules already explaining this
    /// problem are skipped
    pub fn add_rule(&mut self, rule: &Rule) {
        // rules without literals are synthesized for a single job and never shared
        if !rule.is_empty() && !self.seen.insert(rule.id()) {
            return;
        }
        if let Some(section) = self.sections.last_mut() {
            section.push(rule.clone());
        }
    }

    pub fn next_section(&mut self) {
        if self.sections.last().map_or(false, |s| !s.is_empty()) {
            self.sections.push(Vec::new());
        }
    }

    /// All rules, newest section first
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.sections.iter().rev().flatten()
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human readable explanation, one `- ` line per reason
    pub fn describe(&self, pool: &Pool, installed: &InstalledMap) -> String {
        let rules: Vec<&Rule> = self.rules().collect();

        if let [rule] = rules.as_slice() {
            if let Some(message) = missing_package_message(pool, installed, rule) {
                return format!("\n    - {}", message);
            }
        }

        let messages: Vec<String> = rules
            .iter()
            .map(|rule| match rule.job() {
                Some(job) => job_to_text(pool, installed, job),
                None => rule.pretty_string(pool, installed),
            })
            .collect();

        format!("\n    - {}", messages.join("\n    - "))
    }
}

/// Explains an install request nothing in the pool can satisfy
fn missing_package_message(pool: &Pool, installed: &InstalledMap, rule: &Rule) -> Option<String> {
    let job = rule.job()?;
    if job.command != JobCommand::Install || !job_candidates(pool, job, installed).is_empty() {
        return None;
    }

    let name = job.package_name();
    let filtered = pool.what_provides(name, job.constraint(), true, true);
    if !filtered.is_empty() {
        return Some(format!(
            "The requested package {} is satisfiable by {} but these conflict with your requirements or minimum-stability.",
            job.pretty_target(),
            format_packages_unique(pool, &filtered)
        ));
    }

    if pool.what_provides(name, None, true, true).is_empty() {
        return Some(format!(
            "The requested package {} could not be found in any version, there may be a typo in the package name.",
            name
        ));
    }

    Some(format!("The requested package {} could not be found.", job.pretty_target()))
}

fn job_to_text(pool: &Pool, installed: &InstalledMap, job: &Job) -> String {
    match job.command {
        JobCommand::Install | JobCommand::MarkAliasInstalled => {
            let candidates = job_candidates(pool, job, installed);
            if candidates.is_empty() {
                format!("No package found to satisfy install request for {}", job.pretty_target())
            } else {
                format!(
                    "Installation request for {} -> satisfiable by {}.",
                    job.pretty_target(),
                    format_packages_unique(pool, &candidates)
                )
            }
        }
        JobCommand::Update => format!("Update request for {}", job.pretty_target()),
        JobCommand::UpdateAll => "Update request for all packages".to_string(),
        JobCommand::Uninstall | JobCommand::MarkAliasUninstalled => {
            format!("Removal request for {}", job.pretty_target())
        }
    }
}

/// Every problem of a failed solve, rendered while the pool was at hand
#[derive(Debug, Default)]
pub struct ProblemSet {
    problems: Vec<Problem>,
    report: String,
}

impl ProblemSet {
    pub fn new(problems: Vec<Problem>, pool: &Pool, installed: &InstalledMap) -> Self {
        let report = problems
            .iter()
            .enumerate()
            .map(|(i, problem)| format!("\n  Problem {}{}", i + 1, problem.describe(pool, installed)))
            .collect::<Vec<_>>()
            .join("\n");

        Self { problems, report }
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// The rendered `Problem N` blocks
    pub fn report(&self) -> &str {
        &self.report
    }
}

impl fmt::Display for ProblemSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.problems.is_empty() {
            return write!(f, "no problems found");
        }
        write!(f, "{} problem(s) found\n{}", self.problems.len(), self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{Package, Stability};
    use crate::repository::ArrayRepository;
    use crate::solver::request::Request;
    use crate::solver::rule::{ReasonData, RuleReason, RuleType};
    use crate::solver::rule_set::RuleSet;
    use bucket_semver::VersionParser;
    use std::sync::Arc;

    fn pool_with(packages: Vec<Package>) -> Pool {
        let mut pool = Pool::with_minimum_stability(Stability::Stable);
        pool.add_repository(Arc::new(ArrayRepository::new("test").with_packages(packages)));
        pool
    }

    fn root_require_rule(name: &str, constraint: Option<&str>) -> Rule {
        let mut request = Request::new();
        request.install(name, constraint.map(|c| VersionParser::new().parse_constraints(c).unwrap()));
        let job = request.jobs()[0].clone();
        Rule::new(Vec::new(), RuleReason::JobInstall, ReasonData::Job(0)).with_job(job)
    }

    #[test]
    fn test_missing_package_in_any_version() {
        let pool = pool_with(vec![Package::new("a/a", "1.0")]);
        let mut problem = Problem::new();
        problem.add_rule(&root_require_rule("vendor/typo", None));

        let description = problem.describe(&pool, &InstalledMap::new());
        assert_eq!(
            description,
            "\n    - The requested package vendor/typo could not be found in any version, there may be a typo in the package name."
        );
    }

    #[test]
    fn test_missing_version() {
        let pool = pool_with(vec![Package::new("a/a", "1.0")]);
        let mut problem = Problem::new();
        problem.add_rule(&root_require_rule("a/a", Some("^2.0")));

        let description = problem.describe(&pool, &InstalledMap::new());
        assert!(description.contains("The requested package a/a ^2.0 could not be found."));
    }

    #[test]
    fn test_rules_rendered_newest_section_first() {
        let pool = pool_with(vec![
            Package::new("a/a", "1.0").with_require("b/b", "^1.0"),
            Package::new("b/b", "1.0"),
        ]);
        let a = pool.entry(1).unwrap();
        let mut rules = RuleSet::new();
        let requires = rules.add(Rule::requires(1, &[], a.requires()[0].clone()), RuleType::Package);
        let conflict = rules.add(
            Rule::conflict(1, 2, RuleReason::PackageSameName, ReasonData::Package(1)),
            RuleType::Package,
        );

        let mut problem = Problem::new();
        problem.add_rule(rules.get(requires).unwrap());
        problem.add_rule(rules.get(requires).unwrap());
        problem.next_section();
        problem.add_rule(rules.get(conflict).unwrap());
        assert_eq!(problem.len(), 2);

        let description = problem.describe(&pool, &InstalledMap::new());
        let lines: Vec<&str> = description.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("    - Can only install one of:"));
        assert_eq!(lines[1], "    - a/a 1.0 requires b/b ^1.0 -> no matching package found.");
    }

    #[test]
    fn test_problem_set_report() {
        let pool = pool_with(vec![Package::new("a/a", "1.0")]);
        let mut problem = Problem::new();
        problem.add_rule(&root_require_rule("a/a", None));
        let installed = InstalledMap::new();

        let problems = ProblemSet::new(vec![problem], &pool, &installed);
        assert_eq!(problems.len(), 1);
        assert!(problems.report().starts_with("\n  Problem 1\n    - Installation request for a/a -> satisfiable by a/a[1.0]."));
        assert!(problems.to_string().starts_with("1 problem(s) found"));
    }
}
