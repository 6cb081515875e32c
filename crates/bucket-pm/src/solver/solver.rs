use std::collections::HashSet;
use std::time::Instant;

use crate::error::SolverError;
use crate::repository::Repository;

use super::decisions::Decisions;
use super::policy::Policy;
use super::pool::{InstalledMap, PackageId, Pool};
use super::problem::{Problem, ProblemSet};
use super::request::{JobCommand, Request};
use super::rule::{Literal, ReasonData, Rule, RuleReason, RuleType};
use super::rule_generator::{job_candidates, RuleSetGenerator};
use super::rule_set::RuleSet;
use super::transaction::Transaction;
use super::watch_graph::{RuleWatchGraph, RuleWatchNode};

/// The SAT solver for dependency resolution.
///
/// Implements conflict-driven clause learning over the rules generated
/// from the pool: unit propagation through a two-watched-literals graph,
/// first-UIP conflict analysis with backjumping, and a final minimization
/// pass that retries branch alternatives.
pub struct Solver<'a> {
    pool: &'a Pool,
    policy: &'a dyn Policy,
    /// Repository holding the currently installed packages; it must also
    /// have been added to the pool
    installed: &'a dyn Repository,
}

impl<'a> Solver<'a> {
    pub fn new(pool: &'a Pool, policy: &'a dyn Policy, installed: &'a dyn Repository) -> Self {
        Self {
            pool,
            policy,
            installed,
        }
    }

    /// Resolve the request against the pool.
    ///
    /// Returns the operations turning the installed set into a solution,
    /// or every problem found while searching for one.
    ///
    /// # Panics
    ///
    /// Panics with a `solver bug:` message when the decision bookkeeping is
    /// violated; that is never caused by user input.
    pub fn solve(&self, request: &Request) -> Result<Transaction, SolverError> {
        let installed_map = self.setup_installed_map();

        let start = Instant::now();
        let rules = RuleSetGenerator::new(self.pool, self.policy, &installed_map).generate(request);
        log::debug!("Rule generation took {:?}", start.elapsed());

        let mut state = SolverState::new(self.pool, self.policy, installed_map, rules);
        state.check_for_root_require_problems(request);
        state.make_assertion_rule_decisions();

        log::debug!("Resolving dependencies through SAT");
        let before = Instant::now();
        state.run_sat();
        log::info!(
            "Dependency resolution completed in {:.3} seconds",
            before.elapsed().as_secs_f64()
        );

        // installed and still undecided means removed
        let installed_ids: Vec<PackageId> = state.installed_map.keys().copied().collect();
        for id in installed_ids {
            if state.decisions.undecided(id) {
                state.decisions.decide(-id, 1, None);
            }
        }

        if !state.problems.is_empty() {
            log::debug!("Found {} problem(s)", state.problems.len());
            let problems = ProblemSet::new(state.problems, self.pool, &state.installed_map);
            return Err(SolverError::Unsatisfiable(problems));
        }

        Ok(Transaction::from_decisions(
            self.policy,
            self.pool,
            &state.installed_map,
            &state.decisions,
            &state.rules,
        ))
    }

    fn setup_installed_map(&self) -> InstalledMap {
        let mut installed_map = InstalledMap::new();
        for entry in self.installed.packages() {
            match self.pool.id_of(&entry) {
                Some(id) => {
                    installed_map.insert(id, entry);
                }
                None => log::debug!("Installed package {} is not part of the pool", entry),
            }
        }
        installed_map
    }
}

/// Alternatives left untried when a decision was made
struct Branch {
    /// 0 marks an alternative that was already retried
    literals: Vec<Literal>,
    level: i32,
}

/// Everything one solve mutates
struct SolverState<'s> {
    pool: &'s Pool,
    policy: &'s dyn Policy,
    installed_map: InstalledMap,
    /// Installed packages explicitly allowed to change
    update_map: HashSet<PackageId>,
    rules: RuleSet,
    watch_graph: RuleWatchGraph,
    decisions: Decisions,
    /// Next trail offset to propagate
    propagate_index: usize,
    branches: Vec<Branch>,
    problems: Vec<Problem>,
    /// Rule ids each learned rule was derived from, indexed by the
    /// learned rule's `ReasonData::Learned`
    learned_pool: Vec<Vec<u32>>,
}

impl<'s> SolverState<'s> {
    fn new(pool: &'s Pool, policy: &'s dyn Policy, installed_map: InstalledMap, rules: RuleSet) -> Self {
        let watch_graph = RuleWatchGraph::from_rules(&rules);
        Self {
            pool,
            policy,
            installed_map,
            update_map: HashSet::new(),
            rules,
            watch_graph,
            decisions: Decisions::with_capacity(pool.len()),
            propagate_index: 0,
            branches: Vec::new(),
            problems: Vec::new(),
            learned_pool: Vec::new(),
        }
    }

    /// Reports install jobs nothing can satisfy and collects the installed
    /// packages update jobs allow to change
    fn check_for_root_require_problems(&mut self, request: &Request) {
        for (index, job) in request.jobs().iter().enumerate() {
            match job.command {
                JobCommand::Update => {
                    let candidates = self.pool.what_provides(job.package_name(), job.constraint(), false, false);
                    for id in candidates {
                        if self.installed_map.contains_key(&id) {
                            self.update_map.insert(id);
                        }
                    }
                }
                JobCommand::UpdateAll => {
                    self.update_map.extend(self.installed_map.keys().copied());
                }
                JobCommand::Install | JobCommand::MarkAliasInstalled => {
                    if job_candidates(self.pool, job, &self.installed_map).is_empty() {
                        log::debug!("No package satisfies {}", job);
                        let mut problem = Problem::new();
                        let rule = Rule::new(Vec::new(), RuleReason::JobInstall, ReasonData::Job(index))
                            .with_job(job.clone());
                        problem.add_rule(&rule);
                        self.problems.push(problem);
                    }
                }
                JobCommand::Uninstall | JobCommand::MarkAliasUninstalled => {}
            }
        }
    }

    /// Decides every assertion on level 1.
    ///
    /// Two conflicting assertions become a problem: the offending rules are
    /// disabled and the assertion pass starts over.
    fn make_assertion_rule_decisions(&mut self) {
        let decision_start = self.decisions.len();

        let mut rule_index = 0;
        while rule_index < self.rules.len() {
            let rule_id = rule_index as u32;
            rule_index += 1;

            let Some(rule) = self.rules.get(rule_id) else {
                continue;
            };
            if !rule.is_assertion() || rule.is_disabled() {
                continue;
            }

            let literal = rule.literals()[0];
            if !self.decisions.decided(literal) {
                self.decisions.decide(literal, 1, Some(rule_id));
                continue;
            }
            if self.decisions.satisfy(literal) {
                continue;
            }

            if rule.rule_type() == RuleType::Learned {
                self.rules.disable(rule_id);
                continue;
            }

            let conflict = self.decisions.decision_rule(literal);
            let conflict_is_package = conflict
                .and_then(|id| self.rules.get(id))
                .map_or(false, |r| r.rule_type() == RuleType::Package);

            let mut problem = Problem::new();
            problem.add_rule(rule);
            if let Some(conflict_rule) = conflict.and_then(|id| self.rules.get(id)) {
                problem.add_rule(conflict_rule);
            }

            if conflict_is_package {
                log::debug!("Assertion {} conflicts with a package rule", rule);
                self.disable_problem(rule_id);
                self.problems.push(problem);
                continue;
            }

            // every job assertion on this package takes part in the problem
            let job_assertions: Vec<u32> = self
                .rules
                .rules_of_type(RuleType::Job)
                .filter(|r| r.is_enabled() && r.is_assertion() && r.literals()[0].abs() == literal.abs())
                .map(Rule::id)
                .collect();
            for id in job_assertions {
                if let Some(assertion) = self.rules.get(id) {
                    problem.add_rule(assertion);
                }
                self.disable_problem(id);
            }
            log::debug!("Conflicting job assertions on {}", literal.abs());
            self.problems.push(problem);

            while self.decisions.len() > decision_start {
                self.decisions.revert_last();
            }
            rule_index = 0;
        }
    }

    fn run_sat(&mut self) {
        self.propagate_index = 0;

        let mut level = 1;
        let mut system_level = level + 1;

        loop {
            if level == 1 {
                if let Some(conflict) = self.propagate(level) {
                    self.analyze_unsolvable(conflict);
                    continue;
                }
            }

            // job rules first
            if level < system_level {
                let job_rules = self.rules.ids_of_type(RuleType::Job).to_vec();
                let mut interrupted_at = None;

                for (index, &rule_id) in job_rules.iter().enumerate() {
                    let Some(mut queue) = self.job_decision_queue(rule_id) else {
                        continue;
                    };
                    // keep installed versions unless an update was requested for them
                    if self.installed_map.len() != self.update_map.len() {
                        queue = self.prune_to_installed(queue);
                    }
                    if queue.is_empty() {
                        continue;
                    }

                    let previous_level = level;
                    level = self.select_and_install(level, queue, Some(rule_id));
                    if level == 0 {
                        return;
                    }
                    if level <= previous_level {
                        interrupted_at = Some(index);
                        break;
                    }
                }

                system_level = level + 1;
                if interrupted_at.map_or(false, |index| index + 1 < job_rules.len()) {
                    continue;
                }
            }

            if level < system_level {
                system_level = level;
            }

            // then every rule whose positive literals still need a choice
            let mut i = 0;
            let mut n = 0;
            while n < self.rules.len() {
                if i == self.rules.len() {
                    i = 0;
                }
                let rule_id = i as u32;
                i += 1;
                n += 1;

                let Some(queue) = self.rule_decision_queue(rule_id) else {
                    continue;
                };
                if queue.len() < 2 {
                    continue;
                }

                level = self.select_and_install(level, queue, Some(rule_id));
                if level == 0 {
                    return;
                }
                // something changed, look at all rules again
                n = 0;
            }

            if level < system_level {
                continue;
            }

            // installed packages nothing decided on stay, or move to an update when allowed
            if let Some(queue) = self.installed_decision_queue() {
                level = self.select_and_install(level, queue, None);
                if level == 0 {
                    return;
                }
                continue;
            }

            // minimization: retry an alternative decided deeper than its branch
            let mut last: Option<(Literal, i32, usize, usize)> = None;
            for (branch_index, branch) in self.branches.iter().enumerate().rev() {
                for (offset, &literal) in branch.literals.iter().enumerate() {
                    if literal > 0 && self.decisions.decision_level(literal) > branch.level + 1 {
                        last = Some((literal, branch.level, branch_index, offset));
                    }
                }
            }

            if let Some((literal, branch_level, branch_index, offset)) = last {
                log::debug!("Minimizing: retrying {} from level {}", literal, branch_level);
                self.branches[branch_index].literals[offset] = 0;
                level = branch_level;
                self.revert(level);
                let why = self.decisions.last_reason();
                level = self.set_propagate_learn(level, literal, why);
                if level == 0 {
                    return;
                }
                continue;
            }

            break;
        }
    }

    /// Undecided candidates of an enabled job rule none of whose literals holds
    fn job_decision_queue(&self, rule_id: u32) -> Option<Vec<Literal>> {
        let rule = self.rules.get(rule_id)?;
        if !rule.is_enabled() {
            return None;
        }

        let mut queue = Vec::new();
        for &literal in rule.literals() {
            if self.decisions.satisfy(literal) {
                return None;
            }
            if literal > 0 && self.decisions.undecided(literal) {
                queue.push(literal);
            }
        }

        (!queue.is_empty()).then_some(queue)
    }

    fn prune_to_installed(&self, queue: Vec<Literal>) -> Vec<Literal> {
        let mut pruned = Vec::new();
        for &literal in &queue {
            let id = literal.abs();
            if self.installed_map.contains_key(&id) {
                pruned.push(literal);
                if self.update_map.contains(&id) {
                    return queue;
                }
            }
        }
        pruned
    }

    /// Undecided positive literals of a rule whose negative literals are
    /// all installed and whose positive literals are not
    fn rule_decision_queue(&self, rule_id: u32) -> Option<Vec<Literal>> {
        let rule = self.rules.get(rule_id)?;
        if rule.is_disabled() {
            return None;
        }

        let mut queue = Vec::new();
        for &literal in rule.literals() {
            if literal <= 0 {
                if !self.decisions.decided_install(literal.abs()) {
                    return None;
                }
            } else {
                if self.decisions.decided_install(literal) {
                    return None;
                }
                if self.decisions.undecided(literal) {
                    queue.push(literal);
                }
            }
        }

        Some(queue)
    }

    fn propagate(&mut self, level: i32) -> Option<u32> {
        while self.decisions.valid_offset(self.propagate_index) {
            let (literal, _) = self.decisions.at_offset(self.propagate_index);
            let conflict = self
                .watch_graph
                .propagate_literal(literal, level, &mut self.decisions, &self.rules);
            self.propagate_index += 1;

            if conflict.is_some() {
                return conflict;
            }
        }

        None
    }

    /// Undoes every decision above `level` and forgets branches from `level` on
    fn revert(&mut self, level: i32) {
        while let Some(literal) = self.decisions.last_literal() {
            if self.decisions.undecided(literal) || self.decisions.decision_level(literal) <= level {
                break;
            }
            self.decisions.revert_last();
            self.propagate_index = self.decisions.len();
        }

        while self.branches.last().map_or(false, |branch| branch.level >= level) {
            self.branches.pop();
        }
    }

    /// Decides `literal` on a new level and propagates, learning from every
    /// conflict until propagation succeeds.
    ///
    /// Returns the level reached, or 1 after an unsolvable conflict was
    /// recorded and the search restarted.
    fn set_propagate_learn(&mut self, level: i32, literal: Literal, rule: Option<u32>) -> i32 {
        let mut level = level + 1;
        self.decisions.decide(literal, level, rule);

        while let Some(conflict) = self.propagate(level) {
            if level == 1 {
                return self.analyze_unsolvable(conflict);
            }

            let (learn_literal, new_level, learned_rule) = self.analyze(level, conflict);
            if new_level <= 0 || new_level >= level {
                panic!(
                    "solver bug: trying to revert to invalid level {} from level {}",
                    new_level, level
                );
            }

            level = new_level;
            self.revert(level);

            let rule_count = self.rules.len();
            let learned_id = self.rules.add(learned_rule, RuleType::Learned);
            if self.rules.len() > rule_count {
                if let Some(rule) = self.rules.get(learned_id) {
                    let mut node = RuleWatchNode::new(rule);
                    node.watch2_on_highest(rule, &self.decisions);
                    self.watch_graph.insert(node);
                    log::debug!("Learned {} and backjumped to level {}", rule, level);
                }
            }

            self.decisions.decide(learn_literal, level, Some(learned_id));
        }

        level
    }

    /// The first undecided installed package, followed by its undecided
    /// update candidates when an update job covers it
    fn installed_decision_queue(&self) -> Option<Vec<Literal>> {
        let &id = self.installed_map.keys().find(|&&id| self.decisions.undecided(id))?;

        let mut queue = vec![id];
        if self.update_map.contains(&id) {
            queue.extend(
                self.policy
                    .find_update_packages(self.pool, &self.installed_map, id)
                    .into_iter()
                    .filter(|&update| self.decisions.undecided(update)),
            );
        }
        Some(queue)
    }

    fn select_and_install(&mut self, level: i32, queue: Vec<Literal>, rule_id: Option<u32>) -> i32 {
        let required = rule_id
            .and_then(|id| self.rules.get(id))
            .and_then(Rule::required_package)
            .map(str::to_string);

        let mut literals = self.policy.select_preferred_packages(
            self.pool,
            &self.installed_map,
            &queue,
            required.as_deref(),
        );
        if literals.is_empty() {
            return level;
        }

        let selected = literals.remove(0);
        if !literals.is_empty() {
            self.branches.push(Branch { literals, level });
        }

        self.set_propagate_learn(level, selected, rule_id)
    }

    /// First-UIP conflict analysis.
    ///
    /// Returns the literal to assert, the level to jump back to and the
    /// learned rule.
    fn analyze(&mut self, level: i32, conflict: u32) -> (Literal, i32, Rule) {
        let mut rule_id = Some(conflict);
        let mut rule_level = 1;
        let mut num = 0;
        let mut l1num = 0;
        let mut seen: HashSet<PackageId> = HashSet::new();
        // slot 0 holds the asserting literal once found
        let mut learned_literals: Vec<Literal> = vec![0];
        let mut decision_id = self.decisions.len();

        self.learned_pool.push(Vec::new());
        let why = self.learned_pool.len() - 1;

        'analyze: loop {
            if let Some(rule) = rule_id.and_then(|id| self.rules.get(id)) {
                self.learned_pool[why].push(rule.id());

                for &literal in rule.literals() {
                    // skip the one true literal
                    if self.decisions.satisfy(literal) || !seen.insert(literal.abs()) {
                        continue;
                    }

                    let literal_level = self.decisions.decision_level(literal);
                    if literal_level == 1 {
                        l1num += 1;
                    } else if literal_level == level {
                        num += 1;
                    } else {
                        learned_literals.push(literal);
                        rule_level = rule_level.max(literal_level);
                    }
                }
            }

            let mut l1retry = true;
            while l1retry {
                l1retry = false;

                if num == 0 {
                    l1num -= 1;
                    if l1num == 0 {
                        break 'analyze;
                    }
                }

                let literal = loop {
                    if decision_id == 0 {
                        panic!(
                            "solver bug: reached the start of the trail looking for a literal of rule {}",
                            conflict
                        );
                    }
                    decision_id -= 1;
                    let (literal, _) = self.decisions.at_offset(decision_id);
                    if seen.contains(&literal.abs()) {
                        break literal;
                    }
                };
                seen.remove(&literal.abs());

                if num > 0 {
                    num -= 1;
                    if num == 0 {
                        learned_literals[0] = -literal;
                        if l1num == 0 {
                            break 'analyze;
                        }
                        for learned in &learned_literals[1..] {
                            seen.remove(&learned.abs());
                        }
                        // only level 1 marks left
                        l1num += 1;
                        l1retry = true;
                        continue;
                    }
                }

                rule_id = self.decisions.at_offset(decision_id).1;
            }
        }

        let learn_literal = learned_literals[0];
        if learn_literal == 0 {
            panic!("solver bug: did not find a learnable literal in rule {}", conflict);
        }

        (learn_literal, rule_level, Rule::learned(learned_literals, why))
    }

    /// Adds the user-facing causes of a rule to a problem; learned rules are
    /// expanded into the rules they were derived from
    fn analyze_unsolvable_rule(&self, problem: &mut Problem, rule_id: u32) {
        let Some(rule) = self.rules.get(rule_id) else {
            return;
        };

        match (rule.rule_type(), rule.reason_data()) {
            (RuleType::Learned, ReasonData::Learned(why)) => {
                for &id in self.learned_pool.get(*why).into_iter().flatten() {
                    self.analyze_unsolvable_rule(problem, id);
                }
            }
            // package rules are never the cause on their own
            (RuleType::Package, _) => {}
            _ => {
                problem.next_section();
                problem.add_rule(rule);
            }
        }
    }

    /// Records a conflict on level 1 as a problem, disables the rules
    /// involved and restarts the search.
    fn analyze_unsolvable(&mut self, conflict: u32) -> i32 {
        let mut problem = Problem::new();
        if let Some(rule) = self.rules.get(conflict) {
            problem.add_rule(rule);
        }
        self.analyze_unsolvable_rule(&mut problem, conflict);

        let mut seen: HashSet<PackageId> = HashSet::new();
        self.mark_unsatisfied(conflict, &mut seen);

        let trail: Vec<(Literal, Option<u32>)> = self.decisions.iter().copied().collect();
        for (literal, reason) in trail {
            if !seen.contains(&literal.abs()) {
                continue;
            }
            let Some(why) = reason else {
                continue;
            };
            if let Some(rule) = self.rules.get(why) {
                problem.add_rule(rule);
            }
            self.analyze_unsolvable_rule(&mut problem, why);
            self.mark_unsatisfied(why, &mut seen);
        }

        let involved: Vec<u32> = problem.rules().filter(|r| !r.is_empty()).map(Rule::id).collect();
        self.problems.push(problem);
        log::debug!("Unsolvable conflict involving {} rule(s)", involved.len());

        for id in involved {
            self.disable_problem(id);
        }
        self.reset_solver();

        1
    }

    fn mark_unsatisfied(&self, rule_id: u32, seen: &mut HashSet<PackageId>) {
        if let Some(rule) = self.rules.get(rule_id) {
            for &literal in rule.literals() {
                if !self.decisions.satisfy(literal) {
                    seen.insert(literal.abs());
                }
            }
        }
    }

    /// Disables a rule, or every rule of its job for job rules
    fn disable_problem(&mut self, rule_id: u32) {
        let job_index = match self.rules.get(rule_id) {
            Some(rule) if rule.job().is_some() => match rule.reason_data() {
                ReasonData::Job(index) => Some(*index),
                _ => None,
            },
            Some(_) => None,
            None => return,
        };

        let Some(job_index) = job_index else {
            self.rules.disable(rule_id);
            return;
        };

        let job_rules: Vec<u32> = self
            .rules
            .iter()
            .filter(|r| r.job().is_some() && *r.reason_data() == ReasonData::Job(job_index))
            .map(Rule::id)
            .collect();
        for id in job_rules {
            self.rules.disable(id);
        }
    }

    fn reset_solver(&mut self) {
        self.decisions.reset();
        self.propagate_index = 0;
        self.branches.clear();
        self.enable_disable_learned_rules();
        self.make_assertion_rule_decisions();
    }

    /// A learned rule holds only while every rule it came from is enabled
    fn enable_disable_learned_rules(&mut self) {
        let learned: Vec<(u32, bool)> = self
            .rules
            .rules_of_type(RuleType::Learned)
            .map(|rule| {
                let found_disabled = match rule.reason_data() {
                    ReasonData::Learned(why) => self
                        .learned_pool
                        .get(*why)
                        .into_iter()
                        .flatten()
                        .any(|&id| self.rules.get(id).map_or(false, Rule::is_disabled)),
                    _ => false,
                };
                (rule.id(), found_disabled)
            })
            .collect();

        for (id, found_disabled) in learned {
            if found_disabled {
                self.rules.disable(id);
            } else {
                self.rules.enable(id);
            }
        }
    }
}
