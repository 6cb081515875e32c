use std::collections::HashMap;
use std::fmt;

use super::pool::{InstalledMap, Pool};
use super::rule::{Literal, Rule, RuleType};

/// Collection of SAT rules grouped by type.
///
/// - Rules with identical literal sets are stored once
/// - IDs are assigned sequentially in insertion order, across all types
#[derive(Debug, Default)]
pub struct RuleSet {
    /// All rules indexed by ID
    rules: Vec<Rule>,

    /// Rule ids by type, in insertion order
    rules_by_type: HashMap<RuleType, Vec<u32>>,

    /// Sorted literals -> id, for deduplication
    rules_by_literals: HashMap<Vec<Literal>, u32>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule to the set, returning its ID.
    /// Returns the existing rule's ID if one with the same literals exists.
    pub fn add(&mut self, mut rule: Rule, rule_type: RuleType) -> u32 {
        // across types: a remove job matching a package assertion keeps the
        // package rule, and problems then name that rule instead of the job
        if let Some(&existing_id) = self.rules_by_literals.get(rule.literals()) {
            return existing_id;
        }

        let id = self.rules.len() as u32;
        rule.set_id(id);
        rule.set_type(rule_type);

        self.rules_by_type.entry(rule_type).or_default().push(id);
        self.rules_by_literals.insert(rule.literals().to_vec(), id);
        self.rules.push(rule);

        id
    }

    pub fn get(&self, id: u32) -> Option<&Rule> {
        self.rules.get(id as usize)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Rule> {
        self.rules.get_mut(id as usize)
    }

    pub fn rules_of_type(&self, rule_type: RuleType) -> impl Iterator<Item = &Rule> {
        self.rules_by_type
            .get(&rule_type)
            .into_iter()
            .flatten()
            .filter_map(move |&id| self.get(id))
    }

    pub fn ids_of_type(&self, rule_type: RuleType) -> &[u32] {
        self.rules_by_type.get(&rule_type).map_or(&[], Vec::as_slice)
    }

    /// All rules in id order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn count_by_type(&self, rule_type: RuleType) -> usize {
        self.ids_of_type(rule_type).len()
    }

    pub fn disable(&mut self, id: u32) {
        if let Some(rule) = self.get_mut(id) {
            rule.disable();
        }
    }

    pub fn enable(&mut self, id: u32) {
        if let Some(rule) = self.get_mut(id) {
            rule.enable();
        }
    }

    /// Renders every rule grouped by type, for debugging
    pub fn pretty_string(&self, pool: &Pool, installed: &InstalledMap) -> String {
        let mut out = String::new();
        for rule_type in RuleType::all() {
            out.push_str(&format!("{:?}:\n", rule_type));
            for rule in self.rules_of_type(rule_type) {
                out.push_str(&format!("    {}\n", rule.pretty_string(pool, installed)));
            }
        }
        out
    }

    pub fn stats(&self) -> RuleSetStats {
        RuleSetStats {
            total: self.rules.len(),
            assertions: self.rules.iter().filter(|r| r.is_assertion()).count(),
            package: self.count_by_type(RuleType::Package),
            job: self.count_by_type(RuleType::Job),
            learned: self.count_by_type(RuleType::Learned),
        }
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule_type in RuleType::all() {
            writeln!(f, "{:?}:", rule_type)?;
            for rule in self.rules_of_type(rule_type) {
                writeln!(f, "    {}", rule)?;
            }
        }
        Ok(())
    }
}

/// Statistics about a rule set
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RuleSetStats {
    pub total: usize,
    pub assertions: usize,
    pub package: usize,
    pub job: usize,
    pub learned: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::rule::{ReasonData, RuleReason};

    fn rule(literals: Vec<Literal>) -> Rule {
        Rule::new(literals, RuleReason::Undefined, ReasonData::None)
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let mut rules = RuleSet::new();
        assert_eq!(rules.add(rule(vec![-1, 2]), RuleType::Package), 0);
        assert_eq!(rules.add(rule(vec![3]), RuleType::Job), 1);
        assert_eq!(rules.add(rule(vec![-3, -2]), RuleType::Package), 2);

        assert_eq!(rules.len(), 3);
        assert_eq!(rules.ids_of_type(RuleType::Package), &[0, 2]);
        assert_eq!(rules.get(1).unwrap().rule_type(), RuleType::Job);
    }

    #[test]
    fn test_add_deduplicates_on_literals() {
        let mut rules = RuleSet::new();
        let first = rules.add(rule(vec![2, -1]), RuleType::Package);
        let second = rules.add(rule(vec![-1, 2]), RuleType::Job);
        assert_eq!(first, second);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.count_by_type(RuleType::Job), 0);
    }

    #[test]
    fn test_disable_and_stats() {
        let mut rules = RuleSet::new();
        let id = rules.add(rule(vec![1]), RuleType::Job);
        rules.add(rule(vec![-1, 2]), RuleType::Package);
        rules.add(rule(vec![-2]), RuleType::Learned);

        rules.disable(id);
        assert!(rules.get(id).unwrap().is_disabled());
        rules.enable(id);
        assert!(rules.get(id).unwrap().is_enabled());

        let stats = rules.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.assertions, 2);
        assert_eq!(stats.package, 1);
        assert_eq!(stats.job, 1);
        assert_eq!(stats.learned, 1);
    }
}
