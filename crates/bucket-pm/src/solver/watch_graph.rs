use super::decisions::Decisions;
use super::rule::{Literal, Rule};
use super::rule_set::RuleSet;

/// A rule watching two of its literals.
///
/// While neither watched literal is false the rule cannot be unit, so the
/// solver only looks at a rule when one of its watches becomes false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleWatchNode {
    pub rule_id: u32,
    pub watch1: Literal,
    /// 0 for assertions, which are never watched
    pub watch2: Literal,
}

impl RuleWatchNode {
    pub fn new(rule: &Rule) -> Self {
        let literals = rule.literals();
        Self {
            rule_id: rule.id(),
            watch1: literals.first().copied().unwrap_or(0),
            watch2: literals.get(1).copied().unwrap_or(0),
        }
    }

    /// Moves the second watch to the literal decided on the highest level.
    ///
    /// Used for learned rules, whose literals are all false except the one
    /// about to be decided; watching the most recent one makes backtracking
    /// wake the rule up at the right time.
    pub fn watch2_on_highest(&mut self, rule: &Rule, decisions: &Decisions) {
        let literals = rule.literals();
        if literals.len() < 3 {
            return;
        }

        let mut watch_level = 0;
        for &literal in literals {
            if literal == self.watch1 {
                continue;
            }
            let level = decisions.decision_level(literal);
            if level > watch_level {
                self.watch2 = literal;
                watch_level = level;
            }
        }
    }

    pub fn other_watch(&self, literal: Literal) -> Literal {
        if self.watch1 == literal {
            self.watch2
        } else {
            self.watch1
        }
    }

    pub fn move_watch(&mut self, from: Literal, to: Literal) {
        if self.watch1 == from {
            self.watch1 = to;
        } else {
            self.watch2 = to;
        }
    }
}

/// Two-watched literals graph for efficient unit propagation.
///
/// Each watched literal has a chain of the nodes watching it; the newest
/// node is visited first.
#[derive(Debug, Default)]
pub struct RuleWatchGraph {
    nodes: Vec<RuleWatchNode>,
    /// Node indices per literal index; the end of each Vec is the chain head
    chains: Vec<Vec<usize>>,
}

impl RuleWatchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert literal to index (handles positive and negative literals)
    fn literal_to_index(literal: Literal) -> usize {
        let abs = literal.unsigned_abs() as usize;
        if literal > 0 {
            abs * 2
        } else {
            abs * 2 + 1
        }
    }

    fn chain_mut(&mut self, literal: Literal) -> &mut Vec<usize> {
        let index = Self::literal_to_index(literal);
        if index >= self.chains.len() {
            self.chains.resize(index + 1, Vec::new());
        }
        &mut self.chains[index]
    }

    /// Watches every non-assertion rule of the set
    pub fn from_rules(rules: &RuleSet) -> Self {
        let mut graph = Self::new();
        for rule in rules.iter() {
            graph.insert(RuleWatchNode::new(rule));
        }
        graph
    }

    /// Adds a node to the head of both of its watch chains; assertions are skipped
    pub fn insert(&mut self, node: RuleWatchNode) {
        if node.watch1 == 0 || node.watch2 == 0 {
            return;
        }

        let index = self.nodes.len();
        self.nodes.push(node);
        self.chain_mut(node.watch1).push(index);
        self.chain_mut(node.watch2).push(index);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rules watching `literal`, chain head first
    pub fn watching(&self, literal: Literal) -> Vec<u32> {
        self.chains
            .get(Self::literal_to_index(literal))
            .map(|chain| chain.iter().rev().map(|&i| self.nodes[i].rule_id).collect())
            .unwrap_or_default()
    }

    /// Propagates the consequences of `decided_literal` having been decided.
    ///
    /// Every enabled rule watching its negation either moves that watch to
    /// a literal that is not false, forces its other watch on `level`, or
    /// is returned as the conflicting rule.
    pub fn propagate_literal(
        &mut self,
        decided_literal: Literal,
        level: i32,
        decisions: &mut Decisions,
        rules: &RuleSet,
    ) -> Option<u32> {
        let literal = -decided_literal;
        let chain_index = Self::literal_to_index(literal);
        let mut position = self.chains.get(chain_index).map_or(0, Vec::len);

        while position > 0 {
            position -= 1;
            let node_index = self.chains[chain_index][position];
            let node = self.nodes[node_index];
            let other = node.other_watch(literal);

            let Some(rule) = rules.get(node.rule_id) else {
                continue;
            };
            if rule.is_disabled() || decisions.satisfy(other) {
                continue;
            }

            let alternative = rule
                .literals()
                .iter()
                .copied()
                .find(|&l| l != literal && l != other && !decisions.conflict(l));

            if let Some(alternative) = alternative {
                self.chains[chain_index].remove(position);
                self.nodes[node_index].move_watch(literal, alternative);
                self.chain_mut(alternative).push(node_index);
                continue;
            }

            if decisions.conflict(other) {
                return Some(rule.id());
            }

            decisions.decide(other, level, Some(rule.id()));
        }

        None
    }
}
