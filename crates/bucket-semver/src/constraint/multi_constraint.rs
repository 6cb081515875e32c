//! Conjunctive and disjunctive groups of constraints

use std::fmt;

use super::{ConstraintInterface, ConstraintKey, MatchAllConstraint};

/// A list of constraints joined by AND (conjunctive) or OR (disjunctive)
#[derive(Debug, Clone)]
pub struct MultiConstraint {
    constraints: Vec<Box<dyn ConstraintInterface>>,
    conjunctive: bool,
    pretty_string: Option<String>,
}

impl MultiConstraint {
    pub fn new(constraints: Vec<Box<dyn ConstraintInterface>>, conjunctive: bool) -> Self {
        Self {
            constraints,
            conjunctive,
            pretty_string: None,
        }
    }

    /// Builds the simplest constraint for the list: match-all when empty,
    /// the constraint itself when there is only one
    pub fn create(
        mut constraints: Vec<Box<dyn ConstraintInterface>>,
        conjunctive: bool,
    ) -> Box<dyn ConstraintInterface> {
        match constraints.len() {
            0 => Box::new(MatchAllConstraint::new()),
            1 => constraints.remove(0),
            _ => Box::new(Self::new(constraints, conjunctive)),
        }
    }

    pub fn constraints(&self) -> &[Box<dyn ConstraintInterface>] {
        &self.constraints
    }

    pub fn is_conjunctive(&self) -> bool {
        self.conjunctive
    }

    pub fn is_disjunctive(&self) -> bool {
        !self.conjunctive
    }
}

impl ConstraintInterface for MultiConstraint {
    fn matches(&self, provider: &dyn ConstraintInterface) -> bool {
        if self.conjunctive {
            self.constraints.iter().all(|c| provider.matches(c.as_ref()))
        } else {
            self.constraints.iter().any(|c| provider.matches(c.as_ref()))
        }
    }

    fn pretty_string(&self) -> String {
        self.pretty_string.clone().unwrap_or_else(|| self.to_string())
    }

    fn set_pretty_string(&mut self, pretty_string: Option<String>) {
        self.pretty_string = pretty_string;
    }

    fn key(&self) -> ConstraintKey {
        ConstraintKey::Multi {
            conjunctive: self.conjunctive,
            members: self.constraints.iter().map(|c| c.key()).collect(),
        }
    }

    fn clone_box(&self) -> Box<dyn ConstraintInterface> {
        Box::new(self.clone())
    }
}

impl fmt::Display for MultiConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.conjunctive { " " } else { " || " };
        let parts: Vec<String> = self.constraints.iter().map(|c| c.to_string()).collect();
        write!(f, "[{}]", parts.join(separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, Operator};

    fn range(low: &str, high: &str) -> MultiConstraint {
        MultiConstraint::new(
            vec![
                Box::new(Constraint::new(Operator::GreaterThanOrEqual, low)),
                Box::new(Constraint::new(Operator::LessThan, high)),
            ],
            true,
        )
    }

    #[test]
    fn test_conjunctive_matches() {
        let constraint = range("1.0.0.0-dev", "2.0.0.0-dev");
        assert!(constraint.matches(&Constraint::new(Operator::Equal, "1.5.0.0")));
        assert!(!constraint.matches(&Constraint::new(Operator::Equal, "2.0.0.0")));
    }

    #[test]
    fn test_disjunctive_matches() {
        let constraint = MultiConstraint::new(
            vec![Box::new(range("1.0.0.0-dev", "2.0.0.0-dev")), Box::new(range("3.0.0.0-dev", "4.0.0.0-dev"))],
            false,
        );
        assert!(constraint.matches(&Constraint::new(Operator::Equal, "3.1.0.0")));
        assert!(!constraint.matches(&Constraint::new(Operator::Equal, "2.5.0.0")));
        assert_eq!(
            constraint.to_string(),
            "[[>= 1.0.0.0-dev < 2.0.0.0-dev] || [>= 3.0.0.0-dev < 4.0.0.0-dev]]"
        );
    }

    #[test]
    fn test_single_constraint_matches_multi() {
        let single = Constraint::new(Operator::Equal, "1.2.0.0");
        assert!(single.matches(&range("1.0.0.0-dev", "2.0.0.0-dev")));
    }

    #[test]
    fn test_create_simplifies() {
        assert!(MultiConstraint::create(vec![], true).is_match_all());
        let single = MultiConstraint::create(
            vec![Box::new(Constraint::new(Operator::Equal, "1.0.0.0"))],
            false,
        );
        assert_eq!(single.to_string(), "== 1.0.0.0");
    }

    #[test]
    fn test_key_is_structural() {
        let a = range("1.0.0.0-dev", "2.0.0.0-dev");
        let b = range("1.0.0.0-dev", "2.0.0.0-dev");
        let c = range("1.0.0.0-dev", "3.0.0.0-dev");
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }
}
