//! Single operator + version constraint

use std::cmp::Ordering;
use std::fmt;

use super::{ConstraintInterface, ConstraintKey, Operator};
use crate::comparator::{compare_versions, Comparator};

/// A constraint such as `>= 1.0.0.0-dev` over a normalized version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    operator: Operator,
    version: String,
    pretty_string: Option<String>,
}

impl Constraint {
    pub fn new(operator: Operator, version: impl Into<String>) -> Self {
        Self {
            operator,
            version: version.into(),
            pretty_string: None,
        }
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Compares two versions; dev branches only compare to each other by name
    pub fn version_compare(a: &str, b: &str, operator: Operator, compare_branches: bool) -> bool {
        let a_is_branch = a.starts_with("dev-");
        let b_is_branch = b.starts_with("dev-");

        if a_is_branch && b_is_branch {
            return match operator {
                Operator::Equal => a == b,
                Operator::NotEqual => a != b,
                _ => false,
            };
        }

        if !compare_branches && (a_is_branch || b_is_branch) {
            return false;
        }

        Comparator::compare(a, operator, b)
    }

    /// Whether the intervals described by `self` and `provider` intersect
    pub fn match_specific(&self, provider: &Constraint, compare_branches: bool) -> bool {
        let no_equal_op = self.operator.without_equal();
        let provider_no_equal_op = provider.operator.without_equal();

        let is_equal_op = self.operator == Operator::Equal;
        let is_non_equal_op = self.operator == Operator::NotEqual;
        let is_provider_equal_op = provider.operator == Operator::Equal;
        let is_provider_non_equal_op = provider.operator == Operator::NotEqual;

        // != always leaves room for a solution unless paired with ==
        if is_non_equal_op || is_provider_non_equal_op {
            return (!is_equal_op && !is_provider_equal_op)
                || Self::version_compare(
                    &provider.version,
                    &self.version,
                    Operator::NotEqual,
                    compare_branches,
                );
        }

        // same direction, e.g. <= 2.0 and < 1.0
        if !is_equal_op && no_equal_op == provider_no_equal_op {
            return true;
        }

        let (version1, version2, operator) = if is_equal_op {
            (&self.version, &provider.version, provider.operator)
        } else {
            (&provider.version, &self.version, self.operator)
        };

        if Self::version_compare(version1, version2, operator, compare_branches) {
            // >= 1.0 against < 1.0 touches at 1.0 but does not overlap
            return !(provider.operator.is_strict()
                && !self.operator.is_strict()
                && compare_versions(&provider.version, &self.version) == Ordering::Equal);
        }

        false
    }
}

impl ConstraintInterface for Constraint {
    fn matches(&self, other: &dyn ConstraintInterface) -> bool {
        match other.as_constraint() {
            Some(provider) => self.match_specific(provider, false),
            None => other.matches(self),
        }
    }

    fn pretty_string(&self) -> String {
        self.pretty_string.clone().unwrap_or_else(|| self.to_string())
    }

    fn set_pretty_string(&mut self, pretty_string: Option<String>) {
        self.pretty_string = pretty_string;
    }

    fn key(&self) -> ConstraintKey {
        ConstraintKey::Single(self.operator, self.version.clone())
    }

    fn clone_box(&self) -> Box<dyn ConstraintInterface> {
        Box::new(self.clone())
    }

    fn as_constraint(&self) -> Option<&Constraint> {
        Some(self)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator, self.version)
    }
}
