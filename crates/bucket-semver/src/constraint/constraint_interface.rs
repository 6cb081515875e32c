use std::fmt;

use super::{Constraint, Operator};

/// Structural identity of a constraint tree.
///
/// Two constraints with equal keys match exactly the same versions, so the
/// key can stand in for the constraint in caches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstraintKey {
    MatchAll,
    MatchNone,
    Single(Operator, String),
    Multi {
        conjunctive: bool,
        members: Vec<ConstraintKey>,
    },
}

/// Common behaviour of every version constraint
pub trait ConstraintInterface: fmt::Debug + fmt::Display + Send + Sync {
    /// Whether some version satisfies both `self` and `other`
    fn matches(&self, other: &dyn ConstraintInterface) -> bool;

    /// The user-supplied text, falling back to the normalized form
    fn pretty_string(&self) -> String;

    fn set_pretty_string(&mut self, pretty_string: Option<String>);

    fn key(&self) -> ConstraintKey;

    fn clone_box(&self) -> Box<dyn ConstraintInterface>;

    /// Downcast to a single operator constraint
    fn as_constraint(&self) -> Option<&Constraint> {
        None
    }

    fn is_match_all(&self) -> bool {
        false
    }

    fn is_match_none(&self) -> bool {
        false
    }
}

impl Clone for Box<dyn ConstraintInterface> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
