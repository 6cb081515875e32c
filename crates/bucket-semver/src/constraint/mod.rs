//! Constraint types for version matching

#[allow(clippy::module_inception)]
mod constraint;
mod constraint_interface;
mod match_all;
mod match_none;
mod multi_constraint;
mod operator;

pub use constraint::Constraint;
pub use constraint_interface::{ConstraintInterface, ConstraintKey};
pub use match_all::MatchAllConstraint;
pub use match_none::MatchNoneConstraint;
pub use multi_constraint::MultiConstraint;
pub use operator::{InvalidOperatorError, Operator};
