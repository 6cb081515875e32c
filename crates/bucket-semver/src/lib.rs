//! Version parsing, normalization and constraint matching for Bucket packages.
//!
//! Versions are normalized to four numeric components plus an optional
//! stability suffix (`1.2.0.0-beta2`); branches become `dev-<name>`.
//! Constraints are parsed into [`ConstraintInterface`] trait objects whose
//! `matches` answers whether two constraints share at least one version.
//!
//! ```
//! use bucket_semver::{Constraint, ConstraintInterface, Operator, VersionParser};
//!
//! let parser = VersionParser::new();
//! let required = parser.parse_constraints("^1.2").unwrap();
//! let version = parser.normalize("1.4.0").unwrap();
//! assert!(required.matches(&Constraint::new(Operator::Equal, version)));
//! ```

mod comparator;
pub mod constraint;
mod version_parser;

pub use comparator::{compare_versions, Comparator};
pub use constraint::{
    Constraint, ConstraintInterface, ConstraintKey, MatchAllConstraint, MatchNoneConstraint,
    MultiConstraint, Operator,
};
pub use version_parser::{Stability, VersionParser, VersionParserError};
