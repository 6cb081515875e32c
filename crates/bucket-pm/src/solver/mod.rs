//! SAT-based dependency resolver for Bucket packages.
//!
//! This module implements a CDCL (Conflict-Driven Clause Learning) SAT solver
//! specifically designed for package dependency resolution.
//!
//! # Architecture
//!
//! The solver consists of several key components:
//!
//! - [`Pool`]: Registry of all available packages with lookup by name/constraint
//! - [`Request`]: Jobs describing what needs to be resolved
//! - [`RuleSetGenerator`]: Converts package metadata and jobs into a [`RuleSet`]
//! - [`Decisions`] and [`RuleWatchGraph`]: The decision trail and unit propagation
//! - [`Policy`]: Orders candidates when the solver has to choose
//! - [`Solver`]: The main CDCL algorithm implementation
//! - [`Transaction`]: The resulting operations in execution order
//! - [`ProblemSet`]: Human readable explanation of an unsolvable request
//!
//! # Algorithm Overview
//!
//! 1. **Whitelisting**: Restrict the pool to packages reachable from the
//!    installed set and the install jobs
//! 2. **Rule Generation**: Convert dependency graph to SAT clauses
//! 3. **Assertions**: Decide every single-literal rule on level 1
//! 4. **Unit Propagation**: Force decisions from unit clauses
//! 5. **Decision Making**: Choose package versions using policy
//! 6. **Conflict Analysis**: Learn from conflicts to avoid repeating mistakes
//! 7. **Minimization**: Retry branch alternatives decided too deep
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bucket_pm::solver::{DefaultPolicy, Pool, Request, Solver};
//! use bucket_pm::{ArrayRepository, Package};
//!
//! let installed = Arc::new(ArrayRepository::installed());
//! let mut pool = Pool::default();
//! pool.add_repository(installed.clone());
//! pool.add_repository(Arc::new(ArrayRepository::new("remote").with_packages([
//!     Package::new("vendor/a", "1.0.0"),
//! ])));
//!
//! let mut request = Request::new();
//! request.install("vendor/a", None);
//!
//! let policy = DefaultPolicy::new();
//! let transaction = Solver::new(&pool, &policy, installed.as_ref()).solve(&request).unwrap();
//! assert_eq!(transaction.operations()[0].to_string(), "Installing vendor/a (1.0.0)");
//! ```

mod decisions;
mod policy;
mod pool;
mod problem;
mod request;
mod rule;
mod rule_generator;
mod rule_set;
#[allow(clippy::module_inception)]
mod solver;
mod transaction;
mod watch_graph;

#[cfg(test)]
mod tests;

pub use decisions::Decisions;
pub use policy::{DefaultPolicy, Policy};
pub use pool::{InstalledMap, PackageId, Pool, PoolEntry, PoolMatch, RootAlias, RootAliases};
pub use problem::{Problem, ProblemSet};
pub use request::{Job, JobCommand, Request};
pub use rule::{Literal, ReasonData, Rule, RuleReason, RuleType};
pub use rule_generator::RuleSetGenerator;
pub use rule_set::{RuleSet, RuleSetStats};
pub use solver::Solver;
pub use transaction::{Operation, Transaction, TransactionSummary};
pub use watch_graph::{RuleWatchGraph, RuleWatchNode};
