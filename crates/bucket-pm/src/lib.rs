pub mod config;
pub mod error;
pub mod package;
pub mod repository;
pub mod solver;
pub mod util;

pub use config::SolverConfig;
pub use error::{BucketError, Result, SolverError};
pub use package::{AliasPackage, Link, LinkType, Package, Stability};
pub use repository::{ArrayRepository, ProviderRepository, Repository, RepositoryKind};
pub use solver::{
    DefaultPolicy, InstalledMap, Operation, Policy, Pool, PoolEntry, Request, Solver, Transaction,
};
pub use util::is_platform_package;
