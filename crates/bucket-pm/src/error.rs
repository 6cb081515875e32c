use thiserror::Error;

use bucket_semver::VersionParserError;

use crate::solver::ProblemSet;

/// Failure of a solve that the caller can act on.
///
/// Broken solver invariants are not represented here; they panic.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Your requirements could not be resolved to an installable set of packages.\n{}", .0.report())]
    Unsatisfiable(ProblemSet),
}

impl SolverError {
    pub fn problems(&self) -> &ProblemSet {
        match self {
            SolverError::Unsatisfiable(problems) => problems,
        }
    }
}

#[derive(Error, Debug)]
pub enum BucketError {
    // JSON/parsing errors
    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Version constraint errors
    #[error("Invalid version constraint: {0}")]
    Version(#[from] VersionParserError),

    // Solver errors
    #[error(transparent)]
    Solver(#[from] SolverError),
}

pub type Result<T> = std::result::Result<T, BucketError>;
