//! Resolver configuration.
//!
//! Settings use the same kebab-case keys as the package manager's config
//! file and can be overridden through `BUCKET_*` environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use bucket_semver::VersionParser;

use crate::error::{BucketError, Result};
use crate::package::Stability;
use crate::solver::{DefaultPolicy, Pool};

/// Raw settings as they appear in JSON
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawSolverConfig {
    minimum_stability: Option<String>,
    stability_flags: IndexMap<String, String>,
    prefer_stable: Option<bool>,
    prefer_lowest: Option<bool>,
    filter_requires: IndexMap<String, String>,
}

/// Everything that shapes a solve besides the packages and the request
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub minimum_stability: Stability,
    /// Per-package stability overriding `minimum_stability`
    pub stability_flags: IndexMap<String, Stability>,
    pub prefer_stable: bool,
    pub prefer_lowest: bool,
    /// Extra constraints every version of the named package must satisfy
    pub filter_requires: IndexMap<String, String>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            minimum_stability: Stability::Stable,
            stability_flags: IndexMap::new(),
            prefer_stable: true,
            prefer_lowest: false,
            filter_requires: IndexMap::new(),
        }
    }
}

impl SolverConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawSolverConfig = serde_json::from_str(json)?;
        let defaults = Self::default();

        let minimum_stability: Stability = match raw.minimum_stability {
            Some(text) => text.parse()?,
            None => defaults.minimum_stability,
        };

        let mut stability_flags = IndexMap::new();
        for (name, text) in raw.stability_flags {
            stability_flags.insert(name.to_lowercase(), text.parse::<Stability>()?);
        }

        let filter_requires = raw
            .filter_requires
            .into_iter()
            .map(|(name, constraint)| (name.to_lowercase(), constraint))
            .collect();

        Ok(Self {
            minimum_stability,
            stability_flags,
            prefer_stable: raw.prefer_stable.unwrap_or(defaults.prefer_stable),
            prefer_lowest: raw.prefer_lowest.unwrap_or(defaults.prefer_lowest),
            filter_requires,
        })
    }

    /// Loads a JSON config file; a missing file yields the defaults
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| BucketError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::from_json_str(&contents)
            .map_err(|e| BucketError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Applies `BUCKET_MINIMUM_STABILITY`, `BUCKET_PREFER_STABLE` and
    /// `BUCKET_PREFER_LOWEST` from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|var| env::var(var).ok())
    }

    /// Applies overrides read through `lookup`; empty values are ignored
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.is_empty());

        if let Some(value) = get("BUCKET_MINIMUM_STABILITY") {
            self.minimum_stability = value.parse::<Stability>()?;
            log::debug!("Minimum stability set to {} from environment", self.minimum_stability);
        }
        if let Some(value) = get("BUCKET_PREFER_STABLE") {
            self.prefer_stable = parse_bool("BUCKET_PREFER_STABLE", &value)?;
        }
        if let Some(value) = get("BUCKET_PREFER_LOWEST") {
            self.prefer_lowest = parse_bool("BUCKET_PREFER_LOWEST", &value)?;
        }

        Ok(())
    }

    /// Empty pool honouring the stability settings and require filters
    pub fn create_pool(&self) -> Result<Pool> {
        let parser = VersionParser::new();

        let mut filter_requires = HashMap::new();
        for (name, constraint) in &self.filter_requires {
            filter_requires.insert(name.clone(), parser.parse_constraints(constraint)?);
        }

        let stability_flags: HashMap<String, Stability> = self
            .stability_flags
            .iter()
            .map(|(name, stability)| (name.clone(), *stability))
            .collect();

        Ok(Pool::new(self.minimum_stability, stability_flags, filter_requires))
    }

    pub fn create_policy(&self) -> DefaultPolicy {
        DefaultPolicy::new()
            .prefer_stable(self.prefer_stable)
            .prefer_lowest(self.prefer_lowest)
    }
}

fn parse_bool(var: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BucketError::Config(format!(
            "{} must be a boolean, got \"{}\"",
            var, value
        ))),
    }
}
