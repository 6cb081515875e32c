use indexmap::IndexMap;
use std::fmt;

use bucket_semver::{Stability, VersionParser};

use super::{Link, LinkType};

/// Constraint text that resolves to the declaring package's own version
pub(crate) const SELF_VERSION: &str = "self.version";

/// A concrete, installable package version.
///
/// Link maps go from target name to constraint text, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Package name (lowercase)
    pub name: String,

    /// Package name as declared
    pub pretty_name: String,

    /// Normalized version (e.g. "1.0.0.0", "dev-main")
    pub version: String,

    /// Version as declared
    pub pretty_version: String,

    pub stability: Stability,

    /// Package type (library, project, metapackage, ...)
    pub package_type: String,

    pub require: IndexMap<String, String>,
    pub require_dev: IndexMap<String, String>,
    pub conflict: IndexMap<String, String>,
    pub provide: IndexMap<String, String>,
    pub replace: IndexMap<String, String>,
}

impl Package {
    /// Creates a package, normalizing the given version.
    ///
    /// Versions the parser rejects are kept verbatim so that packages coming
    /// from loosely validated sources can still be modelled.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let pretty_name = name.into();
        let pretty_version = version.into();
        let version = VersionParser::new()
            .normalize(&pretty_version)
            .unwrap_or_else(|_| pretty_version.clone());
        let stability = VersionParser::parse_stability(&version);

        Self {
            name: pretty_name.to_lowercase(),
            pretty_name,
            version,
            pretty_version,
            stability,
            package_type: "library".to_string(),
            require: IndexMap::new(),
            require_dev: IndexMap::new(),
            conflict: IndexMap::new(),
            provide: IndexMap::new(),
            replace: IndexMap::new(),
        }
    }

    pub fn with_require(mut self, target: &str, constraint: &str) -> Self {
        self.require.insert(target.to_lowercase(), constraint.to_string());
        self
    }

    pub fn with_require_dev(mut self, target: &str, constraint: &str) -> Self {
        self.require_dev.insert(target.to_lowercase(), constraint.to_string());
        self
    }

    pub fn with_conflict(mut self, target: &str, constraint: &str) -> Self {
        self.conflict.insert(target.to_lowercase(), constraint.to_string());
        self
    }

    pub fn with_provide(mut self, target: &str, constraint: &str) -> Self {
        self.provide.insert(target.to_lowercase(), constraint.to_string());
        self
    }

    pub fn with_replace(mut self, target: &str, constraint: &str) -> Self {
        self.replace.insert(target.to_lowercase(), constraint.to_string());
        self
    }

    pub fn with_type(mut self, package_type: &str) -> Self {
        self.package_type = package_type.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pretty_name(&self) -> &str {
        &self.pretty_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn pretty_version(&self) -> &str {
        &self.pretty_version
    }

    pub fn stability(&self) -> Stability {
        self.stability
    }

    pub fn is_dev(&self) -> bool {
        self.stability == Stability::Dev
    }

    /// Name plus every replaced name, and provided names when asked for
    pub fn names(&self, include_provides: bool) -> Vec<String> {
        let mut names = vec![self.name.clone()];
        let provided = self.provide.keys().filter(|_| include_provides);
        for target in provided.chain(self.replace.keys()) {
            if !names.contains(target) {
                names.push(target.clone());
            }
        }
        names
    }

    pub fn unique_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    pub fn pretty_string(&self) -> String {
        format!("{} {}", self.pretty_name, self.pretty_version)
    }

    pub fn requires(&self) -> Vec<Link> {
        self.links(&self.require, LinkType::Require)
    }

    pub fn dev_requires(&self) -> Vec<Link> {
        self.links(&self.require_dev, LinkType::DevRequire)
    }

    pub fn conflicts(&self) -> Vec<Link> {
        self.links(&self.conflict, LinkType::Conflict)
    }

    pub fn provides(&self) -> Vec<Link> {
        self.links(&self.provide, LinkType::Provide)
    }

    pub fn replaces(&self) -> Vec<Link> {
        self.links(&self.replace, LinkType::Replace)
    }

    fn links(&self, map: &IndexMap<String, String>, link_type: LinkType) -> Vec<Link> {
        map.iter()
            .map(|(target, constraint)| {
                let constraint = if constraint == SELF_VERSION {
                    self.pretty_version.as_str()
                } else {
                    constraint.as_str()
                };
                Link::new(&self.name, target, constraint, link_type)
            })
            .collect()
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pretty_string())
    }
}
