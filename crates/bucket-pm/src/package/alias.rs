use std::fmt;
use std::sync::Arc;

use bucket_semver::{Stability, VersionParser};

use super::package::SELF_VERSION;
use super::{Link, LinkType, Package};

/// A package presented under a different version.
///
/// Used for branch aliases (`dev-main` as `1.0.x-dev`) and root aliases
/// declared with `as` in root requirements. Everything except the version
/// is delegated to the aliased package; `self.version` links are rewritten
/// to the alias version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasPackage {
    alias_of: Arc<Package>,
    version: String,
    pretty_version: String,
    stability: Stability,
    root_package_alias: bool,
}

impl AliasPackage {
    /// `version` is the normalized alias version
    pub fn new(alias_of: Arc<Package>, version: impl Into<String>, pretty_version: impl Into<String>) -> Self {
        let version = version.into();
        let stability = VersionParser::parse_stability(&version);

        Self {
            alias_of,
            version,
            pretty_version: pretty_version.into(),
            stability,
            root_package_alias: false,
        }
    }

    pub fn with_root_package_alias(mut self, value: bool) -> Self {
        self.root_package_alias = value;
        self
    }

    pub fn alias_of(&self) -> &Arc<Package> {
        &self.alias_of
    }

    pub fn is_root_package_alias(&self) -> bool {
        self.root_package_alias
    }

    pub fn name(&self) -> &str {
        self.alias_of.name()
    }

    pub fn pretty_name(&self) -> &str {
        self.alias_of.pretty_name()
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

    pub fn names(&self, include_provides: bool) -> Vec<String> {
        self.alias_of.names(include_provides)
    }

    pub fn unique_name(&self) -> String {
        format!("{}-{}", self.name(), self.version)
    }

    pub fn pretty_string(&self) -> String {
        format!("{} {}", self.pretty_name(), self.pretty_version)
    }

    pub fn requires(&self) -> Vec<Link> {
        self.rewrite(&self.alias_of.require, LinkType::Require, false)
    }

    pub fn dev_requires(&self) -> Vec<Link> {
        self.rewrite(&self.alias_of.require_dev, LinkType::DevRequire, false)
    }

    pub fn conflicts(&self) -> Vec<Link> {
        self.rewrite(&self.alias_of.conflict, LinkType::Conflict, true)
    }

    pub fn provides(&self) -> Vec<Link> {
        self.rewrite(&self.alias_of.provide, LinkType::Provide, true)
    }

    pub fn replaces(&self) -> Vec<Link> {
        self.rewrite(&self.alias_of.replace, LinkType::Replace, true)
    }

    /// Rewrites `self.version` links to the alias version.
    ///
    /// Conflict, provide and replace links keep the aliased package's version
    /// too, so the alias covers both.
    fn rewrite(
        &self,
        map: &indexmap::IndexMap<String, String>,
        link_type: LinkType,
        keep_original: bool,
    ) -> Vec<Link> {
        let alias_constraint = format!("={}", self.version);
        let mut links = Vec::new();
        let mut extra = Vec::new();

        for (target, constraint) in map {
            if constraint != SELF_VERSION {
                links.push(Link::new(self.name(), target, constraint.as_str(), link_type));
                continue;
            }
            if keep_original {
                links.push(Link::new(
                    self.name(),
                    target,
                    self.alias_of.pretty_version(),
                    link_type,
                ));
                extra.push(Link::new(self.name(), target, alias_constraint.as_str(), link_type));
            } else {
                links.push(Link::new(self.name(), target, alias_constraint.as_str(), link_type));
            }
        }

        links.extend(extra);
        links
    }
}

impl fmt::Display for AliasPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}alias of {})",
            self.pretty_string(),
            if self.root_package_alias { "root " } else { "" },
            self.alias_of.pretty_version()
        )
    }
}
