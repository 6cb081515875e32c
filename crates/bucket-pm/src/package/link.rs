use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of package link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    #[serde(rename = "requires")]
    Require,
    #[serde(rename = "devRequires")]
    DevRequire,
    #[serde(rename = "conflicts")]
    Conflict,
    #[serde(rename = "provides")]
    Provide,
    #[serde(rename = "replaces")]
    Replace,
}

impl LinkType {
    /// Returns a human-readable description of the link type
    pub fn description(&self) -> &'static str {
        match self {
            LinkType::Require => "requires",
            LinkType::DevRequire => "requires (for development)",
            LinkType::Conflict => "conflicts",
            LinkType::Provide => "provides",
            LinkType::Replace => "replaces",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A typed edge from a source package to a target name with a constraint.
///
/// The constraint is kept as text; the pool parses and caches it when the
/// link is matched against candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Source package name (lowercase)
    pub source: String,
    /// Target package name (lowercase)
    pub target: String,
    /// Version constraint text (e.g. "^1.0", ">=2.0,<3.0")
    pub constraint: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
}

impl Link {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        constraint: impl Into<String>,
        link_type: LinkType,
    ) -> Self {
        Self {
            source: source.into().to_lowercase(),
            target: target.into().to_lowercase(),
            constraint: constraint.into(),
            link_type,
        }
    }

    /// Human readable form, e.g. `vendor/a requires vendor/b (^1.0)`
    pub fn pretty_string(&self, source_pretty: &str) -> String {
        format!(
            "{} {} {} {}",
            source_pretty,
            self.link_type.description(),
            self.target,
            self.constraint
        )
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} ({})", self.source, self.link_type, self.target, self.constraint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_lowercases_names() {
        let link = Link::new("Vendor/A", "Vendor/B", "^1.0", LinkType::Require);
        assert_eq!(link.source, "vendor/a");
        assert_eq!(link.target, "vendor/b");
        assert_eq!(link.to_string(), "vendor/a requires vendor/b (^1.0)");
    }

    #[test]
    fn test_link_pretty_string() {
        let link = Link::new("a/a", "b/b", "^2.0", LinkType::Conflict);
        assert_eq!(link.pretty_string("a/a 1.0"), "a/a 1.0 conflicts b/b ^2.0");
    }

    #[test]
    fn test_link_type_serialization() {
        let json = serde_json::to_string(&LinkType::Replace).unwrap();
        assert_eq!(json, "\"replaces\"");
    }
}
