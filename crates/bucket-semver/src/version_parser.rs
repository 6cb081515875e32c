//! Version parsing and normalization module

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use thiserror::Error;

use crate::constraint::{
    Constraint, ConstraintInterface, MatchAllConstraint, MultiConstraint, Operator,
};

/// Stability levels for versions, ordered from most to least stable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Stability {
    #[default]
    Stable,
    RC,
    Beta,
    Alpha,
    Dev,
}

impl Stability {
    /// Numeric priority; lower is more stable
    pub fn priority(&self) -> u8 {
        match self {
            Stability::Stable => 0,
            Stability::RC => 5,
            Stability::Beta => 10,
            Stability::Alpha => 15,
            Stability::Dev => 20,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stability::Stable => "stable",
            Stability::RC => "RC",
            Stability::Beta => "beta",
            Stability::Alpha => "alpha",
            Stability::Dev => "dev",
        }
    }

    /// All stabilities from most to least stable
    pub fn all() -> [Stability; 5] {
        [
            Stability::Stable,
            Stability::RC,
            Stability::Beta,
            Stability::Alpha,
            Stability::Dev,
        ]
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Stability {
    type Err = VersionParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VersionParser::normalize_stability(s)
    }
}

/// Error type for version parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParserError {
    #[error("Invalid version string \"{0}\"")]
    InvalidVersion(String),
    #[error("Invalid operator \"{0}\"")]
    InvalidOperator(String),
    #[error("Invalid stability \"{0}\"")]
    InvalidStability(String),
    #[error("Could not parse version constraint {constraint}: {reason}")]
    ConstraintParseError { constraint: String, reason: String },
}

const MODIFIER: &str =
    r"[._-]?(?:(stable|beta|b|RC|alpha|a|patch|pl|p)((?:[.-]?\d+)*)?)?([.-]?dev)?";

const STABILITIES: &str = r"stable|RC|beta|alpha|dev";

lazy_static! {
    static ref CLASSICAL_VERSION_RE: Regex =
        Regex::new(&format!(r"(?i)^v?(\d{{1,5}})(\.\d+)?(\.\d+)?(\.\d+)?{}$", MODIFIER)).unwrap();
    static ref DATE_VERSION_RE: Regex = Regex::new(&format!(
        r"(?i)^v?(\d{{4}}(?:[.:-]?\d{{2}}){{1,6}}(?:[.:-]?\d{{1,3}}){{0,2}}){}$",
        MODIFIER
    ))
    .unwrap();
    static ref NON_DIGIT_RE: Regex = Regex::new(r"\D").unwrap();
    static ref BRANCH_RE: Regex =
        Regex::new(r"(?i)^v?(\d+)(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?(\.(?:\d+|[x*]))?$").unwrap();
    static ref ALIAS_RE: Regex = Regex::new(r"^([^,\s]+) +as +([^,\s]+)$").unwrap();
    static ref STABILITY_FLAG_RE: Regex =
        Regex::new(&format!(r"(?i)@(?:{})$", STABILITIES)).unwrap();
    static ref BUILD_METADATA_RE: Regex = Regex::new(r"^([^,\s+]+)\+[^\s]+$").unwrap();
    static ref DEV_BRANCH_RE: Regex = Regex::new(r"(?i)^(.*?)[.-]?dev$").unwrap();
    static ref STABILITY_PARSE_RE: Regex =
        Regex::new(&format!(r"(?i){}(?:\+.*)?$", MODIFIER)).unwrap();
    static ref OR_SPLIT_RE: Regex = Regex::new(r"\s*\|\|?\s*").unwrap();
    static ref CONSTRAINT_STABILITY_RE: Regex =
        Regex::new(&format!(r"(?i)^([^,\s]*?)@({})$", STABILITIES)).unwrap();
    static ref CONSTRAINT_REF_RE: Regex =
        Regex::new(r"(?i)^(dev-[^,\s@]+?|[^,\s@]+?\.x-dev)#.+$").unwrap();
    static ref WILDCARD_RE: Regex = Regex::new(r"(?i)^v?[x*](\.[x*])*$").unwrap();
    static ref VERSION_SRC: String = format!(
        r"v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.(\d+))?{}(?:\+[^\s]+)?",
        MODIFIER
    );
    static ref TILDE_RE: Regex = Regex::new(&format!(r"(?i)^~{}$", *VERSION_SRC)).unwrap();
    static ref CARET_RE: Regex = Regex::new(&format!(r"(?i)^\^{}$", *VERSION_SRC)).unwrap();
    static ref X_RANGE_RE: Regex =
        Regex::new(r"^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.[xX*])+$").unwrap();
    static ref HYPHEN_RE: Regex = Regex::new(&format!(
        r"(?i)^({}) +- +({})$",
        *VERSION_SRC, *VERSION_SRC
    ))
    .unwrap();
    static ref BASIC_COMPARATOR_RE: Regex = Regex::new(r"^(<>|!=|>=?|<=?|==?)?\s*(.*)$").unwrap();
}

/// Whether a capture group participated and is non-empty
fn present(caps: &Captures<'_>, index: usize) -> bool {
    caps.get(index).map_or(false, |m| !m.as_str().is_empty())
}

/// Collect four numeric version components starting at `first`, missing ones as zero
fn numeric_parts(caps: &Captures<'_>, first: usize) -> [u64; 4] {
    let mut parts = [0u64; 4];
    for (offset, part) in parts.iter_mut().enumerate() {
        if let Some(m) = caps.get(first + offset) {
            *part = m.as_str().parse().unwrap_or(0);
        }
    }
    parts
}

fn is_bare_operator(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| matches!(c, '<' | '>' | '=' | '!' | '^' | '~'))
}

/// Parses and normalizes versions and version constraints
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionParser;

impl VersionParser {
    pub fn new() -> Self {
        VersionParser
    }

    /// Whether `version` can be normalized
    pub fn is_valid(&self, version: &str) -> bool {
        self.normalize(version).is_ok()
    }

    /// Returns the stability of a version string
    pub fn parse_stability(version: &str) -> Stability {
        let version = version.split('#').next().unwrap_or(version).to_lowercase();

        if version.starts_with("dev-") || version.ends_with("-dev") {
            return Stability::Dev;
        }

        if let Some(caps) = STABILITY_PARSE_RE.captures(&version) {
            if present(&caps, 3) {
                return Stability::Dev;
            }
            match caps.get(1).map(|m| m.as_str()) {
                Some("beta") | Some("b") => return Stability::Beta,
                Some("alpha") | Some("a") => return Stability::Alpha,
                Some("rc") => return Stability::RC,
                _ => {}
            }
        }

        Stability::Stable
    }

    /// Parses a stability name such as `RC` or `beta`
    pub fn normalize_stability(stability: &str) -> Result<Stability, VersionParserError> {
        match stability.trim().to_lowercase().as_str() {
            "stable" => Ok(Stability::Stable),
            "rc" => Ok(Stability::RC),
            "beta" | "b" => Ok(Stability::Beta),
            "alpha" | "a" => Ok(Stability::Alpha),
            "dev" => Ok(Stability::Dev),
            _ => Err(VersionParserError::InvalidStability(stability.to_string())),
        }
    }

    /// Normalizes a version string to `major.minor.patch.build[-stability]`
    pub fn normalize(&self, version: &str) -> Result<String, VersionParserError> {
        let mut version = version.trim().to_string();
        if version.is_empty() {
            return Err(VersionParserError::InvalidVersion(version));
        }
        let original = version.clone();

        if let Some(caps) = ALIAS_RE.captures(&original) {
            version = caps[1].to_string();
        }

        if let Some(m) = STABILITY_FLAG_RE.find(&version) {
            let start = m.start();
            version.truncate(start);
        }

        let lower = version.to_lowercase();
        if matches!(lower.as_str(), "master" | "trunk" | "default") {
            return Ok(format!("dev-{}", version));
        }
        if lower.starts_with("dev-") {
            return Ok(format!("dev-{}", &version[4..]));
        }

        if let Some(caps) = BUILD_METADATA_RE.captures(&version) {
            version = caps[1].to_string();
        }

        if let Some(caps) = CLASSICAL_VERSION_RE.captures(&version) {
            let mut normalized = caps[1].to_string();
            for index in 2..=4 {
                normalized.push_str(caps.get(index).map_or(".0", |m| m.as_str()));
            }
            return Ok(Self::append_modifiers(normalized, &caps, 5));
        }

        if let Some(caps) = DATE_VERSION_RE.captures(&version) {
            let normalized = NON_DIGIT_RE.replace_all(&caps[1], ".").into_owned();
            return Ok(Self::append_modifiers(normalized, &caps, 2));
        }

        if let Some(caps) = DEV_BRANCH_RE.captures(&version) {
            let branch = self.normalize_branch(&caps[1]);
            if !branch.starts_with("dev-") {
                return Ok(branch);
            }
        }

        Err(VersionParserError::InvalidVersion(original))
    }

    fn append_modifiers(mut normalized: String, caps: &Captures<'_>, index: usize) -> String {
        if let Some(modifier) = caps.get(index).map(|m| m.as_str()).filter(|m| !m.is_empty()) {
            if modifier.eq_ignore_ascii_case("stable") {
                return normalized;
            }
            normalized.push('-');
            normalized.push_str(Self::expand_stability(modifier));
            if let Some(number) = caps.get(index + 1) {
                normalized.push_str(number.as_str().trim_start_matches(['.', '-']));
            }
        }

        if present(caps, index + 2) {
            normalized.push_str("-dev");
        }

        normalized
    }

    fn expand_stability(stability: &str) -> &'static str {
        match stability.to_lowercase().as_str() {
            "a" | "alpha" => "alpha",
            "b" | "beta" => "beta",
            "p" | "pl" | "patch" => "patch",
            "rc" => "RC",
            _ => "stable",
        }
    }

    /// Normalizes a branch name; numeric branches become `1.9999999.9999999.9999999-dev`
    pub fn normalize_branch(&self, name: &str) -> String {
        let name = name.trim();

        if let Some(caps) = BRANCH_RE.captures(name) {
            let mut version = String::new();
            for index in 1..5 {
                match caps.get(index) {
                    Some(m) => version.push_str(&m.as_str().replace(['*', 'X'], "x")),
                    None => version.push_str(".x"),
                }
            }
            return format!("{}-dev", version.replace('x', "9999999"));
        }

        format!("dev-{}", name)
    }

    /// Parses a constraint string such as `^1.2 || ~2.0`
    pub fn parse_constraints(
        &self,
        constraints: &str,
    ) -> Result<Box<dyn ConstraintInterface>, VersionParserError> {
        let pretty = constraints.to_string();
        let trimmed = constraints.trim();
        if trimmed.is_empty() {
            return Err(self.constraint_error(constraints, "empty constraint"));
        }

        let mut or_groups: Vec<Box<dyn ConstraintInterface>> = Vec::new();
        for group in OR_SPLIT_RE.split(trimmed) {
            let and_parts = Self::split_and_constraints(group);
            if and_parts.is_empty() {
                return Err(self.constraint_error(constraints, "empty constraint group"));
            }

            let mut parsed = Vec::new();
            for part in &and_parts {
                parsed.extend(self.parse_constraint(part)?);
            }

            let constraint = if parsed.len() == 1 {
                parsed.remove(0)
            } else {
                Box::new(MultiConstraint::new(parsed, true)) as Box<dyn ConstraintInterface>
            };
            or_groups.push(constraint);
        }

        let mut constraint = MultiConstraint::create(or_groups, false);
        constraint.set_pretty_string(Some(pretty));
        Ok(constraint)
    }

    /// Splits an AND group on commas and whitespace, keeping `a - b` ranges,
    /// `x as y` aliases and detached operators (`>= 1.0`) together
    fn split_and_constraints(input: &str) -> Vec<String> {
        let tokens: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();

        let mut parts = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            let mut part = tokens[i].to_string();
            i += 1;

            while is_bare_operator(&part) && i < tokens.len() {
                part.push_str(tokens[i]);
                i += 1;
            }

            if i + 1 < tokens.len() && (tokens[i] == "-" || tokens[i] == "as") {
                part = format!("{} {} {}", part, tokens[i], tokens[i + 1]);
                i += 2;
            }

            parts.push(part);
        }

        parts
    }

    fn parse_constraint(
        &self,
        input: &str,
    ) -> Result<Vec<Box<dyn ConstraintInterface>>, VersionParserError> {
        let mut constraint = input.to_string();
        let mut stability_modifier = None;

        if let Some(caps) = ALIAS_RE.captures(input) {
            constraint = caps[1].to_string();
        }

        let flagged = CONSTRAINT_STABILITY_RE
            .captures(&constraint)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()));
        if let Some((base, flag)) = flagged {
            constraint = if base.is_empty() { "*".to_string() } else { base };
            if !flag.eq_ignore_ascii_case("stable") {
                stability_modifier = Some(flag);
            }
        }

        let without_ref = CONSTRAINT_REF_RE
            .captures(&constraint)
            .map(|caps| caps[1].to_string());
        if let Some(stripped) = without_ref {
            constraint = stripped;
        }

        if WILDCARD_RE.is_match(&constraint) {
            return Ok(vec![Box::new(MatchAllConstraint::new())]);
        }

        if constraint.starts_with("~>") {
            return Err(self.constraint_error(input, "~> is not supported, use ~ instead"));
        }

        if let Some(caps) = TILDE_RE.captures(&constraint) {
            return self.parse_tilde_constraint(&constraint, &caps);
        }

        if let Some(caps) = CARET_RE.captures(&constraint) {
            return self.parse_caret_constraint(&constraint, &caps);
        }

        if let Some(caps) = X_RANGE_RE.captures(&constraint) {
            return Ok(self.parse_x_range_constraint(&caps));
        }

        if let Some(caps) = HYPHEN_RE.captures(&constraint) {
            return self.parse_hyphen_constraint(&constraint, &caps);
        }

        if let Some(caps) = BASIC_COMPARATOR_RE.captures(&constraint) {
            let operator = caps.get(1).map_or("", |m| m.as_str());
            let raw_version = caps.get(2).map_or("", |m| m.as_str());

            if let Ok(mut version) = self.normalize(raw_version) {
                match stability_modifier {
                    Some(modifier) if Self::parse_stability(&version) == Stability::Stable => {
                        version.push('-');
                        version.push_str(&modifier);
                    }
                    _ => {
                        if (operator == "<" || operator == ">=")
                            && !version.contains('-')
                            && !version.starts_with("dev-")
                        {
                            version.push_str("-dev");
                        }
                    }
                }

                let operator = if operator.is_empty() {
                    Operator::Equal
                } else {
                    Operator::from_str(operator)?
                };
                return Ok(vec![Box::new(Constraint::new(operator, version))]);
            }
        }

        Err(self.constraint_error(input, "invalid version string"))
    }

    fn parse_tilde_constraint(
        &self,
        constraint: &str,
        caps: &Captures<'_>,
    ) -> Result<Vec<Box<dyn ConstraintInterface>>, VersionParserError> {
        let position = (2..=4).rev().find(|&i| present(caps, i)).unwrap_or(1);

        let suffix = if !present(caps, 5) && !present(caps, 7) { "-dev" } else { "" };
        let low = self
            .normalize(&format!("{}{}", &constraint[1..], suffix))
            .map_err(|_| self.constraint_error(constraint, "invalid lower bound"))?;

        let high_position = position.saturating_sub(1).max(1);
        let high = Self::manipulate_version_array(numeric_parts(caps, 1), high_position, 1);

        Ok(vec![
            Box::new(Constraint::new(Operator::GreaterThanOrEqual, low)),
            Box::new(Constraint::new(Operator::LessThan, format!("{}-dev", high))),
        ])
    }

    fn parse_caret_constraint(
        &self,
        constraint: &str,
        caps: &Captures<'_>,
    ) -> Result<Vec<Box<dyn ConstraintInterface>>, VersionParserError> {
        let major = caps.get(1).map_or("", |m| m.as_str());
        let minor = caps.get(2).map_or("", |m| m.as_str());

        let position = if major != "0" || minor.is_empty() {
            1
        } else if minor != "0" || !present(caps, 3) {
            2
        } else {
            3
        };

        let suffix = if !present(caps, 5) && !present(caps, 7) { "-dev" } else { "" };
        let low = self
            .normalize(&format!("{}{}", &constraint[1..], suffix))
            .map_err(|_| self.constraint_error(constraint, "invalid lower bound"))?;
        let high = Self::manipulate_version_array(numeric_parts(caps, 1), position, 1);

        Ok(vec![
            Box::new(Constraint::new(Operator::GreaterThanOrEqual, low)),
            Box::new(Constraint::new(Operator::LessThan, format!("{}-dev", high))),
        ])
    }

    fn parse_x_range_constraint(&self, caps: &Captures<'_>) -> Vec<Box<dyn ConstraintInterface>> {
        let position = (2..=3).rev().find(|&i| present(caps, i)).unwrap_or(1);
        let parts = numeric_parts(caps, 1);

        let low = format!("{}-dev", Self::manipulate_version_array(parts, position, 0));
        let high = format!("{}-dev", Self::manipulate_version_array(parts, position, 1));

        if low == "0.0.0.0-dev" {
            return vec![Box::new(Constraint::new(Operator::LessThan, high))];
        }

        vec![
            Box::new(Constraint::new(Operator::GreaterThanOrEqual, low)),
            Box::new(Constraint::new(Operator::LessThan, high)),
        ]
    }

    fn parse_hyphen_constraint(
        &self,
        constraint: &str,
        caps: &Captures<'_>,
    ) -> Result<Vec<Box<dyn ConstraintInterface>>, VersionParserError> {
        let low_suffix = if !present(caps, 6) && !present(caps, 8) { "-dev" } else { "" };
        let low = self
            .normalize(&caps[1])
            .map_err(|_| self.constraint_error(constraint, "invalid lower bound"))?;
        let lower = Constraint::new(
            Operator::GreaterThanOrEqual,
            format!("{}{}", low, low_suffix),
        );

        let full_upper = (present(caps, 11) && present(caps, 12))
            || present(caps, 14)
            || present(caps, 16);

        let upper = if full_upper {
            let high = self
                .normalize(&caps[9])
                .map_err(|_| self.constraint_error(constraint, "invalid upper bound"))?;
            Constraint::new(Operator::LessThanOrEqual, high)
        } else {
            let position = if present(caps, 11) { 2 } else { 1 };
            let high = Self::manipulate_version_array(numeric_parts(caps, 10), position, 1);
            Constraint::new(Operator::LessThan, format!("{}-dev", high))
        };

        Ok(vec![Box::new(lower), Box::new(upper)])
    }

    /// Zeroes every component after `position` (1-based) and adds `increment` at it
    pub fn manipulate_version_array(mut parts: [u64; 4], position: usize, increment: u64) -> String {
        for index in (1..=4).rev() {
            if index > position {
                parts[index - 1] = 0;
            } else if index == position {
                parts[index - 1] += increment;
            }
        }

        format!("{}.{}.{}.{}", parts[0], parts[1], parts[2], parts[3])
    }

    fn constraint_error(&self, constraint: &str, reason: &str) -> VersionParserError {
        VersionParserError::ConstraintParseError {
            constraint: constraint.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<crate::constraint::InvalidOperatorError> for VersionParserError {
    fn from(err: crate::constraint::InvalidOperatorError) -> Self {
        VersionParserError::InvalidOperator(err.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(constraint: &str) -> String {
        VersionParser::new()
            .parse_constraints(constraint)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_parse_stability() {
        assert_eq!(VersionParser::parse_stability("1"), Stability::Stable);
        assert_eq!(VersionParser::parse_stability("3.2.1"), Stability::Stable);
        assert_eq!(VersionParser::parse_stability("v2.0.x-dev"), Stability::Dev);
        assert_eq!(VersionParser::parse_stability("v2.0.x-dev#abc123"), Stability::Dev);
        assert_eq!(VersionParser::parse_stability("3.0-RC2"), Stability::RC);
        assert_eq!(VersionParser::parse_stability("dev-master"), Stability::Dev);
        assert_eq!(VersionParser::parse_stability("dev-feature+issue-1"), Stability::Dev);
        assert_eq!(VersionParser::parse_stability("3.1.2-pl2"), Stability::Stable);
        assert_eq!(VersionParser::parse_stability("3.1.2-alpha5"), Stability::Alpha);
        assert_eq!(VersionParser::parse_stability("2.0B1"), Stability::Beta);
        assert_eq!(VersionParser::parse_stability("1.2_a1"), Stability::Alpha);
        assert_eq!(
            VersionParser::parse_stability("1.0.0-alpha11+cs-1.1.0"),
            Stability::Alpha
        );
    }

    #[test]
    fn test_normalize_versions() {
        let parser = VersionParser::new();

        assert_eq!(parser.normalize("1.0.0").unwrap(), "1.0.0.0");
        assert_eq!(parser.normalize("1.2.3.4").unwrap(), "1.2.3.4");
        assert_eq!(parser.normalize("v1.0").unwrap(), "1.0.0.0");
        assert_eq!(parser.normalize("1.0.0-rc1").unwrap(), "1.0.0.0-RC1");
        assert_eq!(parser.normalize("1.0.0-beta.2").unwrap(), "1.0.0.0-beta2");
        assert_eq!(parser.normalize("1.0.0-dev").unwrap(), "1.0.0.0-dev");
        assert_eq!(parser.normalize("1.0.0-pl3").unwrap(), "1.0.0.0-patch3");
        assert_eq!(parser.normalize("1.0.0+build.7").unwrap(), "1.0.0.0");
        assert_eq!(parser.normalize("1.0.0@beta").unwrap(), "1.0.0.0");
        assert_eq!(parser.normalize("1.0.x-dev as 1.0.0").unwrap(), "1.0.9999999.9999999-dev");
        assert_eq!(parser.normalize("2010.01.02").unwrap(), "2010.01.02.0");
        assert_eq!(parser.normalize("20100102").unwrap(), "20100102");
        assert_eq!(parser.normalize("master").unwrap(), "dev-master");
        assert_eq!(parser.normalize("dev-feature/foo").unwrap(), "dev-feature/foo");
        assert_eq!(parser.normalize("1.x-dev").unwrap(), "1.9999999.9999999.9999999-dev");
    }

    #[test]
    fn test_normalize_fails() {
        let parser = VersionParser::new();

        assert!(parser.normalize("").is_err());
        assert!(parser.normalize("a").is_err());
        assert!(parser.normalize("1.0.0-meh").is_err());
        assert!(!parser.is_valid("1.0.0.0.0"));
    }

    #[test]
    fn test_normalize_branch() {
        let parser = VersionParser::new();

        assert_eq!(parser.normalize_branch("v1.x"), "1.9999999.9999999.9999999-dev");
        assert_eq!(parser.normalize_branch("2.1.*"), "2.1.9999999.9999999-dev");
        assert_eq!(parser.normalize_branch("feature"), "dev-feature");
    }

    #[test]
    fn test_normalize_stability() {
        assert_eq!(VersionParser::normalize_stability("RC").unwrap(), Stability::RC);
        assert_eq!(VersionParser::normalize_stability("Beta").unwrap(), Stability::Beta);
        assert!(VersionParser::normalize_stability("nightly").is_err());
        assert_eq!("dev".parse::<Stability>().unwrap(), Stability::Dev);
    }

    #[test]
    fn test_stability_priority() {
        assert!(Stability::Stable.priority() < Stability::RC.priority());
        assert!(Stability::Alpha.priority() < Stability::Dev.priority());
        assert_eq!(Stability::Beta.priority(), 10);
    }

    #[test]
    fn test_parse_basic_constraints() {
        assert_eq!(parse("1.2.3"), "== 1.2.3.0");
        assert_eq!(parse("=1.2.3"), "== 1.2.3.0");
        assert_eq!(parse("<1.2.3.4"), "< 1.2.3.4-dev");
        assert_eq!(parse(">=1.2.3"), ">= 1.2.3.0-dev");
        assert_eq!(parse(">1.0"), "> 1.0.0.0");
        assert_eq!(parse("<=2.0-beta"), "<= 2.0.0.0-beta");
        assert_eq!(parse("!=1.0"), "!= 1.0.0.0");
        assert_eq!(parse("<>1.0"), "!= 1.0.0.0");
        assert_eq!(parse("dev-master"), "== dev-master");
    }

    #[test]
    fn test_parse_wildcards_and_ranges() {
        assert_eq!(parse("*"), "*");
        assert_eq!(parse("x.x"), "*");
        assert_eq!(parse("2.0.*"), "[>= 2.0.0.0-dev < 2.1.0.0-dev]");
        assert_eq!(parse("0.*"), "< 1.0.0.0-dev");
        assert_eq!(parse("~1.2"), "[>= 1.2.0.0-dev < 2.0.0.0-dev]");
        assert_eq!(parse("~1.2.3"), "[>= 1.2.3.0-dev < 1.3.0.0-dev]");
        assert_eq!(parse("~1.2-beta"), "[>= 1.2.0.0-beta < 2.0.0.0-dev]");
        assert_eq!(parse("^1.2.3"), "[>= 1.2.3.0-dev < 2.0.0.0-dev]");
        assert_eq!(parse("^0.2.3"), "[>= 0.2.3.0-dev < 0.3.0.0-dev]");
        assert_eq!(parse("^0.0.3"), "[>= 0.0.3.0-dev < 0.0.4.0-dev]");
        assert_eq!(parse("1 - 2.0"), "[>= 1.0.0.0-dev < 2.1.0.0-dev]");
        assert_eq!(parse("1.2.3 - 2.3.4"), "[>= 1.2.3.0-dev <= 2.3.4.0]");
    }

    #[test]
    fn test_parse_multi_constraints() {
        assert_eq!(parse(">2.0,<=3.0"), "[> 2.0.0.0 <= 3.0.0.0]");
        assert_eq!(parse(">2.0 <=3.0"), "[> 2.0.0.0 <= 3.0.0.0]");
        assert_eq!(parse(">= 2.0 < 3.0"), "[>= 2.0.0.0-dev < 3.0.0.0-dev]");
        assert_eq!(parse("1.0 || 2.0"), "[== 1.0.0.0 || == 2.0.0.0]");
        assert_eq!(parse("1.0|2.0"), "[== 1.0.0.0 || == 2.0.0.0]");
    }

    #[test]
    fn test_parse_strips_flags_and_refs() {
        assert_eq!(parse("1.0@dev"), "== 1.0.0.0-dev");
        assert_eq!(parse("@beta"), "*");
        assert_eq!(parse("dev-main#abcdef"), "== dev-main");
        assert_eq!(parse("dev-main as 1.0.0"), "== dev-main");
    }

    #[test]
    fn test_parse_constraints_keeps_pretty_string() {
        let parser = VersionParser::new();
        let constraint = parser.parse_constraints("^1.0 || ^2.0").unwrap();
        assert_eq!(constraint.pretty_string(), "^1.0 || ^2.0");
    }

    #[test]
    fn test_parse_constraints_fails() {
        let parser = VersionParser::new();

        assert!(parser.parse_constraints("").is_err());
        assert!(parser.parse_constraints("~>1.0").is_err());
        assert!(parser.parse_constraints("1.0 ||").is_err());
        assert!(matches!(
            parser.parse_constraints(">=foo"),
            Err(VersionParserError::ConstraintParseError { .. })
        ));
    }
}
