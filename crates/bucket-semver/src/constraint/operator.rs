//! Operator types for version constraints

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Comparison operators for version constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal (==)
    Equal,
    /// Less than (<)
    LessThan,
    /// Less than or equal (<=)
    LessThanOrEqual,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal (>=)
    GreaterThanOrEqual,
    /// Not equal (!=)
    NotEqual,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid operator: {0}")]
pub struct InvalidOperatorError(pub String);

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::NotEqual => "!=",
        }
    }

    /// The operator text with any `=` removed (`>=` becomes `>`, `==` becomes empty)
    pub fn without_equal(&self) -> &'static str {
        match self {
            Operator::Equal => "",
            Operator::LessThan | Operator::LessThanOrEqual => "<",
            Operator::GreaterThan | Operator::GreaterThanOrEqual => ">",
            Operator::NotEqual => "!",
        }
    }

    /// Strict comparisons exclude the bound itself
    pub fn is_strict(&self) -> bool {
        matches!(self, Operator::LessThan | Operator::GreaterThan)
    }
}

impl FromStr for Operator {
    type Err = InvalidOperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "=" | "==" => Ok(Operator::Equal),
            "<" => Ok(Operator::LessThan),
            "<=" => Ok(Operator::LessThanOrEqual),
            ">" => Ok(Operator::GreaterThan),
            ">=" => Ok(Operator::GreaterThanOrEqual),
            "!=" | "<>" => Ok(Operator::NotEqual),
            _ => Err(InvalidOperatorError(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_from_str() {
        assert_eq!("=".parse::<Operator>().unwrap(), Operator::Equal);
        assert_eq!("<>".parse::<Operator>().unwrap(), Operator::NotEqual);
        assert_eq!(">=".parse::<Operator>().unwrap(), Operator::GreaterThanOrEqual);
        assert!("=>".parse::<Operator>().is_err());
    }

    #[test]
    fn test_operator_without_equal() {
        assert_eq!(Operator::GreaterThanOrEqual.without_equal(), ">");
        assert_eq!(Operator::Equal.without_equal(), "");
        assert!(Operator::LessThan.is_strict());
        assert!(!Operator::LessThanOrEqual.is_strict());
    }
}
