use std::fmt;

use super::{ConstraintInterface, ConstraintKey};

/// A constraint that matches every version (`*`)
#[derive(Debug, Clone, Default)]
pub struct MatchAllConstraint {
    pretty_string: Option<String>,
}

impl MatchAllConstraint {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConstraintInterface for MatchAllConstraint {
    fn matches(&self, _other: &dyn ConstraintInterface) -> bool {
        true
    }

    fn pretty_string(&self) -> String {
        self.pretty_string.clone().unwrap_or_else(|| self.to_string())
    }

    fn set_pretty_string(&mut self, pretty_string: Option<String>) {
        self.pretty_string = pretty_string;
    }

    fn key(&self) -> ConstraintKey {
        ConstraintKey::MatchAll
    }

    fn clone_box(&self) -> Box<dyn ConstraintInterface> {
        Box::new(self.clone())
    }

    fn is_match_all(&self) -> bool {
        true
    }
}

impl fmt::Display for MatchAllConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*")
    }
}
