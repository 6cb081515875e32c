//! Ordering of normalized version strings

use std::cmp::Ordering;

use crate::constraint::Operator;

/// A canonical version component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part<'a> {
    Number(&'a str),
    Word(&'a str),
}

/// Order of a number when compared against a special word
const NUMBER_ORDER: i32 = 4;

/// Ordering of named pre/post release forms; unknown words sort first
fn special_order(word: &str) -> i32 {
    const FORMS: [(&str, i32); 9] = [
        ("dev", 0),
        ("alpha", 1),
        ("a", 1),
        ("beta", 2),
        ("b", 2),
        ("RC", 3),
        ("rc", 3),
        ("pl", 5),
        ("p", 5),
    ];

    FORMS
        .iter()
        .find(|(form, _)| word.starts_with(form))
        .map_or(-6, |(_, order)| *order)
}

/// Splits on separators and at every digit/letter boundary
fn canonicalize(version: &str) -> Vec<Part<'_>> {
    let mut parts = Vec::new();
    let mut start: Option<(usize, bool)> = None;

    for (index, c) in version.char_indices() {
        let numeric = c.is_ascii_digit();
        let alphanumeric = numeric || c.is_ascii_alphabetic();

        if let Some((begin, was_numeric)) = start {
            if alphanumeric && was_numeric == numeric {
                continue;
            }
            parts.push(make_part(&version[begin..index], was_numeric));
            start = None;
        }

        if alphanumeric {
            start = Some((index, numeric));
        }
    }

    if let Some((begin, was_numeric)) = start {
        parts.push(make_part(&version[begin..], was_numeric));
    }

    parts
}

fn make_part(text: &str, numeric: bool) -> Part<'_> {
    if numeric {
        Part::Number(text)
    } else {
        Part::Word(text)
    }
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_parts(a: Part<'_>, b: Part<'_>) -> Ordering {
    match (a, b) {
        (Part::Number(x), Part::Number(y)) => compare_numbers(x, y),
        (Part::Word(x), Part::Word(y)) => special_order(x).cmp(&special_order(y)),
        (Part::Number(_), Part::Word(y)) => NUMBER_ORDER.cmp(&special_order(y)),
        (Part::Word(x), Part::Number(_)) => special_order(x).cmp(&NUMBER_ORDER),
    }
}

/// Compares two versions with PHP `version_compare` semantics
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = canonicalize(a);
    let right = canonicalize(b);

    for (x, y) in left.iter().zip(right.iter()) {
        let ordering = compare_parts(*x, *y);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    match left.len().cmp(&right.len()) {
        Ordering::Equal => Ordering::Equal,
        Ordering::Greater => match left[right.len()] {
            Part::Number(_) => Ordering::Greater,
            Part::Word(word) => special_order(word).cmp(&NUMBER_ORDER),
        },
        Ordering::Less => match right[left.len()] {
            Part::Number(_) => Ordering::Less,
            Part::Word(word) => NUMBER_ORDER.cmp(&special_order(word)),
        },
    }
}

/// Convenience comparisons between two version strings
pub struct Comparator;

impl Comparator {
    pub fn greater_than(a: &str, b: &str) -> bool {
        compare_versions(a, b) == Ordering::Greater
    }

    pub fn greater_than_or_equal_to(a: &str, b: &str) -> bool {
        compare_versions(a, b) != Ordering::Less
    }

    pub fn less_than(a: &str, b: &str) -> bool {
        compare_versions(a, b) == Ordering::Less
    }

    pub fn less_than_or_equal_to(a: &str, b: &str) -> bool {
        compare_versions(a, b) != Ordering::Greater
    }

    pub fn equal_to(a: &str, b: &str) -> bool {
        compare_versions(a, b) == Ordering::Equal
    }

    pub fn not_equal_to(a: &str, b: &str) -> bool {
        compare_versions(a, b) != Ordering::Equal
    }

    /// Evaluates `a <operator> b`
    pub fn compare(a: &str, operator: Operator, b: &str) -> bool {
        let ordering = compare_versions(a, b);
        match operator {
            Operator::Equal => ordering == Ordering::Equal,
            Operator::NotEqual => ordering != Ordering::Equal,
            Operator::LessThan => ordering == Ordering::Less,
            Operator::LessThanOrEqual => ordering != Ordering::Greater,
            Operator::GreaterThan => ordering == Ordering::Greater,
            Operator::GreaterThanOrEqual => ordering != Ordering::Less,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_numeric() {
        assert_eq!(compare_versions("1.0.0.0", "1.0.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.10.0.0", "1.9.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Less);
        assert_eq!(compare_versions("01.2", "1.2"), Ordering::Equal);
    }

    #[test]
    fn test_compare_special_forms() {
        assert!(Comparator::less_than("1.0.0.0-dev", "1.0.0.0-alpha1"));
        assert!(Comparator::less_than("1.0.0.0-alpha1", "1.0.0.0-beta1"));
        assert!(Comparator::less_than("1.0.0.0-beta2", "1.0.0.0-RC1"));
        assert!(Comparator::less_than("1.0.0.0-RC1", "1.0.0.0"));
        assert!(Comparator::greater_than("1.0.0.0-patch1", "1.0.0.0"));
        assert!(Comparator::less_than("1.0.0.0-dev", "1.0.0.0"));
        assert!(Comparator::greater_than("1.0.0.1-dev", "1.0.0.0"));
    }

    #[test]
    fn test_compare_with_operator() {
        assert!(Comparator::compare("2.0.0.0", Operator::GreaterThanOrEqual, "1.0.0.0-dev"));
        assert!(Comparator::compare("1.0.0.0", Operator::NotEqual, "1.0.0.1"));
        assert!(!Comparator::compare("1.0.0.0", Operator::LessThan, "1.0.0.0"));
    }

    #[test]
    fn test_canonicalize_splits_boundaries() {
        assert_eq!(
            canonicalize("1.0RC1"),
            vec![Part::Number("1"), Part::Number("0"), Part::Word("RC"), Part::Number("1")]
        );
        assert_eq!(canonicalize("1_0+2"), vec![Part::Number("1"), Part::Number("0"), Part::Number("2")]);
    }
}
