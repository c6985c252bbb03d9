// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Clause predicate evaluation.
//!
//! A [`Matcher`] is one clause's operator/value-list compiled into a reusable
//! predicate: regex values are compiled once, and every test ORs across the
//! value list. Evaluation is permissive: a comparison that makes no sense for
//! the cell's type is a local non-match, never an error, so heterogeneous
//! real-world data cannot abort a whole query.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::ast::Operator;
use crate::error::Result;

/// A compiled operator/value-list predicate.
#[derive(Debug)]
pub struct Matcher {
    operator: Operator,
    values: Vec<String>,
    regexes: Vec<Regex>,
}

impl Matcher {
    /// Compile a predicate. Fails only when a regex operator carries an
    /// invalid pattern.
    pub fn new(operator: Operator, values: &[String]) -> Result<Self> {
        let mut regexes = Vec::new();
        if operator.is_regex() {
            for value in values {
                let regex = RegexBuilder::new(value)
                    .case_insensitive(operator.is_ignore_case())
                    .build()?;
                regexes.push(regex);
            }
        }
        Ok(Self {
            operator,
            values: values.to_vec(),
            regexes,
        })
    }

    /// True if the cell matches any of the values (OR over values).
    pub fn matches(&self, cell: &Value) -> bool {
        match self.operator {
            Operator::Eq => self.values.iter().any(|v| eq_value(cell, v)),
            Operator::Ne => self.values.iter().any(|v| !eq_value(cell, v)),
            Operator::Lt => self.any_ordering(cell, |ord| ord == Ordering::Less),
            Operator::Lte => self.any_ordering(cell, |ord| ord != Ordering::Greater),
            Operator::Gt => self.any_ordering(cell, |ord| ord == Ordering::Greater),
            Operator::Gte => self.any_ordering(cell, |ord| ord != Ordering::Less),
            Operator::Regex | Operator::RegexIgnoreCase => {
                let text = cell_to_string(cell);
                self.regexes.iter().any(|re| re.is_match(&text))
            }
            Operator::NotRegex | Operator::NotRegexIgnoreCase => {
                let text = cell_to_string(cell);
                self.regexes.iter().any(|re| !re.is_match(&text))
            }
        }
    }

    /// Convenience for matching plain strings (column names).
    pub fn matches_str(&self, text: &str) -> bool {
        self.matches(&Value::String(text.to_string()))
    }

    fn any_ordering(&self, cell: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        self.values
            .iter()
            .any(|v| compare(cell, v).is_some_and(&accept))
    }
}

/// Equality under permissive coercion: strings compare verbatim, numbers
/// against the literal parsed as f64, bools against "true"/"false". Null and
/// nested values never compare equal.
fn eq_value(cell: &Value, literal: &str) -> bool {
    match cell {
        Value::String(s) => s == literal,
        Value::Number(n) => literal
            .parse::<f64>()
            .is_ok_and(|v| n.as_f64() == Some(v)),
        Value::Bool(b) => literal == if *b { "true" } else { "false" },
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Ordering under permissive coercion: numeric when both sides coerce to
/// f64, lexicographic when neither side is numeric and the cell is a
/// string, `None` (non-match) for every mixed or incoercible pairing.
fn compare(cell: &Value, literal: &str) -> Option<Ordering> {
    match cell {
        Value::Number(n) => {
            let lhs = n.as_f64()?;
            let rhs = literal.parse::<f64>().ok()?;
            lhs.partial_cmp(&rhs)
        }
        Value::String(s) => match (s.parse::<f64>(), literal.parse::<f64>()) {
            (Ok(lhs), Ok(rhs)) => lhs.partial_cmp(&rhs),
            (Err(_), Err(_)) => Some(s.as_str().cmp(literal)),
            _ => None,
        },
        _ => None,
    }
}

/// String form used for regex matching: strings verbatim, everything else
/// via its JSON rendering.
fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One-shot `bool_test`: true if `cell` matches any of `values` under
/// `operator`. Callers filtering many cells should compile a [`Matcher`]
/// instead.
pub fn bool_test(cell: &Value, operator: Operator, values: &[String]) -> Result<bool> {
    Ok(Matcher::new(operator, values)?.matches(cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matcher(op: Operator, values: &[&str]) -> Matcher {
        let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        Matcher::new(op, &values).unwrap()
    }

    #[test]
    fn test_eq_or_over_values() {
        let m = matcher(Operator::Eq, &["running", "failed"]);
        assert!(m.matches(&json!("running")));
        assert!(m.matches(&json!("failed")));
        assert!(!m.matches(&json!("pending")));
    }

    #[test]
    fn test_eq_numeric_coercion() {
        let m = matcher(Operator::Eq, &["10"]);
        assert!(m.matches(&json!(10)));
        assert!(m.matches(&json!(10.0)));
        assert!(m.matches(&json!("10")));
        assert!(!m.matches(&json!(11)));
    }

    #[test]
    fn test_eq_bool_and_null() {
        let m = matcher(Operator::Eq, &["true"]);
        assert!(m.matches(&json!(true)));
        assert!(!m.matches(&json!(false)));
        assert!(!m.matches(&Value::Null));
    }

    #[test]
    fn test_ne_is_complement() {
        let m = matcher(Operator::Ne, &["running"]);
        assert!(!m.matches(&json!("running")));
        assert!(m.matches(&json!("failed")));
        // Type mismatch is "not equal", matching the source semantics.
        assert!(m.matches(&Value::Null));
    }

    #[test]
    fn test_ordering_numeric() {
        let m = matcher(Operator::Gt, &["10"]);
        assert!(m.matches(&json!(11)));
        assert!(!m.matches(&json!(10)));
        assert!(m.matches(&json!("10.5")));

        let m = matcher(Operator::Lte, &["10"]);
        assert!(m.matches(&json!(10)));
        assert!(!m.matches(&json!(11)));
    }

    #[test]
    fn test_ordering_lexicographic_strings() {
        let m = matcher(Operator::Lt, &["banana"]);
        assert!(m.matches(&json!("apple")));
        assert!(!m.matches(&json!("cherry")));
    }

    #[test]
    fn test_ordering_incoercible_is_non_match() {
        let m = matcher(Operator::Gt, &["10"]);
        // Mixed numeric/non-numeric pairings never fall back to
        // lexicographic comparison.
        assert!(!m.matches(&json!("not a number")));
        assert!(!m.matches(&Value::Null));
        assert!(!m.matches(&json!({"nested": 1})));

        let m = matcher(Operator::Lt, &["banana"]);
        assert!(!m.matches(&json!(5)));
    }

    #[test]
    fn test_regex_search_semantics() {
        // Unanchored search, not a full match.
        let m = matcher(Operator::Regex, &["err"]);
        assert!(m.matches(&json!("some error text")));
        assert!(!m.matches(&json!("all good")));
    }

    #[test]
    fn test_regex_case_sensitivity() {
        let sensitive = matcher(Operator::Regex, &["ERR"]);
        let insensitive = matcher(Operator::RegexIgnoreCase, &["ERR"]);
        assert!(!sensitive.matches(&json!("error")));
        assert!(insensitive.matches(&json!("error")));
    }

    #[test]
    fn test_regex_on_non_string_cells() {
        let m = matcher(Operator::Regex, &["^10$"]);
        assert!(m.matches(&json!(10)));
        assert!(!m.matches(&json!(100)));
    }

    #[test]
    fn test_not_regex() {
        let m = matcher(Operator::NotRegex, &[".*"]);
        assert!(!m.matches(&json!("anything")));

        let m = matcher(Operator::NotRegex, &["^fail"]);
        assert!(m.matches(&json!("running")));
        assert!(!m.matches(&json!("failed")));
    }

    #[test]
    fn test_invalid_pattern() {
        let values = vec!["(unclosed".to_string()];
        assert!(Matcher::new(Operator::Regex, &values).is_err());
    }

    #[test]
    fn test_bool_test_one_shot() {
        assert!(bool_test(&json!("a"), Operator::Eq, &["a".to_string()]).unwrap());
    }
}
