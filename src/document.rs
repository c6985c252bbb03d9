// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Document-store query builder.
//!
//! Compiles a parsed query into a sequence of `$match` stages for a
//! MongoDB-dialect document store, one stage per clause. Stages are emitted
//! independently and never merged; the caller issues them in order, which
//! reproduces the tabular executor's AND-chain across clauses.
//!
//! Known asymmetry with the tabular backend, preserved deliberately: within
//! one clause this builder ORs across *fields* as well as values, whereas the
//! tabular executor ANDs across columns. See `strategy` and the divergence
//! test in `tests/spql_integration.rs`.

use serde_json::{json, Map, Value};

use crate::ast::{Clause, FieldSelector, Operator, Query};
use crate::error::Result;
use crate::strategy::CompileClause;

/// One `$match` fragment, independently issuable to the store.
pub type MatchStage = Value;

/// The document composition strategy: OR across fields and values.
pub struct DocumentStrategy;

impl CompileClause for DocumentStrategy {
    type Stage = MatchStage;

    fn compile_clause(&self, clause: &Clause) -> Result<MatchStage> {
        // The All selector compiles to the literal field name "all"; the
        // store sees it as an ordinary field key.
        let fields: Vec<&str> = match &clause.selector {
            FieldSelector::All => vec!["all"],
            FieldSelector::Named { patterns, .. } => {
                patterns.iter().map(String::as_str).collect()
            }
        };

        let mut leaves = Vec::new();
        for field in &fields {
            for value in &clause.values {
                let mut predicate = Map::new();
                predicate.insert(
                    dialect_op(clause.operator).to_string(),
                    dialect_value(clause.operator, value),
                );
                if clause.operator.is_ignore_case() {
                    predicate.insert("$options".to_string(), json!("i"));
                }
                let mut leaf = Map::new();
                leaf.insert((*field).to_string(), Value::Object(predicate));
                leaves.push(Value::Object(leaf));
            }
        }

        // "None of these field/value regex matches": NOT over the OR-group.
        let body = if clause.operator.is_negated_regex() {
            json!({ "$not": { "$or": leaves } })
        } else {
            json!({ "$or": leaves })
        };

        Ok(json!({ "$match": body }))
    }
}

/// Fixed operator-to-dialect mapping. `$ne`, `$gte` and `$lte` are the
/// idiomatic completions of the observed partial table.
fn dialect_op(operator: Operator) -> &'static str {
    match operator {
        Operator::Eq => "$in",
        Operator::Ne => "$ne",
        Operator::Lt => "$lt",
        Operator::Lte => "$lte",
        Operator::Gt => "$gt",
        Operator::Gte => "$gte",
        Operator::Regex
        | Operator::RegexIgnoreCase
        | Operator::NotRegex
        | Operator::NotRegexIgnoreCase => "$regex",
    }
}

/// Leaf value shape: `$in` takes a one-element membership array; the
/// ordering operators carry numbers when the literal parses as one; regex
/// and equality operators carry the literal string.
fn dialect_value(operator: Operator, value: &str) -> Value {
    match operator {
        Operator::Eq => json!([value]),
        Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
            match value.parse::<f64>() {
                Ok(n) => json!(n),
                Err(_) => json!(value),
            }
        }
        _ => json!(value),
    }
}

/// Compile every clause of the query into its `$match` stage, in order.
pub fn build_match(query: &Query) -> Result<Vec<MatchStage>> {
    query
        .clauses
        .iter()
        .map(|clause| DocumentStrategy.compile_clause(clause))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn stages(text: &str) -> Vec<MatchStage> {
        build_match(&parse(text).unwrap()).unwrap()
    }

    #[test]
    fn test_eq_membership() {
        let stages = stages("status == running");
        assert_eq!(
            stages,
            vec![json!({"$match": {"$or": [{"status": {"$in": ["running"]}}]}})]
        );
    }

    #[test]
    fn test_or_across_fields_and_values() {
        let stages = stages("name, state == active, idle");
        assert_eq!(
            stages[0],
            json!({"$match": {"$or": [
                {"name": {"$in": ["active"]}},
                {"name": {"$in": ["idle"]}},
                {"state": {"$in": ["active"]}},
                {"state": {"$in": ["idle"]}},
            ]}})
        );
    }

    #[test]
    fn test_one_stage_per_clause() {
        let stages = stages("status == running and frames > 100");
        assert_eq!(stages.len(), 2);
        assert_eq!(
            stages[1],
            json!({"$match": {"$or": [{"frames": {"$gt": 100.0}}]}})
        );
    }

    #[test]
    fn test_ordering_operators() {
        let stages = stages("frames >= 10 and frames <= 20 and frames != 15");
        assert_eq!(
            stages[0],
            json!({"$match": {"$or": [{"frames": {"$gte": 10.0}}]}})
        );
        assert_eq!(
            stages[1],
            json!({"$match": {"$or": [{"frames": {"$lte": 20.0}}]}})
        );
        assert_eq!(
            stages[2],
            json!({"$match": {"$or": [{"frames": {"$ne": "15"}}]}})
        );
    }

    #[test]
    fn test_regex_with_options() {
        let stages = stages("name re.IGNORECASE ERR");
        assert_eq!(
            stages[0],
            json!({"$match": {"$or": [
                {"name": {"$regex": "ERR", "$options": "i"}}
            ]}})
        );
    }

    #[test]
    fn test_not_regex_wraps_or_group() {
        let stages = stages("name nre test, debug");
        assert_eq!(
            stages[0],
            json!({"$match": {"$not": {"$or": [
                {"name": {"$regex": "test"}},
                {"name": {"$regex": "debug"}},
            ]}}})
        );
    }

    #[test]
    fn test_all_selector_wire_shape() {
        let stages = stages("re error");
        assert_eq!(
            stages[0],
            json!({"$match": {"$or": [{"all": {"$regex": "error"}}]}})
        );
    }
}
