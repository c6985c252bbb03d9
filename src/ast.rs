// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! SpQL Abstract Syntax Tree types.
//!
//! Pure data shared by the tabular executor and the document query builder.
//! Only the parser constructs these; only the engine façade replaces the
//! "current" query.

use serde::{Deserialize, Serialize};

/// Comparison operators supported by SpQL.
///
/// Case sensitivity is part of the operator identity rather than a separate
/// flag, so the two backends cannot disagree on case handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,                 // ==
    Ne,                 // !=
    Lt,                 // <
    Lte,                // <=
    Gt,                 // >
    Gte,                // >=
    Regex,              // re
    RegexIgnoreCase,    // re.IGNORECASE
    NotRegex,           // nre
    NotRegexIgnoreCase, // nre.IGNORECASE
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Regex => "re",
            Self::RegexIgnoreCase => "re.IGNORECASE",
            Self::NotRegex => "nre",
            Self::NotRegexIgnoreCase => "nre.IGNORECASE",
        }
    }

    /// Operators that compile their values as regular expressions.
    pub fn is_regex(&self) -> bool {
        matches!(
            self,
            Self::Regex | Self::RegexIgnoreCase | Self::NotRegex | Self::NotRegexIgnoreCase
        )
    }

    pub fn is_ignore_case(&self) -> bool {
        matches!(self, Self::RegexIgnoreCase | Self::NotRegexIgnoreCase)
    }

    /// Operators whose leaves are wrapped in a logical NOT by the document
    /// builder.
    pub fn is_negated_regex(&self) -> bool {
        matches!(self, Self::NotRegex | Self::NotRegexIgnoreCase)
    }
}

/// Connective token joining two clauses in the surface grammar.
///
/// Preserved exactly as parsed but inert at execution time: both backends
/// AND-chain the clause sequence. Real OR handling between clauses is an
/// open question, not something either executor guesses at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connective {
    And,
    Or,
}

/// The rule choosing which table columns a clause applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldSelector {
    /// Every column.
    All,
    /// Columns whose name matches any of `patterns` under `match_mode`.
    /// Field selection reuses the operator vocabulary: `match_mode` is `Eq`
    /// as parsed and may be rewritten to a regex operator via
    /// [`Query::with_field_mode`].
    Named {
        patterns: Vec<String>,
        match_mode: Operator,
    },
}

/// One field-selector/operator/value-list unit of the query.
///
/// `values` is non-empty (the parser rejects empty value lists).
/// `connective` is the token that preceded this clause; `And` for the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub selector: FieldSelector,
    pub operator: Operator,
    pub values: Vec<String>,
    pub connective: Connective,
}

/// A parsed SpQL query: the original string and the ordered clause sequence.
///
/// Clause order is significant and preserved exactly as parsed. A `Query` is
/// replaced wholesale, never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub raw: String,
    pub clauses: Vec<Clause>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Copy of this query with every named selector's match mode replaced.
    ///
    /// Interactive callers use this to request regex field matching
    /// (`re` against column names) without re-parsing.
    pub fn with_field_mode(&self, mode: Operator) -> Query {
        let clauses = self
            .clauses
            .iter()
            .map(|clause| {
                let selector = match &clause.selector {
                    FieldSelector::All => FieldSelector::All,
                    FieldSelector::Named { patterns, .. } => FieldSelector::Named {
                        patterns: patterns.clone(),
                        match_mode: mode,
                    },
                };
                Clause {
                    selector,
                    ..clause.clone()
                }
            })
            .collect();
        Query {
            raw: self.raw.clone(),
            clauses,
        }
    }
}

/// Structured parse failure: the offending token and where it sits.
#[derive(Debug, Clone, Serialize)]
pub struct SyntaxError {
    pub message: String,
    pub position: Option<Position>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(pos) = &self.position {
            write!(f, "{} (line {}, column {})", self.message, pos.line, pos.column)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for SyntaxError {}
