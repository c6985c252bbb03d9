// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! SpQL (Sparse Query Language)
//!
//! A small query language for filter predicates over semi-structured tabular
//! records, with two execution backends sharing one AST: an in-memory
//! tabular filter and a MongoDB-dialect match-stage builder.
//!
//! # Syntax
//!
//! ```text
//! status == running
//! status == running, failed
//! name, state == active
//! frames > 100 and frames < 150
//! host re render-0[12]
//! name re.IGNORECASE ERR
//! all nre debug
//! nre .*
//! ```
//!
//! # Operators
//!
//! | Operator | Meaning | Example |
//! |----------|---------|---------|
//! | `==` | Equal | `status == running` |
//! | `!=` | Not equal | `status != failed` |
//! | `<`, `<=`, `>`, `>=` | Ordering | `frames > 100` |
//! | `re` | Regex search | `host re render-\d+` |
//! | `re.IGNORECASE` | Case-insensitive regex | `name re.IGNORECASE err` |
//! | `nre` | Regex non-match | `name nre ^tmp` |
//! | `nre.IGNORECASE` | Case-insensitive non-match | `name nre.IGNORECASE tmp` |
//!
//! A clause lists the target columns before the operator (`name, state ==
//! active`), or applies to every column via `all` or by omitting the field
//! part. Comma-separated values OR together within a clause; clauses chain
//! with `and`/`or` connectives, though both backends currently AND-chain the
//! sequence regardless (see [`ast::Connective`]).

pub mod ast;
pub mod document;
pub mod engine;
pub mod error;
pub mod parser;
pub mod predicate;
pub mod strategy;
pub mod table;
pub mod tabular;

pub use ast::{Clause, Connective, FieldSelector, Operator, Position, Query, SyntaxError};
pub use document::{build_match, DocumentStrategy, MatchStage};
pub use engine::SpqlEngine;
pub use error::{Result, SpqlError};
pub use parser::parse;
pub use predicate::{bool_test, Matcher};
pub use strategy::CompileClause;
pub use table::Table;
pub use tabular::{filter, TabularStrategy};
