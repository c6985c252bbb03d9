// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Query engine façade.
//!
//! Thin convenience wrapper for interactive callers: it caches the most
//! recently parsed [`Query`] and runs either backend against it. The cached
//! query is replaced wholesale by each successful `search` and left intact
//! when parsing fails, so there is no partial-update path.
//!
//! Everything the engine does is also available as pure value-passing calls
//! (`parser::parse`, `tabular::filter`, `document::build_match`), which is
//! the preferred surface for concurrent use: no shared state, no locking.

use crate::ast::{Operator, Query};
use crate::document::{self, MatchStage};
use crate::error::{Result, SpqlError};
use crate::table::Table;
use crate::tabular;

#[derive(Debug, Default)]
pub struct SpqlEngine {
    last: Query,
}

impl SpqlEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` and make it the current query. On a parse error the
    /// previous query is untouched.
    pub fn search(&mut self, text: &str) -> Result<&Query> {
        let query = crate::parser::parse(text)?;
        tracing::debug!(clauses = query.clauses.len(), raw = %query.raw, "Parsed query");
        self.last = query;
        Ok(&self.last)
    }

    pub fn last_query(&self) -> &Query {
        &self.last
    }

    /// Run the current query against a table. Zero surviving rows is
    /// reported as [`SpqlError::EmptyResult`]; callers decide severity.
    pub fn tabular_query(&self, table: &Table) -> Result<Table> {
        self.tabular_query_with_mode(table, Operator::Eq)
    }

    /// [`SpqlEngine::tabular_query`] with field patterns matched against
    /// column names under `field_mode` instead of equality.
    pub fn tabular_query_with_mode(&self, table: &Table, field_mode: Operator) -> Result<Table> {
        let query = self.last.with_field_mode(field_mode);
        let result = tabular::filter(table, &query)?;
        if result.is_empty() {
            return Err(SpqlError::EmptyResult);
        }
        Ok(result)
    }

    /// Compile the current query into document-store match stages.
    pub fn document_query(&self) -> Result<Vec<MatchStage>> {
        document::build_match(&self.last)
    }
}
