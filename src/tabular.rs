// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Tabular filter executor.
//!
//! Applies a parsed query to an in-memory [`Table`], one clause at a time:
//! clause *i+1* receives the table produced by clause *i*, so the sequence is
//! an AND-chain regardless of the parsed connectives (the connective token is
//! inert in this version, see [`crate::ast::Connective`]).
//!
//! Composition rules within one clause, reproduced exactly:
//! - OR over the selector's field patterns (a column is selected if it
//!   matches any pattern);
//! - OR over the value list (a cell matches if it matches any value);
//! - AND across selected columns (a row survives only if every selected
//!   column's cell matched).

use crate::ast::{Clause, FieldSelector, Query};
use crate::error::Result;
use crate::predicate::Matcher;
use crate::strategy::CompileClause;
use crate::table::Table;

/// The tabular composition strategy: AND across resolved columns.
pub struct TabularStrategy;

/// One clause compiled for tabular execution.
pub struct ClauseFilter {
    /// `None` selects every column.
    columns: Option<Matcher>,
    cells: Matcher,
}

impl CompileClause for TabularStrategy {
    type Stage = ClauseFilter;

    fn compile_clause(&self, clause: &Clause) -> Result<ClauseFilter> {
        let columns = match &clause.selector {
            FieldSelector::All => None,
            FieldSelector::Named {
                patterns,
                match_mode,
            } => Some(Matcher::new(*match_mode, patterns)?),
        };
        let cells = Matcher::new(clause.operator, &clause.values)?;
        Ok(ClauseFilter { columns, cells })
    }
}

impl ClauseFilter {
    /// Apply this clause to a table.
    ///
    /// Row filtering keeps the full column set, so later clauses and
    /// downstream projection still see every column. After it, a named
    /// selector drops only the columns left entirely null across the
    /// surviving rows; `All` drops nothing. A named selector resolving no
    /// columns matches nothing: the clause yields the empty table rather
    /// than an error, since the parser defers all column-existence handling
    /// to execution.
    pub fn apply(&self, table: &Table) -> Table {
        let resolved: Vec<usize> = match &self.columns {
            None => (0..table.columns().len()).collect(),
            Some(matcher) => table
                .columns()
                .iter()
                .enumerate()
                .filter(|(_, name)| matcher.matches_str(name))
                .map(|(idx, _)| idx)
                .collect(),
        };

        if self.columns.is_some() && resolved.is_empty() {
            return Table::default();
        }

        let survivors: Vec<_> = table
            .rows()
            .iter()
            .filter(|row| resolved.iter().all(|&idx| self.cells.matches(&row[idx])))
            .collect();

        let kept: Vec<usize> = if self.columns.is_some() {
            (0..table.columns().len())
                .filter(|&idx| survivors.iter().any(|row| !row[idx].is_null()))
                .collect()
        } else {
            (0..table.columns().len()).collect()
        };

        let mut result =
            Table::new(kept.iter().map(|&i| table.columns()[i].clone()).collect());
        for row in &survivors {
            result.push_row(kept.iter().map(|&i| row[i].clone()).collect());
        }

        result
    }
}

/// Filter a table through every clause of the query in order.
///
/// An empty final table is a normal outcome here; the engine façade and
/// [`Table::spql_search`] map it to `SpqlError::EmptyResult` for callers that
/// treat no-results as reportable.
pub fn filter(table: &Table, query: &Query) -> Result<Table> {
    let mut current = table.clone();
    for clause in &query.clauses {
        let stage = TabularStrategy.compile_clause(clause)?;
        current = stage.apply(&current);
        tracing::trace!(
            operator = clause.operator.as_str(),
            rows = current.len(),
            "Applied clause"
        );
    }
    Ok(current)
}
