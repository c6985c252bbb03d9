// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! In-memory tabular dataset.
//!
//! A [`Table`] is an ordered set of column names over rows of dynamically
//! typed cells (`serde_json::Value`). Columns are not required to be
//! homogeneously typed; data-source adapters hand records over as JSON and
//! downstream presentation layers take them back the same way.

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use crate::ast::Operator;
use crate::error::{Result, SpqlError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from JSON records. Column order is first-seen order;
    /// keys missing from a record become null cells.
    pub fn from_records(records: Vec<Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|col| record.remove(col).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    /// Append a row. Panics in debug builds if the width disagrees with the
    /// column count.
    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Projection to the named display columns, in the order given. Unknown
    /// names are skipped rather than erroring, consistent with execution-time
    /// column handling elsewhere.
    pub fn select_columns(&self, names: &[&str]) -> Table {
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        self.project(&indices)
    }

    /// Projection to the given column indices, preserving the order of
    /// `indices`.
    pub(crate) fn project(&self, indices: &[usize]) -> Table {
        Table {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// Expand object-valued cells into `col_key` columns.
    ///
    /// Every key observed in an object cell of a column becomes a new column
    /// named `col_key`, placed after the original columns; rows without that
    /// key get null. Scalar columns and non-object cells pass through
    /// unchanged.
    pub fn flatten(&self) -> Table {
        let mut scalar_indices = Vec::new();
        // (source column index, object key) in first-seen order
        let mut expansions: Vec<(usize, String)> = Vec::new();

        for idx in 0..self.columns.len() {
            let is_nested = self
                .rows
                .iter()
                .any(|row| matches!(row[idx], Value::Object(_)));
            if !is_nested {
                scalar_indices.push(idx);
                continue;
            }
            for row in &self.rows {
                if let Value::Object(map) = &row[idx] {
                    for key in map.keys() {
                        if !expansions.iter().any(|(i, k)| *i == idx && k == key) {
                            expansions.push((idx, key.clone()));
                        }
                    }
                }
            }
        }

        let columns = scalar_indices
            .iter()
            .map(|&i| self.columns[i].clone())
            .chain(
                expansions
                    .iter()
                    .map(|(i, key)| format!("{}_{key}", self.columns[*i])),
            )
            .collect();
        let mut table = Table::new(columns);

        for row in &self.rows {
            let mut out: Vec<Value> = scalar_indices.iter().map(|&i| row[i].clone()).collect();
            for (src, key) in &expansions {
                let cell = match &row[*src] {
                    Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Null),
                    _ => Value::Null,
                };
                out.push(cell);
            }
            table.push_row(out);
        }

        table
    }

    /// Elementwise regex substitution over string cells; other cells pass
    /// through unchanged.
    pub fn regex_sub(&self, pattern: &str, replacement: &str, ignore_case: bool) -> Result<Table> {
        let regex = build_regex(pattern, ignore_case)?;
        Ok(self.map_cells(|cell| match cell {
            Value::String(s) => Value::String(regex.replace_all(s, replacement).into_owned()),
            other => other.clone(),
        }))
    }

    /// Elementwise regex search over string cells, replacing each cell with
    /// the captured group when the pattern matches and leaving it unchanged
    /// otherwise.
    pub fn regex_search(&self, pattern: &str, group: usize, ignore_case: bool) -> Result<Table> {
        let regex = build_regex(pattern, ignore_case)?;
        Ok(self.map_cells(|cell| match cell {
            Value::String(s) => match regex.captures(s).and_then(|c| c.get(group)) {
                Some(m) => Value::String(m.as_str().to_string()),
                None => cell.clone(),
            },
            other => other.clone(),
        }))
    }

    /// Like [`Table::regex_search`], but the pattern must match at the start
    /// of the cell.
    pub fn regex_match(&self, pattern: &str, group: usize, ignore_case: bool) -> Result<Table> {
        let regex = build_regex(pattern, ignore_case)?;
        Ok(self.map_cells(|cell| match cell {
            Value::String(s) => {
                let captured = regex
                    .captures(s)
                    .filter(|c| c.get(0).map(|m| m.start()) == Some(0))
                    .and_then(|c| c.get(group).map(|m| m.as_str().to_string()));
                match captured {
                    Some(text) => Value::String(text),
                    None => cell.clone(),
                }
            }
            other => other.clone(),
        }))
    }

    /// Elementwise regex split over string cells, replacing each cell with
    /// the array of captured groups when the pattern matches and leaving it
    /// unchanged otherwise. Groups that did not participate become null.
    pub fn regex_split(&self, pattern: &str, ignore_case: bool) -> Result<Table> {
        let regex = build_regex(pattern, ignore_case)?;
        Ok(self.map_cells(|cell| match cell {
            Value::String(s) => match regex.captures(s) {
                Some(captures) => Value::Array(
                    captures
                        .iter()
                        .skip(1)
                        .map(|m| match m {
                            Some(m) => Value::String(m.as_str().to_string()),
                            None => Value::Null,
                        })
                        .collect(),
                ),
                None => cell.clone(),
            },
            other => other.clone(),
        }))
    }

    fn map_cells(&self, f: impl Fn(&Value) -> Value) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| row.iter().map(&f).collect())
                .collect(),
        }
    }

    /// Parse-and-filter in one call, for interactive callers.
    /// Zero surviving rows reports [`SpqlError::EmptyResult`].
    pub fn spql_search(&self, text: &str) -> Result<Table> {
        self.spql_search_with_mode(text, Operator::Eq)
    }

    /// [`Table::spql_search`] with field patterns matched against column
    /// names under `field_mode` (typically a regex operator) instead of
    /// equality.
    pub fn spql_search_with_mode(&self, text: &str, field_mode: Operator) -> Result<Table> {
        let query = crate::parser::parse(text)?.with_field_mode(field_mode);
        let result = crate::tabular::filter(self, &query)?;
        if result.is_empty() {
            return Err(SpqlError::EmptyResult);
        }
        Ok(result)
    }
}

fn build_regex(pattern: &str, ignore_case: bool) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()?)
}
