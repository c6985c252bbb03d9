// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

//! Shared clause-compilation capability.
//!
//! Both backends compile one [`Clause`] into one executable stage, but they
//! compose fields differently: the tabular executor ANDs across resolved
//! columns while the document builder ORs across fields. Keeping each as its
//! own named strategy behind this trait makes that divergence explicit and a
//! future unification a strategy swap rather than a behavioral surprise.

use crate::ast::Clause;
use crate::error::Result;

pub trait CompileClause {
    type Stage;

    fn compile_clause(&self, clause: &Clause) -> Result<Self::Stage>;
}
