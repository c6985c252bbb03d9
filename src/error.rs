// Copyright 2025 StrongDM Inc
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::ast::SyntaxError;

#[derive(Error, Debug)]
pub enum SpqlError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("no results found")]
    EmptyResult,
}

pub type Result<T> = std::result::Result<T, SpqlError>;
