//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

/// One `must`/`when`/mandatory/uniqueness finding against the candidate
/// being validated. Validation aggregates every failure rather than
/// stopping at the first one, so callers see the whole picture at once.
#[derive(Clone, Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug)]
pub enum Error {
    /// Validation produced one or more constraint failures; the commit
    /// never proceeded past step 4 of the pipeline.
    ValidationFailed(Vec<ValidationError>),
    /// A pre-commit hook exited non-zero; the commit is aborted before any
    /// durable side effect.
    PreHookFailed(String),
    /// A second commit was requested while one was already in flight.
    CommitInProgress,
}

impl Error {
    pub fn log(&self) {
        warn!(error = %self, "commit failed");
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ValidationFailed(errors) => {
                write!(f, "validation failed ({} error(s)): ", errors.len())?;
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{e}")?;
                }
                Ok(())
            }
            Error::PreHookFailed(stderr) => write!(f, "pre-commit hook failed: {stderr}"),
            Error::CommitInProgress => {
                write!(f, "resource denied: commit already in progress")
            }
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
