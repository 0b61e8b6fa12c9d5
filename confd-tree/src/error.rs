//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

use crate::path::Path;

#[derive(Debug)]
pub enum Error {
    NodeExists(Path),
    NodeNotExists(Path),
    SchemaMismatch(Path),
}

impl Error {
    pub fn log(&self) {
        match self {
            Error::NodeExists(path) => warn!(%path, "{}", self),
            Error::NodeNotExists(path) => warn!(%path, "{}", self),
            Error::SchemaMismatch(path) => warn!(%path, "{}", self),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NodeExists(path) => write!(f, "node already exists: {path}"),
            Error::NodeNotExists(path) => write!(f, "node does not exist: {path}"),
            Error::SchemaMismatch(path) => {
                write!(f, "path does not match the schema: {path}")
            }
        }
    }
}

impl std::error::Error for Error {}
