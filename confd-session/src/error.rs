//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

use confd_tree::Path;

/// The standardised management-error taxonomy surfaced on the wire, shared
/// by every session-level and edit-config operation.
#[derive(Debug)]
pub enum Error {
    /// A primitive `set`/`delete` addressed a node the schema doesn't have,
    /// or whose kind disagrees with the operation attempted.
    UnknownElement(Path),
    /// An edit-config operation attribute used a namespace other than the
    /// NETCONF base namespace.
    UnknownNamespace(String),
    /// An edit-config operation attribute value wasn't one of
    /// `merge`/`replace`/`create`/`delete`/`remove`.
    UnknownAttribute(String),
    /// `create` targeted a node that already exists.
    NodeExists(Path),
    /// `delete` targeted a node that doesn't exist.
    NodeNotExists(Path),
    /// A path couldn't be resolved against the schema at all.
    InvalidPath(Path),
    /// A leaf value failed its type constraint.
    InvalidValue(Path, String),
    /// A mandatory leaf/list was absent from the finished edit.
    MissingElement(Path),
    /// The auth backend refused the operation. Never carries which rule
    /// matched.
    AccessDenied,
    /// A pid other than the lock holder attempted a locked operation.
    LockDenied(u32),
    /// A session-manager or commit-manager invariant the caller can't
    /// retry around (mismatched shared flag, commit already in progress,
    /// hook/script failure captured as stderr).
    OperationFailed(String),
    /// A session-manager lookup/create denied by the ownership predicate.
    ResourceDenied(String),
}

impl Error {
    pub fn log(&self) {
        warn!(error = %self, "session operation failed");
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnknownElement(path) => write!(f, "unknown element: {path}"),
            Error::UnknownNamespace(ns) => write!(f, "unknown namespace: {ns}"),
            Error::UnknownAttribute(attr) => write!(f, "unknown attribute: {attr}"),
            Error::NodeExists(path) => write!(f, "node already exists: {path}"),
            Error::NodeNotExists(path) => write!(f, "node does not exist: {path}"),
            Error::InvalidPath(path) => write!(f, "invalid path: {path}"),
            Error::InvalidValue(path, msg) => write!(f, "invalid value at {path}: {msg}"),
            Error::MissingElement(path) => write!(f, "missing mandatory element: {path}"),
            Error::AccessDenied => write!(f, "access denied"),
            Error::LockDenied(pid) => write!(f, "lock denied, held by {pid}"),
            Error::OperationFailed(msg) => write!(f, "operation failed: {msg}"),
            Error::ResourceDenied(msg) => write!(f, "resource denied: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<confd_tree::Error> for Error {
    fn from(err: confd_tree::Error) -> Error {
        match err {
            confd_tree::Error::NodeExists(path) => Error::NodeExists(path),
            confd_tree::Error::NodeNotExists(path) => Error::NodeNotExists(path),
            confd_tree::Error::SchemaMismatch(path) => Error::InvalidPath(path),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
