//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The seam through which `Session`/`EditConfig` reach the external
//! authentication/authorisation backend; this crate only calls through
//! the trait below and never implements a backend itself.

use confd_utils::identity::Identity;

/// The kind of primitive command the edit-config processor is about to
/// apply, mirroring NETCONF/RESTCONF's own create-vs-update distinction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandKind {
    Create,
    Update,
    Delete,
}

/// One primitive `set`/`delete` synthesised by the edit-config processor,
/// handed to the auth backend before it's applied.
#[derive(Clone, Debug)]
pub struct Command {
    pub kind: CommandKind,
    pub path: String,
    pub value: Option<String>,
    /// Whether the schema flags this path's value as a secret (e.g. a
    /// password leaf), so the auth backend can apply stricter policy.
    pub secret: bool,
}

/// The authentication/authorisation backend. The core never implements
/// this itself; it only calls through the trait, exactly as
/// `ComponentManager` and `ScriptExecutor` are only called through their
/// own traits.
pub trait Authorizer: Send + Sync {
    /// Command-level authorisation: may `identity` apply `command` at all.
    fn authorize_command(&self, identity: &Identity, command: &Command) -> bool;

    /// Path-level authorisation: may `identity` even see/touch this path,
    /// independent of the specific command (used for `Load`/`CopyConfig`
    /// node retention and for `Show` secret-masking decisions upstream).
    fn authorize_path(&self, identity: &Identity, path: &str, secret: bool) -> bool;

    /// Accounting hook for a command that was in fact permitted. The
    /// default implementation does nothing; backends that need an audit
    /// trail override it.
    fn accounting(&self, _identity: &Identity, _command: &Command) {}
}

/// An `Authorizer` that permits everything, used by the daemon binary's
/// demo wiring and by tests that don't exercise authorisation denial.
#[derive(Clone, Copy, Debug, Default)]
pub struct PermitAll;

impl Authorizer for PermitAll {
    fn authorize_command(&self, _identity: &Identity, _command: &Command) -> bool {
        true
    }

    fn authorize_path(&self, _identity: &Identity, _path: &str, _secret: bool) -> bool {
        true
    }
}
