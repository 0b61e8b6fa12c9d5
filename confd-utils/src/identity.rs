//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Caller identity, used throughout the northbound core to decide session
//! ownership and authorisation scope.

/// The unix-like identity of a northbound caller: a uid, the originating
/// process id (used for session locking), and whether the caller is a
/// superuser or the daemon's own service identity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Identity {
    pub uid: u32,
    pub pid: u32,
    pub is_superuser: bool,
    pub is_daemon: bool,
}

impl Identity {
    pub fn new(uid: u32, pid: u32) -> Self {
        Identity {
            uid,
            pid,
            is_superuser: uid == 0,
            is_daemon: false,
        }
    }

    /// The identity the daemon process uses for its own internal operations
    /// (e.g. applying a startup configuration file).
    pub fn daemon() -> Self {
        Identity {
            uid: 0,
            pid: 0,
            is_superuser: true,
            is_daemon: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_zero_is_superuser() {
        let id = Identity::new(0, 42);
        assert!(id.is_superuser);
        assert!(!id.is_daemon);
    }

    #[test]
    fn daemon_identity_is_privileged() {
        let id = Identity::daemon();
        assert!(id.is_superuser);
        assert!(id.is_daemon);
    }
}
