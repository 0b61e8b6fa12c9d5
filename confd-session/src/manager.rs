//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The process-wide session registry (§4.5): a guarded map from session id
//! to [`Session`], enforcing the shared/un-shared ownership predicate on
//! every lookup.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use confd_commit::{CommitManager, ScriptExecutor};
use confd_schema::SchemaNode;
use confd_tree::RunningCell;
use confd_utils::identity::Identity;

use crate::debug::Debug;
use crate::error::{Error, Result};
use crate::session::Session;

/// A guarded registry mapping session id to [`Session`], per §4.5.
///
/// Reads (`Get`) take the map's read lock; `Create`/`Destroy` take the
/// write lock. The per-session pid lock is a separate, finer-grained
/// concern handled by [`Session`] itself.
pub struct SessionManager {
    sessions: RwLock<HashMap<u32, Arc<Session>>>,
    running: RunningCell,
    schema: Arc<SchemaNode>,
    commit_manager: CommitManager,
    script_executor: Arc<dyn ScriptExecutor>,
}

impl SessionManager {
    pub fn new(
        running: RunningCell,
        schema: Arc<SchemaNode>,
        commit_manager: CommitManager,
        script_executor: Arc<dyn ScriptExecutor>,
    ) -> Self {
        SessionManager {
            sessions: RwLock::new(HashMap::new()),
            running,
            schema,
            commit_manager,
            script_executor,
        }
    }

    /// Creates session `sid` owned by `identity.uid` (ignored when
    /// `shared` is set). Idempotent when a session `sid` already exists
    /// with the same `shared` flag; a mismatched re-`Create` is an
    /// `OperationFailed`, per §4.5.
    pub fn create(&self, identity: &Identity, sid: u32, shared: bool) -> Result<Arc<Session>> {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(existing) = sessions.get(&sid) {
            if existing.is_shared() == shared {
                return Ok(existing.clone());
            }
            return Err(Error::OperationFailed(format!(
                "session {sid} already exists with shared={}",
                existing.is_shared()
            )));
        }

        let session = Arc::new(Session::new(
            sid,
            shared,
            identity.uid,
            self.running.clone(),
            self.schema.clone(),
            self.commit_manager.clone(),
            self.script_executor.clone(),
        ));
        sessions.insert(sid, session.clone());
        Debug::SessionCreated(sid, shared).log();
        Ok(session)
    }

    /// Looks up session `sid`, enforcing the access predicate: shared
    /// sessions, the daemon identity, and superusers may look up any
    /// session; everyone else only their own.
    pub fn get(&self, identity: &Identity, sid: u32) -> Result<Arc<Session>> {
        let sessions = self.sessions.read().unwrap();
        let session = sessions
            .get(&sid)
            .ok_or_else(|| Error::ResourceDenied(format!("no such session {sid}")))?;
        if !permitted(identity, session) {
            return Err(Error::ResourceDenied("access denied to session".to_owned()));
        }
        Ok(session.clone())
    }

    /// Destroys session `sid`. Requires both the access predicate and the
    /// session's own pid lock (unlocked, or held by `identity.pid`).
    pub fn destroy(&self, identity: &Identity, sid: u32) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap();
        let Some(session) = sessions.get(&sid) else {
            return Ok(());
        };
        if !permitted(identity, session) {
            return Err(Error::ResourceDenied("access denied to session".to_owned()));
        }
        session.check_lock(identity.pid)?;
        sessions.remove(&sid);
        Debug::SessionDestroyed(sid).log();
        Ok(())
    }

    pub fn lock(&self, identity: &Identity, sid: u32) -> Result<()> {
        self.get(identity, sid)?.lock(identity.pid)
    }

    pub fn unlock(&self, identity: &Identity, sid: u32) -> Result<()> {
        self.get(identity, sid)?.unlock(identity.pid)
    }

    /// Releases every session lock held by `pid`, used when a client
    /// process exits without explicitly unlocking its sessions.
    pub fn unlock_all_pid(&self, pid: u32) {
        let sessions = self.sessions.read().unwrap();
        for session in sessions.values() {
            session.unlock_if_held_by(pid);
        }
    }
}

fn permitted(identity: &Identity, session: &Session) -> bool {
    session.is_shared() || identity.is_daemon || identity.is_superuser || identity.uid == session.owner_uid()
}

#[cfg(test)]
mod tests {
    use confd_schema::SchemaBuilder;
    use confd_tree::Tree;

    use super::*;

    struct NoopComponents;
    impl confd_commit::ComponentManager for NoopComponents {
        fn set_running(&self, _component: &str, _config: &serde_json::Value) -> std::result::Result<(), String> {
            Ok(())
        }
    }

    fn manager() -> SessionManager {
        let schema = SchemaBuilder::container("sys", "system").build();
        let running = RunningCell::new(Tree::empty(schema.clone()));
        let tmp = std::env::temp_dir().join(format!("confd-session-manager-test-{}", std::process::id()));
        std::fs::create_dir_all(&tmp).unwrap();
        let commit_manager = CommitManager::new(
            running.clone(),
            Vec::new(),
            Arc::new(NoopComponents),
            Arc::new(confd_commit::ProcessScriptExecutor),
            tmp.join("pre-commit.d"),
            tmp.join("post-commit.d"),
            tmp.join("running.conf"),
        );
        SessionManager::new(running, schema, commit_manager, Arc::new(confd_commit::ProcessScriptExecutor))
    }

    #[test]
    fn create_is_idempotent_with_matching_shared_flag() {
        let manager = manager();
        let identity = Identity::new(1000, 1);
        manager.create(&identity, 1, false).unwrap();
        assert!(manager.create(&identity, 1, false).is_ok());
        assert!(manager.create(&identity, 1, true).is_err());
    }

    #[test]
    fn unshared_session_hidden_from_other_uid() {
        let manager = manager();
        let owner = Identity::new(1000, 1);
        manager.create(&owner, 1, false).unwrap();

        let other = Identity::new(2000, 2);
        assert!(matches!(manager.get(&other, 1), Err(Error::ResourceDenied(_))));

        let superuser = Identity::new(0, 3);
        assert!(manager.get(&superuser, 1).is_ok());
    }

    #[test]
    fn shared_session_visible_to_anyone() {
        let manager = manager();
        let owner = Identity::new(1000, 1);
        manager.create(&owner, 1, true).unwrap();

        let other = Identity::new(2000, 2);
        assert!(manager.get(&other, 1).is_ok());
    }

    #[test]
    fn destroy_respects_lock_ownership() {
        let manager = manager();
        let owner = Identity::new(1000, 1);
        let session = manager.create(&owner, 1, false).unwrap();
        session.lock(42).unwrap();

        assert!(matches!(manager.destroy(&owner, 1), Err(Error::LockDenied(42))));
        manager.unlock_all_pid(42);
        assert!(manager.destroy(&owner, 1).is_ok());
        assert!(manager.get(&owner, 1).is_err());
    }
}
