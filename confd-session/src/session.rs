//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! A single client's editable configuration, per `SPEC_FULL.md` §4.4: a
//! candidate tree, a pid-scoped lock, and the operations (`Set`/`Delete`/
//! `Get`/`Validate`/`Commit`/`Discard`/`Show`/`GetFullTree`/`Load`/
//! `CopyConfig`/`Lock`/`Unlock`) a session exposes over it.

use std::sync::{Arc, Mutex};

use serde_json::Value as Json;

use confd_commit::{CommitStatus, ScriptExecutor, ValidationError};
use confd_schema::{ActionKind, SchemaNode};
use confd_tree::{
    render_native_display, render_native_subtree, render_rfc7951, Defaults, Path, RunningCell,
    Segment, Tree, Union,
};
use confd_utils::identity::Identity;

use crate::authz::Authorizer;
use crate::debug::Debug;
use crate::editconfig::{self, EditConfigRequest};
use crate::error::{Error, Result};
use crate::lock::Lock;

/// The outcome of a `Commit` call, mirroring §4.4's `(outputs, errors, ok)`
/// contract. Unlike the lock/ownership checks that precede it (surfaced as
/// an `Err`), a commit that ran but failed validation, a hook, a
/// component, or a script still comes back as `Ok` with `ok: false` or a
/// non-empty `errors` list; the caller asked to commit and got an
/// answer, not a transport-level failure.
#[derive(Clone, Debug)]
pub struct CommitReport {
    pub outputs: Vec<String>,
    pub errors: Vec<String>,
    pub ok: bool,
}

pub struct Session {
    id: u32,
    shared: bool,
    owner_uid: u32,
    candidate: Mutex<Tree>,
    lock: Lock,
    running: RunningCell,
    schema: Arc<SchemaNode>,
    commit_manager: confd_commit::CommitManager,
    script_executor: Arc<dyn ScriptExecutor>,
}

impl Session {
    /// Creates a session whose candidate starts out equal to the current
    /// running configuration, matching NETCONF's candidate-datastore
    /// semantics.
    pub fn new(
        id: u32,
        shared: bool,
        owner_uid: u32,
        running: RunningCell,
        schema: Arc<SchemaNode>,
        commit_manager: confd_commit::CommitManager,
        script_executor: Arc<dyn ScriptExecutor>,
    ) -> Self {
        let candidate = (*running.load()).clone();
        Session {
            id,
            shared,
            owner_uid,
            candidate: Mutex::new(candidate),
            lock: Lock::new(),
            running,
            schema,
            commit_manager,
            script_executor,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_shared(&self) -> bool {
        self.shared
    }

    pub fn owner_uid(&self) -> u32 {
        self.owner_uid
    }

    pub fn lock_holder(&self) -> Option<u32> {
        self.lock.holder()
    }

    pub fn lock(&self, pid: u32) -> Result<()> {
        self.lock.acquire(pid)?;
        Debug::Locked(self.id, pid).log();
        Ok(())
    }

    pub fn unlock(&self, pid: u32) -> Result<()> {
        self.lock.release(pid)?;
        Debug::Unlocked(self.id, pid).log();
        Ok(())
    }

    pub fn unlock_if_held_by(&self, pid: u32) {
        self.lock.release_if_held_by(pid);
    }

    pub(crate) fn check_lock(&self, pid: u32) -> Result<()> {
        self.lock.check(pid)
    }

    pub fn set(&self, identity: &Identity, path: &Path, value: Option<&str>, create_only: bool) -> Result<()> {
        self.lock.check(identity.pid)?;
        let mut candidate = self.candidate.lock().unwrap();
        candidate.set(path, value, create_only)?;
        let path_str = path.to_string();
        Debug::Set(self.id, &path_str).log();
        Ok(())
    }

    pub fn delete(&self, identity: &Identity, path: &Path, strict: bool) -> Result<()> {
        self.lock.check(identity.pid)?;
        let mut candidate = self.candidate.lock().unwrap();
        candidate.delete(path, strict)?;
        let path_str = path.to_string();
        Debug::Delete(self.id, &path_str).log();
        Ok(())
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        let candidate = self.candidate.lock().unwrap();
        candidate.descendant(path).and_then(|node| node.value.clone())
    }

    pub fn exists(&self, path: &Path, include_defaults: bool) -> bool {
        let candidate = self.candidate.lock().unwrap();
        if !include_defaults {
            return candidate.exists(path, false);
        }
        let running = self.running.load();
        let view = Union::root(&candidate, &running, Defaults::Include);
        view.descendant(path).map(|node| node.exists()).unwrap_or(false)
    }

    /// Runs the NETCONF edit-config pipeline against this session's
    /// candidate, under the session lock.
    pub fn edit_config(
        &self,
        identity: &Identity,
        authorizer: &dyn Authorizer,
        request: EditConfigRequest<'_>,
    ) -> Result<Vec<String>> {
        self.lock.check(identity.pid)?;
        let mut candidate = self.candidate.lock().unwrap();
        editconfig::edit_config(&mut candidate, &self.schema, identity, authorizer, request)
    }

    /// Validates the candidate merged with defaults against the running
    /// tree merged without defaults, per §4.4/§4.6 step 3-4.
    pub fn validate(&self) -> Vec<ValidationError> {
        let candidate = self.candidate.lock().unwrap();
        let running = self.running.load();
        let mcan = Union::root(&candidate, &running, Defaults::Include);
        confd_commit::validate(&mcan)
    }

    pub fn discard(&self, identity: &Identity) -> Result<()> {
        self.lock.check(identity.pid)?;
        let mut candidate = self.candidate.lock().unwrap();
        let running = self.running.load();
        *candidate = (*running).clone();
        Debug::Discard(self.id).log();
        Ok(())
    }

    /// Submits the candidate to the commit manager on behalf of `identity`,
    /// translating its outcome into §4.4's `(outputs, errors, ok)` shape.
    /// A lock failure is the only way this itself returns `Err`; once the
    /// lock is held, every commit-pipeline outcome (validation failure,
    /// hook failure, partial component/script failure) comes back `Ok`
    /// with the failure folded into `errors`/`ok`.
    pub async fn commit(&self, identity: &Identity, message: Option<String>) -> Result<CommitReport> {
        self.lock.check(identity.pid)?;
        Debug::CommitRequested(self.id).log();
        let snapshot = self.candidate.lock().unwrap().clone();
        let user = format!("uid={}", identity.uid);
        match self.commit_manager.commit(snapshot, user, message).await {
            Ok(outcome) => {
                let ok = !matches!(outcome.status, CommitStatus::Failure);
                let errors = outcome
                    .warnings
                    .iter()
                    .map(|w| format!("{}: {}", w.source, w.message))
                    .collect();
                Ok(CommitReport {
                    outputs: vec![format!("commit {} {:?}", outcome.id, outcome.status)],
                    errors,
                    ok,
                })
            }
            Err(err) => Ok(CommitReport {
                outputs: Vec::new(),
                errors: vec![err.to_string()],
                ok: false,
            }),
        }
    }

    /// Serialises the union view rooted at `path` (the whole tree when
    /// `path` is root) in device-native form, masking secret leaves unless
    /// `show_secrets` is set.
    pub fn show(&self, path: &Path, defaults: Defaults, show_secrets: bool) -> Result<String> {
        let candidate = self.candidate.lock().unwrap();
        let running = self.running.load();
        let root = Union::root(&candidate, &running, defaults);
        if path.is_root() {
            return Ok(render_native_display(&root, show_secrets));
        }
        let node = root.descendant(path).ok_or_else(|| Error::InvalidPath(path.clone()))?;
        Ok(render_native_subtree(&node, show_secrets))
    }

    /// Returns a merged configuration-and-state view rooted at `path`, as
    /// RFC 7951 JSON, running each reachable `get-state` script to
    /// populate its subtree. Script/parse failures degrade to warnings
    /// rather than aborting the call (§9: "warning vs error distinction in
    /// GetFullTree/state population").
    pub fn get_full_tree(&self, path: &Path) -> Result<(Json, Vec<String>)> {
        let candidate = self.candidate.lock().unwrap();
        let running = self.running.load();
        let config_view = Union::root(&candidate, &running, Defaults::Include);

        let (mut json, schema_root) = if path.is_root() {
            (render_rfc7951(&config_view), self.schema.clone())
        } else {
            let node = config_view.descendant(path).ok_or_else(|| Error::InvalidPath(path.clone()))?;
            let schema = node.schema().clone();
            (render_rfc7951(&node), schema)
        };

        let mut warnings = Vec::new();
        populate_state(&schema_root, &mut json, self.script_executor.as_ref(), &mut warnings);
        Ok((json, warnings))
    }

    /// Replaces the candidate with the top-level contents of `document`
    /// (a NETCONF `<config>` document, the only wire format this crate
    /// parses; see the design notes on the lack of a native-format
    /// parser). Top-level nodes `identity` isn't authorised to write are
    /// retained unchanged from the prior candidate.
    pub fn copy_config(&self, identity: &Identity, authorizer: &dyn Authorizer, document: &str) -> Result<Vec<String>> {
        self.lock.check(identity.pid)?;
        let mut guard = self.candidate.lock().unwrap();
        let previous = guard.clone();

        let mut incoming = Tree::empty(self.schema.clone());
        let request = EditConfigRequest {
            target: editconfig::Target::Candidate,
            default_operation: editconfig::Operation::Merge,
            test_option: editconfig::TestOption::Set,
            error_option: editconfig::ErrorOption::ContinueOnError,
            document,
        };
        let outputs = editconfig::edit_config(&mut incoming, &self.schema, identity, authorizer, request)?;

        for child_schema in self.schema.children() {
            let path = Path::root().child(Segment::node(child_schema.namespace.clone(), child_schema.name.clone()));
            if authorizer.authorize_path(identity, &path.to_string(), child_schema.secret) {
                continue;
            }
            incoming.root.children.retain(|c| {
                !(c.namespace() == child_schema.namespace && c.name() == child_schema.name)
            });
            if let Some(retained) = previous.descendant(&path) {
                incoming.root.children.push(retained.clone());
            }
        }

        *guard = incoming;
        Debug::CopyConfig(self.id).log();
        Ok(outputs)
    }

    /// Reads `path` as a `<config>` document and delegates to
    /// [`Session::copy_config`].
    pub fn load(&self, identity: &Identity, authorizer: &dyn Authorizer, path: &std::path::Path) -> Result<Vec<String>> {
        let document = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed(e.to_string()))?;
        self.copy_config(identity, authorizer, &document)
    }
}

/// Runs every `get-state` script declared directly on `schema`'s
/// state-true children, merging parsed output into `json` under the
/// child's namespace-qualified key. Doesn't recurse past a populated
/// state subtree: the script is expected to report everything beneath it.
fn populate_state(schema: &Arc<SchemaNode>, json: &mut Json, executor: &dyn ScriptExecutor, warnings: &mut Vec<String>) {
    let Json::Object(obj) = json else {
        return;
    };
    for child in schema.children() {
        if !child.is_state() {
            continue;
        }
        let Some(script) = child.actions.get(ActionKind::GetState) else {
            continue;
        };
        match executor.run(&script.command, ActionKind::GetState) {
            Ok(stdout) => match serde_json::from_str::<Json>(&stdout) {
                Ok(value) => {
                    check_mandatory_state(child, &value, warnings);
                    obj.insert(format!("{}:{}", child.namespace, child.name), value);
                }
                Err(err) => warnings.push(format!("{}: malformed state output: {err}", child.data_path())),
            },
            Err(err) => warnings.push(format!("{}: {err}", child.data_path())),
        }
    }
}

/// Mandatory-leaf check over a `get-state` script's own direct children,
/// per §4.4's "applying mandatory-leaf checks on pure-state subtrees".
fn check_mandatory_state(schema: &Arc<SchemaNode>, value: &Json, warnings: &mut Vec<String>) {
    for child in schema.children() {
        if !child.is_mandatory() {
            continue;
        }
        let present = value.as_object().map(|o| o.contains_key(&child.name)).unwrap_or(false);
        if !present {
            warnings.push(format!("{}: missing mandatory state leaf", child.data_path()));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use confd_commit::ComponentManager;
    use confd_schema::{ActionScript, DataType, SchemaBuilder};

    use super::*;
    use crate::authz::PermitAll;

    struct NoopComponents;
    impl ComponentManager for NoopComponents {
        fn set_running(&self, _component: &str, _config: &Json) -> std::result::Result<(), String> {
            Ok(())
        }
    }

    struct RecordingScripts(Mutex<Vec<String>>);
    impl ScriptExecutor for RecordingScripts {
        fn run(&self, command: &str, _kind: ActionKind) -> std::result::Result<String, String> {
            self.0.lock().unwrap().push(command.to_owned());
            Ok(r#"{"uptime":"1d"}"#.to_owned())
        }
    }

    fn schema() -> Arc<SchemaNode> {
        SchemaBuilder::container("if", "interfaces")
            .child(
                SchemaBuilder::list("if", "interface", &["name"])
                    .child(SchemaBuilder::leaf("if", "name", DataType::String))
                    .child(SchemaBuilder::leaf("if", "mtu", DataType::Uint32)),
            )
            .child(
                SchemaBuilder::container("if", "interfaces-state")
                    .state()
                    .actions(confd_schema::ActionTable::new().with(ActionScript::new(
                        ActionKind::GetState,
                        0,
                        "/bin/true",
                    ))),
            )
            .build()
    }

    fn identity() -> Identity {
        Identity::new(1000, tempid())
    }

    fn tempid() -> u32 {
        static COUNTER: AtomicU32 = AtomicU32::new(1);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    fn new_session(schema: Arc<SchemaNode>) -> Session {
        new_session_with_executor(schema, Arc::new(confd_commit::ProcessScriptExecutor))
    }

    fn new_session_with_executor(schema: Arc<SchemaNode>, script_executor: Arc<dyn ScriptExecutor>) -> Session {
        let running = RunningCell::new(Tree::empty(schema.clone()));
        let tmp = std::env::temp_dir().join(format!("confd-session-test-{}", tempid()));
        std::fs::create_dir_all(&tmp).unwrap();
        let commit_manager = confd_commit::CommitManager::new(
            running.clone(),
            Vec::new(),
            Arc::new(NoopComponents),
            Arc::new(confd_commit::ProcessScriptExecutor),
            tmp.join("pre-commit.d"),
            tmp.join("post-commit.d"),
            tmp.join("running.conf"),
        );
        Session::new(1, false, 1000, running, schema, commit_manager, script_executor)
    }

    #[test]
    fn set_then_exists_then_delete() {
        let session = new_session(schema());
        let identity = identity();
        let path = Path::root()
            .child(Segment::list_entry("if", "interface", vec![("name".to_owned(), "eth0".to_owned())]))
            .child(Segment::node("if", "mtu"));
        session.set(&identity, &path, Some("1500"), false).unwrap();
        assert!(session.exists(&path, false));
        session.delete(&identity, &path, true).unwrap();
        assert!(!session.exists(&path, false));
    }

    #[test]
    fn lock_denies_other_pid() {
        let session = new_session(schema());
        session.lock(42).unwrap();
        let other = Identity::new(1000, 99);
        let path = Path::root().child(Segment::node("if", "bogus"));
        let result = session.set(&other, &path, None, false);
        assert!(matches!(result, Err(Error::LockDenied(42))));
        session.unlock(42).unwrap();
        assert!(session.set(&other, &path, None, false).is_err());
    }

    #[test]
    fn discard_restores_running() {
        let session = new_session(schema());
        let identity = identity();
        let path = Path::root()
            .child(Segment::list_entry("if", "interface", vec![("name".to_owned(), "eth0".to_owned())]));
        session.set(&identity, &path, None, false).unwrap();
        assert!(session.exists(&path, false));
        session.discard(&identity).unwrap();
        assert!(!session.exists(&path, false));
    }

    #[tokio::test]
    async fn commit_reports_success() {
        let session = new_session(schema());
        let identity = identity();
        let report = session.commit(&identity, Some("test commit".to_owned())).await.unwrap();
        assert!(report.ok);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn get_full_tree_merges_state_script_output() {
        let executor = Arc::new(RecordingScripts(Mutex::new(Vec::new())));
        let session = new_session_with_executor(schema(), executor);
        let (json, warnings) = session.get_full_tree(&Path::root()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(json["if:interfaces-state"]["uptime"], serde_json::json!("1d"));
    }

    #[test]
    fn copy_config_replaces_candidate() {
        let session = new_session(schema());
        let identity = identity();
        let xml = r#"<config>
            <interface xmlns="if"><name>eth0</name><mtu>1500</mtu></interface>
        </config>"#;
        session.copy_config(&identity, &PermitAll, xml).unwrap();
        let path = Path::root()
            .child(Segment::list_entry("if", "interface", vec![("name".to_owned(), "eth0".to_owned())]))
            .child(Segment::node("if", "mtu"));
        assert!(session.exists(&path, false));
    }
}
