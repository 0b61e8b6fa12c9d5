//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use confd_tree::{diff, render_native, Defaults, RunningCell, Tree, Union};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use crate::component::{dispatch_order, slice, ComponentManager, ComponentSpec};
use crate::debug::Debug;
use crate::error::{Error, Result, ValidationError};
use crate::hooks;
use crate::schedule::build_schedule;
use crate::script::{action_order, ScriptExecutor};
use crate::validate::validate;

/// How a commit that reached the point of touching the running
/// configuration ended up, once pre-commit validation and hooks have
/// already passed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommitStatus {
    /// Every component and action script reported success.
    Success,
    /// The running configuration was swapped and persisted, but one or more
    /// components, action scripts, or the post-commit hook directory
    /// reported a failure. Best-effort side effects don't roll back an
    /// already-durable commit.
    Partial,
    /// The commit never touched the running configuration: it failed
    /// validation or a pre-commit hook rejected it.
    Failure,
}

/// A non-fatal problem surfaced by a commit that otherwise completed.
#[derive(Clone, Debug)]
pub struct CommitWarning {
    pub source: String,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct CommitOutcome {
    pub id: u64,
    pub status: CommitStatus,
    pub warnings: Vec<CommitWarning>,
}

struct Request {
    candidate: Tree,
    user: String,
    message: Option<String>,
    respond: oneshot::Sender<Result<CommitOutcome>>,
}

/// Orchestrates the full commit pipeline against a single serializing
/// queue: at most one commit runs at a time, and a second commit requested
/// while one is already executing is rejected rather than blocked on.
///
/// The manager never performs a side effect itself; component dispatch
/// runs through [`ComponentManager`], action scripts through
/// [`ScriptExecutor`], both hook directories through [`hooks::run_dir`],
/// mirroring the split this crate keeps everywhere between orchestration
/// and the backend that actually touches the device.
#[derive(Clone)]
pub struct CommitManager {
    tx: mpsc::Sender<Request>,
}

impl CommitManager {
    pub fn new(
        running: RunningCell,
        components: Vec<ComponentSpec>,
        component_manager: Arc<dyn ComponentManager>,
        script_executor: Arc<dyn ScriptExecutor>,
        pre_commit_dir: PathBuf,
        post_commit_dir: PathBuf,
        running_file: PathBuf,
    ) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let worker = Worker {
            running,
            components,
            component_manager,
            script_executor,
            pre_commit_dir,
            post_commit_dir,
            running_file,
            next_id: AtomicU64::new(1),
            has_committed: AtomicBool::new(false),
        };
        tokio::spawn(worker.run(rx));
        CommitManager { tx }
    }

    /// Submits `candidate` for commit on behalf of `user`, with an optional
    /// commit `message` surfaced to hooks as `COMMIT_COMMENT`. Returns
    /// [`Error::CommitInProgress`] immediately, without waiting, if the
    /// queue is already full.
    pub async fn commit(
        &self,
        candidate: Tree,
        user: impl Into<String>,
        message: Option<String>,
    ) -> Result<CommitOutcome> {
        let (respond, recv) = oneshot::channel();
        self.tx
            .try_send(Request {
                candidate,
                user: user.into(),
                message,
                respond,
            })
            .map_err(|_| Error::CommitInProgress)?;
        recv.await.map_err(|_| Error::CommitInProgress)?
    }
}

struct Worker {
    running: RunningCell,
    components: Vec<ComponentSpec>,
    component_manager: Arc<dyn ComponentManager>,
    script_executor: Arc<dyn ScriptExecutor>,
    pre_commit_dir: PathBuf,
    post_commit_dir: PathBuf,
    running_file: PathBuf,
    next_id: AtomicU64,
    has_committed: AtomicBool,
}

impl Worker {
    async fn run(self, mut rx: mpsc::Receiver<Request>) {
        while let Some(request) = rx.recv().await {
            let outcome = self.run_one(request.candidate, &request.user, request.message.as_deref());
            let _ = request.respond.send(outcome);
        }
    }

    fn run_one(&self, candidate: Tree, user: &str, message: Option<&str>) -> Result<CommitOutcome> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Debug::CommitStarted(id).log();

        // Step 1-2: snapshot running, build `run` (the pre-commit baseline)
        // and `mcan` (the validated, defaults-applied candidate). The very
        // first commit of the process has no prior defaults-applied
        // baseline to diff against, so `run` is taken without defaults.
        let running = self.running.load();
        let run_defaults = if self.has_committed.load(Ordering::SeqCst) {
            Defaults::Include
        } else {
            Defaults::Exclude
        };
        let run = Union::root(&running, &running, run_defaults);
        let mcan = Union::root(&candidate, &running, Defaults::Include);
        let effective = Union::root(&candidate, &running, Defaults::Exclude);

        // Step 3-4: validate.
        let errors = validate(&mcan);
        if !errors.is_empty() {
            Debug::ValidationFailed(id, errors.len()).log();
            return Err(Error::ValidationFailed(errors));
        }

        // Step 5: compose the hook environment. `COMMIT_STATUS` isn't known
        // yet at this point in the pipeline, so the pre-commit invocation
        // goes out without it; post-commit gets the full set.
        let mut envs = vec![("COMMIT_USER".to_owned(), user.to_owned())];
        if let Ok(path) = std::env::var("PATH") {
            envs.push(("PATH".to_owned(), path));
        }
        if let Some(message) = message {
            envs.push(("COMMIT_COMMENT".to_owned(), message.to_owned()));
        }

        // Step 6: pre-commit hooks. A failure here aborts before any
        // durable side effect.
        if let Err(stderr) = hooks::run_dir(&self.pre_commit_dir, "pre-commit", &envs) {
            return Err(Error::PreHookFailed(stderr));
        }

        let mut warnings = Vec::new();
        let mut successes = 0usize;
        let mut failures = 0usize;

        // Step 7: changedNSMap, the set of namespaces touched by this
        // commit, used to decide which components need dispatching.
        let changed_namespaces = changed_namespaces(&run, &mcan);

        // Step 8: component dispatch, in declared before/after order.
        // Best-effort: a component that rejects its slice is recorded as a
        // warning but never unwinds the commit.
        let order = dispatch_order(&self.components);
        for name in &order {
            let Some(spec) = self.components.iter().find(|c| &c.name == name) else {
                continue;
            };
            let touched = spec.is_default
                || spec
                    .owned_namespaces
                    .iter()
                    .any(|ns| changed_namespaces.contains(ns));
            if !touched {
                continue;
            }
            Debug::ComponentDispatch(id, name).log();
            let config = slice(&mcan, &spec.owned_namespaces);
            match self.component_manager.set_running(name, &config) {
                Ok(()) => successes += 1,
                Err(err) => {
                    Debug::ComponentFailed(id, name, &err).log();
                    failures += 1;
                    warnings.push(CommitWarning {
                        source: format!("component:{name}"),
                        message: err,
                    });
                }
            }
        }

        // Step 9: action scripts, scheduled from the diff and ordered by
        // priority then position.
        let schedule = action_order(build_schedule(&run, &mcan));
        for action in &schedule {
            Debug::ScriptRun(id, &action.command).log();
            match self.script_executor.run(&action.command, action.kind) {
                Ok(_) => successes += 1,
                Err(err) => {
                    Debug::ScriptFailed(id, &action.command, &err).log();
                    failures += 1;
                    warnings.push(CommitWarning {
                        source: format!("script:{}", action.path),
                        message: err,
                    });
                }
            }
        }

        // Step 10: atomic running swap. The stored tree is the candidate
        // merged over running with defaults stripped back out; the
        // materialised view used for validation and component dispatch
        // always carries defaults, but nothing default-only should persist
        // as if the operator had set it explicitly.
        let new_running = Tree::from_union(&effective);
        self.running.store(new_running.clone());
        self.has_committed.store(true, Ordering::SeqCst);
        Debug::RunningSwapped(id).log();

        // Persist the new running configuration, mode 0600 (still step 10).
        if let Err(err) = self.persist(&new_running) {
            warnings.push(CommitWarning {
                source: "persist".to_owned(),
                message: err,
            });
        }

        // Step 12-13: classify before running post-commit hooks, since
        // `COMMIT_STATUS` needs to be in their environment. `SUCCESS` when
        // nothing failed, `FAILURE` when nothing succeeded either (but the
        // commit still became durable; only validation/pre-hook failures
        // prevent that), otherwise `PARTIAL`.
        let status = if failures == 0 {
            CommitStatus::Success
        } else if successes == 0 {
            CommitStatus::Failure
        } else {
            CommitStatus::Partial
        };

        // Step 11: post-commit hooks. The commit is already durable, so a
        // failure here is reported but doesn't fail the commit itself.
        envs.push(("COMMIT_STATUS".to_owned(), status_label(status).to_uppercase()));
        if let Err(stderr) = hooks::run_dir(&self.post_commit_dir, "post-commit", &envs) {
            warnings.push(CommitWarning {
                source: "post-commit-hook".to_owned(),
                message: stderr,
            });
        }
        Debug::CommitFinished(id, status_label(status)).log();

        Ok(CommitOutcome { id, status, warnings })
    }

    fn persist(&self, tree: &Tree) -> std::result::Result<(), String> {
        let view = Union::root(tree, tree, Defaults::Exclude);
        let text = render_native(&view);
        fs::write(&self.running_file, text).map_err(|e| e.to_string())?;
        let mut perms = fs::metadata(&self.running_file)
            .map_err(|e| e.to_string())?
            .permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&self.running_file, perms).map_err(|e| e.to_string())
    }
}

fn status_label(status: CommitStatus) -> &'static str {
    match status {
        CommitStatus::Success => "success",
        CommitStatus::Partial => "partial",
        CommitStatus::Failure => "failure",
    }
}

fn changed_namespaces(run: &Union<'_>, mcan: &Union<'_>) -> Vec<String> {
    let mut namespaces: Vec<String> = diff(run, mcan)
        .into_iter()
        .map(|entry| entry.namespace)
        .collect();
    namespaces.sort();
    namespaces.dedup();
    namespaces
}
