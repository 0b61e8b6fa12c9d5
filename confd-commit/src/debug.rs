//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span, trace, trace_span};

#[derive(Debug)]
pub enum Debug<'a> {
    CommitStarted(u64),
    ValidationFailed(u64, usize),
    ComponentDispatch(u64, &'a str),
    ComponentFailed(u64, &'a str, &'a str),
    ScriptRun(u64, &'a str),
    ScriptFailed(u64, &'a str, &'a str),
    RunningSwapped(u64),
    CommitFinished(u64, &'a str),
}

impl<'a> Debug<'a> {
    pub fn log(&self) {
        match self {
            Debug::CommitStarted(id) => {
                debug_span!("commit").in_scope(|| debug!(commit_id = id, "{}", self));
            }
            Debug::ValidationFailed(id, count) => {
                debug_span!("commit")
                    .in_scope(|| debug!(commit_id = id, errors = count, "{}", self));
            }
            Debug::ComponentDispatch(id, name) => {
                trace_span!("commit").in_scope(|| trace!(commit_id = id, component = name, "{}", self));
            }
            Debug::ComponentFailed(id, name, err) => {
                debug_span!("commit")
                    .in_scope(|| debug!(commit_id = id, component = name, error = err, "{}", self));
            }
            Debug::ScriptRun(id, command) => {
                trace_span!("commit").in_scope(|| trace!(commit_id = id, command, "{}", self));
            }
            Debug::ScriptFailed(id, command, err) => {
                debug_span!("commit")
                    .in_scope(|| debug!(commit_id = id, command, error = err, "{}", self));
            }
            Debug::RunningSwapped(id) => {
                debug_span!("commit").in_scope(|| debug!(commit_id = id, "{}", self));
            }
            Debug::CommitFinished(id, status) => {
                debug_span!("commit").in_scope(|| debug!(commit_id = id, status, "{}", self));
            }
        }
    }
}

impl<'a> std::fmt::Display for Debug<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::CommitStarted(..) => write!(f, "commit started"),
            Debug::ValidationFailed(..) => write!(f, "validation failed"),
            Debug::ComponentDispatch(..) => write!(f, "dispatching to component"),
            Debug::ComponentFailed(..) => write!(f, "component set-running failed"),
            Debug::ScriptRun(..) => write!(f, "running action script"),
            Debug::ScriptFailed(..) => write!(f, "action script failed"),
            Debug::RunningSwapped(..) => write!(f, "running configuration swapped"),
            Debug::CommitFinished(..) => write!(f, "commit finished"),
        }
    }
}
