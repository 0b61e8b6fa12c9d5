//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span, trace_span, trace};

#[derive(Debug)]
pub enum Debug<'a> {
    SessionCreated(u32, bool),
    SessionDestroyed(u32),
    Locked(u32, u32),
    Unlocked(u32, u32),
    Set(u32, &'a str),
    Delete(u32, &'a str),
    Discard(u32),
    EditConfigOp(&'a str, &'a str),
    CopyConfig(u32),
    CommitRequested(u32),
}

impl<'a> Debug<'a> {
    pub fn log(&self) {
        match self {
            Debug::SessionCreated(..) | Debug::SessionDestroyed(..) => {
                debug_span!("session").in_scope(|| debug!("{}", self));
            }
            Debug::Locked(..) | Debug::Unlocked(..) => {
                debug_span!("session").in_scope(|| debug!("{}", self));
            }
            Debug::Set(sid, path) | Debug::Delete(sid, path) => {
                trace_span!("session").in_scope(|| trace!(%sid, %path, "{}", self));
            }
            Debug::Discard(sid) => {
                debug_span!("session").in_scope(|| debug!(%sid, "{}", self));
            }
            Debug::EditConfigOp(op, path) => {
                trace_span!("edit-config").in_scope(|| trace!(%op, %path, "{}", self));
            }
            Debug::CopyConfig(sid) => {
                debug_span!("session").in_scope(|| debug!(%sid, "{}", self));
            }
            Debug::CommitRequested(sid) => {
                debug_span!("session").in_scope(|| debug!(%sid, "{}", self));
            }
        }
    }
}

impl<'a> std::fmt::Display for Debug<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::SessionCreated(sid, shared) => {
                write!(f, "session {sid} created (shared={shared})")
            }
            Debug::SessionDestroyed(sid) => write!(f, "session {sid} destroyed"),
            Debug::Locked(sid, pid) => write!(f, "session {sid} locked by pid {pid}"),
            Debug::Unlocked(sid, pid) => write!(f, "session {sid} unlocked by pid {pid}"),
            Debug::Set(..) => write!(f, "set"),
            Debug::Delete(..) => write!(f, "delete"),
            Debug::Discard(..) => write!(f, "discard"),
            Debug::EditConfigOp(..) => write!(f, "edit-config primitive op"),
            Debug::CopyConfig(sid) => write!(f, "session {sid} candidate replaced via copy-config"),
            Debug::CommitRequested(sid) => write!(f, "session {sid} requested commit"),
        }
    }
}
