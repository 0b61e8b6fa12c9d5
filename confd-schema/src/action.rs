//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

/// The lifecycle point at which an action script attached to a schema node
/// fires.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ActionKind {
    Begin,
    Create,
    Update,
    Delete,
    End,
    /// Not a commit-time action: invoked by `GetFullTree` to populate a
    /// state subtree.
    GetState,
}

/// A single shell command attached to a schema node for a given lifecycle
/// point, along with the priority used to order it relative to scripts on
/// other nodes touched by the same commit.
#[derive(Clone, Debug)]
pub struct ActionScript {
    pub kind: ActionKind,
    pub priority: i32,
    pub command: String,
}

impl ActionScript {
    pub fn new(kind: ActionKind, priority: i32, command: impl Into<String>) -> Self {
        ActionScript {
            kind,
            priority,
            command: command.into(),
        }
    }
}

/// The set of action scripts declared on a single schema node, one per
/// lifecycle kind.
#[derive(Clone, Debug, Default)]
pub struct ActionTable(BTreeMap<ActionKind, ActionScript>);

impl ActionTable {
    pub fn new() -> Self {
        ActionTable::default()
    }

    #[must_use]
    pub fn with(mut self, script: ActionScript) -> Self {
        self.0.insert(script.kind, script);
        self
    }

    pub fn get(&self, kind: ActionKind) -> Option<&ActionScript> {
        self.0.get(&kind)
    }

    pub fn has(&self, kind: ActionKind) -> bool {
        self.0.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The node's own priority for commit-order purposes: the minimum
    /// priority among its declared commit-phase scripts, or `0` if it has
    /// none (so schemas without action scripts sort before/with defaults
    /// rather than being pushed arbitrarily late).
    pub fn commit_priority(&self) -> i32 {
        self.0
            .values()
            .filter(|s| s.kind != ActionKind::GetState)
            .map(|s| s.priority)
            .min()
            .unwrap_or(0)
    }
}
