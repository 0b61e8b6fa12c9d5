//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::process::Command;

use confd_schema::ActionKind;

/// One action-script invocation synthesised from the commit diff, ready to
/// be ordered and executed.
#[derive(Clone, Debug)]
pub struct ScheduledAction {
    pub path: String,
    pub kind: ActionKind,
    pub priority: i32,
    /// Pre-order position of the owning node within the diff walk, used as
    /// the tie-breaker within a priority band so that scripts on the same
    /// priority fire in the order their nodes were touched.
    pub position: usize,
    pub command: String,
}

/// Sorts scheduled actions by priority, then position; the order §4.9
/// requires action scripts to run in during a commit.
pub fn action_order(mut actions: Vec<ScheduledAction>) -> Vec<ScheduledAction> {
    actions.sort_by_key(|a| (a.priority, a.position));
    actions
}

/// The seam through which the commit pipeline runs an action script. The
/// core never shells out itself outside of this trait, mirroring
/// [`crate::component::ComponentManager`]'s split between orchestration and
/// the side-effecting backend.
pub trait ScriptExecutor: Send + Sync {
    /// Runs `command` with `kind`'s lifecycle point as its sole argument
    /// (`begin`/`create`/`update`/`delete`/`end`), returning captured
    /// stdout on success or stderr on a non-zero exit.
    fn run(&self, command: &str, kind: ActionKind) -> Result<String, String>;
}

/// Runs actions scripts by shelling out via [`std::process::Command`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessScriptExecutor;

impl ScriptExecutor for ProcessScriptExecutor {
    fn run(&self, command: &str, kind: ActionKind) -> Result<String, String> {
        let arg = match kind {
            ActionKind::Begin => "begin",
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::End => "end",
            ActionKind::GetState => "get-state",
        };
        let output = Command::new(command)
            .arg(arg)
            .output()
            .map_err(|e| e.to_string())?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(String::from_utf8_lossy(&output.stderr).into_owned())
        }
    }
}

/// One step of a user-ordered leaf-list's synthetic delete/re-create
/// cascade.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LeafListOp {
    Delete(String),
    Create(String),
}

/// Computes the synthetic action cascade for a user-ordered leaf-list that
/// changed from `old_values` to `new_values`. Devices that only support
/// appending/removing at the tail of a user-ordered leaf-list can't delete
/// a non-final element in place: deleting the earliest removed element
/// forces every element at or after its original position to be deleted,
/// and every surviving element among them to be re-created afterward, in
/// its new relative order, to preserve observable ordering.
///
/// Pure appends (nothing removed) need no cascade; the new entries get
/// their ordinary `create` action from the surrounding diff walk, and this
/// returns an empty list.
pub fn leaf_list_delete_cascade(old_values: &[String], new_values: &[String]) -> Vec<LeafListOp> {
    let Some(i) = old_values.iter().position(|v| !new_values.contains(v)) else {
        return Vec::new();
    };

    let mut ops = Vec::new();
    for value in &old_values[i..] {
        ops.push(LeafListOp::Delete(value.clone()));
    }

    let survivors: Vec<&String> = old_values[i + 1..]
        .iter()
        .filter(|v| new_values.contains(v))
        .collect();
    for value in new_values.iter().filter(|v| survivors.contains(v)) {
        ops.push(LeafListOp::Create(value.clone()));
    }
    ops
}
