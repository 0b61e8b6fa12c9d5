//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_schema::{ActionKind, Ordering, SchemaNodeKind};
use confd_tree::{Path, Segment, Union};

use crate::script::{leaf_list_delete_cascade, LeafListOp, ScheduledAction};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Change {
    Unchanged,
    Added,
    Deleted,
    Updated,
}

/// Walks `run` (the pre-commit baseline) against `mcan` (the validated
/// candidate) in pre-order, scheduling one `begin`/state/`end` triple of
/// [`ScheduledAction`]s for every node whose presence or value changed,
/// plus the synthetic delete/re-create cascade for user-ordered leaf-lists
/// (§4.6 step 9, §8 scenario 1).
pub fn build_schedule(run: &Union<'_>, mcan: &Union<'_>) -> Vec<ScheduledAction> {
    let mut position = 0usize;
    let mut out = Vec::new();
    walk(Some(run), Some(mcan), Path::root(), &mut position, &mut out);
    out
}

fn walk(
    old: Option<&Union<'_>>,
    new: Option<&Union<'_>>,
    path: Path,
    position: &mut usize,
    out: &mut Vec<ScheduledAction>,
) {
    let reference = match new.or(old) {
        Some(r) => r,
        None => return,
    };

    if reference.schema().kind == SchemaNodeKind::LeafList
        && reference.schema().ordering == Ordering::User
    {
        schedule_leaf_list(old, new, reference, &path, position, out);
        return;
    }

    let change = classify(old, new);
    if change != Change::Unchanged {
        schedule_node(reference, change, &path, position, out);
    }

    let old_children: Vec<Union<'_>> = old.map(Union::children).unwrap_or_default();
    let new_children: Vec<Union<'_>> = new.map(Union::children).unwrap_or_default();

    let mut keys: Vec<(String, String, Vec<(String, String)>)> = Vec::new();
    for c in new_children.iter().chain(old_children.iter()) {
        let key = child_key(c);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    for key in keys {
        let oc = old_children.iter().find(|c| child_key(c) == key);
        let nc = new_children.iter().find(|c| child_key(c) == key);
        let segment = segment_for(nc.or(oc).unwrap(), &key.2);
        walk(oc, nc, path.clone().child(segment), position, out);
    }
}

fn schedule_leaf_list(
    old: Option<&Union<'_>>,
    new: Option<&Union<'_>>,
    list_node: &Union<'_>,
    path: &Path,
    position: &mut usize,
    out: &mut Vec<ScheduledAction>,
) {
    let old_values: Vec<String> = old
        .map(Union::children)
        .unwrap_or_default()
        .iter()
        .filter_map(Union::value)
        .collect();
    let new_values: Vec<String> = new
        .map(Union::children)
        .unwrap_or_default()
        .iter()
        .filter_map(Union::value)
        .collect();

    for value in new_values.iter().filter(|v| !old_values.contains(v)) {
        schedule_script(
            list_node,
            Change::Added,
            &path.clone().child(Segment::leaf_list_entry(
                list_node.namespace(),
                list_node.name(),
                value.clone(),
            )),
            position,
            out,
        );
    }

    for op in leaf_list_delete_cascade(&old_values, &new_values) {
        let (change, value) = match op {
            LeafListOp::Delete(v) => (Change::Deleted, v),
            LeafListOp::Create(v) => (Change::Added, v),
        };
        let entry_path = path.clone().child(Segment::leaf_list_entry(
            list_node.namespace(),
            list_node.name(),
            value,
        ));
        schedule_script(list_node, change, &entry_path, position, out);
    }
}

fn schedule_node(node: &Union<'_>, change: Change, path: &Path, position: &mut usize, out: &mut Vec<ScheduledAction>) {
    schedule_script(node, change, path, position, out);
}

fn schedule_script(
    node: &Union<'_>,
    change: Change,
    path: &Path,
    position: &mut usize,
    out: &mut Vec<ScheduledAction>,
) {
    let actions = &node.schema().actions;
    let priority = actions.commit_priority();
    let pos = *position;
    *position += 1;

    let state_kind = match change {
        Change::Added => Some(ActionKind::Create),
        Change::Deleted => Some(ActionKind::Delete),
        Change::Updated => {
            if actions.has(ActionKind::Create) {
                None
            } else {
                Some(ActionKind::Update)
            }
        }
        Change::Unchanged => None,
    };

    let mut push = |kind: ActionKind| {
        if let Some(script) = actions.get(kind) {
            out.push(ScheduledAction {
                path: path.to_string(),
                kind,
                priority,
                position: pos,
                command: script.command.clone(),
            });
        }
    };

    push(ActionKind::Begin);
    if let Some(kind) = state_kind {
        push(kind);
    }
    push(ActionKind::End);
}

fn classify(old: Option<&Union<'_>>, new: Option<&Union<'_>>) -> Change {
    let old_exists = old.map(Union::exists).unwrap_or(false);
    let new_exists = new.map(Union::exists).unwrap_or(false);
    match (old_exists, new_exists) {
        (false, true) => Change::Added,
        (true, false) => Change::Deleted,
        (true, true) => {
            if old.unwrap().value() != new.unwrap().value() {
                Change::Updated
            } else {
                Change::Unchanged
            }
        }
        (false, false) => Change::Unchanged,
    }
}

fn child_key(u: &Union<'_>) -> (String, String, Vec<(String, String)>) {
    (u.namespace().to_owned(), u.name().to_owned(), u.key_values())
}

fn segment_for(u: &Union<'_>, keys: &[(String, String)]) -> Segment {
    if !keys.is_empty() {
        Segment::list_entry(u.namespace(), u.name(), keys.to_vec())
    } else if let Some(value) = u.value() {
        if u.schema().kind == SchemaNodeKind::LeafList {
            Segment::leaf_list_entry(u.namespace(), u.name(), value)
        } else {
            Segment::node(u.namespace(), u.name())
        }
    } else {
        Segment::node(u.namespace(), u.name())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confd_schema::{ActionScript, ActionTable, DataType, SchemaBuilder, SchemaNode};
    use confd_tree::{Defaults, Tree};

    use super::*;

    fn schema() -> Arc<SchemaNode> {
        SchemaBuilder::container("if", "interfaces")
            .child(
                SchemaBuilder::leaf_list("if", "dns", DataType::String).actions(
                    ActionTable::new()
                        .with(ActionScript::new(ActionKind::Begin, 0, "dns-hook"))
                        .with(ActionScript::new(ActionKind::Create, 0, "dns-hook"))
                        .with(ActionScript::new(ActionKind::Delete, 0, "dns-hook"))
                        .with(ActionScript::new(ActionKind::End, 0, "dns-hook")),
                ),
            )
            .build()
    }

    fn with_entries(values: &[&str]) -> Tree {
        let mut tree = Tree::empty(schema());
        for v in values {
            tree.set(
                &Path::root().child(Segment::leaf_list_entry("if", "dns", *v)),
                Some(v),
                false,
            )
            .unwrap();
        }
        tree
    }

    #[test]
    fn middle_removal_schedules_full_cascade() {
        let run_tree = with_entries(&["a", "b", "c"]);
        let mcan_tree = with_entries(&["a", "c"]);
        let run = Union::root(&run_tree, &run_tree, Defaults::Exclude);
        let mcan = Union::root(&mcan_tree, &run_tree, Defaults::Exclude);

        let schedule = build_schedule(&run, &mcan);
        let deletes: Vec<&str> = schedule
            .iter()
            .filter(|a| a.kind == ActionKind::Delete)
            .map(|a| a.path.as_str())
            .collect();
        let creates: Vec<&str> = schedule
            .iter()
            .filter(|a| a.kind == ActionKind::Create)
            .map(|a| a.path.as_str())
            .collect();
        assert!(deletes.iter().any(|p| p.contains("'b'")));
        assert!(deletes.iter().any(|p| p.contains("'c'")));
        assert!(creates.iter().any(|p| p.contains("'c'")));
    }
}
