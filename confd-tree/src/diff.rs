//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use crate::path::{Path, Segment};
use crate::union::Union;

/// How a node's presence/value changed between two merged views.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Change {
    Unchanged,
    Added,
    Deleted,
    Updated,
    /// Added solely because a schema default newly applies (no explicit
    /// value in either source tree).
    AddedByDefault,
    /// Removed solely because a schema default stopped applying.
    DeletedByDefault,
}

impl Change {
    pub fn is_change(self) -> bool {
        self != Change::Unchanged
    }
}

/// One entry of a flattened, pre-order diff.
#[derive(Clone, Debug)]
pub struct DiffEntry {
    pub path: Path,
    pub change: Change,
    pub namespace: String,
}

/// Walks `old` and `new` (typically running-without-defaults and
/// candidate-with-defaults, or the reverse) and produces a pre-order list
/// of every node whose presence or value differs.
pub fn diff<'a>(old: &Union<'a>, new: &Union<'a>) -> Vec<DiffEntry> {
    let mut out = Vec::new();
    walk(Some(old), Some(new), Path::root(), &mut out);
    out
}

fn walk(old: Option<&Union<'_>>, new: Option<&Union<'_>>, path: Path, out: &mut Vec<DiffEntry>) {
    let change = classify(old, new);
    if let Some(reference) = new.or(old) {
        if change.is_change() {
            out.push(DiffEntry {
                path: path.clone(),
                change,
                namespace: reference.namespace().to_owned(),
            });
        }
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
        walk(oc, nc, path.clone().child(segment), out);
    }
}

fn classify(old: Option<&Union<'_>>, new: Option<&Union<'_>>) -> Change {
    let old_exists = old.map(Union::exists).unwrap_or(false);
    let new_exists = new.map(Union::exists).unwrap_or(false);
    match (old_exists, new_exists) {
        (false, true) => {
            if new.unwrap().is_explicit() {
                Change::Added
            } else {
                Change::AddedByDefault
            }
        }
        (true, false) => {
            if old.unwrap().is_explicit() {
                Change::Deleted
            } else {
                Change::DeletedByDefault
            }
        }
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
    if keys.is_empty() {
        Segment::node(u.namespace(), u.name())
    } else {
        Segment::list_entry(u.namespace(), u.name(), keys.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confd_schema::{DataType, SchemaBuilder, SchemaNode};

    use super::*;
    use crate::tree::Tree;
    use crate::union::Defaults;

    fn schema() -> Arc<SchemaNode> {
        SchemaBuilder::container("if", "interfaces")
            .child(
                SchemaBuilder::list("if", "interface", &["name"])
                    .child(SchemaBuilder::leaf("if", "name", DataType::String))
                    .child(SchemaBuilder::leaf("if", "mtu", DataType::Uint32)),
            )
            .build()
    }

    #[test]
    fn detects_added_leaf_and_list_entry() {
        let schema = schema();
        let running = Tree::empty(schema.clone());
        let mut candidate = Tree::empty(schema.clone());
        let path = Path::root()
            .child(Segment::list_entry(
                "if",
                "interface",
                vec![("name".to_owned(), "eth0".to_owned())],
            ))
            .child(Segment::node("if", "mtu"));
        candidate.set(&path, Some("1500"), false).unwrap();

        let old = Union::root(&running, &running, Defaults::Exclude);
        let new = Union::root(&candidate, &running, Defaults::Exclude);
        let entries = diff(&old, &new);

        assert!(entries.iter().any(|e| e.change == Change::Added
            && e.path.to_string().contains("interface")
            && !e.path.to_string().contains("mtu")));
        assert!(entries
            .iter()
            .any(|e| e.change == Change::Added && e.path.to_string().ends_with("if:mtu")));
    }

    #[test]
    fn detects_updated_leaf() {
        let schema = schema();
        let path = Path::root()
            .child(Segment::list_entry(
                "if",
                "interface",
                vec![("name".to_owned(), "eth0".to_owned())],
            ))
            .child(Segment::node("if", "mtu"));

        let mut running = Tree::empty(schema.clone());
        running.set(&path, Some("1500"), false).unwrap();
        let mut candidate = Tree::empty(schema.clone());
        candidate.set(&path, Some("9000"), false).unwrap();

        let old = Union::root(&running, &running, Defaults::Exclude);
        let new = Union::root(&candidate, &running, Defaults::Exclude);
        let entries = diff(&old, &new);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].change, Change::Updated);
    }

    #[test]
    fn no_changes_yields_empty_diff() {
        let schema = schema();
        let path = Path::root()
            .child(Segment::list_entry(
                "if",
                "interface",
                vec![("name".to_owned(), "eth0".to_owned())],
            ))
            .child(Segment::node("if", "mtu"));
        let mut tree = Tree::empty(schema.clone());
        tree.set(&path, Some("1500"), false).unwrap();

        let old = Union::root(&tree, &tree, Defaults::Exclude);
        let new = Union::root(&tree, &tree, Defaults::Exclude);
        assert!(diff(&old, &new).is_empty());
    }
}
