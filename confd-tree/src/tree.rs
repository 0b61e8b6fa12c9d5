//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;

use confd_schema::SchemaNode;

use crate::error::Error;
use crate::node::Node;
use crate::path::{Path, Segment};
use crate::union::Union;

/// An owned configuration tree; either the candidate or the running copy.
#[derive(Clone, Debug)]
pub struct Tree {
    pub schema: Arc<SchemaNode>,
    pub root: Node,
}

impl Tree {
    pub fn empty(schema: Arc<SchemaNode>) -> Self {
        Tree {
            root: Node::container(schema.clone()),
            schema,
        }
    }

    /// Sets the value (or presence) at `path`, creating intermediate
    /// containers/list-entries/leaf-list-entries the schema permits.
    /// `create_only` rejects the call if the terminal node already exists
    /// (the edit-config `create` operation); otherwise it's idempotent.
    pub fn set(&mut self, path: &Path, value: Option<&str>, create_only: bool) -> Result<(), Error> {
        if create_only && self.exists(path, true) {
            return Err(Error::NodeExists(path.clone()));
        }
        let mut cur = &mut self.root;
        let mut cur_schema = self.schema.clone();
        for segment in path.segments() {
            cur_schema = cur_schema
                .child(segment.namespace(), segment.name())
                .cloned()
                .ok_or_else(|| Error::SchemaMismatch(path.clone()))?;
            cur = ensure_child(cur, &cur_schema, segment);
        }
        if let Some(v) = value {
            cur.value = Some(v.to_owned());
        }
        Ok(())
    }

    /// Removes the subtree at `path`. `strict` turns absence into an error
    /// (the edit-config `delete` operation); otherwise absence is a no-op
    /// (`remove`).
    pub fn delete(&mut self, path: &Path, strict: bool) -> Result<(), Error> {
        let Some(parent_path) = path.parent() else {
            // Deleting the root clears everything.
            self.root.children.clear();
            return Ok(());
        };
        let Some(last) = path.segments().last() else {
            return Ok(());
        };
        let Some(parent) = self.descendant_mut(&parent_path) else {
            if strict {
                return Err(Error::NodeNotExists(path.clone()));
            }
            return Ok(());
        };
        let before = parent.children.len();
        parent.children.retain(|c| !segment_matches(c, last));
        if strict && parent.children.len() == before {
            return Err(Error::NodeNotExists(path.clone()));
        }
        Ok(())
    }

    /// `include_defaults` is accepted for API symmetry with the union view;
    /// a raw candidate/running tree never holds default-only nodes, so it
    /// has no effect here.
    pub fn exists(&self, path: &Path, include_defaults: bool) -> bool {
        let _ = include_defaults;
        self.descendant(path).is_some()
    }

    /// Flattens a merged view back into an owned tree, dropping any
    /// default-only nodes the view may have materialised (a view built
    /// with [`crate::union::Defaults::Exclude`] has none to drop). This is
    /// what the commit pipeline stores into the running pointer and
    /// persists: the merge of candidate-over-running with defaults
    /// stripped back out.
    pub fn from_union(view: &Union<'_>) -> Tree {
        let mut root = Node::container(view.schema().clone());
        materialize_children(view, &mut root);
        Tree {
            schema: view.schema().clone(),
            root,
        }
    }

    pub fn descendant(&self, path: &Path) -> Option<&Node> {
        let mut cur = &self.root;
        for segment in path.segments() {
            cur = cur.children.iter().find(|c| segment_matches(c, segment))?;
        }
        Some(cur)
    }

    fn descendant_mut(&mut self, path: &Path) -> Option<&mut Node> {
        let mut cur = &mut self.root;
        for segment in path.segments() {
            cur = cur
                .children
                .iter_mut()
                .find(|c| segment_matches(c, segment))?;
        }
        Some(cur)
    }
}

fn materialize_children(view: &Union<'_>, node: &mut Node) {
    for child in view.children() {
        let mut child_node = match child.value() {
            Some(v) => Node::leaf(child.schema().clone(), v),
            None => Node::container(child.schema().clone()),
        };
        materialize_children(&child, &mut child_node);
        node.children.push(child_node);
    }
}

fn segment_matches(node: &Node, segment: &Segment) -> bool {
    if node.namespace() != segment.namespace() || node.name() != segment.name() {
        return false;
    }
    match segment {
        Segment::Node { .. } => true,
        Segment::ListEntry { keys, .. } => node.key_values().as_slice() == keys.as_slice(),
        Segment::LeafListEntry { value, .. } => node.value.as_deref() == Some(value.as_str()),
    }
}

/// Finds or creates, in `parent`, the child addressed by `segment` (whose
/// schema is `schema`), returning a mutable reference to it.
fn ensure_child<'a>(
    parent: &'a mut Node,
    schema: &Arc<SchemaNode>,
    segment: &Segment,
) -> &'a mut Node {
    if let Some(idx) = parent
        .children
        .iter()
        .position(|c| segment_matches(c, segment))
    {
        return &mut parent.children[idx];
    }
    let mut node = Node::container(schema.clone());
    if let Segment::ListEntry { keys, .. } = segment {
        for (key_name, key_value) in keys {
            if let Some(key_schema) = schema.child(&schema.namespace, key_name) {
                node.children.push(Node::leaf(key_schema.clone(), key_value.clone()));
            }
        }
    }
    if let Segment::LeafListEntry { value, .. } = segment {
        node.value = Some(value.clone());
    }
    parent.children.push(node);
    parent.children.last_mut().unwrap()
}

#[cfg(test)]
mod tests {
    use confd_schema::{DataType, SchemaBuilder};

    use super::*;

    fn schema() -> Arc<SchemaNode> {
        SchemaBuilder::container("if", "interfaces")
            .child(
                SchemaBuilder::list("if", "interface", &["name"])
                    .child(SchemaBuilder::leaf("if", "name", DataType::String))
                    .child(SchemaBuilder::leaf("if", "mtu", DataType::Uint32)),
            )
            .build()
    }

    fn iface_path(name: &str) -> Path {
        Path::root().child(Segment::list_entry(
            "if",
            "interface",
            vec![("name".to_owned(), name.to_owned())],
        ))
    }

    #[test]
    fn set_creates_missing_ancestors() {
        let mut tree = Tree::empty(schema());
        let path = iface_path("eth0").child(Segment::node("if", "mtu"));
        tree.set(&path, Some("1500"), false).unwrap();
        assert!(tree.exists(&path, false));
        let entry = tree.descendant(&iface_path("eth0")).unwrap();
        assert_eq!(entry.key_values(), vec![("name".to_owned(), "eth0".to_owned())]);
    }

    #[test]
    fn create_rejects_existing_node() {
        let mut tree = Tree::empty(schema());
        let path = iface_path("eth0");
        tree.set(&path, None, false).unwrap();
        assert!(tree.set(&path, None, true).is_err());
    }

    #[test]
    fn strict_delete_rejects_missing_node() {
        let mut tree = Tree::empty(schema());
        assert!(tree.delete(&iface_path("eth0"), true).is_err());
        assert!(tree.delete(&iface_path("eth0"), false).is_ok());
    }

    #[test]
    fn delete_removes_subtree() {
        let mut tree = Tree::empty(schema());
        let path = iface_path("eth0").child(Segment::node("if", "mtu"));
        tree.set(&path, Some("1500"), false).unwrap();
        tree.delete(&iface_path("eth0"), true).unwrap();
        assert!(!tree.exists(&iface_path("eth0"), false));
    }

    #[test]
    fn from_union_drops_defaults_but_keeps_explicit_values() {
        use confd_schema::DataType as DT;
        use crate::union::Defaults;

        let schema = SchemaBuilder::container("if", "interfaces")
            .child(
                SchemaBuilder::list("if", "interface", &["name"])
                    .child(SchemaBuilder::leaf("if", "name", DT::String))
                    .child(SchemaBuilder::leaf("if", "mtu", DT::Uint32).default_value("1500")),
            )
            .build();
        let mut tree = Tree::empty(schema.clone());
        tree.set(&iface_path("eth0"), None, false).unwrap();

        let view = Union::root(&tree, &tree, Defaults::Exclude);
        let materialized = Tree::from_union(&view);
        let entry = materialized.descendant(&iface_path("eth0")).unwrap();
        assert!(entry.child("if", "mtu").is_none());
    }
}
