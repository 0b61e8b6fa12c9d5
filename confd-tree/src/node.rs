//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;

use confd_schema::SchemaNode;

/// One node of an owned configuration tree (candidate or running).
///
/// `List`/`LeafList` entries reuse their owning list's `SchemaNode` rather
/// than a separate per-entry schema type: the list schema already carries
/// `key_names`, so an entry node can look its own key values up directly
/// from it. What distinguishes "the list" from "one of its entries" is
/// structural position (an entry is always a child of a node whose schema
/// is the same list), not a different schema kind.
#[derive(Clone, Debug)]
pub struct Node {
    pub schema: Arc<SchemaNode>,
    /// Present only for `Leaf` and `LeafValue` kinds.
    pub value: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn container(schema: Arc<SchemaNode>) -> Self {
        Node {
            schema,
            value: None,
            children: Vec::new(),
        }
    }

    pub fn leaf(schema: Arc<SchemaNode>, value: impl Into<String>) -> Self {
        Node {
            schema,
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.schema.namespace
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// This entry's key values, in the owning list's declared key order.
    /// Only meaningful when called on a node reached as a `List` node's
    /// child (an entry); `self.schema` is then the list's own schema.
    pub fn key_values(&self) -> Vec<(String, String)> {
        self.schema
            .key_names
            .iter()
            .filter_map(|key_name| {
                self.children
                    .iter()
                    .find(|c| c.name() == key_name)
                    .and_then(|c| c.value.clone())
                    .map(|v| (key_name.clone(), v))
            })
            .collect()
    }

    /// Looks up a uniquely-named child (container or leaf). List and
    /// leaf-list entries are siblings sharing one `(namespace, name)`, so
    /// this returns the first one found; use [`Node::list_entry`] or
    /// [`Node::leaf_list_entry`] for those instead.
    pub fn child(&self, namespace: &str, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|c| c.namespace() == namespace && c.name() == name)
    }

    /// All siblings named `(namespace, name)`; the entries of a list or
    /// leaf-list, or the single match for anything else.
    pub fn children_named<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Node> {
        self.children
            .iter()
            .filter(move |c| c.namespace() == namespace && c.name() == name)
    }

    pub fn list_entry(
        &self,
        namespace: &str,
        name: &str,
        keys: &[(String, String)],
    ) -> Option<&Node> {
        self.children_named(namespace, name)
            .find(|entry| entry.key_values().as_slice() == keys)
    }

    pub fn leaf_list_entry(&self, namespace: &str, name: &str, value: &str) -> Option<&Node> {
        self.children_named(namespace, name)
            .find(|entry| entry.value.as_deref() == Some(value))
    }

    pub fn is_empty_value(&self) -> bool {
        self.schema.data_type == Some(confd_schema::DataType::Empty)
    }
}
