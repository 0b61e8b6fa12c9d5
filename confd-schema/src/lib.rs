//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The compiled-schema representation the rest of the configuration daemon
//! core is bound against.
//!
//! A real deployment would populate this tree by compiling `.yang` source
//! files; that compiler is out of scope here. Instead `SchemaNode` is a
//! plain, hand-buildable owned tree so the rest of the crate has something
//! concrete to walk, and so tests can construct minimal fixture schemas
//! without a YANG toolchain.

pub mod action;
mod builder;

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

pub use action::{ActionKind, ActionScript, ActionTable};
pub use builder::SchemaBuilder;

/// The shape a schema node can take, mirroring YANG's statement kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchemaNodeKind {
    Container,
    List,
    Leaf,
    LeafList,
    /// A synthetic per-entry node under a `List`, keyed by the list's key
    /// leaves. Not a YANG statement kind of its own, but modeled explicitly
    /// because config-tree nodes need a schema to point to even for list
    /// entries.
    ListEntry,
    /// A synthetic per-value node under a `LeafList`.
    LeafValue,
}

/// The YANG base type of a leaf or leaf-list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataType {
    Empty,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    String,
    Decimal64,
    Enumeration,
    IdentityRef,
    Union,
    Binary,
}

impl DataType {
    /// Whether values of this type should be rendered as a JSON number in
    /// RFC 7951 output (as opposed to a quoted string).
    pub fn is_json_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Bool
                | DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Uint8
                | DataType::Uint16
                | DataType::Uint32
        )
    }
}

/// Whether a list/leaf-list preserves insertion order or sorts by natural
/// key/value order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ordering {
    System,
    User,
}

/// A `must`/`when` constraint attached to a schema node.
#[derive(Clone, Debug)]
pub struct Constraint {
    pub xpath: String,
    pub error_message: Option<String>,
}

impl Constraint {
    pub fn new(xpath: impl Into<String>) -> Self {
        Constraint {
            xpath: xpath.into(),
            error_message: None,
        }
    }

    #[must_use]
    pub fn with_error_message(mut self, msg: impl Into<String>) -> Self {
        self.error_message = Some(msg.into());
        self
    }
}

/// A node in the compiled schema tree.
///
/// Children are owned by their parent; the parent link is a `Weak`
/// back-reference so the tree isn't kept alive by a reference cycle (see the
/// design notes on cyclic diff/union/schema references).
pub struct SchemaNode {
    pub kind: SchemaNodeKind,
    pub namespace: String,
    pub name: String,
    /// The module that textually contains this node's definition. Usually
    /// equal to `namespace`, but differs for nodes reached through a
    /// `grouping`'s `uses` or through an `augment`, which is what makes
    /// unprefixed XPath name resolution inside those constructs bind to the
    /// *defining* module rather than the node's own namespace.
    pub defining_module: String,
    pub config: bool,
    pub presence: bool,
    pub mandatory: bool,
    pub ordering: Ordering,
    pub data_type: Option<DataType>,
    pub default: Option<String>,
    pub key_names: Vec<String>,
    /// Marks a leaf as carrying a secret value (YANG's de-facto
    /// `password`/`secret` convention), so the edit-config authoriser can
    /// apply stricter policy and `Show` can mask it by default.
    pub secret: bool,
    /// YANG `unique` statements: each entry is the set of leaf names (by
    /// local name, relative to a list entry) whose combined values must be
    /// unique across the list's entries. Only meaningful on `List` nodes.
    pub unique: Vec<Vec<String>>,
    pub features: Vec<String>,
    pub constraints: Vec<Constraint>,
    pub when: Option<Constraint>,
    pub actions: ActionTable,
    pub(crate) children: Vec<Arc<SchemaNode>>,
    pub(crate) children_by_name: BTreeMap<(String, String), usize>,
    pub(crate) parent: std::sync::RwLock<Weak<SchemaNode>>,
}

impl std::fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaNode")
            .field("kind", &self.kind)
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .finish()
    }
}

impl SchemaNode {
    pub fn is_config(&self) -> bool {
        self.config
    }

    pub fn is_state(&self) -> bool {
        !self.config
    }

    pub fn is_np_container(&self) -> bool {
        self.kind == SchemaNodeKind::Container && !self.presence
    }

    pub fn is_list_key(&self) -> bool {
        self.kind == SchemaNodeKind::Leaf
            && self
                .parent()
                .map(|p| p.key_names.iter().any(|k| k == &self.name))
                .unwrap_or(false)
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn children(&self) -> impl Iterator<Item = &Arc<SchemaNode>> {
        self.children.iter()
    }

    pub fn child(&self, namespace: &str, name: &str) -> Option<&Arc<SchemaNode>> {
        self.children_by_name
            .get(&(namespace.to_owned(), name.to_owned()))
            .map(|&idx| &self.children[idx])
    }

    pub fn parent(&self) -> Option<Arc<SchemaNode>> {
        self.parent.read().unwrap().upgrade()
    }

    /// The `data_path()`-style absolute schema path, e.g.
    /// `/vyatta-test-first-v1:first/mainPCont`.
    pub fn data_path(&self) -> String {
        let mut segments = vec![format!("{}:{}", self.namespace, self.name)];
        let mut cur = self.parent();
        while let Some(node) = cur {
            segments.push(format!("{}:{}", node.namespace, node.name));
            cur = node.parent();
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    pub fn is_ancestor_of(self: &Arc<Self>, other: &Arc<SchemaNode>) -> bool {
        let mut cur = other.parent();
        while let Some(node) = cur {
            if Arc::ptr_eq(&node, self) {
                return true;
            }
            cur = node.parent();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Arc<SchemaNode> {
        SchemaBuilder::container("main", "main")
            .child(
                SchemaBuilder::container("main", "mainPCont").presence(true).child(
                    SchemaBuilder::leaf("main", "x", DataType::Uint32),
                ),
            )
            .build()
    }

    #[test]
    fn data_path_is_root_anchored() {
        let root = fixture();
        let pcont = root.child("main", "mainPCont").unwrap();
        let x = pcont.child("main", "x").unwrap();
        assert_eq!(x.data_path(), "/main:main/main:mainPCont/main:x");
    }

    #[test]
    fn presence_container_is_not_np() {
        let root = fixture();
        let pcont = root.child("main", "mainPCont").unwrap();
        assert!(!pcont.is_np_container());
        assert!(root.is_np_container());
    }
}
