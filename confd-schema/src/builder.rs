//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use crate::{
    ActionTable, Constraint, DataType, Ordering, SchemaNode, SchemaNodeKind,
};

/// A fluent builder for hand-constructing fixture `SchemaNode` trees, used
/// by tests and by the daemon binary's demo wiring in lieu of a real YANG
/// compiler.
pub struct SchemaBuilder {
    kind: SchemaNodeKind,
    namespace: String,
    name: String,
    defining_module: Option<String>,
    config: bool,
    presence: bool,
    mandatory: bool,
    ordering: Ordering,
    data_type: Option<DataType>,
    default: Option<String>,
    key_names: Vec<String>,
    secret: bool,
    unique: Vec<Vec<String>>,
    features: Vec<String>,
    constraints: Vec<Constraint>,
    when: Option<Constraint>,
    actions: ActionTable,
    children: Vec<SchemaBuilder>,
}

impl SchemaBuilder {
    fn new(kind: SchemaNodeKind, namespace: &str, name: &str) -> Self {
        SchemaBuilder {
            kind,
            namespace: namespace.to_owned(),
            name: name.to_owned(),
            defining_module: None,
            config: true,
            presence: false,
            mandatory: false,
            ordering: Ordering::System,
            data_type: None,
            default: None,
            key_names: Vec::new(),
            secret: false,
            unique: Vec::new(),
            features: Vec::new(),
            constraints: Vec::new(),
            when: None,
            actions: ActionTable::new(),
            children: Vec::new(),
        }
    }

    pub fn container(namespace: &str, name: &str) -> Self {
        SchemaBuilder::new(SchemaNodeKind::Container, namespace, name)
    }

    pub fn list(namespace: &str, name: &str, key_names: &[&str]) -> Self {
        let mut b = SchemaBuilder::new(SchemaNodeKind::List, namespace, name);
        b.key_names = key_names.iter().map(|s| s.to_string()).collect();
        b
    }

    pub fn leaf(namespace: &str, name: &str, data_type: DataType) -> Self {
        let mut b = SchemaBuilder::new(SchemaNodeKind::Leaf, namespace, name);
        b.data_type = Some(data_type);
        b
    }

    pub fn leaf_list(namespace: &str, name: &str, data_type: DataType) -> Self {
        let mut b =
            SchemaBuilder::new(SchemaNodeKind::LeafList, namespace, name);
        b.data_type = Some(data_type);
        b.ordering = Ordering::User;
        b
    }

    #[must_use]
    pub fn child(mut self, child: SchemaBuilder) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = SchemaBuilder>) -> Self {
        self.children.extend(children);
        self
    }

    #[must_use]
    pub fn presence(mut self, presence: bool) -> Self {
        self.presence = presence;
        self
    }

    #[must_use]
    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    #[must_use]
    pub fn state(mut self) -> Self {
        self.config = false;
        self
    }

    #[must_use]
    pub fn ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Declares a `unique` statement over the given leaf names (relative
    /// to one entry of this list).
    #[must_use]
    pub fn secret(mut self, secret: bool) -> Self {
        self.secret = secret;
        self
    }

    #[must_use]
    pub fn unique(mut self, leaf_names: &[&str]) -> Self {
        self.unique
            .push(leaf_names.iter().map(|s| s.to_string()).collect());
        self
    }

    #[must_use]
    pub fn feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    #[must_use]
    pub fn must(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn when(mut self, constraint: Constraint) -> Self {
        self.when = Some(constraint);
        self
    }

    #[must_use]
    pub fn actions(mut self, actions: ActionTable) -> Self {
        self.actions = actions;
        self
    }

    /// Marks this node (typically reached through a `uses`/augment) as
    /// textually defined in a module other than its namespace, which is
    /// what makes unprefixed XPath references inside it bind to that module
    /// rather than to the node's own namespace.
    #[must_use]
    pub fn defining_module(mut self, module: impl Into<String>) -> Self {
        self.defining_module = Some(module.into());
        self
    }

    pub fn build(self) -> Arc<SchemaNode> {
        let defining_module =
            self.defining_module.unwrap_or_else(|| self.namespace.clone());
        let children: Vec<Arc<SchemaNode>> =
            self.children.into_iter().map(SchemaBuilder::build).collect();
        let mut children_by_name = BTreeMap::new();
        for (idx, child) in children.iter().enumerate() {
            children_by_name
                .insert((child.namespace.clone(), child.name.clone()), idx);
        }

        let node = Arc::new(SchemaNode {
            kind: self.kind,
            namespace: self.namespace,
            name: self.name,
            defining_module,
            config: self.config,
            presence: self.presence,
            mandatory: self.mandatory,
            ordering: self.ordering,
            data_type: self.data_type,
            default: self.default,
            key_names: self.key_names,
            secret: self.secret,
            unique: self.unique,
            features: self.features,
            constraints: self.constraints,
            when: self.when,
            actions: self.actions,
            children,
            children_by_name,
            parent: std::sync::RwLock::new(Weak::new()),
        });

        for child in node.children.iter() {
            *child.parent.write().unwrap() = Arc::downgrade(&node);
        }

        node
    }
}
