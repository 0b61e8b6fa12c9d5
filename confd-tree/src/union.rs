//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Arc;

use confd_schema::{DataType, SchemaNode};
use confd_xpath::XpathNode;

use crate::node::Node;
use crate::path::{Path, Segment};
use crate::tree::Tree;

/// Whether a merged view materialises schema default values for nodes
/// neither tree sets explicitly.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Defaults {
    Include,
    Exclude,
}

/// A lazily-merged view over a candidate and a running tree: children come
/// from candidate when present, else running; default-only children are
/// synthesised under non-presence containers (or configured presence
/// containers) when `Defaults::Include` is requested.
///
/// `Union` owns nothing but references into the two source trees plus a
/// handful of owned default-value nodes it synthesises on the fly, so a
/// view can be built cheaply and discarded after one validation/dispatch
/// pass.
#[derive(Clone, Debug)]
pub struct Union<'a> {
    schema: Arc<SchemaNode>,
    candidate: Option<&'a Node>,
    running: Option<&'a Node>,
    defaults: Defaults,
    parent: Option<Box<Union<'a>>>,
}

impl<'a> Union<'a> {
    pub fn root(candidate: &'a Tree, running: &'a Tree, defaults: Defaults) -> Self {
        Union {
            schema: candidate.schema.clone(),
            candidate: Some(&candidate.root),
            running: Some(&running.root),
            defaults,
            parent: None,
        }
    }

    /// A view over a single tree with no counterpart (used for `must`
    /// evaluation against the running-only snapshot, or for a from-scratch
    /// materialised candidate with no persisted running yet).
    pub fn single(tree: &'a Tree, defaults: Defaults) -> Self {
        Union {
            schema: tree.schema.clone(),
            candidate: Some(&tree.root),
            running: None,
            defaults,
            parent: None,
        }
    }

    pub fn value(&self) -> Option<String> {
        self.candidate
            .and_then(|n| n.value.clone())
            .or_else(|| self.running.and_then(|n| n.value.clone()))
            .or_else(|| {
                if self.defaults == Defaults::Include {
                    self.schema.default.clone()
                } else {
                    None
                }
            })
    }

    pub fn namespace(&self) -> &str {
        &self.schema.namespace
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Whether either source tree explicitly holds this node, as opposed to
    /// it being synthesised purely from a schema default.
    pub fn is_explicit(&self) -> bool {
        self.candidate.is_some() || self.running.is_some()
    }

    /// Whether this node has any presence in the merged view at all
    /// (explicit, or a materialised default).
    pub fn exists(&self) -> bool {
        self.is_explicit() || self.value().is_some()
    }

    /// The schema node this view is merged against. Exposed so validation
    /// and dispatch code (outside this crate) can walk `must`/`when`,
    /// mandatory, and `unique` constraints without this crate needing to
    /// re-implement that logic itself.
    pub fn schema(&self) -> &Arc<SchemaNode> {
        &self.schema
    }

    pub fn key_values(&self) -> Vec<(String, String)> {
        self.candidate
            .or(self.running)
            .map(|n| n.key_values())
            .unwrap_or_default()
    }

    fn show_defaults_under(&self) -> bool {
        self.defaults == Defaults::Include
            && (self.schema.is_np_container() || self.is_present())
    }

    /// Whether this node (a presence container) is actually set in either
    /// source tree, as opposed to only existing as a schema possibility.
    fn is_present(&self) -> bool {
        self.candidate.is_some() || self.running.is_some()
    }

    /// Children of this union node: the union of candidate and running
    /// children (candidate wins on overlap), plus default-only children
    /// materialised when allowed.
    pub fn children(&self) -> Vec<Union<'a>> {
        let mut out = Vec::new();
        let mut seen: Vec<(String, String, Vec<(String, String)>)> = Vec::new();

        if let Some(candidate) = self.candidate {
            for child in &candidate.children {
                let key = identity_key(child);
                seen.push(key.clone());
                out.push(self.merge_child(Some(child), self.find_running_peer(&key)));
            }
        }
        if let Some(running) = self.running {
            for child in &running.children {
                let key = identity_key(child);
                if seen.contains(&key) {
                    continue;
                }
                out.push(self.merge_child(None, Some(child)));
            }
        }

        if self.show_defaults_under() {
            for child_schema in self.schema.children() {
                if !child_schema.has_default() {
                    continue;
                }
                let already = out
                    .iter()
                    .any(|u| u.namespace() == child_schema.namespace && u.name() == child_schema.name);
                if !already {
                    out.push(Union {
                        schema: child_schema.clone(),
                        candidate: None,
                        running: None,
                        defaults: self.defaults,
                        parent: Some(Box::new(self.clone())),
                    });
                }
            }
        }

        out
    }

    fn find_running_peer(
        &self,
        key: &(String, String, Vec<(String, String)>),
    ) -> Option<&'a Node> {
        let running = self.running?;
        running.children.iter().find(|c| &identity_key(c) == key)
    }

    /// Walks `path` from this view, returning the merged sub-view at that
    /// location, or `None` if no segment resolves under either source
    /// tree (including as a schema default). Used by `Show`/`GetFullTree`
    /// to scope rendering to a sub-path instead of the whole tree.
    pub fn descendant(&self, path: &Path) -> Option<Union<'a>> {
        let mut cur = self.clone();
        for segment in path.segments() {
            cur = cur.children().into_iter().find(|c| segment_matches(c, segment))?;
        }
        Some(cur)
    }

    fn merge_child(&self, candidate: Option<&'a Node>, running: Option<&'a Node>) -> Union<'a> {
        let schema = candidate
            .or(running)
            .map(|n| n.schema.clone())
            .unwrap_or_else(|| self.schema.clone());
        Union {
            schema,
            candidate,
            running,
            defaults: self.defaults,
            parent: Some(Box::new(self.clone())),
        }
    }
}

fn identity_key(node: &Node) -> (String, String, Vec<(String, String)>) {
    (
        node.namespace().to_owned(),
        node.name().to_owned(),
        node.key_values(),
    )
}

fn segment_matches(node: &Union<'_>, segment: &Segment) -> bool {
    if node.namespace() != segment.namespace() || node.name() != segment.name() {
        return false;
    }
    match segment {
        Segment::Node { .. } => true,
        Segment::ListEntry { keys, .. } => node.key_values().as_slice() == keys.as_slice(),
        Segment::LeafListEntry { value, .. } => node.value().as_deref() == Some(value.as_str()),
    }
}

impl<'a> XpathNode for Union<'a> {
    fn local_name(&self) -> &str {
        self.name()
    }

    fn namespace(&self) -> &str {
        self.namespace()
    }

    fn value(&self) -> Option<String> {
        Union::value(self)
    }

    fn is_config(&self) -> bool {
        self.schema.is_config()
    }

    fn parent(&self) -> Option<Self> {
        self.parent.as_deref().cloned()
    }

    fn root(&self) -> Self {
        let mut cur = self.clone();
        while let Some(parent) = cur.parent.clone() {
            cur = *parent;
        }
        cur
    }

    fn children(&self) -> Vec<Self> {
        Union::children(self)
    }

    fn path(&self) -> String {
        let mut segments = vec![self.step()];
        let mut cur = self.parent.clone();
        while let Some(parent) = cur {
            segments.push(parent.step());
            cur = parent.parent.clone();
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }
}

impl<'a> Union<'a> {
    /// This node's own path step, without ancestry: `name[key='value']` for
    /// list entries, `name(value)` for leaf-list entries, else plain
    /// `namespace:name`.
    fn step(&self) -> String {
        if !self.schema.key_names.is_empty() {
            let keys = self
                .candidate
                .or(self.running)
                .map(|n| n.key_values())
                .unwrap_or_default();
            let rendered = keys
                .iter()
                .map(|(k, v)| format!("[{k}='{v}']"))
                .collect::<String>();
            format!("{}:{}{}", self.namespace(), self.name(), rendered)
        } else if self.is_leaf_list_entry() {
            format!(
                "{}:{}({})",
                self.namespace(),
                self.name(),
                self.value().unwrap_or_default()
            )
        } else if self.schema.data_type == Some(DataType::Empty) && self.is_explicit() {
            format!("{}:{}()", self.namespace(), self.name())
        } else {
            format!("{}:{}", self.namespace(), self.name())
        }
    }

    fn is_leaf_list_entry(&self) -> bool {
        self.schema.kind == confd_schema::SchemaNodeKind::LeafList
    }
}
