//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fmt;

/// One step of a config tree path. List entries carry their key values (in
/// schema-declared key order) so a path can be resolved without consulting
/// the tree; leaf-list entries carry the value being addressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Node {
        namespace: String,
        name: String,
    },
    ListEntry {
        namespace: String,
        name: String,
        keys: Vec<(String, String)>,
    },
    LeafListEntry {
        namespace: String,
        name: String,
        value: String,
    },
}

impl Segment {
    pub fn namespace(&self) -> &str {
        match self {
            Segment::Node { namespace, .. }
            | Segment::ListEntry { namespace, .. }
            | Segment::LeafListEntry { namespace, .. } => namespace,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Segment::Node { name, .. }
            | Segment::ListEntry { name, .. }
            | Segment::LeafListEntry { name, .. } => name,
        }
    }

    pub fn node(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Segment::Node {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn list_entry(
        namespace: impl Into<String>,
        name: impl Into<String>,
        keys: Vec<(String, String)>,
    ) -> Self {
        Segment::ListEntry {
            namespace: namespace.into(),
            name: name.into(),
            keys,
        }
    }

    pub fn leaf_list_entry(
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Segment::LeafListEntry {
            namespace: namespace.into(),
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Node { namespace, name } => write!(f, "{namespace}:{name}"),
            Segment::ListEntry {
                namespace,
                name,
                keys,
            } => {
                write!(f, "{namespace}:{name}")?;
                for (k, v) in keys {
                    write!(f, "[{k}='{v}']")?;
                }
                Ok(())
            }
            Segment::LeafListEntry {
                namespace,
                name,
                value,
            } => write!(f, "{namespace}:{name}[.='{value}']"),
        }
    }
}

/// A root-anchored sequence of `Segment`s addressing a node in the config
/// tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path(pub Vec<Segment>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn new(segments: Vec<Segment>) -> Self {
        Path(segments)
    }

    #[must_use]
    pub fn child(mut self, segment: Segment) -> Self {
        self.0.push(segment);
        self
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            return None;
        }
        Some(Path(self.0[..self.0.len() - 1].to_vec()))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
