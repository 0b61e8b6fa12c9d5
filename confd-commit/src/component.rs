//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use serde_json::{Map, Value as Json};

use confd_tree::{to_json_value, Union};

/// A registered component: the owner of one or more top-level schema
/// namespaces, dispatched its RFC 7951 slice of the committed
/// configuration whenever one of its namespaces changes.
#[derive(Clone, Debug)]
pub struct ComponentSpec {
    pub name: String,
    pub owned_namespaces: Vec<String>,
    /// Components that must be notified before this one.
    pub before: Vec<String>,
    /// Components that must be notified after this one.
    pub after: Vec<String>,
    /// Whether this is the "default" component that still receives an
    /// (empty) notification even when nothing in the commit touches any of
    /// its namespaces.
    pub is_default: bool,
}

/// The seam through which the commit pipeline hands a component its slice
/// of the newly-committed configuration. The core never implements this
/// itself; exactly as with [`crate::script::ScriptExecutor`]; a real
/// deployment wires in a transport to the out-of-process component.
pub trait ComponentManager: Send + Sync {
    /// Delivers `config` (the RFC 7951 slice of the merged candidate
    /// restricted to `component`'s owned namespaces) to the component.
    /// Best-effort: a component that fails to apply its slice is logged
    /// and reported as a commit warning, but never unwinds the commit
    /// that already swapped the running pointer (see the design notes on
    /// rollback-on-error's documented limitation).
    fn set_running(&self, component: &str, config: &Json) -> Result<(), String>;
}

/// Topologically orders `components` by their `before`/`after` edges,
/// breaking ties by declaration order. Cycles are broken by falling back
/// to declaration order for whatever remains once no more free nodes can
/// be found; a configuration error this module doesn't try to diagnose
/// further.
pub fn dispatch_order(components: &[ComponentSpec]) -> Vec<String> {
    let names: Vec<&str> = components.iter().map(|c| c.name.as_str()).collect();
    let mut remaining: Vec<&str> = names.clone();
    let mut ordered = Vec::with_capacity(components.len());

    while !remaining.is_empty() {
        let pick = remaining
            .iter()
            .position(|&name| {
                let spec = components.iter().find(|c| c.name == name).unwrap();
                spec.after
                    .iter()
                    .all(|dep| ordered.contains(dep) || !names.contains(&dep.as_str()))
                    && !remaining.iter().any(|&other| {
                        other != name
                            && components
                                .iter()
                                .find(|c| c.name == other)
                                .map(|o| o.before.iter().any(|b| b == name))
                                .unwrap_or(false)
                            && spec.after.iter().all(|dep| dep != other)
                    })
            })
            .unwrap_or(0);
        ordered.push(remaining.remove(pick).to_owned());
    }

    ordered
}

/// Renders the RFC 7951 slice of `root` owned by a component whose
/// declared namespaces are `owned`: a node belongs to the slice if its own
/// schema namespace is in `owned`, independent of which namespace its
/// ancestors or descendants belong to (augmentations nest arbitrarily).
/// Ancestor containers are reconstructed around a deeply-owned descendant
/// purely for path shape; they carry no content of their own unless they
/// themselves belong to this component too.
pub fn slice(root: &Union<'_>, owned: &[String]) -> Json {
    let mut obj = Map::new();
    let mut last_ns: Option<String> = None;
    for child in root.children() {
        if let Some(value) = slice_node(&child, owned) {
            insert_sliced_member(&mut obj, &child, value, &mut last_ns);
        }
    }
    Json::Object(obj)
}

fn slice_node(node: &Union<'_>, owned: &[String]) -> Option<Json> {
    let mine = owned.iter().any(|ns| ns == node.namespace());
    let children = node.children();

    if children.is_empty() {
        return if mine { Some(to_json_value(node)) } else { None };
    }

    let mut obj = Map::new();
    let mut last_ns: Option<String> = None;
    let mut any_child = false;
    for child in &children {
        if let Some(value) = slice_node(child, owned) {
            any_child = true;
            insert_sliced_member(&mut obj, child, value, &mut last_ns);
        }
    }

    if mine || any_child {
        Some(Json::Object(obj))
    } else {
        None
    }
}

fn insert_sliced_member(
    obj: &mut Map<String, Json>,
    node: &Union<'_>,
    value: Json,
    last_namespace: &mut Option<String>,
) {
    let qualify = last_namespace.as_deref() != Some(node.namespace());
    *last_namespace = Some(node.namespace().to_owned());
    let key = if qualify {
        format!("{}:{}", node.namespace(), node.name())
    } else {
        node.name().to_owned()
    };

    if !node.key_values().is_empty() {
        obj.entry(key)
            .or_insert_with(|| Json::Array(Vec::new()))
            .as_array_mut()
            .expect("list member is always a JSON array")
            .push(value);
        return;
    }

    obj.insert(key, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, before: &[&str], after: &[&str]) -> ComponentSpec {
        ComponentSpec {
            name: name.to_owned(),
            owned_namespaces: Vec::new(),
            before: before.iter().map(|s| s.to_string()).collect(),
            after: after.iter().map(|s| s.to_string()).collect(),
            is_default: false,
        }
    }

    #[test]
    fn orders_by_before_after_edges() {
        let components = vec![
            spec("first", &[], &[]),
            spec("second", &[], &[]),
            spec("third", &["first"], &["second"]),
        ];
        let order = dispatch_order(&components);
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert!(pos("second") < pos("third"));
        assert!(pos("third") < pos("first"));
    }

    #[test]
    fn no_constraints_preserves_declaration_order() {
        let components = vec![spec("a", &[], &[]), spec("b", &[], &[]), spec("c", &[], &[])];
        assert_eq!(dispatch_order(&components), vec!["a", "b", "c"]);
    }

    #[test]
    fn slice_separates_presence_container_from_augmenting_leaf() {
        use std::sync::Arc;

        use confd_schema::{DataType, SchemaBuilder, SchemaNode};
        use confd_tree::{Defaults, Path, Segment, Tree};

        fn schema() -> Arc<SchemaNode> {
            SchemaBuilder::container("main", "top").child(
                SchemaBuilder::container("main", "mainPCont").presence(true).child(
                    SchemaBuilder::leaf("augment", "augPLeaf", DataType::String)
                        .defining_module("augment"),
                ),
            )
            .build()
        }

        let schema = schema();
        let running = Tree::empty(schema.clone());
        let mut candidate = Tree::empty(schema.clone());
        let pcont = Path::root().child(Segment::node("main", "mainPCont"));
        candidate.set(&pcont, None, false).unwrap();
        candidate
            .set(&pcont.child(Segment::node("augment", "augPLeaf")), Some("v"), false)
            .unwrap();

        let view = Union::root(&candidate, &running, Defaults::Include);

        let main_owned = vec!["main".to_owned()];
        let main_slice = slice(&view, &main_owned);
        assert_eq!(main_slice, serde_json::json!({"main:mainPCont": {}}));

        let augment_owned = vec!["augment".to_owned()];
        let augment_slice = slice(&view, &augment_owned);
        assert_eq!(
            augment_slice,
            serde_json::json!({"main:mainPCont": {"augment:augPLeaf": "v"}})
        );
    }

    #[test]
    fn slice_encodes_leaves_by_type_not_as_bare_strings() {
        use std::sync::Arc;

        use confd_schema::{DataType, SchemaBuilder, SchemaNode};
        use confd_tree::{Defaults, Path, Segment, Tree};

        fn schema() -> Arc<SchemaNode> {
            SchemaBuilder::container("if", "interfaces")
                .child(
                    SchemaBuilder::list("if", "interface", &["name"])
                        .child(SchemaBuilder::leaf("if", "name", DataType::String))
                        .child(SchemaBuilder::leaf("if", "mtu", DataType::Uint32))
                        .child(SchemaBuilder::leaf("if", "enabled", DataType::Empty)),
                )
                .build()
        }

        let schema = schema();
        let running = Tree::empty(schema.clone());
        let mut candidate = Tree::empty(schema.clone());
        let entry = Path::root().child(Segment::list_entry(
            "if",
            "interface",
            vec![("name".to_owned(), "eth0".to_owned())],
        ));
        candidate
            .set(&entry.clone().child(Segment::node("if", "mtu")), Some("1500"), false)
            .unwrap();
        candidate
            .set(&entry.child(Segment::node("if", "enabled")), None, false)
            .unwrap();

        let view = Union::root(&candidate, &running, Defaults::Include);
        let owned = vec!["if".to_owned()];
        let sliced = slice(&view, &owned);
        let rendered = &sliced["if:interfaces"]["interface"][0];
        assert_eq!(rendered["mtu"], serde_json::json!(1500));
        assert_eq!(rendered["enabled"], serde_json::json!([null]));
        assert_eq!(rendered["name"], serde_json::json!("eth0"));
    }
}
