//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::fmt::Write as _;

use serde_json::{Map, Value as Json};

use confd_schema::DataType;

use crate::union::Union;

/// Renders a merged view in the device-native curly-braced "show" form,
/// e.g.:
/// ```text
/// interfaces {
///     interface eth0 {
///         mtu 1500;
///     }
/// }
/// ```
pub fn render_native(root: &Union<'_>) -> String {
    render_native_inner(root, true)
}

/// Renders in the same "show" form as [`render_native`], but masks leaves
/// the schema flags as secret unless `show_secrets` is set. Used by
/// `Session::Show`; [`render_native`] itself is reserved for the running
/// file, which always needs the real values.
pub fn render_native_display(root: &Union<'_>, show_secrets: bool) -> String {
    render_native_inner(root, show_secrets)
}

/// Renders `node` itself, not just its children, in the same curly-braced
/// form as [`render_native_display`]. Used when `Show`/`GetFullTree` scope
/// to a sub-path rather than the whole tree: `render_native_display`'s
/// root is always the synthetic document root, which has no name of its
/// own to print.
pub fn render_native_subtree(node: &Union<'_>, show_secrets: bool) -> String {
    let mut out = String::new();
    render_native_node(node, 0, show_secrets, &mut out);
    out
}

fn render_native_inner(root: &Union<'_>, show_secrets: bool) -> String {
    let mut out = String::new();
    for child in root.children() {
        render_native_node(&child, 0, show_secrets, &mut out);
    }
    out
}

fn render_native_node(node: &Union<'_>, depth: usize, show_secrets: bool, out: &mut String) {
    let indent = "    ".repeat(depth);

    if node.is_empty() {
        let _ = writeln!(out, "{indent}{};", node.name());
        return;
    }
    if let Some(value) = node.value() {
        let value = if node.schema().secret && !show_secrets {
            "********".to_owned()
        } else {
            value
        };
        let _ = writeln!(out, "{indent}{} {value};", node.name());
        return;
    }

    let keys = node.key_values();
    if keys.is_empty() {
        let _ = writeln!(out, "{indent}{} {{", node.name());
    } else {
        let rendered = keys.into_iter().map(|(_, v)| v).collect::<Vec<_>>().join(" ");
        let _ = writeln!(out, "{indent}{} {rendered} {{", node.name());
    }
    for child in node.children() {
        render_native_node(&child, depth + 1, show_secrets, out);
    }
    let _ = writeln!(out, "{indent}}}");
}

trait EmptyLeaf {
    fn is_empty(&self) -> bool;
    fn schema_data_type(&self) -> Option<DataType>;
}

impl EmptyLeaf for Union<'_> {
    fn is_empty(&self) -> bool {
        self.schema_data_type() == Some(DataType::Empty)
    }

    fn schema_data_type(&self) -> Option<DataType> {
        self.schema().data_type
    }
}

/// Renders a merged view as an RFC 7951 JSON object, namespace-qualifying
/// top-level member names the way the wire format requires
/// (`module:name`), leaving nested members unqualified within the same
/// module. `int64`/`uint64` leaves are rendered as quoted strings per RFC
/// 7951 §6.1; other numeric types are bare JSON numbers.
pub fn render_rfc7951(root: &Union<'_>) -> Json {
    let mut obj = Map::new();
    let mut last_namespace: Option<String> = None;
    for child in root.children() {
        insert_member(&mut obj, &child, &mut last_namespace);
    }
    Json::Object(obj)
}

fn insert_member(obj: &mut Map<String, Json>, node: &Union<'_>, last_namespace: &mut Option<String>) {
    let qualify = last_namespace.as_deref() != Some(node.namespace());
    *last_namespace = Some(node.namespace().to_owned());
    let key = if qualify {
        format!("{}:{}", node.namespace(), node.name())
    } else {
        node.name().to_owned()
    };

    if !node.key_values().is_empty() {
        let entry = render_member_object(node);
        obj.entry(key)
            .or_insert_with(|| Json::Array(Vec::new()))
            .as_array_mut()
            .expect("list member is always a JSON array")
            .push(entry);
        return;
    }

    obj.insert(key, to_json_value(node));
}

fn render_member_object(node: &Union<'_>) -> Json {
    let mut inner = Map::new();
    let mut ns: Option<String> = None;
    for child in node.children() {
        insert_member(&mut inner, &child, &mut ns);
    }
    Json::Object(inner)
}

/// Type-directed leaf encoding shared with the component-dispatch slicer
/// (`confd-commit::component::slice`): `int8..int16`/`uint8..uint32` leaves
/// render as bare JSON numbers, `int64`/`uint64` as quoted strings per RFC
/// 7951 §6.1, and an empty-typed leaf as `[null]` — a one-element array
/// holding `null`, not bare `null` (spec §6).
pub fn to_json_value(node: &Union<'_>) -> Json {
    if node.is_empty() {
        return Json::Array(vec![Json::Null]);
    }
    if let Some(value) = node.value() {
        return match node.schema_data_type() {
            Some(dt) if dt.is_json_numeric() => {
                serde_json::from_str::<Json>(&value).unwrap_or(Json::String(value))
            }
            Some(DataType::Int64) | Some(DataType::Uint64) => Json::String(value),
            _ => Json::String(value),
        };
    }
    render_member_object(node)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confd_schema::{SchemaBuilder, SchemaNode};

    use super::*;
    use crate::path::{Path, Segment};
    use crate::tree::Tree;
    use crate::union::Defaults;

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

    fn sample_tree() -> Tree {
        let mut tree = Tree::empty(schema());
        let entry = Path::root().child(Segment::list_entry(
            "if",
            "interface",
            vec![("name".to_owned(), "eth0".to_owned())],
        ));
        tree.set(&entry.clone().child(Segment::node("if", "mtu")), Some("1500"), false)
            .unwrap();
        tree.set(&entry.child(Segment::node("if", "enabled")), None, false)
            .unwrap();
        tree
    }

    #[test]
    fn native_rendering_nests_list_entries() {
        let tree = sample_tree();
        let view = Union::root(&tree, &tree, Defaults::Exclude);
        let text = render_native(&view);
        assert!(text.contains("interface eth0 {"));
        assert!(text.contains("mtu 1500;"));
        assert!(text.contains("enabled;"));
    }

    #[test]
    fn display_rendering_masks_secret_leaves_by_default() {
        let schema = SchemaBuilder::container("sys", "system")
            .child(SchemaBuilder::leaf("sys", "password", DataType::String).secret(true))
            .build();
        let mut tree = Tree::empty(schema.clone());
        tree.set(&Path::root().child(Segment::node("sys", "password")), Some("hunter2"), false)
            .unwrap();

        let view = Union::root(&tree, &tree, Defaults::Exclude);
        let masked = render_native_display(&view, false);
        assert!(masked.contains("password ********;"));
        let revealed = render_native_display(&view, true);
        assert!(revealed.contains("password hunter2;"));
        // The persistence path never masks.
        assert!(render_native(&view).contains("password hunter2;"));
    }

    #[test]
    fn subtree_rendering_includes_the_node_itself() {
        let tree = sample_tree();
        let view = Union::root(&tree, &tree, Defaults::Exclude);
        let entry = view
            .descendant(&Path::root().child(Segment::list_entry(
                "if",
                "interface",
                vec![("name".to_owned(), "eth0".to_owned())],
            )))
            .unwrap();
        let text = render_native_subtree(&entry, true);
        assert!(text.starts_with("interface eth0 {"));
        assert!(text.contains("mtu 1500;"));
    }

    #[test]
    fn rfc7951_numeric_and_empty_leaves() {
        let tree = sample_tree();
        let view = Union::root(&tree, &tree, Defaults::Exclude);
        let json = render_rfc7951(&view);
        let entries = &json["if:interfaces"]["interface"];
        assert!(entries.is_array());
        let entry = &entries[0];
        assert_eq!(entry["mtu"], serde_json::json!(1500));
        assert_eq!(entry["enabled"], serde_json::json!([null]));
        assert_eq!(entry["name"], serde_json::json!("eth0"));
    }
}
