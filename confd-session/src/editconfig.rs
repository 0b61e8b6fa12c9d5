//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! The NETCONF-style edit-config processor: turns a parsed XML edit
//! document into an ordered list of primitive `set`/`delete` operations
//! against a candidate tree, authorising and applying each one per the
//! caller's `error-option`.

use std::sync::Arc;

use confd_schema::{DataType, SchemaNode, SchemaNodeKind};
use confd_tree::{Path, Segment, Tree};
use confd_utils::identity::Identity;

use crate::authz::{Authorizer, Command, CommandKind};
use crate::debug::Debug;
use crate::error::{Error, Result};

const NETCONF_BASE_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// The effective operation a single edit-tree node carries, inherited from
/// its nearest ancestor's own attribute or the edit's default-operation
/// when neither it nor any ancestor sets one explicitly.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Merge,
    Replace,
    Create,
    Delete,
    Remove,
    /// `default-operation=none` with no operation attribute anywhere on the
    /// path to this node: the node contributes nothing.
    None,
}

impl Operation {
    fn from_attr(value: &str) -> Result<Operation> {
        match value {
            "merge" => Ok(Operation::Merge),
            "replace" => Ok(Operation::Replace),
            "create" => Ok(Operation::Create),
            "delete" => Ok(Operation::Delete),
            "remove" => Ok(Operation::Remove),
            other => Err(Error::UnknownAttribute(other.to_owned())),
        }
    }

    fn is_delete_like(self) -> bool {
        matches!(self, Operation::Delete | Operation::Remove)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Target {
    Candidate,
    Running,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TestOption {
    TestThenSet,
    Set,
    TestOnly,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOption {
    StopOnError,
    ContinueOnError,
    /// Pre-validates every primitive op against a scratch copy before
    /// applying any of them. This is whole-edit pre-validation, not true
    /// rollback of a partially-applied edit; see the design notes.
    RollbackOnError,
}

/// One primitive operation synthesised from the edit tree, in document
/// order.
#[derive(Clone, Debug)]
pub struct EditOp {
    pub operation: Operation,
    pub path: Path,
    pub value: Option<String>,
    pub secret: bool,
}

pub struct EditConfigRequest<'a> {
    pub target: Target,
    pub default_operation: Operation,
    pub test_option: TestOption,
    pub error_option: ErrorOption,
    pub document: &'a str,
}

/// Parses `request.document` against `schema` into an ordered op list, then
/// applies it to `candidate` under `identity`'s authorisation, obeying
/// `error_option`. Returns the captured outputs of every op that was
/// actually applied.
pub fn edit_config(
    candidate: &mut Tree,
    schema: &Arc<SchemaNode>,
    identity: &Identity,
    authorizer: &dyn Authorizer,
    request: EditConfigRequest<'_>,
) -> Result<Vec<String>> {
    let doc = roxmltree::Document::parse(request.document)
        .map_err(|e| Error::OperationFailed(format!("malformed edit-config document: {e}")))?;

    let mut ops = Vec::new();
    for child in doc.root_element().children().filter(|n| n.is_element()) {
        traverse(&child, schema, request.default_operation, Path::root(), &mut ops)?;
    }

    if request.error_option == ErrorOption::RollbackOnError {
        let mut scratch = candidate.clone();
        for op in &ops {
            apply_op(&mut scratch, op)?;
        }
    }

    if request.test_option == TestOption::TestOnly {
        return Ok(Vec::new());
    }

    let mut outputs = Vec::new();
    for op in &ops {
        let command = Command {
            kind: command_kind(candidate, op),
            path: op.path.to_string(),
            value: op.value.clone(),
            secret: op.secret,
        };
        let authorized = authorizer.authorize_command(identity, &command)
            && authorizer.authorize_path(identity, &command.path, op.secret);
        if authorized {
            authorizer.accounting(identity, &command);
        }

        Debug::EditConfigOp(operation_label(op.operation), &command.path).log();
        let result = if authorized {
            apply_op(candidate, op)
        } else {
            Err(Error::AccessDenied)
        };
        match result {
            Ok(()) => outputs.push(format!("{}: ok", command.path)),
            Err(err) => {
                if request.error_option == ErrorOption::ContinueOnError {
                    outputs.push(format!("{}: {err}", command.path));
                    continue;
                }
                return Err(err);
            }
        }
    }

    Ok(outputs)
}

fn operation_label(op: Operation) -> &'static str {
    match op {
        Operation::Merge => "merge",
        Operation::Replace => "replace",
        Operation::Create => "create",
        Operation::Delete => "delete",
        Operation::Remove => "remove",
        Operation::None => "none",
    }
}

fn command_kind(tree: &Tree, op: &EditOp) -> CommandKind {
    match op.operation {
        Operation::Delete | Operation::Remove => CommandKind::Delete,
        _ if tree.exists(&op.path, false) => CommandKind::Update,
        _ => CommandKind::Create,
    }
}

fn apply_op(tree: &mut Tree, op: &EditOp) -> Result<()> {
    match op.operation {
        Operation::None => Ok(()),
        Operation::Merge => {
            if !tree.exists(&op.path, false) {
                tree.set(&op.path, op.value.as_deref(), false)?;
            }
            Ok(())
        }
        Operation::Replace => {
            tree.delete(&op.path, false)?;
            tree.set(&op.path, op.value.as_deref(), false)?;
            Ok(())
        }
        Operation::Create => {
            tree.set(&op.path, op.value.as_deref(), true)?;
            Ok(())
        }
        Operation::Delete => {
            tree.delete(&op.path, true)?;
            Ok(())
        }
        Operation::Remove => {
            tree.delete(&op.path, false)?;
            Ok(())
        }
    }
}

fn traverse(
    node: &roxmltree::Node<'_, '_>,
    schema: &Arc<SchemaNode>,
    inherited: Operation,
    path: Path,
    ops: &mut Vec<EditOp>,
) -> Result<()> {
    let tag = node.tag_name();
    let Some(child_schema) = schema.child(tag.namespace().unwrap_or(""), tag.name()) else {
        return Err(Error::UnknownElement(path.child(Segment::node(
            tag.namespace().unwrap_or("").to_owned(),
            tag.name().to_owned(),
        ))));
    };

    let effective = own_operation(node, inherited)?;

    match child_schema.kind {
        SchemaNodeKind::List => {
            traverse_list_entry(node, child_schema, effective, path, ops)
        }
        SchemaNodeKind::Leaf => {
            let entry_path = path.child(Segment::node(
                child_schema.namespace.clone(),
                child_schema.name.clone(),
            ));
            emit_leaf(node, child_schema, effective, entry_path, ops)
        }
        SchemaNodeKind::LeafList => {
            let value = node.text().unwrap_or("").to_owned();
            let entry_path = path.child(Segment::leaf_list_entry(
                child_schema.namespace.clone(),
                child_schema.name.clone(),
                value.clone(),
            ));
            if effective != Operation::None {
                ops.push(EditOp {
                    operation: effective,
                    path: entry_path,
                    value: Some(value),
                    secret: false,
                });
            }
            Ok(())
        }
        SchemaNodeKind::Container => {
            let entry_path = path.child(Segment::node(
                child_schema.namespace.clone(),
                child_schema.name.clone(),
            ));
            traverse_container(node, child_schema, effective, entry_path, ops)
        }
        SchemaNodeKind::ListEntry | SchemaNodeKind::LeafValue => {
            Err(Error::InvalidPath(path))
        }
    }
}

fn traverse_container(
    node: &roxmltree::Node<'_, '_>,
    schema: &Arc<SchemaNode>,
    effective: Operation,
    path: Path,
    ops: &mut Vec<EditOp>,
) -> Result<()> {
    let emits_own_op = schema.presence || effective.is_delete_like();

    if emits_own_op && effective.is_delete_like() {
        // Post-order: children first, then the container itself.
        for child in node.children().filter(|n| n.is_element()) {
            traverse(&child, schema, effective, path.clone(), ops)?;
        }
        ops.push(EditOp {
            operation: effective,
            path,
            value: None,
            secret: false,
        });
        return Ok(());
    }

    if emits_own_op {
        // Pre-order: the presence container itself, then its children.
        ops.push(EditOp {
            operation: effective,
            path: path.clone(),
            value: None,
            secret: false,
        });
    }

    for child in node.children().filter(|n| n.is_element()) {
        traverse(&child, schema, effective, path.clone(), ops)?;
    }
    Ok(())
}

fn traverse_list_entry(
    node: &roxmltree::Node<'_, '_>,
    schema: &Arc<SchemaNode>,
    effective: Operation,
    path: Path,
    ops: &mut Vec<EditOp>,
) -> Result<()> {
    let children: Vec<_> = node.children().filter(|n| n.is_element()).collect();

    let mut keys = Vec::new();
    for key_name in &schema.key_names {
        let Some(key_node) = children
            .iter()
            .find(|c| c.tag_name().name() == key_name)
        else {
            if effective.is_delete_like() {
                // No selector at all: delete the bare list.
                ops.push(EditOp {
                    operation: effective,
                    path: path.child(Segment::node(schema.namespace.clone(), schema.name.clone())),
                    value: None,
                    secret: false,
                });
                return Ok(());
            }
            return Err(Error::MissingElement(path));
        };
        keys.push((key_name.clone(), key_node.text().unwrap_or("").to_owned()));
    }

    let entry_path = path.child(Segment::list_entry(
        schema.namespace.clone(),
        schema.name.clone(),
        keys.clone(),
    ));

    for (key_name, value) in &keys {
        if let Some(key_schema) = schema.child(&schema.namespace, key_name) {
            let key_path = entry_path.clone().child(Segment::node(
                key_schema.namespace.clone(),
                key_schema.name.clone(),
            ));
            if effective != Operation::None && !effective.is_delete_like() {
                ops.push(EditOp {
                    operation: Operation::Merge,
                    path: key_path,
                    value: Some(value.clone()),
                    secret: false,
                });
            }
        }
    }

    for child in &children {
        if schema.key_names.iter().any(|k| k == child.tag_name().name()) {
            continue;
        }
        traverse(child, schema, effective, entry_path.clone(), ops)?;
    }

    if effective.is_delete_like() {
        // Post-order, mirroring traverse_container: children first, then the
        // entry itself, so a bare keyed delete (no other children) still
        // removes the entry.
        ops.push(EditOp {
            operation: effective,
            path: entry_path,
            value: None,
            secret: false,
        });
    }

    Ok(())
}

fn emit_leaf(
    node: &roxmltree::Node<'_, '_>,
    schema: &Arc<SchemaNode>,
    effective: Operation,
    path: Path,
    ops: &mut Vec<EditOp>,
) -> Result<()> {
    if effective == Operation::None {
        return Ok(());
    }
    let value = if schema.data_type == Some(DataType::Empty) {
        None
    } else {
        Some(node.text().unwrap_or("").to_owned())
    };
    ops.push(EditOp {
        operation: effective,
        path,
        value,
        secret: schema.secret,
    });
    Ok(())
}

fn own_operation(node: &roxmltree::Node<'_, '_>, inherited: Operation) -> Result<Operation> {
    for attr in node.attributes() {
        if attr.name() != "operation" {
            continue;
        }
        match attr.namespace() {
            Some(ns) if ns == NETCONF_BASE_NS => return Operation::from_attr(attr.value()),
            Some(ns) => return Err(Error::UnknownNamespace(ns.to_owned())),
            None => return Operation::from_attr(attr.value()),
        }
    }
    Ok(inherited)
}

#[cfg(test)]
mod tests {
    use confd_schema::SchemaBuilder;

    use super::*;
    use crate::authz::PermitAll;

    fn schema() -> Arc<SchemaNode> {
        SchemaBuilder::container("if", "interfaces")
            .child(
                SchemaBuilder::list("if", "interface", &["name"])
                    .child(SchemaBuilder::leaf("if", "name", DataType::String))
                    .child(SchemaBuilder::leaf("if", "mtu", DataType::Uint32))
                    .child(SchemaBuilder::container("if", "enabled").presence(true)),
            )
            .build()
    }

    fn identity() -> Identity {
        Identity::new(1000, 42)
    }

    #[test]
    fn merge_creates_missing_leaf() {
        let schema = schema();
        let mut candidate = Tree::empty(schema.clone());
        let xml = r#"<config>
            <interface xmlns="if"><name>eth0</name><mtu>1500</mtu></interface>
        </config>"#;
        let request = EditConfigRequest {
            target: Target::Candidate,
            default_operation: Operation::Merge,
            test_option: TestOption::Set,
            error_option: ErrorOption::StopOnError,
            document: xml,
        };
        edit_config(&mut candidate, &schema, &identity(), &PermitAll, request).unwrap();

        let entry_path = Path::root().child(Segment::list_entry(
            "if",
            "interface",
            vec![("name".to_owned(), "eth0".to_owned())],
        ));
        assert!(candidate.exists(&entry_path.child(Segment::node("if", "mtu")), false));
    }

    #[test]
    fn create_on_existing_node_fails() {
        let schema = schema();
        let mut candidate = Tree::empty(schema.clone());
        let entry_path = Path::root().child(Segment::list_entry(
            "if",
            "interface",
            vec![("name".to_owned(), "eth0".to_owned())],
        ));
        candidate.set(&entry_path, None, false).unwrap();

        let xml = r#"<config xmlns:nc="urn:ietf:params:xml:ns:netconf:base:1.0">
            <interface xmlns="if" nc:operation="create"><name>eth0</name></interface>
        </config>"#;
        let request = EditConfigRequest {
            target: Target::Candidate,
            default_operation: Operation::Merge,
            test_option: TestOption::Set,
            error_option: ErrorOption::StopOnError,
            document: xml,
        };
        let result = edit_config(&mut candidate, &schema, &identity(), &PermitAll, request);
        assert!(matches!(result, Err(Error::NodeExists(_))));
    }

    #[test]
    fn delete_on_keyed_entry_removes_it() {
        let schema = schema();
        let mut candidate = Tree::empty(schema.clone());
        let entry_path = Path::root().child(Segment::list_entry(
            "if",
            "interface",
            vec![("name".to_owned(), "eth0".to_owned())],
        ));
        candidate.set(&entry_path, None, false).unwrap();
        candidate
            .set(&entry_path.clone().child(Segment::node("if", "mtu")), Some("1500"), false)
            .unwrap();
        assert!(candidate.exists(&entry_path, false));

        let xml = r#"<config xmlns:nc="urn:ietf:params:xml:ns:netconf:base:1.0">
            <interface xmlns="if" nc:operation="delete"><name>eth0</name></interface>
        </config>"#;
        let request = EditConfigRequest {
            target: Target::Candidate,
            default_operation: Operation::Merge,
            test_option: TestOption::Set,
            error_option: ErrorOption::StopOnError,
            document: xml,
        };
        edit_config(&mut candidate, &schema, &identity(), &PermitAll, request).unwrap();

        assert!(!candidate.exists(&entry_path, false));
    }

    #[test]
    fn unknown_operation_namespace_is_rejected() {
        let schema = schema();
        let mut candidate = Tree::empty(schema.clone());
        let xml = r#"<config xmlns:bogus="urn:example:bogus">
            <interface xmlns="if" bogus:operation="merge"><name>eth0</name></interface>
        </config>"#;
        let request = EditConfigRequest {
            target: Target::Candidate,
            default_operation: Operation::Merge,
            test_option: TestOption::Set,
            error_option: ErrorOption::StopOnError,
            document: xml,
        };
        let result = edit_config(&mut candidate, &schema, &identity(), &PermitAll, request);
        assert!(matches!(result, Err(Error::UnknownNamespace(_))));
    }
}
