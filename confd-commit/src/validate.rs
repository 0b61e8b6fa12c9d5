//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use confd_tree::Union;
use confd_xpath::{Context, XpathNode};

use crate::error::ValidationError;

/// Validates a merged-with-defaults candidate view against the schema's
/// `must`/`when`/mandatory/uniqueness constraints, collecting every
/// failure rather than stopping at the first one (§7: "aggregated into a
/// list so callers see all failures at once").
///
/// `must` evaluation on a config-true node must never observe config-false
/// (state) siblings: the whole walk only ever descends into config-true
/// nodes, and the XPath surface itself is built purely from the config
/// tree, so state nodes are structurally absent from the context; not
/// filtered out at evaluation time.
pub fn validate(root: &Union<'_>) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    walk(root, &mut errors);
    errors
}

fn walk(node: &Union<'_>, errors: &mut Vec<ValidationError>) {
    if !node.schema().is_config() {
        return;
    }

    if let Some(when) = &node.schema().when {
        let ctx = Context::new(node, node, &node.schema().defining_module);
        match confd_xpath::evaluate(&when.xpath, &ctx) {
            Ok(true) => {}
            Ok(false) => {
                if node.is_explicit() {
                    errors.push(ValidationError {
                        path: node.path(),
                        message: when
                            .error_message
                            .clone()
                            .unwrap_or_else(|| format!("when \"{}\" not satisfied", when.xpath)),
                    });
                }
                return;
            }
            Err(msg) => {
                errors.push(ValidationError {
                    path: node.path(),
                    message: format!("malformed when expression \"{}\": {msg}", when.xpath),
                });
                return;
            }
        }
    }

    for constraint in &node.schema().constraints {
        let ctx = Context::new(node, node, &node.schema().defining_module);
        match confd_xpath::evaluate(&constraint.xpath, &ctx) {
            Ok(true) => {}
            Ok(false) => errors.push(ValidationError {
                path: node.path(),
                message: constraint
                    .error_message
                    .clone()
                    .unwrap_or_else(|| format!("must \"{}\" not satisfied", constraint.xpath)),
            }),
            Err(msg) => errors.push(ValidationError {
                path: node.path(),
                message: format!("malformed must expression \"{}\": {msg}", constraint.xpath),
            }),
        }
    }

    let children = node.children();
    check_mandatory(node, &children, errors);
    check_unique(node, &children, errors);

    for child in &children {
        walk(child, errors);
    }
}

fn check_mandatory(node: &Union<'_>, children: &[Union<'_>], errors: &mut Vec<ValidationError>) {
    for child_schema in node.schema().children() {
        if !child_schema.is_mandatory() {
            continue;
        }
        let present = children
            .iter()
            .any(|c| c.namespace() == child_schema.namespace && c.name() == child_schema.name);
        if !present {
            errors.push(ValidationError {
                path: format!("{}/{}:{}", node.path(), child_schema.namespace, child_schema.name),
                message: "mandatory element is missing".to_owned(),
            });
        }
    }
}

fn check_unique(node: &Union<'_>, children: &[Union<'_>], errors: &mut Vec<ValidationError>) {
    for child_schema in node.schema().children() {
        if child_schema.unique.is_empty() {
            continue;
        }
        let entries: Vec<&Union<'_>> = children
            .iter()
            .filter(|c| c.namespace() == child_schema.namespace && c.name() == child_schema.name)
            .collect();
        for unique_set in &child_schema.unique {
            let mut seen: Vec<Vec<Option<String>>> = Vec::new();
            for entry in &entries {
                let values: Vec<Option<String>> = unique_set
                    .iter()
                    .map(|leaf_name| {
                        entry
                            .children()
                            .into_iter()
                            .find(|c| c.name() == leaf_name)
                            .and_then(|c| c.value())
                    })
                    .collect();
                if seen.contains(&values) {
                    errors.push(ValidationError {
                        path: entry.path(),
                        message: format!(
                            "unique constraint violated over [{}]",
                            unique_set.join(", ")
                        ),
                    });
                } else {
                    seen.push(values);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use confd_schema::{Constraint, DataType, SchemaBuilder, SchemaNode};
    use confd_tree::{Defaults, Path, Segment, Tree};

    use super::*;

    fn schema_with_must() -> Arc<SchemaNode> {
        SchemaBuilder::container("m", "m").child(
            SchemaBuilder::leaf("m", "description", DataType::String)
                .must(Constraint::new("contains(.,'foo')").with_error_message("need foo")),
        )
        .build()
    }

    #[test]
    fn must_failure_carries_custom_message() {
        let schema = schema_with_must();
        let running = Tree::empty(schema.clone());
        let mut candidate = Tree::empty(schema.clone());
        candidate
            .set(&Path::root().child(Segment::node("m", "description")), Some("bar"), false)
            .unwrap();
        let view = Union::root(&candidate, &running, Defaults::Include);
        let errors = validate(&view);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "need foo");
    }

    #[test]
    fn must_success_produces_no_errors() {
        let schema = schema_with_must();
        let running = Tree::empty(schema.clone());
        let mut candidate = Tree::empty(schema.clone());
        candidate
            .set(&Path::root().child(Segment::node("m", "description")), Some("foobar"), false)
            .unwrap();
        let view = Union::root(&candidate, &running, Defaults::Include);
        assert!(validate(&view).is_empty());
    }

    #[test]
    fn mandatory_leaf_missing_is_reported() {
        let schema = SchemaBuilder::container("m", "m")
            .child(SchemaBuilder::leaf("m", "required", DataType::String).mandatory(true))
            .build();
        let running = Tree::empty(schema.clone());
        let candidate = Tree::empty(schema.clone());
        let view = Union::root(&candidate, &running, Defaults::Include);
        let errors = validate(&view);
        assert!(errors.iter().any(|e| e.message.contains("mandatory")));
    }

    #[test]
    fn unique_violation_across_list_entries() {
        let schema = SchemaBuilder::container("m", "m")
            .child(
                SchemaBuilder::list("m", "entry", &["id"])
                    .unique(&["tag"])
                    .child(SchemaBuilder::leaf("m", "id", DataType::String))
                    .child(SchemaBuilder::leaf("m", "tag", DataType::String)),
            )
            .build();
        let running = Tree::empty(schema.clone());
        let mut candidate = Tree::empty(schema.clone());
        for (id, tag) in [("a", "x"), ("b", "x")] {
            let entry = Path::root().child(Segment::list_entry(
                "m",
                "entry",
                vec![("id".to_owned(), id.to_owned())],
            ));
            candidate
                .set(&entry.clone().child(Segment::node("m", "tag")), Some(tag), false)
                .unwrap();
        }
        let view = Union::root(&candidate, &running, Defaults::Include);
        let errors = validate(&view);
        assert!(errors.iter().any(|e| e.message.contains("unique")));
    }
}
