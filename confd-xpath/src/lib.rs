//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! A bundled, intentionally-scoped XPath 1.0-like expression evaluator.
//!
//! This is not a general-purpose XPath engine: it covers the subset of the
//! language that appears in `must`/`when` constraints over a configuration
//! tree; boolean/relational operators, path steps with name tests and
//! predicates (both key-style equality and positional, `[1]`/`[position()
//! = last()]`), `current()`, and a handful of the core function library
//! (`contains`, `starts-with`, `count`, `string-length`, `concat`,
//! `normalize-space`, `boolean`, `string`, `number`, `not`, `position`,
//! `last`). Node-set functions like `//` descendant axes are out of scope;
//! trees that need more should implement [`XpathNode`] and wire in a real
//! XPath crate instead of this one.

pub mod ast;
mod eval;
mod node;
mod parser;

pub use ast::{Anchor, CompareOp, Expr, NameTest, PathExpr, Step};
pub use eval::{eval_bool, Context, Value};
pub use node::XpathNode;
pub use parser::parse;

/// Parses and evaluates `expr` against `ctx` in one call, returning its
/// XPath effective boolean value. This is what `must`/`when` enforcement
/// calls per constraint.
pub fn evaluate<N: XpathNode>(expr: &str, ctx: &Context<'_, N>) -> Result<bool, String> {
    let parsed = parse(expr)?;
    Ok(eval_bool(&parsed, ctx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct TestNode {
        namespace: &'static str,
        name: &'static str,
        value: Option<String>,
        config: bool,
        children: Vec<TestNode>,
        parent: Option<Box<TestNode>>,
    }

    impl TestNode {
        fn leaf(namespace: &'static str, name: &'static str, value: &str) -> Self {
            TestNode {
                namespace,
                name,
                value: Some(value.to_owned()),
                config: true,
                children: Vec::new(),
                parent: None,
            }
        }

        fn container(
            namespace: &'static str,
            name: &'static str,
            children: Vec<TestNode>,
        ) -> Self {
            let bare = TestNode {
                namespace,
                name,
                value: None,
                config: true,
                children,
                parent: None,
            };
            let parent_view = TestNode {
                parent: None,
                ..bare.clone_shallow()
            };
            let mut node = bare;
            for child in node.children.iter_mut() {
                child.parent = Some(Box::new(parent_view.clone()));
            }
            node
        }

        /// Clones everything but leaves `parent` untouched by the deep
        /// per-child back-reference this constructor installs afterward.
        fn clone_shallow(&self) -> Self {
            TestNode {
                namespace: self.namespace,
                name: self.name,
                value: self.value.clone(),
                config: self.config,
                children: self.children.clone(),
                parent: self.parent.clone(),
            }
        }
    }

    impl XpathNode for TestNode {
        fn local_name(&self) -> &str {
            self.name
        }

        fn namespace(&self) -> &str {
            self.namespace
        }

        fn value(&self) -> Option<String> {
            self.value.clone()
        }

        fn is_config(&self) -> bool {
            self.config
        }

        fn parent(&self) -> Option<Self> {
            self.parent.as_deref().cloned()
        }

        fn root(&self) -> Self {
            match &self.parent {
                Some(p) => p.root(),
                None => self.clone(),
            }
        }

        fn children(&self) -> Vec<Self> {
            self.children.clone()
        }

        fn path(&self) -> String {
            format!("/{}:{}", self.namespace, self.name)
        }
    }

    fn mtu_tree() -> TestNode {
        TestNode::container(
            "if",
            "interface",
            vec![
                TestNode::leaf("if", "name", "eth0"),
                TestNode::leaf("if", "mtu", "1500"),
            ],
        )
    }

    #[test]
    fn evaluates_contains_scenario() {
        let tree = TestNode::leaf("if", "description", "uplink to core");
        let ctx = Context::new(&tree, &tree, "if");
        assert!(evaluate("contains(., 'core')", &ctx).unwrap());
        assert!(!evaluate("contains(., 'missing')", &ctx).unwrap());
    }

    #[test]
    fn evaluates_relational_on_child_leaf() {
        let tree = mtu_tree();
        let mtu = &tree.children[1];
        let ctx = Context::new(mtu, mtu, "if");
        assert!(evaluate("../if:mtu >= 1280", &ctx).unwrap());
        assert!(!evaluate("../if:mtu > 9000", &ctx).unwrap());
    }

    #[test]
    fn evaluates_predicate_equality() {
        let tree = mtu_tree();
        let ctx = Context::new(&tree, &tree, "if");
        assert!(evaluate("if:name = 'eth0'", &ctx).unwrap());
        assert!(evaluate("not(if:name = 'eth1')", &ctx).unwrap());
    }

    #[test]
    fn rejects_malformed_expression() {
        let tree = mtu_tree();
        let ctx = Context::new(&tree, &tree, "if");
        assert!(evaluate("if:name = ", &ctx).is_err());
    }

    #[test]
    fn evaluates_positional_predicate() {
        let tree = TestNode::container(
            "if",
            "interfaces",
            vec![
                TestNode::leaf("if", "name", "eth0"),
                TestNode::leaf("if", "name", "eth1"),
                TestNode::leaf("if", "name", "eth2"),
            ],
        );
        let ctx = Context::new(&tree, &tree, "if");
        assert!(evaluate("if:name[1] = 'eth0'", &ctx).unwrap());
        assert!(evaluate("if:name[2] = 'eth1'", &ctx).unwrap());
        assert!(evaluate("if:name[last()] = 'eth2'", &ctx).unwrap());
        assert!(evaluate("count(if:name[position() > 1]) = 2", &ctx).unwrap());
    }
}
