//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use crate::ast::{Anchor, CompareOp, Expr, NameTest, PathExpr, Step};
use crate::node::XpathNode;

/// An XPath value, coerced between kinds the way XPath 1.0 does: node-sets
/// compare existentially against other kinds, booleans short-circuit
/// everything else through `bool()`, and numbers/strings follow the usual
/// printf-ish rules.
#[derive(Clone, Debug)]
pub enum Value<N> {
    NodeSet(Vec<N>),
    Bool(bool),
    Number(f64),
    Str(String),
}

impl<N: XpathNode> Value<N> {
    pub fn boolean(&self) -> bool {
        match self {
            Value::NodeSet(nodes) => !nodes.is_empty(),
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
        }
    }

    pub fn string(&self) -> String {
        match self {
            Value::NodeSet(nodes) => nodes
                .first()
                .and_then(|n| n.value())
                .unwrap_or_default(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.clone(),
        }
    }

    pub fn number(&self) -> f64 {
        match self {
            Value::NodeSet(_) => self.string().parse().unwrap_or(f64::NAN),
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::Str(s) => s.trim().parse().unwrap_or(f64::NAN),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Evaluation context: the node the constraint is attached to (`.`), the
/// node `current()` resolves to (equal to the context node at the top
/// level, distinct from it inside predicates), the module an unprefixed
/// `NameTest` should resolve against, and the proximity position/size
/// `position()`/`last()` and bare-number predicates (`[1]`) read from.
pub struct Context<'a, N> {
    pub node: &'a N,
    pub current: &'a N,
    pub home_module: &'a str,
    pub position: usize,
    pub size: usize,
}

impl<'a, N> Context<'a, N> {
    /// A top-level context: position 1 of 1, the conventional proximity for
    /// a constraint evaluated outside of any predicate filtering.
    pub fn new(node: &'a N, current: &'a N, home_module: &'a str) -> Self {
        Context { node, current, home_module, position: 1, size: 1 }
    }
}

/// Evaluates a parsed constraint expression against a tree context,
/// returning its XPath boolean effective value (per `Value::boolean`).
pub fn eval_bool<N: XpathNode>(expr: &Expr, ctx: &Context<'_, N>) -> bool {
    eval(expr, ctx).boolean()
}

fn eval<N: XpathNode>(expr: &Expr, ctx: &Context<'_, N>) -> Value<N> {
    match expr {
        Expr::Or(lhs, rhs) => {
            Value::Bool(eval_bool(lhs, ctx) || eval_bool(rhs, ctx))
        }
        Expr::And(lhs, rhs) => {
            Value::Bool(eval_bool(lhs, ctx) && eval_bool(rhs, ctx))
        }
        Expr::Not(inner) => Value::Bool(!eval_bool(inner, ctx)),
        Expr::Compare(op, lhs, rhs) => {
            Value::Bool(compare(*op, &eval(lhs, ctx), &eval(rhs, ctx)))
        }
        Expr::Number(n) => Value::Number(*n),
        Expr::Str(s) => Value::Str(s.clone()),
        Expr::Call(name, args) => eval_call(name, args, ctx),
        Expr::Path(path) => Value::NodeSet(select_path(path, ctx)),
    }
}

fn compare<N: XpathNode>(op: CompareOp, lhs: &Value<N>, rhs: &Value<N>) -> bool {
    if let (Value::NodeSet(a), Value::NodeSet(b)) = (lhs, rhs) {
        return a.iter().any(|na| {
            b.iter().any(|nb| {
                compare_scalars(op, &node_string(na), &node_string(nb), true)
            })
        });
    }
    if let Value::NodeSet(nodes) = lhs {
        return nodes.iter().any(|n| {
            compare_against_scalar(op, &node_string(n), rhs)
        });
    }
    if let Value::NodeSet(nodes) = rhs {
        return nodes.iter().any(|n| {
            compare_against_scalar(op.flip(), &node_string(n), lhs)
        });
    }
    match (lhs, rhs) {
        (Value::Bool(_), _) | (_, Value::Bool(_)) => {
            let (a, b) = (lhs.boolean(), rhs.boolean());
            match op {
                CompareOp::Eq => a == b,
                CompareOp::Ne => a != b,
                _ => compare_numbers(op, a as u8 as f64, b as u8 as f64),
            }
        }
        (Value::Number(_), _) | (_, Value::Number(_)) => {
            compare_numbers(op, lhs.number(), rhs.number())
        }
        _ => compare_scalars(op, &lhs.string(), &rhs.string(), true),
    }
}

fn node_string<N: XpathNode>(n: &N) -> String {
    n.value().unwrap_or_default()
}

fn compare_against_scalar<N: XpathNode>(
    op: CompareOp,
    node_value: &str,
    scalar: &Value<N>,
) -> bool {
    match scalar {
        Value::Number(n) => {
            compare_numbers(op, node_value.trim().parse().unwrap_or(f64::NAN), *n)
        }
        Value::Str(s) => compare_scalars(op, node_value, s, true),
        Value::Bool(b) => {
            let nb = !node_value.is_empty();
            compare_scalars(op, &nb.to_string(), &b.to_string(), false)
        }
        Value::NodeSet(_) => unreachable!("node-set/node-set handled earlier"),
    }
}

fn compare_numbers(op: CompareOp, a: f64, b: f64) -> bool {
    match op {
        CompareOp::Eq => a == b,
        CompareOp::Ne => a != b,
        CompareOp::Lt => a < b,
        CompareOp::Le => a <= b,
        CompareOp::Gt => a > b,
        CompareOp::Ge => a >= b,
    }
}

fn compare_scalars(op: CompareOp, a: &str, b: &str, lexical: bool) -> bool {
    match op {
        CompareOp::Eq => a == b,
        CompareOp::Ne => a != b,
        _ if lexical => {
            let (an, bn): (f64, f64) =
                (a.trim().parse().unwrap_or(f64::NAN), b.trim().parse().unwrap_or(f64::NAN));
            compare_numbers(op, an, bn)
        }
        _ => compare_numbers(op, a.parse().unwrap_or(f64::NAN), b.parse().unwrap_or(f64::NAN)),
    }
}

impl CompareOp {
    fn flip(self) -> CompareOp {
        match self {
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Le => CompareOp::Ge,
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Ge => CompareOp::Le,
            same => same,
        }
    }
}

fn eval_call<N: XpathNode>(name: &str, args: &[Expr], ctx: &Context<'_, N>) -> Value<N> {
    match name {
        "not" => Value::Bool(!eval_bool(&args[0], ctx)),
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "current" => Value::NodeSet(vec![ctx.current.clone()]),
        "boolean" => Value::Bool(eval(&args[0], ctx).boolean()),
        "string" => Value::Str(eval(&args[0], ctx).string()),
        "number" => Value::Number(eval(&args[0], ctx).number()),
        "count" => {
            let n = match eval(&args[0], ctx) {
                Value::NodeSet(nodes) => nodes.len() as f64,
                _ => 0.0,
            };
            Value::Number(n)
        }
        "position" => Value::Number(ctx.position as f64),
        "last" => Value::Number(ctx.size as f64),
        "contains" => {
            let haystack = eval(&args[0], ctx).string();
            let needle = eval(&args[1], ctx).string();
            Value::Bool(haystack.contains(&needle))
        }
        "starts-with" => {
            let haystack = eval(&args[0], ctx).string();
            let needle = eval(&args[1], ctx).string();
            Value::Bool(haystack.starts_with(&needle))
        }
        "string-length" => {
            let s = if args.is_empty() {
                node_string(ctx.node)
            } else {
                eval(&args[0], ctx).string()
            };
            Value::Number(s.chars().count() as f64)
        }
        "concat" => {
            let mut out = String::new();
            for a in args {
                out.push_str(&eval(a, ctx).string());
            }
            Value::Str(out)
        }
        "normalize-space" => {
            let s = if args.is_empty() {
                node_string(ctx.node)
            } else {
                eval(&args[0], ctx).string()
            };
            Value::Str(s.split_whitespace().collect::<Vec<_>>().join(" "))
        }
        _ => Value::Bool(false),
    }
}

fn select_path<N: XpathNode>(path: &PathExpr, ctx: &Context<'_, N>) -> Vec<N> {
    let start = match path.anchor {
        Anchor::Root => ctx.node.root(),
        Anchor::Current => ctx.current.clone(),
        Anchor::Relative => ctx.node.clone(),
    };
    let mut frontier = vec![start];
    for step in &path.steps {
        frontier = apply_step(step, frontier, ctx);
    }
    frontier
}

fn apply_step<N: XpathNode>(step: &Step, frontier: Vec<N>, ctx: &Context<'_, N>) -> Vec<N> {
    match step {
        Step::SelfStep => frontier,
        Step::ParentStep => frontier.into_iter().filter_map(|n| n.parent()).collect(),
        Step::Named(test, predicates) => {
            let mut matched: Vec<N> = Vec::new();
            for node in &frontier {
                for child in node.children() {
                    if name_test_matches(test, &child, ctx.home_module) {
                        matched.push(child);
                    }
                }
            }
            for predicate in predicates {
                let size = matched.len();
                matched = matched
                    .into_iter()
                    .enumerate()
                    .filter(|(i, candidate)| {
                        let inner = Context {
                            node: candidate,
                            current: ctx.current,
                            home_module: ctx.home_module,
                            position: i + 1,
                            size,
                        };
                        passes_predicate(predicate, &inner)
                    })
                    .map(|(_, candidate)| candidate)
                    .collect();
            }
            matched
        }
    }
}

/// A numeric predicate result (a bare `[1]`, `position()=last()`'s operands,
/// etc.) is compared against the candidate's proximity position rather than
/// coerced through `boolean()`, matching XPath 1.0's predicate-truth-value
/// rule; any other result kind falls back to its ordinary boolean value.
fn passes_predicate<N: XpathNode>(predicate: &Expr, ctx: &Context<'_, N>) -> bool {
    match eval(predicate, ctx) {
        Value::Number(n) => n == ctx.position as f64,
        other => other.boolean(),
    }
}

fn name_test_matches<N: XpathNode>(test: &NameTest, node: &N, home_module: &str) -> bool {
    match test {
        NameTest::AnyWildcard => true,
        NameTest::NamespaceWildcard(prefix) => node.namespace() == prefix.as_str(),
        NameTest::Name(prefix, name) => {
            let expected_ns = prefix.as_deref().unwrap_or(home_module);
            node.namespace() == expected_ns && node.local_name() == name.as_str()
        }
    }
}
