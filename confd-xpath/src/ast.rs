//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Call(String, Vec<Expr>),
    Path(PathExpr),
    Number(f64),
    Str(String),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathExpr {
    pub anchor: Anchor,
    pub steps: Vec<Step>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Anchor {
    /// `/a/b`; starts at the document root.
    Root,
    /// `current()/a/b` or a step list starting with an explicit `current()`.
    Current,
    /// `a/b`; starts at the context node.
    Relative,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    SelfStep,
    ParentStep,
    Named(NameTest, Vec<Expr>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum NameTest {
    /// `*`
    AnyWildcard,
    /// `pfx:*`
    NamespaceWildcard(String),
    /// `pfx:name` or (unprefixed) `name`.
    Name(Option<String>, String),
}
