//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use winnow::ascii::{digit1, multispace0};
use winnow::combinator::{alt, delimited, opt, preceded, repeat, separated};
use winnow::error::{ContextError, ErrMode};
use winnow::token::{literal, take_while};
use winnow::{ModalResult, Parser};

use crate::ast::{Anchor, CompareOp, Expr, NameTest, PathExpr, Step};

/// Parses a `must`/`when` constraint expression in its entirety, failing if
/// trailing input remains after a valid expression is consumed.
pub fn parse(input: &str) -> Result<Expr, String> {
    let mut s = input;
    let expr = ws(or_expr)
        .parse_next(&mut s)
        .map_err(|e: ErrMode<ContextError>| format!("xpath parse error: {e}"))?;
    let trailing = ws(multispace0).parse_next(&mut s).unwrap_or_default();
    let _ = trailing;
    if !s.is_empty() {
        return Err(format!("unexpected trailing input: {s:?}"));
    }
    Ok(expr)
}

fn ws<'a, O>(
    mut inner: impl Parser<&'a str, O, ErrMode<ContextError>>,
) -> impl Parser<&'a str, O, ErrMode<ContextError>> {
    move |input: &mut &'a str| {
        let _ = multispace0.parse_next(input)?;
        let out = inner.parse_next(input)?;
        let _ = multispace0.parse_next(input)?;
        Ok(out)
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        take_while(1, is_name_start),
        take_while(0.., is_name_continue),
    )
        .take()
        .parse_next(input)
}

/// Matches a reserved word as a whole identifier, so `organization` is never
/// mistaken for the keyword `or` followed by a stray `ganization` token.
fn keyword<'a>(
    kw: &'static str,
) -> impl Parser<&'a str, &'a str, ErrMode<ContextError>> {
    move |input: &mut &'a str| {
        let checkpoint = *input;
        let ident = identifier.parse_next(input)?;
        if ident == kw {
            Ok(ident)
        } else {
            *input = checkpoint;
            Err(ErrMode::Backtrack(ContextError::new()))
        }
    }
}

fn or_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = and_expr.parse_next(input)?;
    let rest: Vec<Expr> =
        repeat(0.., preceded(ws(keyword("or")), and_expr)).parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, rhs| Expr::Or(Box::new(acc), Box::new(rhs))))
}

fn and_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = equality_expr.parse_next(input)?;
    let rest: Vec<Expr> = repeat(0.., preceded(ws(keyword("and")), equality_expr))
        .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, rhs| Expr::And(Box::new(acc), Box::new(rhs))))
}

fn compare_op(input: &mut &str) -> ModalResult<CompareOp> {
    ws(alt((
        literal("!=").value(CompareOp::Ne),
        literal("<=").value(CompareOp::Le),
        literal(">=").value(CompareOp::Ge),
        literal("=").value(CompareOp::Eq),
        literal("<").value(CompareOp::Lt),
        literal(">").value(CompareOp::Gt),
    )))
    .parse_next(input)
}

fn equality_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = relational_expr.parse_next(input)?;
    let rest: Vec<(CompareOp, Expr)> =
        repeat(0.., (compare_op, relational_expr)).parse_next(input)?;
    Ok(rest.into_iter().fold(first, |acc, (op, rhs)| {
        Expr::Compare(op, Box::new(acc), Box::new(rhs))
    }))
}

fn relational_expr(input: &mut &str) -> ModalResult<Expr> {
    unary_expr.parse_next(input)
}

fn unary_expr(input: &mut &str) -> ModalResult<Expr> {
    alt((
        preceded(
            ws(keyword("not")),
            delimited(ws(literal("(")), or_expr, ws(literal(")"))),
        )
        .map(|e| Expr::Not(Box::new(e))),
        primary_expr,
    ))
    .parse_next(input)
}

fn number_literal(input: &mut &str) -> ModalResult<f64> {
    let whole: &str = digit1.parse_next(input)?;
    let frac: Option<&str> = opt(preceded(literal("."), digit1)).parse_next(input)?;
    let text = match frac {
        Some(f) => format!("{whole}.{f}"),
        None => whole.to_owned(),
    };
    text.parse::<f64>()
        .map_err(|_| ErrMode::Backtrack(ContextError::new()))
}

fn string_literal(input: &mut &str) -> ModalResult<String> {
    alt((
        delimited(literal("'"), take_while(0.., |c| c != '\''), literal("'")),
        delimited(literal("\""), take_while(0.., |c| c != '"'), literal("\"")),
    ))
    .map(|s: &str| s.to_owned())
    .parse_next(input)
}

fn function_call(input: &mut &str) -> ModalResult<Expr> {
    let name = identifier.parse_next(input)?;
    let args: Vec<Expr> = delimited(
        ws(literal("(")),
        separated(0.., ws(or_expr), ws(literal(","))),
        ws(literal(")")),
    )
    .parse_next(input)?;
    Ok(Expr::Call(name.to_owned(), args))
}

fn current_path(input: &mut &str) -> ModalResult<Expr> {
    let _ = literal("current").parse_next(input)?;
    let _ = ws(literal("(")).parse_next(input)?;
    let _ = literal(")").parse_next(input)?;
    let steps: Vec<Step> =
        opt(preceded(literal("/"), relative_path)).parse_next(input)?.unwrap_or_default();
    Ok(Expr::Path(PathExpr {
        anchor: Anchor::Current,
        steps,
    }))
}

fn path_expr(input: &mut &str) -> ModalResult<Expr> {
    alt((
        preceded(literal("/"), relative_path).map(|steps| {
            Expr::Path(PathExpr {
                anchor: Anchor::Root,
                steps,
            })
        }),
        relative_path.map(|steps| {
            Expr::Path(PathExpr {
                anchor: Anchor::Relative,
                steps,
            })
        }),
    ))
    .parse_next(input)
}

fn relative_path(input: &mut &str) -> ModalResult<Vec<Step>> {
    separated(1.., step, literal("/")).parse_next(input)
}

fn step(input: &mut &str) -> ModalResult<Step> {
    alt((
        literal("..").value(Step::ParentStep),
        literal(".").value(Step::SelfStep),
        (name_test, repeat(0.., predicate)).map(|(nt, preds)| Step::Named(nt, preds)),
    ))
    .parse_next(input)
}

fn predicate(input: &mut &str) -> ModalResult<Expr> {
    delimited(ws(literal("[")), or_expr, ws(literal("]"))).parse_next(input)
}

fn name_test(input: &mut &str) -> ModalResult<NameTest> {
    alt((
        literal("*").value(NameTest::AnyWildcard),
        (identifier, literal(":"), literal("*"))
            .map(|(pfx, _, _)| NameTest::NamespaceWildcard(pfx.to_owned())),
        (identifier, opt(preceded(literal(":"), identifier))).map(|(a, b)| match b {
            Some(name) => NameTest::Name(Some(a.to_owned()), name.to_owned()),
            None => NameTest::Name(None, a.to_owned()),
        }),
    ))
    .parse_next(input)
}

fn primary_expr(input: &mut &str) -> ModalResult<Expr> {
    ws(alt((
        delimited(literal("("), or_expr, ws(literal(")"))),
        string_literal.map(Expr::Str),
        number_literal.map(Expr::Number),
        current_path,
        function_call,
        path_expr,
    )))
    .parse_next(input)
}
