//! Query parsing.

use quarry_core::{ContainerTag, Direction, Expr, Ident, Query, SortKey};

use super::shapes;
use super::{ParseError, ParseResult, Scope};
use crate::compile::Compiler;
use crate::dynamics::DynamicsAccum;
use crate::host::{ExprKind, HostExpr, HostType};

/// Combinators callable on a query receiver.
const OPERATORS: &[&str] = &[
    "filter",
    "where",
    "map",
    "flatMap",
    "sortedBy",
    "sortedByDescending",
    "take",
    "drop",
    "distinct",
    "union",
    "unionAll",
];

impl Compiler<'_> {
    pub(crate) fn parse_query(
        &mut self,
        expr: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Query> {
        if let Some(target) = shapes::splice_target(expr) {
            return self.splice_query(target, dynamics);
        }
        if let Some(args) = shapes::free_call(expr, "Table") {
            return self.parse_table(expr, args);
        }
        if let Some(id) = shapes::captured_call(expr, &self.arena) {
            let xr = self.call_captured(id, expr, scope, dynamics)?;
            return xr.into_query().ok_or_else(|| {
                ParseError::unrecognized(expr.span, "captured function in query position")
            });
        }
        if let Some((name, head, args)) = shapes::method_call(expr) {
            if OPERATORS.contains(&name) && matches!(head.ty, HostType::Query(_)) {
                return self.parse_operator(expr, name, head, args, scope, dynamics);
            }
        }
        if let Some(args) = shapes::free_call(expr, "select") {
            let Some(([], body)) = args.first().and_then(shapes::lambda) else {
                return Err(ParseError::unrecognized(expr.span, "arguments of `select`"));
            };
            let clause = self.parse_select(body, scope, dynamics)?;
            return Ok(Query::Select(Box::new(clause)));
        }
        if let ExprKind::Ident(name) = &expr.kind {
            if let Some(var) = scope.lookup(name) {
                let ident = var.ident.clone();
                return Ok(if var.query {
                    Query::Ident(ident)
                } else {
                    Query::FromExpr(Box::new(Expr::Ident(ident)))
                });
            }
        }
        if shapes::capture_reference(expr, ContainerTag::Query) {
            return self.splice_query(expr, dynamics);
        }

        Err(ParseError::unrecognized(
            expr.span,
            format!(
                "{} in query position",
                shapes::describe(expr, &self.arena)
            ),
        ))
    }

    fn splice_query(
        &mut self,
        target: &HostExpr,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Query> {
        let span = target.span;
        let xr = self.splice(target, dynamics)?;
        xr.into_query()
            .ok_or_else(|| ParseError::unrecognized(span, "non-query capture in query position"))
    }

    /// `Table<T>()`
    fn parse_table(&mut self, expr: &HostExpr, args: &[HostExpr]) -> ParseResult<Query> {
        let row = match &expr.ty {
            HostType::Query(row) if args.is_empty() => row,
            _ => return Err(ParseError::unrecognized(expr.span, "arguments of `Table`")),
        };
        let Some(name) = row.class_name() else {
            return Err(ParseError::unrecognized(
                expr.span,
                format!("`Table` of non-entity type `{row}`"),
            ));
        };
        Ok(Query::entity(name, row.to_xr_type()))
    }

    fn parse_operator(
        &mut self,
        expr: &HostExpr,
        name: &str,
        head: &HostExpr,
        args: &[HostExpr],
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Query> {
        let shape_error = || ParseError::unrecognized(expr.span, format!("arguments of `{name}`"));
        let head = Box::new(self.parse_query(head, scope, dynamics)?);
        let row = head.ty();

        match (name, args) {
            ("distinct", []) => Ok(Query::Distinct { head }),
            ("take" | "drop", [count]) => {
                let count = Box::new(self.parse_expr(count, scope, dynamics)?);
                Ok(if name == "take" {
                    Query::Take { head, count }
                } else {
                    Query::Drop { head, count }
                })
            }
            ("union" | "unionAll", [other]) => {
                let right = Box::new(self.parse_query(other, scope, dynamics)?);
                Ok(Query::Union {
                    left: head,
                    right,
                    all: name == "unionAll",
                })
            }
            (_, [f]) => {
                let (param, body) = shapes::lambda1(f).ok_or_else(shape_error)?;
                let id = Ident::new(param.name.clone(), row);
                let inner = scope.with(&param.name, id.clone());
                match name {
                    "filter" | "where" => Ok(Query::Filter {
                        head,
                        id,
                        body: Box::new(self.parse_expr(body, &inner, dynamics)?),
                    }),
                    "map" => Ok(Query::Map {
                        head,
                        id,
                        body: Box::new(self.parse_expr(body, &inner, dynamics)?),
                    }),
                    "flatMap" => Ok(Query::FlatMap {
                        head,
                        id,
                        body: Box::new(self.parse_query(body, &inner, dynamics)?),
                    }),
                    "sortedBy" | "sortedByDescending" => {
                        let direction = if name == "sortedBy" {
                            Direction::Asc
                        } else {
                            Direction::Desc
                        };
                        let expr = self.parse_expr(body, &inner, dynamics)?;
                        Ok(Query::SortBy {
                            head,
                            id,
                            keys: vec![SortKey { expr, direction }],
                        })
                    }
                    _ => Err(shape_error()),
                }
            }
            _ => Err(shape_error()),
        }
    }
}
