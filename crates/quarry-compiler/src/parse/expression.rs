//! Expression parsing.

use quarry_core::{BinaryOp, Branch, Expr, Ident, Query, XrType};

use super::shapes;
use super::{ParseError, ParseResult, Scope};
use crate::compile::Compiler;
use crate::diagnostics::DiagnosticKind;
use crate::dynamics::{DynamicsAccum, ParamKind};
use crate::host::{Callee, ExprKind, HostExpr, HostType, Stmt, WhenBranch};

/// Host methods with a direct SQL counterpart.
const METHODS: &[&str] = &[
    "uppercase",
    "lowercase",
    "trim",
    "length",
    "substring",
    "startsWith",
    "endsWith",
    "contains",
    "isEmpty",
    "isNotEmpty",
];

impl Compiler<'_> {
    pub(crate) fn parse_expr(
        &mut self,
        expr: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Expr> {
        if let Some(target) = shapes::splice_target(expr) {
            let span = target.span;
            let xr = self.splice(target, dynamics)?;
            return xr.into_expr().ok_or_else(|| {
                ParseError::unrecognized(span, "action capture in expression position")
            });
        }
        if let Some((kind, value, serializer)) = shapes::param_call(expr) {
            return self.parse_param(expr, kind, value, serializer, dynamics);
        }
        if let Some(id) = shapes::captured_call(expr, &self.arena) {
            let span = expr.span;
            let xr = self.call_captured(id, expr, scope, dynamics)?;
            return xr.into_expr().ok_or_else(|| {
                ParseError::unrecognized(span, "captured action in expression position")
            });
        }

        match &expr.kind {
            ExprKind::Binary { op, lhs, rhs } => {
                let left = self.parse_expr(lhs, scope, dynamics)?;
                let right = self.parse_expr(rhs, scope, dynamics)?;
                Ok(Expr::binary(left, *op, right))
            }
            ExprKind::Unary { op, operand } => Ok(Expr::Unary {
                op: *op,
                operand: Box::new(self.parse_expr(operand, scope, dynamics)?),
            }),
            ExprKind::If {
                cond,
                then,
                otherwise: Some(otherwise),
            } => self.parse_if(cond, then, otherwise, scope, dynamics),
            ExprKind::If {
                otherwise: None, ..
            } => Err(ParseError::unrecognized(expr.span, "`if` without `else`")),
            ExprKind::When {
                branches,
                otherwise: Some(otherwise),
            } => self.parse_when(branches, otherwise, scope, dynamics),
            ExprKind::When {
                otherwise: None, ..
            } => Err(ParseError::unrecognized(
                expr.span,
                "`when` without an `else` branch",
            )),
            ExprKind::Const(value) => Ok(Expr::literal(value.clone())),
            ExprKind::Ident(name) => match scope.lookup(name) {
                Some(var) if var.query => {
                    Ok(Expr::Subquery(Box::new(Query::Ident(var.ident.clone()))))
                }
                Some(var) => Ok(Expr::Ident(var.ident.clone())),
                None if matches!(expr.ty, HostType::Query(_)) => {
                    let query = self.parse_query(expr, scope, dynamics)?;
                    Ok(Expr::Subquery(Box::new(query)))
                }
                None => Err(ParseError::invalid(
                    DiagnosticKind::HostValueInCapture,
                    expr.span,
                    name.clone(),
                )),
            },
            ExprKind::Property { receiver, name } => {
                let of = self.parse_expr(receiver, scope, dynamics)?;
                let ty = of
                    .ty()
                    .field(name)
                    .cloned()
                    .unwrap_or_else(|| expr.ty.to_xr_type());
                Ok(Expr::Property {
                    of: Box::new(of),
                    name: name.clone(),
                    ty,
                })
            }
            ExprKind::Block {
                statements,
                result: Some(result),
            } => self.parse_block(statements, result, scope, dynamics),
            ExprKind::Construct { class, args } => {
                let mut fields = Vec::with_capacity(args.len());
                for (name, arg) in args {
                    fields.push((name.clone(), self.parse_expr(arg, scope, dynamics)?));
                }
                Ok(Expr::Product {
                    name: class.clone(),
                    fields,
                })
            }
            ExprKind::Call {
                callee: Callee::Named(name),
                receiver: Some(receiver),
                args,
            } if METHODS.contains(&name.as_str()) => {
                let head = self.parse_expr(receiver, scope, dynamics)?;
                let mut parsed = Vec::with_capacity(args.len());
                for arg in args {
                    parsed.push(self.parse_expr(arg, scope, dynamics)?);
                }
                let ty = match expr.ty {
                    HostType::Boolean => XrType::BooleanExpression,
                    ref other => other.to_xr_type(),
                };
                Ok(Expr::MethodCall {
                    head: Box::new(head),
                    name: name.clone(),
                    args: parsed,
                    ty,
                })
            }
            _ if matches!(expr.ty, HostType::Query(_)) => {
                let query = self.parse_query(expr, scope, dynamics)?;
                Ok(Expr::Subquery(Box::new(query)))
            }
            ExprKind::DeclRef(id)
            | ExprKind::Call {
                callee: Callee::Decl(id),
                ..
            } => Err(ParseError::invalid(
                DiagnosticKind::HostValueInCapture,
                expr.span,
                self.arena[*id].name.clone(),
            )),
            _ => Err(ParseError::unrecognized(
                expr.span,
                format!(
                    "{} in expression position",
                    shapes::describe(expr, &self.arena)
                ),
            )),
        }
    }

    fn parse_param(
        &mut self,
        call: &HostExpr,
        kind: ParamKind,
        value: &HostExpr,
        serializer: Option<&HostExpr>,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Expr> {
        let element = if kind.is_list() {
            value.ty.element()
        } else {
            &value.ty
        };
        if kind.is_static() && !element.is_primitive() {
            return Err(ParseError::invalid(
                DiagnosticKind::NonPrimitiveParam,
                value.span,
                format!("got `{element}`"),
            ));
        }
        if kind.is_custom() && serializer.is_none() {
            return Err(ParseError::unrecognized(
                call.span,
                format!("`{}` without a serializer", kind.call_name()),
            ));
        }

        let bid = self.bids.fresh();
        let ty = element.to_xr_type();
        dynamics.add_param(bid, value.clone(), kind, serializer.cloned());
        Ok(Expr::Param { bid, ty })
    }

    /// `if (c) t else false` is `c && t`; `if (c) true else o` is `c || o`.
    fn parse_if(
        &mut self,
        cond: &HostExpr,
        then: &HostExpr,
        otherwise: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Expr> {
        let cond_xr = self.parse_expr(cond, scope, dynamics)?;
        if shapes::is_bool(otherwise, false) {
            let then_xr = self.parse_expr(then, scope, dynamics)?;
            return Ok(Expr::binary(cond_xr, BinaryOp::And, then_xr));
        }
        if shapes::is_bool(then, true) {
            let otherwise_xr = self.parse_expr(otherwise, scope, dynamics)?;
            return Ok(Expr::binary(cond_xr, BinaryOp::Or, otherwise_xr));
        }
        let then_xr = self.parse_expr(then, scope, dynamics)?;
        let otherwise_xr = self.parse_expr(otherwise, scope, dynamics)?;
        Ok(Expr::When {
            branches: vec![Branch {
                cond: cond_xr,
                then: then_xr,
            }],
            otherwise: Box::new(otherwise_xr),
        })
    }

    fn parse_when(
        &mut self,
        branches: &[WhenBranch],
        otherwise: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Expr> {
        let mut parsed = Vec::with_capacity(branches.len());
        for branch in branches {
            parsed.push(Branch {
                cond: self.parse_expr(&branch.cond, scope, dynamics)?,
                then: self.parse_expr(&branch.then, scope, dynamics)?,
            });
        }
        Ok(Expr::When {
            branches: parsed,
            otherwise: Box::new(self.parse_expr(otherwise, scope, dynamics)?),
        })
    }

    /// A block of `val` bindings ending in a result.
    fn parse_block(
        &mut self,
        statements: &[Stmt],
        result: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Expr> {
        let mut inner = scope.clone();
        let mut bindings = Vec::with_capacity(statements.len());
        for stmt in statements {
            let Stmt::Val { name, init, .. } = stmt else {
                return Err(ParseError::unrecognized(
                    stmt.span(),
                    "statement in capture block",
                ));
            };
            let value = self.parse_expr(init, &inner, dynamics)?;
            let id = Ident::new(name.clone(), value.ty());
            inner.bind(name, id.clone());
            bindings.push((id, value));
        }
        let output = self.parse_expr(result, &inner, dynamics)?;
        if bindings.is_empty() {
            return Ok(output);
        }
        Ok(Expr::Block {
            bindings,
            output: Box::new(output),
        })
    }
}
