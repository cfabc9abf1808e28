//! Action parsing: `insert`, `update`, `delete` with their `filter` and
//! `returning` suffixes, plus batch actions.

use quarry_core::{Action, Assignment, BatchAction, ContainerTag, Ident, Query, Returning};

use super::shapes;
use super::{ParseError, ParseResult, Scope};
use crate::compile::Compiler;
use crate::dynamics::DynamicsAccum;
use crate::host::{ExprKind, HostExpr, HostType, LambdaParam};

/// Alias bound by `delete` when no filter names the row.
const DELETE_ALIAS: &str = "x";

impl Compiler<'_> {
    pub(crate) fn parse_action(
        &mut self,
        expr: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Action> {
        let target = shapes::splice_target(expr)
            .or_else(|| shapes::capture_reference(expr, ContainerTag::Action).then_some(expr));
        if let Some(target) = target {
            let xr = self.splice(target, dynamics)?;
            return xr.into_action().ok_or_else(|| {
                ParseError::unrecognized(target.span, "non-action capture in action position")
            });
        }
        if let Some(id) = shapes::captured_call(expr, &self.arena) {
            let xr = self.call_captured(id, expr, scope, dynamics)?;
            return xr.into_action().ok_or_else(|| {
                ParseError::unrecognized(expr.span, "captured function in action position")
            });
        }

        if let Some((name, receiver, args)) = shapes::method_call(expr) {
            match (name, args) {
                ("filter" | "where", [f]) => {
                    let action = self.parse_action(receiver, scope, dynamics)?;
                    return self.parse_action_filter(expr, action, f, scope, dynamics);
                }
                ("returning", [f]) => {
                    let action = self.parse_action(receiver, scope, dynamics)?;
                    return self.parse_returning(expr, action, f, scope, dynamics);
                }
                _ => {}
            }
        }

        for name in ["insert", "update"] {
            let Some(args) = shapes::free_call(expr, name) else {
                continue;
            };
            let (target, entity_ty) = self.action_target(expr)?;
            let Some((param, body)) = args.first().and_then(shapes::lambda1) else {
                return Err(ParseError::unrecognized(
                    expr.span,
                    format!("arguments of `{name}`"),
                ));
            };
            let alias = Ident::new(param.name.clone(), entity_ty);
            let inner = scope.with(&param.name, alias.clone());
            let assignments = self.parse_assignments(body, &inner, dynamics)?;
            return Ok(if name == "insert" {
                Action::Insert {
                    target,
                    alias,
                    assignments,
                    returning: None,
                }
            } else {
                Action::Update {
                    target,
                    alias,
                    assignments,
                    filter: None,
                    returning: None,
                }
            });
        }

        if let Some([]) = shapes::free_call(expr, "delete") {
            let (target, entity_ty) = self.action_target(expr)?;
            return Ok(Action::Delete {
                target,
                alias: Ident::new(DELETE_ALIAS, entity_ty),
                filter: None,
                returning: None,
            });
        }

        Err(ParseError::unrecognized(
            expr.span,
            format!(
                "{} in action position",
                shapes::describe(expr, &self.arena)
            ),
        ))
    }

    /// `capture.batch(data) { row -> action }`
    pub(crate) fn parse_batch(
        &mut self,
        data: &HostExpr,
        params: &[LambdaParam],
        body: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<BatchAction> {
        let [param] = params else {
            return Err(ParseError::unrecognized(
                body.span,
                "batch body without exactly one row parameter",
            ));
        };
        let alias = Ident::new(param.name.clone(), data.ty.element().to_xr_type());
        let inner = scope.with(&param.name, alias.clone());
        let action = self.parse_action(body, &inner, dynamics)?;
        Ok(BatchAction { alias, action })
    }

    /// The target table of an action, from its static `SqlAction<Input, _>` type.
    fn action_target(&self, expr: &HostExpr) -> ParseResult<(Box<Query>, quarry_core::XrType)> {
        let HostType::Action { input, .. } = &expr.ty else {
            return Err(ParseError::unrecognized(
                expr.span,
                format!("action of type `{}`", expr.ty),
            ));
        };
        let Some(name) = input.class_name() else {
            return Err(ParseError::unrecognized(
                expr.span,
                format!("action on non-entity type `{input}`"),
            ));
        };
        let ty = input.to_xr_type();
        Ok((Box::new(Query::entity(name, ty.clone())), ty))
    }

    /// `set(a to b, ..)`
    fn parse_assignments(
        &mut self,
        body: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Vec<Assignment>> {
        let body = match &body.kind {
            ExprKind::Block {
                statements,
                result: Some(result),
            } if statements.is_empty() => result,
            _ => body,
        };
        let Some(pairs) = shapes::free_call(body, "set") else {
            return Err(ParseError::unrecognized(
                body.span,
                format!("{} as action body", shapes::describe(body, &self.arena)),
            ));
        };

        let mut assignments = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let Some(("to", property, [value])) = shapes::method_call(pair) else {
                return Err(ParseError::unrecognized(
                    pair.span,
                    "assignment without `to`",
                ));
            };
            assignments.push(Assignment {
                property: self.parse_expr(property, scope, dynamics)?,
                value: self.parse_expr(value, scope, dynamics)?,
            });
        }
        Ok(assignments)
    }

    fn parse_action_filter(
        &mut self,
        expr: &HostExpr,
        mut action: Action,
        f: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Action> {
        let Some((param, body)) = shapes::lambda1(f) else {
            return Err(ParseError::unrecognized(expr.span, "arguments of `filter`"));
        };
        let (alias, slot) = match &mut action {
            Action::Update { alias, filter, .. } | Action::Delete { alias, filter, .. } => {
                (alias.clone(), filter)
            }
            _ => {
                return Err(ParseError::unrecognized(
                    expr.span,
                    "`filter` on an action without a filter clause",
                ));
            }
        };
        if slot.is_some() {
            return Err(ParseError::unrecognized(
                expr.span,
                "second `filter` on the same action",
            ));
        }
        let inner = scope.with(&param.name, alias);
        *slot = Some(self.parse_expr(body, &inner, dynamics)?);
        Ok(action)
    }

    fn parse_returning(
        &mut self,
        expr: &HostExpr,
        mut action: Action,
        f: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Action> {
        let Some((param, body)) = shapes::lambda1(f) else {
            return Err(ParseError::unrecognized(expr.span, "arguments of `returning`"));
        };
        let (alias, slot) = match &mut action {
            Action::Insert {
                alias, returning, ..
            }
            | Action::Update {
                alias, returning, ..
            }
            | Action::Delete {
                alias, returning, ..
            } => (alias.clone(), returning),
            Action::Tag { .. } => {
                return Err(ParseError::unrecognized(
                    expr.span,
                    "`returning` on a spliced action",
                ));
            }
        };
        if slot.is_some() {
            return Err(ParseError::unrecognized(
                expr.span,
                "second `returning` on the same action",
            ));
        }
        let inner = scope.with(&param.name, alias.clone());
        let output = self.parse_expr(body, &inner, dynamics)?;
        *slot = Some(Returning { id: alias, output });
        Ok(action)
    }
}
