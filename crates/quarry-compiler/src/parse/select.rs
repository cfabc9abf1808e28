//! Select block parsing.
//!
//! Staged: classify the statements, validate their order, then parse each
//! clause in the scope of the identifiers bound before it.

use quarry_core::{
    Direction, Expr, Ident, JoinKind, Literal, SelectClause, SelectStep, SortKey, XrType,
};

use super::shapes;
use super::{ParseError, ParseResult, Scope};
use crate::compile::Compiler;
use crate::diagnostics::DiagnosticKind;
use crate::dynamics::DynamicsAccum;
use crate::host::{ExprKind, HostExpr, Stmt};
use crate::select_order::{self, ClauseKind, OrderError};

/// One classified statement of a select block.
struct Clause<'e> {
    kind: ClauseKind,
    stmt: &'e Stmt,
}

fn classify(stmt: &Stmt) -> Option<ClauseKind> {
    let call = match stmt {
        Stmt::Val { init, .. } => init,
        Stmt::Destructure { .. } => return Some(ClauseKind::Assign),
        Stmt::Expr(e) => e,
    };
    let kind = match (stmt, call.call_name()) {
        (Stmt::Val { .. }, Some("from")) => ClauseKind::From,
        (Stmt::Val { .. }, Some("join" | "joinLeft")) => ClauseKind::Join,
        (Stmt::Val { .. }, _) => ClauseKind::Assign,
        (_, Some("where")) => ClauseKind::Where,
        (_, Some("groupBy")) => ClauseKind::GroupBy,
        (_, Some("sortBy")) => ClauseKind::SortBy,
        _ => return None,
    };
    Some(kind)
}

/// The argument of `where(..)` / `where { .. }`.
fn predicate_body(args: &[HostExpr]) -> Option<&HostExpr> {
    match args {
        [arg] => match shapes::lambda(arg) {
            Some(([], body)) => Some(body),
            Some(_) => None,
            None => Some(arg),
        },
        _ => None,
    }
}

impl Compiler<'_> {
    pub(crate) fn parse_select(
        &mut self,
        body: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<SelectClause> {
        let (statements, result) = match &body.kind {
            ExprKind::Block { statements, result } => (statements.as_slice(), result.as_deref()),
            _ => (&[][..], Some(body)),
        };

        let mut clauses = Vec::with_capacity(statements.len());
        for stmt in statements {
            let Some(kind) = classify(stmt) else {
                return Err(ParseError::unrecognized(
                    stmt.span(),
                    "statement in select block",
                ));
            };
            clauses.push(Clause { kind, stmt });
        }

        let errors = select_order::validate(clauses.iter().map(|c| (c.kind, c.stmt.span())));
        if !errors.is_empty() {
            for error in &errors {
                self.report_order_error(error);
            }
            return Err(ParseError::Reported);
        }
        let Some(result) = result else {
            return Err(ParseError::bare(
                DiagnosticKind::MissingSelectResult,
                body.span,
            ));
        };

        let mut scope = scope.clone();
        let mut select = SelectClause {
            steps: Vec::new(),
            filter: None,
            group_by: None,
            sort_by: None,
            result: Expr::literal(Literal::Null),
        };
        for clause in &clauses {
            self.parse_clause(clause, &mut select, &mut scope, dynamics)?;
        }
        select.result = self.parse_expr(result, &scope, dynamics)?;
        Ok(select)
    }

    fn report_order_error(&mut self, error: &OrderError) {
        let kind = match error {
            OrderError::OutOfOrder { .. } => DiagnosticKind::ClauseOutOfOrder,
            OrderError::Duplicate { .. } => DiagnosticKind::DuplicateModifier,
        };
        let builder = self
            .diagnostics
            .report(kind, error.range())
            .message(error.message());
        match error {
            OrderError::Duplicate { first, .. } => builder.related_to("first used here", *first),
            OrderError::OutOfOrder { .. } => builder,
        }
        .emit();
    }

    fn parse_clause(
        &mut self,
        clause: &Clause<'_>,
        select: &mut SelectClause,
        scope: &mut Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<()> {
        let span = clause.stmt.span();
        let shape_error =
            || ParseError::unrecognized(span, format!("arguments of `{}`", clause.kind.keyword()));

        match (clause.kind, clause.stmt) {
            (ClauseKind::From, Stmt::Val { name, init, .. }) => {
                let [source] = call_args(init) else {
                    return Err(shape_error());
                };
                let source = self.parse_query(source, scope, dynamics)?;
                let id = Ident::new(name.clone(), source.ty());
                scope.bind(name, id.clone());
                select.steps.push(SelectStep::From { id, source });
            }
            (ClauseKind::Join, Stmt::Val { name, init, .. }) => {
                let [source, on] = call_args(init) else {
                    return Err(shape_error());
                };
                let kind = match init.call_name() {
                    Some("joinLeft") => JoinKind::Left,
                    _ => JoinKind::Inner,
                };
                let source = self.parse_query(source, scope, dynamics)?;
                let id = Ident::new(name.clone(), source.ty());
                let (on_scope, on_body) = match shapes::lambda(on) {
                    Some(([param], body)) => (scope.with(&param.name, id.clone()), body),
                    Some(([], body)) => (scope.with(name, id.clone()), body),
                    _ => return Err(shape_error()),
                };
                let on = self.parse_expr(on_body, &on_scope, dynamics)?;
                scope.bind(name, id.clone());
                select.steps.push(SelectStep::Join {
                    id,
                    kind,
                    source,
                    on,
                });
            }
            (ClauseKind::Assign, Stmt::Val { name, init, .. }) => {
                let value = self.parse_expr(init, scope, dynamics)?;
                let id = Ident::new(name.clone(), value.ty());
                scope.bind(name, id.clone());
                select.steps.push(SelectStep::Assign {
                    ids: vec![id],
                    value,
                });
            }
            (ClauseKind::Assign, Stmt::Destructure { names, init }) => {
                let value = self.parse_expr(init, scope, dynamics)?;
                let value_ty = value.ty();
                let ids: Vec<Ident> = names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let ty = match &value_ty {
                            XrType::Product { fields, .. } => fields
                                .get(i)
                                .map_or(XrType::Unknown, |(_, ty)| ty.clone()),
                            _ => XrType::Unknown,
                        };
                        Ident::new(name.clone(), ty)
                    })
                    .collect();
                for id in &ids {
                    scope.bind(&id.name, id.clone());
                }
                select.steps.push(SelectStep::Assign { ids, value });
            }
            (ClauseKind::Where, Stmt::Expr(call)) => {
                let body = predicate_body(call_args(call)).ok_or_else(shape_error)?;
                select.filter = Some(self.parse_expr(body, scope, dynamics)?);
            }
            (ClauseKind::GroupBy, Stmt::Expr(call)) => {
                let mut keys = Vec::new();
                for arg in call_args(call) {
                    keys.push(self.parse_expr(arg, scope, dynamics)?);
                }
                select.group_by = Some(match keys.len() {
                    0 => return Err(shape_error()),
                    1 => keys.remove(0),
                    _ => Expr::Product {
                        name: "Tuple".to_string(),
                        fields: keys
                            .into_iter()
                            .enumerate()
                            .map(|(i, e)| (format!("_{}", i + 1), e))
                            .collect(),
                    },
                });
            }
            (ClauseKind::SortBy, Stmt::Expr(call)) => {
                let mut keys = Vec::new();
                for arg in call_args(call) {
                    let (direction, key) = match (arg.call_name(), call_args(arg)) {
                        (Some("asc"), [key]) => (Direction::Asc, key),
                        (Some("desc"), [key]) => (Direction::Desc, key),
                        _ => (Direction::Asc, arg),
                    };
                    keys.push(SortKey {
                        expr: self.parse_expr(key, scope, dynamics)?,
                        direction,
                    });
                }
                if keys.is_empty() {
                    return Err(shape_error());
                }
                select.sort_by = Some(keys);
            }
            _ => return Err(shape_error()),
        }
        Ok(())
    }
}

fn call_args(expr: &HostExpr) -> &[HostExpr] {
    match &expr.kind {
        ExprKind::Call { args, .. } => args,
        _ => &[],
    }
}
