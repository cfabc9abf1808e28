//! XR visitor.
//!
//! Implement `Visitor` and override `visit_*` to add logic. Call the matching
//! `walk_*` inside an override to continue recursion (or omit it to stop).

use crate::xr::{Action, BatchAction, Expr, Query, SelectStep, Xr};
use crate::Bid;

pub trait Visitor: Sized {
    fn visit_query(&mut self, query: &Query) {
        walk_query(self, query);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_action(&mut self, action: &Action) {
        walk_action(self, action);
    }
}

pub fn walk_xr<V: Visitor>(visitor: &mut V, xr: &Xr) {
    match xr {
        Xr::Query(q) => visitor.visit_query(q),
        Xr::Expr(e) => visitor.visit_expr(e),
        Xr::Action(a) => visitor.visit_action(a),
        Xr::Batch(BatchAction { action, .. }) => visitor.visit_action(action),
    }
}

pub fn walk_query<V: Visitor>(visitor: &mut V, query: &Query) {
    match query {
        Query::Entity { .. } | Query::Ident(_) | Query::Tag { .. } => {}
        Query::Filter { head, body, .. } | Query::Map { head, body, .. } => {
            visitor.visit_query(head);
            visitor.visit_expr(body);
        }
        Query::FlatMap { head, body, .. } => {
            visitor.visit_query(head);
            visitor.visit_query(body);
        }
        Query::SortBy { head, keys, .. } => {
            visitor.visit_query(head);
            for key in keys {
                visitor.visit_expr(&key.expr);
            }
        }
        Query::Take { head, count } | Query::Drop { head, count } => {
            visitor.visit_query(head);
            visitor.visit_expr(count);
        }
        Query::Distinct { head } => visitor.visit_query(head),
        Query::Union { left, right, .. } => {
            visitor.visit_query(left);
            visitor.visit_query(right);
        }
        Query::Select(clause) => {
            for step in &clause.steps {
                match step {
                    SelectStep::From { source, .. } => visitor.visit_query(source),
                    SelectStep::Join { source, on, .. } => {
                        visitor.visit_query(source);
                        visitor.visit_expr(on);
                    }
                    SelectStep::Assign { value, .. } => visitor.visit_expr(value),
                }
            }
            if let Some(filter) = &clause.filter {
                visitor.visit_expr(filter);
            }
            if let Some(group_by) = &clause.group_by {
                visitor.visit_expr(group_by);
            }
            for key in clause.sort_by.iter().flatten() {
                visitor.visit_expr(&key.expr);
            }
            visitor.visit_expr(&clause.result);
        }
        Query::FromExpr(e) => visitor.visit_expr(e),
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Ident(_) | Expr::Const { .. } | Expr::Param { .. } | Expr::Tag { .. } => {}
        Expr::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expr::Unary { operand, .. } => visitor.visit_expr(operand),
        Expr::Property { of, .. } => visitor.visit_expr(of),
        Expr::When { branches, otherwise } => {
            for branch in branches {
                visitor.visit_expr(&branch.cond);
                visitor.visit_expr(&branch.then);
            }
            visitor.visit_expr(otherwise);
        }
        Expr::Product { fields, .. } => {
            for (_, value) in fields {
                visitor.visit_expr(value);
            }
        }
        Expr::Block { bindings, output } => {
            for (_, value) in bindings {
                visitor.visit_expr(value);
            }
            visitor.visit_expr(output);
        }
        Expr::MethodCall { head, args, .. } => {
            visitor.visit_expr(head);
            for arg in args {
                visitor.visit_expr(arg);
            }
        }
        Expr::Subquery(q) => visitor.visit_query(q),
    }
}

pub fn walk_action<V: Visitor>(visitor: &mut V, action: &Action) {
    let (target, assignments, filter, returning) = match action {
        Action::Insert {
            target,
            assignments,
            returning,
            ..
        } => (target, assignments.as_slice(), None, returning),
        Action::Update {
            target,
            assignments,
            filter,
            returning,
            ..
        } => (target, assignments.as_slice(), filter.as_ref(), returning),
        Action::Delete {
            target,
            filter,
            returning,
            ..
        } => (target, &[][..], filter.as_ref(), returning),
        Action::Tag { .. } => return,
    };
    visitor.visit_query(target);
    for assignment in assignments {
        visitor.visit_expr(&assignment.property);
        visitor.visit_expr(&assignment.value);
    }
    if let Some(filter) = filter {
        visitor.visit_expr(filter);
    }
    if let Some(returning) = returning {
        visitor.visit_expr(&returning.output);
    }
}

/// Collects bind identifiers in traversal order.
#[derive(Default)]
struct BidCollector {
    bids: Vec<Bid>,
    runtime_tags: usize,
}

impl Visitor for BidCollector {
    fn visit_query(&mut self, query: &Query) {
        if let Query::Tag { bid, .. } = query {
            self.bids.push(*bid);
            self.runtime_tags += 1;
        }
        walk_query(self, query);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Param { bid, .. } => self.bids.push(*bid),
            Expr::Tag { bid, .. } => {
                self.bids.push(*bid);
                self.runtime_tags += 1;
            }
            _ => {}
        }
        walk_expr(self, expr);
    }

    fn visit_action(&mut self, action: &Action) {
        if let Action::Tag { bid } = action {
            self.bids.push(*bid);
            self.runtime_tags += 1;
        }
        walk_action(self, action);
    }
}

impl Xr {
    /// Every parameter and runtime bind identifier, in traversal order.
    pub fn bids(&self) -> Vec<Bid> {
        let mut collector = BidCollector::default();
        walk_xr(&mut collector, self);
        collector.bids
    }

    /// Whether any runtime-only fragment placeholder remains.
    pub fn has_runtime_tags(&self) -> bool {
        let mut collector = BidCollector::default();
        walk_xr(&mut collector, self);
        collector.runtime_tags > 0
    }
}

/// Mutable counterpart of [`Visitor`].
pub trait VisitorMut: Sized {
    fn visit_query_mut(&mut self, query: &mut Query) {
        walk_query_mut(self, query);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }

    fn visit_action_mut(&mut self, action: &mut Action) {
        walk_action_mut(self, action);
    }
}

pub fn walk_xr_mut<V: VisitorMut>(visitor: &mut V, xr: &mut Xr) {
    match xr {
        Xr::Query(q) => visitor.visit_query_mut(q),
        Xr::Expr(e) => visitor.visit_expr_mut(e),
        Xr::Action(a) => visitor.visit_action_mut(a),
        Xr::Batch(BatchAction { action, .. }) => visitor.visit_action_mut(action),
    }
}

pub fn walk_query_mut<V: VisitorMut>(visitor: &mut V, query: &mut Query) {
    match query {
        Query::Entity { .. } | Query::Ident(_) | Query::Tag { .. } => {}
        Query::Filter { head, body, .. } | Query::Map { head, body, .. } => {
            visitor.visit_query_mut(head);
            visitor.visit_expr_mut(body);
        }
        Query::FlatMap { head, body, .. } => {
            visitor.visit_query_mut(head);
            visitor.visit_query_mut(body);
        }
        Query::SortBy { head, keys, .. } => {
            visitor.visit_query_mut(head);
            for key in keys {
                visitor.visit_expr_mut(&mut key.expr);
            }
        }
        Query::Take { head, count } | Query::Drop { head, count } => {
            visitor.visit_query_mut(head);
            visitor.visit_expr_mut(count);
        }
        Query::Distinct { head } => visitor.visit_query_mut(head),
        Query::Union { left, right, .. } => {
            visitor.visit_query_mut(left);
            visitor.visit_query_mut(right);
        }
        Query::Select(clause) => {
            for step in &mut clause.steps {
                match step {
                    SelectStep::From { source, .. } => visitor.visit_query_mut(source),
                    SelectStep::Join { source, on, .. } => {
                        visitor.visit_query_mut(source);
                        visitor.visit_expr_mut(on);
                    }
                    SelectStep::Assign { value, .. } => visitor.visit_expr_mut(value),
                }
            }
            if let Some(filter) = &mut clause.filter {
                visitor.visit_expr_mut(filter);
            }
            if let Some(group_by) = &mut clause.group_by {
                visitor.visit_expr_mut(group_by);
            }
            for key in clause.sort_by.iter_mut().flatten() {
                visitor.visit_expr_mut(&mut key.expr);
            }
            visitor.visit_expr_mut(&mut clause.result);
        }
        Query::FromExpr(e) => visitor.visit_expr_mut(e),
    }
}

pub fn walk_expr_mut<V: VisitorMut>(visitor: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Ident(_) | Expr::Const { .. } | Expr::Param { .. } | Expr::Tag { .. } => {}
        Expr::Binary { left, right, .. } => {
            visitor.visit_expr_mut(left);
            visitor.visit_expr_mut(right);
        }
        Expr::Unary { operand, .. } => visitor.visit_expr_mut(operand),
        Expr::Property { of, .. } => visitor.visit_expr_mut(of),
        Expr::When { branches, otherwise } => {
            for branch in branches {
                visitor.visit_expr_mut(&mut branch.cond);
                visitor.visit_expr_mut(&mut branch.then);
            }
            visitor.visit_expr_mut(otherwise);
        }
        Expr::Product { fields, .. } => {
            for (_, value) in fields {
                visitor.visit_expr_mut(value);
            }
        }
        Expr::Block { bindings, output } => {
            for (_, value) in bindings {
                visitor.visit_expr_mut(value);
            }
            visitor.visit_expr_mut(output);
        }
        Expr::MethodCall { head, args, .. } => {
            visitor.visit_expr_mut(head);
            for arg in args {
                visitor.visit_expr_mut(arg);
            }
        }
        Expr::Subquery(q) => visitor.visit_query_mut(q),
    }
}

pub fn walk_action_mut<V: VisitorMut>(visitor: &mut V, action: &mut Action) {
    let (target, assignments, filter, returning) = match action {
        Action::Insert {
            target,
            assignments,
            returning,
            ..
        } => (target, assignments.as_mut_slice(), None, returning),
        Action::Update {
            target,
            assignments,
            filter,
            returning,
            ..
        } => (target, assignments.as_mut_slice(), filter.as_mut(), returning),
        Action::Delete {
            target,
            filter,
            returning,
            ..
        } => (target, &mut [][..], filter.as_mut(), returning),
        Action::Tag { .. } => return,
    };
    visitor.visit_query_mut(target);
    for assignment in assignments {
        visitor.visit_expr_mut(&mut assignment.property);
        visitor.visit_expr_mut(&mut assignment.value);
    }
    if let Some(filter) = filter {
        visitor.visit_expr_mut(filter);
    }
    if let Some(returning) = returning {
        visitor.visit_expr_mut(&mut returning.output);
    }
}

/// Rewrites bind identifiers in traversal order.
struct BidRewriter<F> {
    f: F,
}

impl<F: FnMut(Bid) -> Bid> VisitorMut for BidRewriter<F> {
    fn visit_query_mut(&mut self, query: &mut Query) {
        if let Query::Tag { bid, .. } = query {
            *bid = (self.f)(*bid);
        }
        walk_query_mut(self, query);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let Expr::Param { bid, .. } | Expr::Tag { bid, .. } = expr {
            *bid = (self.f)(*bid);
        }
        walk_expr_mut(self, expr);
    }

    fn visit_action_mut(&mut self, action: &mut Action) {
        if let Action::Tag { bid } = action {
            *bid = (self.f)(*bid);
        }
        walk_action_mut(self, action);
    }
}

impl Xr {
    /// Replace every bind identifier with `f(bid)`, visiting them in the
    /// same order as [`Xr::bids`].
    pub fn map_bids(&mut self, f: impl FnMut(Bid) -> Bid) {
        walk_xr_mut(&mut BidRewriter { f }, self);
    }
}
