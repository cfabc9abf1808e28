//! Beta reduction over XR.
//!
//! Replaces free occurrences of identifiers with replacement trees. Used to
//! inline captured functions: the body is reduced with `{param -> argument}`.
//!
//! Binders shadow the substitution inside their scope: lambda ids of query
//! combinators, select `from`/`join`/assignment ids, block bindings, action
//! aliases, returning ids and batch aliases. A binder whose name occurs in a
//! replacement still visible inside its scope is renamed first (`p` becomes
//! `p_1`), so a substituted identifier never refers to the wrong binder.

use std::borrow::Cow;
use std::collections::HashSet;

use indexmap::IndexMap;
use quarry_core::visitor::{Visitor, walk_action, walk_expr, walk_query, walk_xr};
use quarry_core::{
    Action, Assignment, BatchAction, Branch, Expr, Ident, Query, Returning, SelectClause,
    SelectStep, SortKey, Xr, XrType,
};

/// Identifier name to replacement tree.
pub type Substitution = IndexMap<String, Xr>;

/// A replacement whose type could not be reconciled with its use site.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionWarning {
    pub name: String,
    pub expected: XrType,
    pub found: XrType,
}

impl std::fmt::Display for ReductionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`{}` is used as {} but was given {}",
            self.name, self.expected, self.found
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub xr: Xr,
    pub warnings: Vec<ReductionWarning>,
}

/// Reduce `xr` under `map`. Total: every input produces a tree.
pub fn reduce(xr: &Xr, map: &Substitution) -> Reduction {
    if map.is_empty() {
        return Reduction {
            xr: xr.clone(),
            warnings: Vec::new(),
        };
    }
    let mut taken = names(xr);
    for (name, replacement) in map {
        taken.insert(name.clone());
        taken.extend(names(replacement));
    }
    let mut reducer = Reducer {
        warnings: Vec::new(),
        taken,
        renamed: HashSet::new(),
    };
    let xr = reducer.xr(xr, map);
    Reduction {
        xr,
        warnings: reducer.warnings,
    }
}

/// `map` without the given names, borrowed when nothing is removed.
fn shadow<'m, 'n>(
    map: &'m Substitution,
    names: impl IntoIterator<Item = &'n str>,
) -> Cow<'m, Substitution> {
    let mut out = Cow::Borrowed(map);
    for name in names {
        if out.contains_key(name) {
            out.to_mut().shift_remove(name);
        }
    }
    out
}

/// Every identifier name in `xr`, bound or free.
fn names(xr: &Xr) -> HashSet<String> {
    let mut collector = NameCollector::default();
    if let Xr::Batch(b) = xr {
        collector.names.insert(b.alias.name.clone());
    }
    walk_xr(&mut collector, xr);
    collector.names
}

#[derive(Default)]
struct NameCollector {
    names: HashSet<String>,
}

impl NameCollector {
    fn add(&mut self, id: &Ident) {
        if !self.names.contains(&id.name) {
            self.names.insert(id.name.clone());
        }
    }
}

impl Visitor for NameCollector {
    fn visit_query(&mut self, query: &Query) {
        match query {
            Query::Ident(id)
            | Query::Filter { id, .. }
            | Query::Map { id, .. }
            | Query::FlatMap { id, .. }
            | Query::SortBy { id, .. } => self.add(id),
            Query::Select(clause) => {
                for step in &clause.steps {
                    match step {
                        SelectStep::From { id, .. } | SelectStep::Join { id, .. } => self.add(id),
                        SelectStep::Assign { ids, .. } => ids.iter().for_each(|id| self.add(id)),
                    }
                }
            }
            _ => {}
        }
        walk_query(self, query);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(id) => self.add(id),
            Expr::Block { bindings, .. } => bindings.iter().for_each(|(id, _)| self.add(id)),
            _ => {}
        }
        walk_expr(self, expr);
    }

    fn visit_action(&mut self, action: &Action) {
        match action {
            Action::Insert {
                alias, returning, ..
            }
            | Action::Update {
                alias, returning, ..
            }
            | Action::Delete {
                alias, returning, ..
            } => {
                self.add(alias);
                if let Some(r) = returning {
                    self.add(&r.id);
                }
            }
            Action::Tag { .. } => {}
        }
        walk_action(self, action);
    }
}

struct Reducer {
    warnings: Vec<ReductionWarning>,
    /// Names that a renamed binder must not take.
    taken: HashSet<String>,
    /// Names introduced by renaming.
    renamed: HashSet<String>,
}

impl Reducer {
    fn xr(&mut self, xr: &Xr, map: &Substitution) -> Xr {
        match xr {
            Xr::Query(q) => Xr::Query(self.query(q, map)),
            Xr::Expr(e) => Xr::Expr(self.expr(e, map)),
            Xr::Action(a) => Xr::Action(self.action(a, map)),
            Xr::Batch(b) => {
                let (alias, inner) = self.bind(&b.alias, map);
                Xr::Batch(BatchAction {
                    alias,
                    action: self.action(&b.action, &inner),
                })
            }
        }
    }

    /// Enter the scope of binder `id`: the identifier to emit and the map
    /// for its scope.
    fn bind<'m>(&mut self, id: &Ident, map: &'m Substitution) -> (Ident, Cow<'m, Substitution>) {
        let mut inner = shadow(map, [id.name.as_str()]);
        if !inner.values().any(|r| names(r).contains(&id.name)) {
            return (id.clone(), inner);
        }

        let mut n = 1;
        let fresh = loop {
            let candidate = format!("{}_{n}", id.name);
            if !self.taken.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        log::trace!("renaming binder `{}` to `{fresh}`", id.name);
        self.taken.insert(fresh.clone());
        self.renamed.insert(fresh.clone());

        let renamed = Ident::new(fresh, id.ty.clone());
        inner
            .to_mut()
            .insert(id.name.clone(), Xr::Expr(Expr::Ident(renamed.clone())));
        (renamed, inner)
    }

    /// The replacement for `name`, itself reduced under the rest of the map.
    /// Binder renames apply to the body only, never to replacements.
    fn replacement(&mut self, name: &str, map: &Substitution) -> Option<Xr> {
        let replacement = map.get(name)?;
        let own_name = match replacement {
            Xr::Expr(Expr::Ident(id)) | Xr::Query(Query::Ident(id)) => Some(id.name.as_str()),
            _ => None,
        };
        let renames: Vec<&str> = map
            .iter()
            .filter(|(_, r)| matches!(r, Xr::Expr(Expr::Ident(id)) if self.renamed.contains(&id.name)))
            .map(|(n, _)| n.as_str())
            .collect();
        let rest = shadow(
            map,
            std::iter::once(name).chain(own_name).chain(renames),
        );
        Some(self.xr(replacement, &rest))
    }

    /// Retag a terminal replacement to agree with its use site.
    fn correct(&mut self, site: &Ident, replacement: Expr) -> Expr {
        let found = replacement.ty();
        let expected = &site.ty;
        if !replacement.is_terminal()
            || found.is_bottom()
            || expected.is_bottom()
            || *expected == XrType::Generic
            || *expected == found
        {
            return replacement;
        }
        if expected.is_more_specific_than(&found) {
            let ty = expected
                .least_upper_bound(&found)
                .unwrap_or_else(|| expected.clone());
            return replacement.with_type(ty);
        }
        if expected.least_upper_bound(&found).is_some() {
            return replacement;
        }

        log::warn!(
            "substituting `{}`: expected {expected}, found {found}; typed as Unknown",
            site.name
        );
        self.warnings.push(ReductionWarning {
            name: site.name.clone(),
            expected: expected.clone(),
            found,
        });
        replacement.with_type(XrType::Unknown)
    }

    fn boxed(&mut self, e: &Expr, map: &Substitution) -> Box<Expr> {
        Box::new(self.expr(e, map))
    }

    fn expr(&mut self, e: &Expr, map: &Substitution) -> Expr {
        match e {
            Expr::Ident(id) => match self.replacement(&id.name, map).and_then(Xr::into_expr) {
                Some(replacement) => self.correct(id, replacement),
                None => e.clone(),
            },
            Expr::Const { .. } | Expr::Param { .. } | Expr::Tag { .. } => e.clone(),
            Expr::Binary { op, left, right } => Expr::Binary {
                op: *op,
                left: self.boxed(left, map),
                right: self.boxed(right, map),
            },
            Expr::Unary { op, operand } => Expr::Unary {
                op: *op,
                operand: self.boxed(operand, map),
            },
            Expr::Property { of, name, ty } => {
                let reduced = self.expr(of, map);
                if reduced != **of {
                    if let Expr::Product { fields, .. } = &reduced {
                        if let Some((_, field)) = fields.iter().find(|(n, _)| n == name) {
                            return field.clone();
                        }
                    }
                }
                Expr::Property {
                    of: Box::new(reduced),
                    name: name.clone(),
                    ty: ty.clone(),
                }
            }
            Expr::When {
                branches,
                otherwise,
            } => Expr::When {
                branches: branches
                    .iter()
                    .map(|b| Branch {
                        cond: self.expr(&b.cond, map),
                        then: self.expr(&b.then, map),
                    })
                    .collect(),
                otherwise: self.boxed(otherwise, map),
            },
            Expr::Product { name, fields } => Expr::Product {
                name: name.clone(),
                fields: fields
                    .iter()
                    .map(|(n, f)| (n.clone(), self.expr(f, map)))
                    .collect(),
            },
            Expr::Block { bindings, output } => {
                let mut scope = Cow::Borrowed(map);
                let mut reduced = Vec::with_capacity(bindings.len());
                for (id, value) in bindings {
                    let value = self.expr(value, &scope);
                    let (id, inner) = self.bind(id, &scope);
                    let inner = inner.into_owned();
                    reduced.push((id, value));
                    scope = Cow::Owned(inner);
                }
                Expr::Block {
                    bindings: reduced,
                    output: self.boxed(output, &scope),
                }
            }
            Expr::MethodCall {
                head,
                name,
                args,
                ty,
            } => Expr::MethodCall {
                head: self.boxed(head, map),
                name: name.clone(),
                args: args.iter().map(|a| self.expr(a, map)).collect(),
                ty: ty.clone(),
            },
            Expr::Subquery(q) => Expr::Subquery(Box::new(self.query(q, map))),
        }
    }

    fn sort_keys(&mut self, keys: &[SortKey], map: &Substitution) -> Vec<SortKey> {
        keys.iter()
            .map(|k| SortKey {
                expr: self.expr(&k.expr, map),
                direction: k.direction,
            })
            .collect()
    }

    fn query(&mut self, q: &Query, map: &Substitution) -> Query {
        match q {
            Query::Entity { .. } | Query::Tag { .. } => q.clone(),
            Query::Ident(id) => match self.replacement(&id.name, map) {
                Some(Xr::Query(query)) => query,
                Some(Xr::Expr(Expr::Ident(r))) if self.renamed.contains(&r.name) => {
                    Query::Ident(Ident::new(r.name, id.ty.clone()))
                }
                Some(Xr::Expr(Expr::Subquery(query))) => *query,
                Some(Xr::Expr(expr)) => Query::FromExpr(Box::new(expr)),
                _ => q.clone(),
            },
            Query::Filter { head, id, body } => {
                let head = Box::new(self.query(head, map));
                let (id, inner) = self.bind(id, map);
                Query::Filter {
                    head,
                    id,
                    body: self.boxed(body, &inner),
                }
            }
            Query::Map { head, id, body } => {
                let head = Box::new(self.query(head, map));
                let (id, inner) = self.bind(id, map);
                Query::Map {
                    head,
                    id,
                    body: self.boxed(body, &inner),
                }
            }
            Query::FlatMap { head, id, body } => {
                let head = Box::new(self.query(head, map));
                let (id, inner) = self.bind(id, map);
                Query::FlatMap {
                    head,
                    id,
                    body: Box::new(self.query(body, &inner)),
                }
            }
            Query::SortBy { head, id, keys } => {
                let head = Box::new(self.query(head, map));
                let (id, inner) = self.bind(id, map);
                Query::SortBy {
                    head,
                    id,
                    keys: self.sort_keys(keys, &inner),
                }
            }
            Query::Take { head, count } => Query::Take {
                head: Box::new(self.query(head, map)),
                count: self.boxed(count, map),
            },
            Query::Drop { head, count } => Query::Drop {
                head: Box::new(self.query(head, map)),
                count: self.boxed(count, map),
            },
            Query::Distinct { head } => Query::Distinct {
                head: Box::new(self.query(head, map)),
            },
            Query::Union { left, right, all } => Query::Union {
                left: Box::new(self.query(left, map)),
                right: Box::new(self.query(right, map)),
                all: *all,
            },
            Query::Select(clause) => Query::Select(Box::new(self.select(clause, map))),
            Query::FromExpr(e) => match self.expr(e, map) {
                Expr::Subquery(query) => *query,
                other => Query::FromExpr(Box::new(other)),
            },
        }
    }

    fn select(&mut self, clause: &SelectClause, map: &Substitution) -> SelectClause {
        let mut scope = Cow::Borrowed(map);
        let mut steps = Vec::with_capacity(clause.steps.len());
        for step in &clause.steps {
            let reduced = match step {
                SelectStep::From { id, source } => {
                    let source = self.query(source, &scope);
                    let (id, inner) = self.bind(id, &scope);
                    let inner = inner.into_owned();
                    scope = Cow::Owned(inner);
                    SelectStep::From { id, source }
                }
                SelectStep::Join {
                    id,
                    kind,
                    source,
                    on,
                } => {
                    let source = self.query(source, &scope);
                    let (id, inner) = self.bind(id, &scope);
                    let inner = inner.into_owned();
                    let on = self.expr(on, &inner);
                    scope = Cow::Owned(inner);
                    SelectStep::Join {
                        id,
                        kind: *kind,
                        source,
                        on,
                    }
                }
                SelectStep::Assign { ids, value } => {
                    let value = self.expr(value, &scope);
                    let mut bound = Vec::with_capacity(ids.len());
                    for id in ids {
                        let (id, inner) = self.bind(id, &scope);
                        let inner = inner.into_owned();
                        bound.push(id);
                        scope = Cow::Owned(inner);
                    }
                    SelectStep::Assign { ids: bound, value }
                }
            };
            steps.push(reduced);
        }

        SelectClause {
            steps,
            filter: clause.filter.as_ref().map(|e| self.expr(e, &scope)),
            group_by: clause.group_by.as_ref().map(|e| self.expr(e, &scope)),
            sort_by: clause.sort_by.as_ref().map(|k| self.sort_keys(k, &scope)),
            result: self.expr(&clause.result, &scope),
        }
    }

    fn assignments(&mut self, assignments: &[Assignment], map: &Substitution) -> Vec<Assignment> {
        assignments
            .iter()
            .map(|a| Assignment {
                property: self.expr(&a.property, map),
                value: self.expr(&a.value, map),
            })
            .collect()
    }

    fn returning(
        &mut self,
        returning: &Option<Returning>,
        map: &Substitution,
    ) -> Option<Returning> {
        returning.as_ref().map(|r| {
            let (id, inner) = self.bind(&r.id, map);
            Returning {
                id,
                output: self.expr(&r.output, &inner),
            }
        })
    }

    fn action(&mut self, a: &Action, map: &Substitution) -> Action {
        match a {
            Action::Insert {
                target,
                alias,
                assignments,
                returning,
            } => {
                let target = Box::new(self.query(target, map));
                let (alias, inner) = self.bind(alias, map);
                Action::Insert {
                    target,
                    alias,
                    assignments: self.assignments(assignments, &inner),
                    returning: self.returning(returning, &inner),
                }
            }
            Action::Update {
                target,
                alias,
                assignments,
                filter,
                returning,
            } => {
                let target = Box::new(self.query(target, map));
                let (alias, inner) = self.bind(alias, map);
                Action::Update {
                    target,
                    alias,
                    assignments: self.assignments(assignments, &inner),
                    filter: filter.as_ref().map(|e| self.expr(e, &inner)),
                    returning: self.returning(returning, &inner),
                }
            }
            Action::Delete {
                target,
                alias,
                filter,
                returning,
            } => {
                let target = Box::new(self.query(target, map));
                let (alias, inner) = self.bind(alias, map);
                Action::Delete {
                    target,
                    alias,
                    filter: filter.as_ref().map(|e| self.expr(e, &inner)),
                    returning: self.returning(returning, &inner),
                }
            }
            Action::Tag { .. } => a.clone(),
        }
    }
}
