//! Captured functions.
//!
//! A declaration flagged `captured_function` is never planted. Its body is
//! compiled once per compilation with the parameters in scope as XR
//! identifiers, then inlined at each call by beta reduction.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use quarry_core::{Bid, ContainerTag, Ident, Query, SerializedXr, Xr};
use rowan::TextRange;

use super::shapes::{self, EntryKind};
use super::{ParseError, ParseResult, Scope};
use crate::beta;
use crate::chain::eligibility_error;
use crate::compile::Compiler;
use crate::diagnostics::DiagnosticKind;
use crate::dynamics::DynamicsAccum;
use crate::host::{Decl, DeclId, ExprKind, HostExpr, HostType, LambdaParam};
use crate::store::Lookup;

/// A compiled captured-function body, ready for substitution.
#[derive(Debug, Clone)]
pub(crate) struct CapturedBody {
    pub params: Vec<LambdaParam>,
    pub xr: Xr,
    pub dynamics: DynamicsAccum,
}

impl Compiler<'_> {
    /// Inline a call to the captured function `id`.
    pub(crate) fn call_captured(
        &mut self,
        id: DeclId,
        call: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Xr> {
        let ExprKind::Call { receiver, args, .. } = &call.kind else {
            return Err(ParseError::unrecognized(
                call.span,
                "captured function used without a call",
            ));
        };
        let body = self.captured_body(id, call.span)?;

        let actuals: Vec<&HostExpr> = receiver.as_deref().into_iter().chain(args).collect();
        if actuals.len() != body.params.len() {
            return Err(ParseError::invalid(
                DiagnosticKind::InvalidCapturedFunction,
                call.span,
                format!(
                    "`{}` takes {} arguments, got {}",
                    self.arena[id].name,
                    body.params.len(),
                    actuals.len()
                ),
            ));
        }

        let mut inlined = DynamicsAccum::new();
        let mut map = IndexMap::with_capacity(actuals.len());
        for (param, arg) in body.params.iter().zip(actuals) {
            let value = match param.ty {
                HostType::Query(_) => Xr::Query(self.parse_query(arg, scope, &mut inlined)?),
                _ => Xr::Expr(self.parse_expr(arg, scope, &mut inlined)?),
            };
            map.insert(param.name.clone(), value);
        }

        let reduction = beta::reduce(&body.xr, &map);
        for warning in &reduction.warnings {
            self.diagnostics
                .report(DiagnosticKind::ReductionTypeMismatch, call.span)
                .message(warning.to_string())
                .emit();
        }

        let mut xr = reduction.xr;
        inlined.merge(body.dynamics);
        self.renumber_inlined(&mut xr, &mut inlined);
        dynamics.merge(inlined);
        Ok(xr)
    }

    /// Give the placeholders of one inlined call fresh BIDs in the order the
    /// reduced tree visits them. Bindings from the arguments and the body
    /// are rewritten to match. Placeholders owned by anything else keep
    /// their BIDs.
    fn renumber_inlined(&mut self, xr: &mut Xr, inlined: &mut DynamicsAccum) {
        let owned: HashSet<Bid> = inlined
            .params()
            .iter()
            .map(|p| p.bid)
            .chain(inlined.runtimes().iter().map(|r| r.bid))
            .collect();
        if owned.is_empty() {
            return;
        }

        let mut fresh: HashMap<Bid, Bid> = HashMap::with_capacity(owned.len());
        let bids = &mut self.bids;
        xr.map_bids(|bid| {
            if !owned.contains(&bid) {
                return bid;
            }
            *fresh.entry(bid).or_insert_with(|| bids.fresh())
        });
        inlined.renumber(|bid| fresh.get(&bid).copied());
    }

    /// The compiled body of a captured function, compiling it on first use.
    pub(crate) fn captured_body(&mut self, id: DeclId, span: TextRange) -> ParseResult<CapturedBody> {
        if let Some(body) = self.captured.get(&id) {
            return Ok(body.clone());
        }

        let decl = self.arena[id].clone();
        let body = if decl.is_foreign() {
            self.foreign_captured_body(&decl, span)?
        } else {
            self.local_captured_body(id, &decl)?
        };
        log::debug!(
            "compiled captured function `{}` ({} params)",
            decl.name,
            body.params.len()
        );
        self.captured.insert(id, body.clone());
        Ok(body)
    }

    fn local_captured_body(&mut self, id: DeclId, decl: &Decl) -> ParseResult<CapturedBody> {
        if self.in_progress.contains(&id) {
            return Err(ParseError::invalid(
                DiagnosticKind::RecursiveCapturedFunction,
                decl.span,
                decl.name.clone(),
            ));
        }
        let Some(body) = &decl.body else {
            return Err(ParseError::invalid(
                DiagnosticKind::InvalidCapturedFunction,
                decl.span,
                format!("`{}` has no body", decl.name),
            ));
        };

        let mut scope = Scope::new();
        for param in decl.params() {
            let ident = Ident::new(param.name.clone(), param.ty.to_xr_type());
            match param.ty {
                HostType::Query(_) => scope.bind_query(&param.name, ident),
                _ => scope.bind(&param.name, ident),
            }
        }

        self.in_progress.push(id);
        let mut dynamics = DynamicsAccum::new();
        let parsed = self.parse_captured_xr(decl, body, &scope, &mut dynamics);
        self.in_progress.pop();
        let xr = parsed?;

        if !dynamics.no_runtimes() {
            return Err(ParseError::invalid(
                DiagnosticKind::InvalidCapturedFunction,
                body.span,
                format!("`{}` splices a runtime-only capture", decl.name),
            ));
        }
        if self.store.is_eligible(decl) {
            if !dynamics.params().is_empty() || !dynamics.inherited_params().is_empty() {
                return Err(ParseError::invalid(
                    DiagnosticKind::InvalidCapturedFunction,
                    body.span,
                    format!(
                        "`{}` is shared across modules and cannot bind runtime parameters; pass them as arguments",
                        decl.name
                    ),
                ));
            }
            self.store
                .put_stored(decl, xr.tag(), &SerializedXr::encode(&xr))?;
        }

        Ok(CapturedBody {
            params: decl.params().to_vec(),
            xr,
            dynamics,
        })
    }

    /// Parse a captured function body by its declared return kind. A body
    /// wrapped in a capture entry is unwrapped first.
    fn parse_captured_xr(
        &mut self,
        decl: &Decl,
        body: &HostExpr,
        scope: &Scope,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Xr> {
        let (entry, inner) = match shapes::capture_entry(body) {
            Some(entry) => (Some(entry.kind), entry.body),
            None => (None, body),
        };
        match (entry, decl.ty.capture_kind()) {
            (Some(EntryKind::Select), _) => Ok(Xr::Query(Query::Select(Box::new(
                self.parse_select(inner, scope, dynamics)?,
            )))),
            (Some(EntryKind::Expression), _) | (_, Some(ContainerTag::Expr)) => {
                Ok(Xr::Expr(self.parse_expr(inner, scope, dynamics)?))
            }
            (_, Some(ContainerTag::Query)) => {
                Ok(Xr::Query(self.parse_query(inner, scope, dynamics)?))
            }
            (_, Some(ContainerTag::Action)) => {
                Ok(Xr::Action(self.parse_action(inner, scope, dynamics)?))
            }
            _ => Err(ParseError::invalid(
                DiagnosticKind::InvalidCapturedFunction,
                decl.span,
                format!("`{}` must return a query, expression or action", decl.name),
            )),
        }
    }

    fn foreign_captured_body(&mut self, decl: &Decl, span: TextRange) -> ParseResult<CapturedBody> {
        if !self.store.is_eligible(decl) {
            return Err(eligibility_error(decl, self.store.is_enabled()).into());
        }
        let Some(kind) = decl.ty.capture_kind() else {
            return Err(ParseError::invalid(
                DiagnosticKind::InvalidCapturedFunction,
                span,
                format!("`{}` must return a query, expression or action", decl.name),
            ));
        };

        let stored = match self.store.get_stored(decl, kind)? {
            Lookup::Found(stored) => stored,
            Lookup::KindMismatch { .. } => {
                self.diagnostics
                    .report(DiagnosticKind::StoreKindMismatch, span)
                    .message(decl.name.clone())
                    .emit();
                return Err(ParseError::invalid(
                    DiagnosticKind::InvalidCapturedFunction,
                    span,
                    format!("`{}` has no usable stored capture", decl.name),
                ));
            }
            Lookup::Missing => {
                return Err(ParseError::invalid(
                    DiagnosticKind::InvalidCapturedFunction,
                    span,
                    format!("`{}` was not found in the cross-module store", decl.name),
                ));
            }
        };
        let xr = stored.decode().map_err(|e| {
            ParseError::invalid(DiagnosticKind::MalformedXr, span, e.to_string())
        })?;
        if !xr.bids().is_empty() {
            return Err(ParseError::invalid(
                DiagnosticKind::MalformedXr,
                span,
                format!(
                    "stored capture for `{}` refers to runtime bindings it does not carry",
                    decl.name
                ),
            ));
        }

        Ok(CapturedBody {
            params: decl.params().to_vec(),
            xr,
            dynamics: DynamicsAccum::new(),
        })
    }
}
