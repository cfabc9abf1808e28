//! Splicing one capture into another.

use quarry_core::{Action, ContainerTag, Expr, Query, Xr};

use super::{ParseError, ParseResult};
use crate::chain::Projection;
use crate::compile::Compiler;
use crate::container::CaptureContainer;
use crate::diagnostics::DiagnosticKind;
use crate::dynamics::DynamicsAccum;
use crate::host::{Callee, ExprKind, HostExpr};

impl Compiler<'_> {
    /// Splice the capture `target` evaluates to.
    ///
    /// A statically known container is inlined and its params (and runtimes,
    /// when it has any) are inherited from `target`. Anything else becomes a
    /// runtime fragment behind a fresh `Tag`.
    pub(crate) fn splice(
        &mut self,
        target: &HostExpr,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Xr> {
        let Some(kind) = target.ty.capture_kind() else {
            return Err(ParseError::unrecognized(
                target.span,
                format!("splice of non-capture type `{}`", target.ty),
            ));
        };

        let chain = self.build_from(target)?;
        let container = match self.ascend(chain)? {
            Projection::Resolved(c) | Projection::Pluckable(c) => Some(c),
            Projection::NoResult => self.installed_pluckable(target),
        };

        let Some(container) = container else {
            return self.splice_runtime(target, kind, dynamics);
        };

        let xr = container.decode().map_err(|e| {
            ParseError::invalid(DiagnosticKind::MalformedXr, target.span, e.to_string())
        })?;
        if xr.tag() != kind {
            return Err(ParseError::invalid(
                DiagnosticKind::MalformedXr,
                target.span,
                format!("expected a {kind} capture, found {}", xr.tag()),
            ));
        }

        dynamics.inherit_params(target.clone());
        if container.is_pluckable() {
            dynamics.inherit_runtimes(target.clone());
        }
        log::debug!(
            "inlined {kind} capture at {:?} ({})",
            target.span,
            if container.is_pluckable() {
                "pluckable"
            } else {
                "uprootable"
            }
        );
        Ok(xr)
    }

    fn splice_runtime(
        &mut self,
        target: &HostExpr,
        kind: ContainerTag,
        dynamics: &mut DynamicsAccum,
    ) -> ParseResult<Xr> {
        if kind == ContainerTag::ActionBatch {
            return Err(ParseError::unrecognized(
                target.span,
                "runtime splice of an action batch",
            ));
        }
        let bid = self.bids.fresh();
        let ty = target.ty.to_xr_type();
        let xr = match kind {
            ContainerTag::Query => Xr::Query(Query::Tag { bid, ty }),
            ContainerTag::Expr => Xr::Expr(Expr::Tag { bid, ty }),
            _ => Xr::Action(Action::Tag { bid }),
        };
        dynamics.add_runtime(bid, target.clone());
        log::debug!("runtime fragment {bid} at {:?}", target.span);
        Ok(xr)
    }

    /// A Pluckable container already installed where `target` reads from.
    pub(crate) fn installed_pluckable(&self, target: &HostExpr) -> Option<CaptureContainer> {
        let id = match &target.kind {
            ExprKind::Container(c) => return c.is_pluckable().then(|| (**c).clone()),
            ExprKind::DeclRef(id)
            | ExprKind::Call {
                callee: Callee::Decl(id),
                ..
            } => *id,
            _ => return None,
        };
        let container = self.arena.get(id)?.body.as_ref()?.as_container()?;
        container
            .is_pluckable()
            .then(|| container.replant(target))
    }
}
