use quarry_core::ContainerTag;

use super::{OwnerChain, Root};
use crate::compile::Compiler;
use crate::container::CaptureContainer;
use crate::diagnostics::DiagnosticKind;
use crate::host::{Callee, Decl, DeclId, DeclKind, ExprKind, HostExpr};
use crate::parse::shapes::{self, EntryKind};
use crate::store::Lookup;
use crate::{Error, Result};

/// The fatal error for a foreign declaration that cannot share its capture.
pub(crate) fn eligibility_error(decl: &Decl, store_enabled: bool) -> Error {
    let fix = if !store_enabled {
        "enable cross-module captures"
    } else {
        "declare it `inline`"
    };
    Error::CrossModuleEligibility {
        name: decl.name.clone(),
        path: decl.qualified_path.clone(),
        fix,
    }
}

impl Compiler<'_> {
    /// Walk from a use site down to the capture it evaluates to.
    pub(crate) fn build_from(&mut self, expr: &HostExpr) -> Result<OwnerChain> {
        let mut visited = Vec::new();
        self.build_chain(expr, None, &mut visited)
    }

    /// `owner` is the declaration whose body `expr` is, if any.
    pub(crate) fn build_chain(
        &mut self,
        expr: &HostExpr,
        owner: Option<DeclId>,
        visited: &mut Vec<DeclId>,
    ) -> Result<OwnerChain> {
        if let Some(container) = expr.as_container() {
            let root = if container.is_uprootable() {
                Root::Uprootable(container.clone())
            } else {
                Root::Unknown
            };
            return Ok(OwnerChain::Root(root));
        }
        if let Some(entry) = shapes::capture_entry(expr) {
            let kind = match entry.kind {
                EntryKind::Select => Some(ContainerTag::Query),
                EntryKind::Expression => Some(ContainerTag::Expr),
                EntryKind::Batch => Some(ContainerTag::ActionBatch),
                EntryKind::Capture => expr.ty.capture_kind(),
            };
            let root = match kind {
                Some(kind) => Root::Virgin {
                    kind,
                    expr: expr.clone(),
                    owner,
                },
                None => Root::Unknown,
            };
            return Ok(OwnerChain::Root(root));
        }

        match &expr.kind {
            ExprKind::DeclRef(id)
            | ExprKind::Call {
                callee: Callee::Decl(id),
                ..
            } => self.through_decl(*id, expr, visited),
            _ => Ok(OwnerChain::Root(Root::Unknown)),
        }
    }

    fn through_decl(
        &mut self,
        id: DeclId,
        site: &HostExpr,
        visited: &mut Vec<DeclId>,
    ) -> Result<OwnerChain> {
        let unknown = Ok(OwnerChain::Root(Root::Unknown));
        if visited.contains(&id) || self.in_progress.contains(&id) {
            log::debug!("owner chain stops at {id}: cyclic or in progress");
            return unknown;
        }
        visited.push(id);

        let decl = &self.arena[id];
        if decl.captured_function {
            return unknown;
        }
        if decl.is_foreign() {
            let decl = decl.clone();
            return self.from_store(&decl, site);
        }
        if matches!(decl.kind, DeclKind::Variable { mutable: true }) {
            return unknown;
        }
        let Some(body) = decl.body.clone() else {
            return unknown;
        };
        let kind = decl.kind.clone();

        let parent = Box::new(self.build_chain(&body, Some(id), visited)?);
        let site = site.clone();
        Ok(match kind {
            DeclKind::Function { .. } => OwnerChain::SourcedFunction {
                decl: id,
                site,
                parent,
            },
            DeclKind::Field => OwnerChain::SourcedField {
                decl: id,
                site,
                parent,
            },
            DeclKind::Variable { .. } => OwnerChain::SourcedVariable {
                decl: id,
                site,
                parent,
            },
        })
    }

    /// A foreign declaration: eligibility, then the store.
    fn from_store(&mut self, decl: &Decl, site: &HostExpr) -> Result<OwnerChain> {
        let Some(kind) = decl.ty.capture_kind() else {
            return Ok(OwnerChain::Root(Root::Unknown));
        };
        if !self.store.is_eligible(decl) {
            return Err(eligibility_error(decl, self.store.is_enabled()));
        }

        let root = match self.store.get_stored(decl, kind)? {
            Lookup::Found(xr) => Root::FromStore(CaptureContainer::from_store(kind, xr, site)),
            Lookup::KindMismatch { found } => {
                self.diagnostics
                    .report(DiagnosticKind::StoreKindMismatch, site.span)
                    .message(decl.qualified_path.clone())
                    .related_to(format!("stored as {found}, used as {kind}"), decl.span)
                    .emit();
                Root::Unknown
            }
            Lookup::Missing => Root::Unknown,
        };
        Ok(OwnerChain::Root(root))
    }
}
