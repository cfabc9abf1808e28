use super::{OwnerChain, Projection, Root};
use crate::compile::Compiler;
use crate::container::CaptureContainer;
use crate::host::{DeclId, ExprKind, HostExpr};
use crate::Result;

impl Compiler<'_> {
    /// Compile the root of `chain` and project the result up to its site.
    pub(crate) fn ascend(&mut self, chain: OwnerChain) -> Result<Projection> {
        let (decl, site, parent) = match chain {
            OwnerChain::Root(root) => return self.project_root(root),
            OwnerChain::SourcedFunction { decl, site, parent }
            | OwnerChain::SourcedField { decl, site, parent }
            | OwnerChain::SourcedVariable { decl, site, parent } => (decl, site, parent),
        };

        match self.ascend(*parent)? {
            Projection::Resolved(container) => {
                self.install(decl, &container)?;
                Ok(Projection::Resolved(container.replant(&site)))
            }
            Projection::Pluckable(_) | Projection::NoResult => Ok(Projection::NoResult),
        }
    }

    fn project_root(&mut self, root: Root) -> Result<Projection> {
        match root {
            Root::Uprootable(container) => Ok(Projection::Resolved(container)),
            Root::FromStore(container) if container.is_uprootable() => {
                Ok(Projection::Resolved(container))
            }
            Root::FromStore(container) => Ok(Projection::Pluckable(container)),
            Root::Unknown => Ok(Projection::NoResult),
            Root::Virgin { expr, owner, .. } => match self.compile_virgin(&expr, owner)? {
                Some(container) if container.is_uprootable() => {
                    Ok(Projection::Resolved(container))
                }
                Some(container) => {
                    if let Some(owner) = owner {
                        self.install(owner, &container)?;
                    }
                    Ok(Projection::Pluckable(container))
                }
                None => Ok(Projection::NoResult),
            },
        }
    }

    /// Overwrite a declaration's body with its container, once.
    ///
    /// Inline local functions are also published to the cross-module store.
    pub(crate) fn install(&mut self, id: DeclId, container: &CaptureContainer) -> Result<()> {
        if self.arena.is_resolved(id) {
            return Ok(());
        }
        let decl = &self.arena[id];
        let span = decl.body.as_ref().map_or(decl.span, |b| b.span);
        let body = HostExpr::new(
            ExprKind::Container(Box::new(container.clone())),
            decl.ty.clone(),
            span,
        );
        let publish = decl.inline && decl.is_function() && !decl.is_foreign();
        self.arena.overwrite_body(id, body);
        log::debug!(
            "installed {} container on `{}`",
            container.kind,
            self.arena[id].name
        );

        if publish {
            self.store
                .put_stored(&self.arena[id], container.kind, &container.xr)?;
        }
        Ok(())
    }
}
