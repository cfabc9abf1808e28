//! Unit-level entry point.

use super::Compiler;
use crate::chain::Projection;
use crate::config::Config;
use crate::container::CaptureContainer;
use crate::diagnostics::Diagnostics;
use crate::host::{CompilationUnit, DeclArena, DeclId, HostExpr};
use crate::store::CrossModuleStore;
use crate::Result;

/// Everything a compilation produced.
#[derive(Debug)]
pub struct CompiledUnit {
    pub name: String,
    /// Source text carried over from the unit, for rendering diagnostics.
    pub source: Option<String>,
    /// Declarations, with capture bodies replaced by their containers.
    pub arena: DeclArena,
    /// One entry per top-level site; `None` where nothing could be compiled.
    pub sites: Vec<Option<CaptureContainer>>,
    pub diagnostics: Diagnostics,
}

impl CompiledUnit {
    /// The container installed on a declaration, if any.
    pub fn container(&self, id: DeclId) -> Option<&CaptureContainer> {
        self.arena.get(id)?.body.as_ref()?.as_container()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Compile every capture of `unit`.
///
/// Per-capture problems end up in [`CompiledUnit::diagnostics`]. An `Err` is
/// fatal: an ineligible cross-module reference, a store failure or an
/// inconsistent unit.
pub fn compile(unit: &CompilationUnit, config: &Config) -> Result<CompiledUnit> {
    unit.validate()?;
    log::debug!(
        "compiling unit `{}` ({} declarations, {} sites)",
        unit.name,
        unit.decls.len(),
        unit.sites.len()
    );

    CrossModuleStore::scoped(config.store.clone(), |store| {
        let mut compiler = Compiler::new(&unit.name, DeclArena::new(unit.decls.clone()), store);
        compiler.resolve_decls()?;

        let mut sites = Vec::with_capacity(unit.sites.len());
        for site in &unit.sites {
            sites.push(compiler.resolve_site(site)?);
        }

        let (arena, diagnostics) = compiler.into_parts();
        Ok(CompiledUnit {
            name: unit.name.clone(),
            source: unit.source.clone(),
            arena,
            sites,
            diagnostics,
        })
    })
}

impl Compiler<'_> {
    /// Resolve local capture-typed declarations in source order.
    ///
    /// Inline captured functions are compiled eagerly so that they are
    /// published even when nothing in this unit calls them.
    fn resolve_decls(&mut self) -> Result<()> {
        for id in self.arena.ids() {
            let decl = &self.arena[id];
            if decl.is_foreign() || self.arena.is_resolved(id) {
                continue;
            }
            if decl.captured_function {
                if decl.inline && self.store.is_enabled() {
                    let span = decl.span;
                    if let Err(e) = self.captured_body(id, span) {
                        self.report(e)?;
                    }
                }
                continue;
            }
            if decl.ty.capture_kind().is_none() {
                continue;
            }
            let Some(body) = decl.body.clone() else {
                continue;
            };

            let mut visited = vec![id];
            let chain = self.build_chain(&body, Some(id), &mut visited)?;
            if let Projection::Resolved(container) = self.ascend(chain)? {
                self.install(id, &container)?;
            }
        }
        Ok(())
    }

    fn resolve_site(&mut self, site: &HostExpr) -> Result<Option<CaptureContainer>> {
        let chain = self.build_from(site)?;
        let depth = chain.depth();
        let container = self
            .ascend(chain)?
            .into_container()
            .or_else(|| self.installed_pluckable(site));
        log::debug!(
            "site at {:?}: {} (through {depth} declarations)",
            site.span,
            match &container {
                Some(c) if c.is_uprootable() => "uprootable",
                Some(_) => "pluckable",
                None => "unresolved",
            }
        );
        Ok(container)
    }
}
