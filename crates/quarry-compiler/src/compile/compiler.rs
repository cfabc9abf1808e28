//! Core compiler state.

use std::collections::HashMap;

use quarry_core::BidGen;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::host::{DeclArena, DeclId};
use crate::parse::{CapturedBody, ParseError};
use crate::store::CrossModuleStore;
use crate::Result;

/// Compiler state for one compilation unit.
pub struct Compiler<'s> {
    pub(crate) arena: DeclArena,
    pub(crate) store: &'s mut CrossModuleStore,
    pub(crate) bids: BidGen,
    pub(crate) diagnostics: Diagnostics,
    /// Declarations whose captures are being compiled right now.
    /// Innermost at the end.
    pub(crate) in_progress: Vec<DeclId>,
    /// Captured function bodies, compiled at most once.
    pub(crate) captured: HashMap<DeclId, CapturedBody>,
}

impl<'s> Compiler<'s> {
    pub fn new(unit_name: &str, arena: DeclArena, store: &'s mut CrossModuleStore) -> Self {
        Self {
            arena,
            store,
            bids: BidGen::for_unit(unit_name),
            diagnostics: Diagnostics::new(),
            in_progress: Vec::new(),
            captured: HashMap::new(),
        }
    }

    pub fn arena(&self) -> &DeclArena {
        &self.arena
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (DeclArena, Diagnostics) {
        (self.arena, self.diagnostics)
    }

    /// Turn a capture's parse failure into a diagnostic.
    ///
    /// Only fatal errors are passed on.
    pub(crate) fn report(&mut self, error: ParseError) -> Result<()> {
        match error {
            ParseError::Unrecognized { span, shape } => {
                self.diagnostics
                    .report(DiagnosticKind::UnrecognizedShape, span)
                    .message(shape)
                    .emit();
            }
            ParseError::Invalid { kind, span, detail } => {
                let builder = self.diagnostics.report(kind, span);
                match detail {
                    Some(detail) => builder.message(detail).emit(),
                    None => builder.emit(),
                }
            }
            ParseError::Reported => {}
            ParseError::Fatal(e) => return Err(e),
        }
        Ok(())
    }
}
