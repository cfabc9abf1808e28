//! Compiling one capture entry into a container.

use quarry_core::{ContainerTag, Query, Xr};

use super::Compiler;
use crate::container::CaptureContainer;
use crate::dynamics::DynamicsAccum;
use crate::host::{DeclId, HostExpr};
use crate::parse::shapes::{self, Entry, EntryKind};
use crate::parse::{ParseError, ParseResult, Scope};
use crate::Result;

impl Compiler<'_> {
    /// Compile a capture entry that has no container yet.
    ///
    /// Parse failures are reported and yield `None`; only fatal errors are
    /// returned. `owner` is marked in progress while its body compiles.
    pub(crate) fn compile_virgin(
        &mut self,
        expr: &HostExpr,
        owner: Option<DeclId>,
    ) -> Result<Option<CaptureContainer>> {
        let Some(entry) = shapes::capture_entry(expr) else {
            return Ok(None);
        };

        if let Some(owner) = owner {
            self.in_progress.push(owner);
        }
        let compiled = self.compile_entry(expr, &entry);
        if owner.is_some() {
            self.in_progress.pop();
        }

        match compiled {
            Ok(container) => {
                log::debug!(
                    "compiled {} capture at {:?} ({})",
                    container.kind,
                    expr.span,
                    if container.is_uprootable() {
                        "uprootable"
                    } else {
                        "pluckable"
                    }
                );
                Ok(Some(container))
            }
            Err(e) => {
                self.report(e)?;
                Ok(None)
            }
        }
    }

    fn compile_entry(&mut self, expr: &HostExpr, entry: &Entry<'_>) -> ParseResult<CaptureContainer> {
        let scope = Scope::new();
        let mut dynamics = DynamicsAccum::new();
        if entry.kind != EntryKind::Batch && !entry.params.is_empty() {
            return Err(ParseError::unrecognized(
                entry.body.span,
                "capture block with parameters",
            ));
        }

        let xr = match entry.kind {
            EntryKind::Select => Xr::Query(Query::Select(Box::new(self.parse_select(
                entry.body,
                &scope,
                &mut dynamics,
            )?))),
            EntryKind::Expression => Xr::Expr(self.parse_expr(entry.body, &scope, &mut dynamics)?),
            EntryKind::Batch => {
                let Some(data) = entry.data else {
                    return Err(ParseError::unrecognized(expr.span, "batch without data"));
                };
                Xr::Batch(self.parse_batch(data, entry.params, entry.body, &scope, &mut dynamics)?)
            }
            EntryKind::Capture => match expr.ty.capture_kind() {
                Some(ContainerTag::Query) => {
                    Xr::Query(self.parse_query(entry.body, &scope, &mut dynamics)?)
                }
                Some(ContainerTag::Expr) => {
                    Xr::Expr(self.parse_expr(entry.body, &scope, &mut dynamics)?)
                }
                Some(ContainerTag::Action) => {
                    Xr::Action(self.parse_action(entry.body, &scope, &mut dynamics)?)
                }
                Some(ContainerTag::ActionBatch) | None => {
                    return Err(ParseError::unrecognized(
                        expr.span,
                        format!("capture of type `{}`", expr.ty),
                    ));
                }
            },
        };

        let container = CaptureContainer::plant(&xr, dynamics);
        Ok(match entry.data {
            Some(data) => container.with_batch_source(data.clone()),
            None => container,
        })
    }
}
