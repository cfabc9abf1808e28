use rowan::TextRange;

use crate::diagnostics::DiagnosticKind;
use crate::store::StoreError;
use crate::Error;

/// Why a capture could not be parsed.
///
/// Everything but `Fatal` aborts only the enclosing top-level capture.
#[derive(Debug)]
pub enum ParseError {
    /// No shape in the priority list matched.
    Unrecognized { span: TextRange, shape: String },
    /// A shape matched but its contents are not allowed.
    Invalid {
        kind: DiagnosticKind,
        span: TextRange,
        detail: Option<String>,
    },
    /// Already reported as diagnostics.
    Reported,
    Fatal(Error),
}

impl ParseError {
    pub(crate) fn unrecognized(span: TextRange, shape: impl Into<String>) -> Self {
        Self::Unrecognized {
            span,
            shape: shape.into(),
        }
    }

    pub(crate) fn invalid(kind: DiagnosticKind, span: TextRange, detail: impl Into<String>) -> Self {
        Self::Invalid {
            kind,
            span,
            detail: Some(detail.into()),
        }
    }

    pub(crate) fn bare(kind: DiagnosticKind, span: TextRange) -> Self {
        Self::Invalid {
            kind,
            span,
            detail: None,
        }
    }
}

impl From<Error> for ParseError {
    fn from(e: Error) -> Self {
        Self::Fatal(e)
    }
}

impl From<StoreError> for ParseError {
    fn from(e: StoreError) -> Self {
        Self::Fatal(Error::StoreUnavailable(e))
    }
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;
