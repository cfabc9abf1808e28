use rowan::TextRange;

/// Diagnostic kinds, grouped by the stage that reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Structural parsing
    UnrecognizedShape,
    HostValueInCapture,
    NonPrimitiveParam,
    InvalidCapturedFunction,
    RecursiveCapturedFunction,

    // Select clauses
    ClauseOutOfOrder,
    DuplicateModifier,
    MissingSelectResult,

    // Container payloads
    MalformedXr,

    // Warnings
    StoreKindMismatch,
    ReductionTypeMismatch,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::StoreKindMismatch | Self::ReductionTypeMismatch => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Default hint for this kind, automatically included in diagnostics.
    pub fn default_hint(&self) -> Option<&'static str> {
        match self {
            Self::HostValueInCapture => {
                Some("bind runtime values with `param(..)` to pass them into the capture")
            }
            Self::NonPrimitiveParam => Some("use `paramCustom(value, serializer)` for other types"),
            Self::StoreKindMismatch => Some("recompile the declaring module to refresh the entry"),
            _ => None,
        }
    }

    /// Base message for this diagnostic kind, used when no custom message is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::UnrecognizedShape => "unrecognized capture shape",
            Self::HostValueInCapture => "host value used inside a capture",
            Self::NonPrimitiveParam => "`param` requires a primitive value",
            Self::InvalidCapturedFunction => "invalid captured function",
            Self::RecursiveCapturedFunction => "captured function calls itself",

            Self::ClauseOutOfOrder => "select clause out of order",
            Self::DuplicateModifier => "select modifier used more than once",
            Self::MissingSelectResult => "select body has no result expression",

            Self::MalformedXr => "malformed serialized capture",

            Self::StoreKindMismatch => "stored capture has a different kind",
            Self::ReductionTypeMismatch => "substituted value has an incompatible type",
        }
    }

    /// Template for custom messages. Contains `{}` placeholder for caller-provided detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::UnrecognizedShape => "unrecognized {}".to_string(),
            Self::HostValueInCapture => "`{}` is not available inside the capture".to_string(),
            Self::RecursiveCapturedFunction => "captured function `{}` calls itself".to_string(),
            Self::ClauseOutOfOrder => "{}".to_string(),
            Self::DuplicateModifier => "`{}` is already used in this select".to_string(),
            Self::StoreKindMismatch => "stored capture for `{}` has a different kind".to_string(),
            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Render the final message.
    ///
    /// - `None` → returns `fallback_message()`
    /// - `Some(detail)` → returns `custom_message()` with `{}` replaced by detail
    pub fn message(&self, msg: Option<&str>) -> String {
        match msg {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub(crate) range: TextRange,
    pub(crate) message: String,
}

impl RelatedInfo {
    pub fn new(range: TextRange, message: impl Into<String>) -> Self {
        Self {
            range,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    pub(crate) range: TextRange,
    pub(crate) message: String,
    pub(crate) related: Vec<RelatedInfo>,
    pub(crate) hints: Vec<String>,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, range: TextRange, message: impl Into<String>) -> Self {
        Self {
            kind,
            range,
            message: message.into(),
            related: Vec::new(),
            hints: kind.default_hint().map(String::from).into_iter().collect(),
        }
    }

    pub(crate) fn with_default_message(kind: DiagnosticKind, range: TextRange) -> Self {
        Self::new(kind, range, kind.fallback_message())
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity(),
            u32::from(self.range.start()),
            u32::from(self.range.end()),
            self.message
        )?;
        for related in &self.related {
            write!(
                f,
                " (related: {} at {}..{})",
                related.message,
                u32::from(related.range.start()),
                u32::from(related.range.end())
            )?;
        }
        for hint in &self.hints {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}
