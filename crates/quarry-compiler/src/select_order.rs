//! Select-clause ordering.
//!
//! Inside a select block the clauses must read
//! `from+ join* (where | groupBy | sortBy)*` with each modifier used at most
//! once. Plain assignments may appear anywhere. Validation is a small state
//! machine over the clause sequence; an invalid clause is reported and the
//! state is left where it was, so one misplaced clause yields one error.

use rowan::TextRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    From,
    Join,
    Where,
    GroupBy,
    SortBy,
    /// `val x = ..` that is not a clause.
    Assign,
}

impl ClauseKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::From => "from",
            Self::Join => "join",
            Self::Where => "where",
            Self::GroupBy => "groupBy",
            Self::SortBy => "sortBy",
            Self::Assign => "val",
        }
    }

    pub fn is_modifier(self) -> bool {
        matches!(self, Self::Where | Self::GroupBy | Self::SortBy)
    }
}

/// Where the validator is within the select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Begin,
    From,
    Join,
    Modifier,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    OutOfOrder {
        clause: ClauseKind,
        phase: Phase,
        range: TextRange,
    },
    Duplicate {
        clause: ClauseKind,
        range: TextRange,
        first: TextRange,
    },
}

impl OrderError {
    pub fn range(&self) -> TextRange {
        match self {
            Self::OutOfOrder { range, .. } | Self::Duplicate { range, .. } => *range,
        }
    }

    pub fn clause(&self) -> ClauseKind {
        match self {
            Self::OutOfOrder { clause, .. } | Self::Duplicate { clause, .. } => *clause,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::OutOfOrder {
                clause: ClauseKind::From,
                phase,
                ..
            } => format!("`from` cannot follow {}", phase_description(*phase)),
            Self::OutOfOrder {
                clause: ClauseKind::Join,
                phase: Phase::Begin,
                ..
            } => "`join` must follow a `from`".to_string(),
            Self::OutOfOrder { clause, phase, .. } => {
                format!("`{}` cannot follow {}", clause.keyword(), phase_description(*phase))
            }
            Self::Duplicate { clause, .. } => clause.keyword().to_string(),
        }
    }
}

fn phase_description(phase: Phase) -> &'static str {
    match phase {
        Phase::Begin => "the start of the select",
        Phase::From => "a `from`",
        Phase::Join => "a `join`",
        Phase::Modifier => "a `where`, `groupBy` or `sortBy`",
    }
}

#[derive(Debug, Clone)]
pub struct SelectValidator {
    phase: Phase,
    seen: Vec<(ClauseKind, TextRange)>,
    errors: Vec<OrderError>,
}

impl Default for SelectValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectValidator {
    pub fn new() -> Self {
        Self {
            phase: Phase::Begin,
            seen: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Feed the next clause.
    pub fn step(&mut self, clause: ClauseKind, range: TextRange) {
        let next = match (clause, self.phase) {
            (ClauseKind::Assign, phase) => Some(phase),
            (ClauseKind::From, Phase::Begin | Phase::From) => Some(Phase::From),
            (ClauseKind::Join, Phase::From | Phase::Join) => Some(Phase::Join),
            (modifier, _) if modifier.is_modifier() => {
                if let Some(&(_, first)) = self.seen.iter().find(|(k, _)| *k == modifier) {
                    self.errors.push(OrderError::Duplicate {
                        clause,
                        range,
                        first,
                    });
                    return;
                }
                Some(Phase::Modifier)
            }
            _ => None,
        };

        match next {
            Some(phase) => {
                self.phase = phase;
                self.seen.push((clause, range));
            }
            None => self.errors.push(OrderError::OutOfOrder {
                clause,
                phase: self.phase,
                range,
            }),
        }
    }

    pub fn finish(self) -> Vec<OrderError> {
        self.errors
    }
}

/// Validate a whole clause sequence.
pub fn validate(clauses: impl IntoIterator<Item = (ClauseKind, TextRange)>) -> Vec<OrderError> {
    let mut validator = SelectValidator::new();
    for (clause, range) in clauses {
        validator.step(clause, range);
    }
    validator.finish()
}
