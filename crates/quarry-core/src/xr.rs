//! The XR query algebra.
//!
//! Four closed roots: [`Query`], [`Expr`], [`Action`] and [`BatchAction`],
//! wrapped by [`Xr`] when the kind is only known at runtime. Nodes are plain
//! owned trees and compare structurally.

use serde::{Deserialize, Serialize};

use crate::{Bid, XrType};

/// Kind of a compiled capture. Doubles as the tag in serialized XR.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerTag {
    Query,
    Expr,
    Action,
    ActionBatch,
}

impl ContainerTag {
    pub const ALL: [ContainerTag; 4] = [Self::Query, Self::Expr, Self::Action, Self::ActionBatch];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Expr => "Expr",
            Self::Action => "Action",
            Self::ActionBatch => "ActionBatch",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == s)
    }
}

impl std::fmt::Display for ContainerTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named variable bound by a lambda, a select clause or a function parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub ty: XrType,
}

impl Ident {
    pub fn new(name: impl Into<String>, ty: XrType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Any XR root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Xr {
    Query(Query),
    Expr(Expr),
    Action(Action),
    Batch(BatchAction),
}

impl Xr {
    pub fn tag(&self) -> ContainerTag {
        match self {
            Self::Query(_) => ContainerTag::Query,
            Self::Expr(_) => ContainerTag::Expr,
            Self::Action(_) => ContainerTag::Action,
            Self::Batch(_) => ContainerTag::ActionBatch,
        }
    }

    /// View as a query. Expressions wrapping a subquery unwrap to it.
    pub fn into_query(self) -> Option<Query> {
        match self {
            Self::Query(q) => Some(q),
            Self::Expr(Expr::Subquery(q)) => Some(*q),
            _ => None,
        }
    }

    /// View as an expression. Queries become subqueries.
    pub fn into_expr(self) -> Option<Expr> {
        match self {
            Self::Expr(e) => Some(e),
            Self::Query(q) => Some(Expr::Subquery(Box::new(q))),
            _ => None,
        }
    }

    pub fn into_action(self) -> Option<Action> {
        match self {
            Self::Action(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_batch(self) -> Option<BatchAction> {
        match self {
            Self::Batch(b) => Some(b),
            _ => None,
        }
    }
}

impl From<Query> for Xr {
    fn from(q: Query) -> Self {
        Self::Query(q)
    }
}

impl From<Expr> for Xr {
    fn from(e: Expr) -> Self {
        Self::Expr(e)
    }
}

impl From<Action> for Xr {
    fn from(a: Action) -> Self {
        Self::Action(a)
    }
}

impl From<BatchAction> for Xr {
    fn from(b: BatchAction) -> Self {
        Self::Batch(b)
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl Literal {
    pub fn natural_type(&self) -> XrType {
        match self {
            Self::Null => XrType::Null,
            Self::Bool(_) => XrType::BooleanValue,
            Self::Int(_) | Self::Double(_) | Self::String(_) => XrType::Value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    Plus,
    Minus,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    /// Comparison and logical operators produce predicates.
    pub fn is_predicate(self) -> bool {
        !matches!(
            self,
            Self::Plus | Self::Minus | Self::Mul | Self::Div | Self::Rem
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Not => "!",
            Self::Neg => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub cond: Expr,
    pub then: Expr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub expr: Expr,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Ident(Ident),
    Const {
        value: Literal,
        ty: XrType,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Property {
        of: Box<Expr>,
        name: String,
        ty: XrType,
    },
    When {
        branches: Vec<Branch>,
        otherwise: Box<Expr>,
    },
    Product {
        name: String,
        fields: Vec<(String, Expr)>,
    },
    Block {
        bindings: Vec<(Ident, Expr)>,
        output: Box<Expr>,
    },
    MethodCall {
        head: Box<Expr>,
        name: String,
        args: Vec<Expr>,
        ty: XrType,
    },
    /// Placeholder for a runtime-bound parameter value.
    Param {
        bid: Bid,
        ty: XrType,
    },
    /// Placeholder for a runtime-only expression fragment.
    Tag {
        bid: Bid,
        ty: XrType,
    },
    Subquery(Box<Query>),
}

impl Expr {
    pub fn ident(name: impl Into<String>, ty: XrType) -> Self {
        Self::Ident(Ident::new(name, ty))
    }

    /// Literal tagged with its natural type.
    pub fn literal(value: Literal) -> Self {
        let ty = value.natural_type();
        Self::Const { value, ty }
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn property(of: Expr, name: impl Into<String>) -> Self {
        let name = name.into();
        let ty = of.ty().field(&name).cloned().unwrap_or(XrType::Value);
        Self::Property {
            of: Box::new(of),
            name,
            ty,
        }
    }

    pub fn ty(&self) -> XrType {
        match self {
            Self::Ident(id) => id.ty.clone(),
            Self::Const { ty, .. } => ty.clone(),
            Self::Binary { op, left, .. } => {
                if op.is_predicate() {
                    XrType::BooleanExpression
                } else {
                    match left.ty() {
                        t if t.is_bottom() => XrType::Value,
                        t => t,
                    }
                }
            }
            Self::Unary { op, operand } => match op {
                UnaryOp::Not => XrType::BooleanExpression,
                UnaryOp::Neg => operand.ty(),
            },
            Self::Property { ty, .. } => ty.clone(),
            Self::When { branches, otherwise } => {
                let mut ty = otherwise.ty();
                for branch in branches {
                    ty = ty.least_upper_bound(&branch.then.ty()).unwrap_or(ty);
                }
                ty
            }
            Self::Product { name, fields } => XrType::Product {
                name: name.clone(),
                fields: fields.iter().map(|(n, e)| (n.clone(), e.ty())).collect(),
            },
            Self::Block { output, .. } => output.ty(),
            Self::MethodCall { ty, .. } => ty.clone(),
            Self::Param { ty, .. } | Self::Tag { ty, .. } => ty.clone(),
            Self::Subquery(q) => q.ty(),
        }
    }

    /// Identifiers and constants are the only nodes whose type may be retagged.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ident(_) | Self::Const { .. })
    }

    /// Retag a terminal. Other nodes are returned unchanged.
    pub fn with_type(self, ty: XrType) -> Self {
        match self {
            Self::Ident(id) => Self::Ident(Ident { ty, ..id }),
            Self::Const { value, .. } => Self::Const { value, ty },
            other => other,
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectStep {
    From {
        id: Ident,
        source: Query,
    },
    Join {
        id: Ident,
        kind: JoinKind,
        source: Query,
        on: Expr,
    },
    /// `val x = e` or `val (a, b) = e` between clauses.
    Assign {
        ids: Vec<Ident>,
        value: Expr,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectClause {
    pub steps: Vec<SelectStep>,
    pub filter: Option<Expr>,
    pub group_by: Option<Expr>,
    pub sort_by: Option<Vec<SortKey>>,
    pub result: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    Entity {
        name: String,
        ty: XrType,
    },
    Ident(Ident),
    Filter {
        head: Box<Query>,
        id: Ident,
        body: Box<Expr>,
    },
    Map {
        head: Box<Query>,
        id: Ident,
        body: Box<Expr>,
    },
    FlatMap {
        head: Box<Query>,
        id: Ident,
        body: Box<Query>,
    },
    SortBy {
        head: Box<Query>,
        id: Ident,
        keys: Vec<SortKey>,
    },
    Take {
        head: Box<Query>,
        count: Box<Expr>,
    },
    Drop {
        head: Box<Query>,
        count: Box<Expr>,
    },
    Distinct {
        head: Box<Query>,
    },
    Union {
        left: Box<Query>,
        right: Box<Query>,
        all: bool,
    },
    Select(Box<SelectClause>),
    /// Placeholder for a runtime-only query fragment.
    Tag {
        bid: Bid,
        ty: XrType,
    },
    FromExpr(Box<Expr>),
}

impl Query {
    pub fn entity(name: impl Into<String>, ty: XrType) -> Self {
        Self::Entity {
            name: name.into(),
            ty,
        }
    }

    /// Row type produced by this query.
    pub fn ty(&self) -> XrType {
        match self {
            Self::Entity { ty, .. } | Self::Tag { ty, .. } => ty.clone(),
            Self::Ident(id) => id.ty.clone(),
            Self::Filter { head, .. }
            | Self::SortBy { head, .. }
            | Self::Take { head, .. }
            | Self::Drop { head, .. }
            | Self::Distinct { head } => head.ty(),
            Self::Map { body, .. } => body.ty(),
            Self::FlatMap { body, .. } => body.ty(),
            Self::Union { left, .. } => left.ty(),
            Self::Select(clause) => clause.result.ty(),
            Self::FromExpr(e) => e.ty(),
        }
    }
}

// ============================================================================
// Actions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub property: Expr,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Returning {
    pub id: Ident,
    pub output: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Insert {
        target: Box<Query>,
        alias: Ident,
        assignments: Vec<Assignment>,
        returning: Option<Returning>,
    },
    Update {
        target: Box<Query>,
        alias: Ident,
        assignments: Vec<Assignment>,
        filter: Option<Expr>,
        returning: Option<Returning>,
    },
    Delete {
        target: Box<Query>,
        alias: Ident,
        filter: Option<Expr>,
        returning: Option<Returning>,
    },
    /// Placeholder for a runtime-only action.
    Tag { bid: Bid },
}

impl Action {
    pub fn returning(&self) -> Option<&Returning> {
        match self {
            Self::Insert { returning, .. }
            | Self::Update { returning, .. }
            | Self::Delete { returning, .. } => returning.as_ref(),
            Self::Tag { .. } => None,
        }
    }
}

/// An action executed once per element of runtime-supplied batch data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAction {
    pub alias: Ident,
    pub action: Action,
}
