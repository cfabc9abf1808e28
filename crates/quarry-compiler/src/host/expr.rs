//! Host expression tree, as produced by the front-end.

use quarry_core::{BinaryOp, Literal, UnaryOp};
use rowan::TextRange;
use serde::{Deserialize, Serialize};

use super::{DeclId, HostType};
use crate::container::CaptureContainer;

/// A typed host expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostExpr {
    pub kind: ExprKind,
    pub ty: HostType,
    #[serde(default)]
    pub span: TextRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Callee {
    /// A library or builtin function, by name (`filter`, `param`, `capture.select`, ...).
    Named(String),
    /// A declaration of the compilation.
    Decl(DeclId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambdaParam {
    pub name: String,
    pub ty: HostType,
}

impl LambdaParam {
    pub fn new(name: impl Into<String>, ty: HostType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhenBranch {
    pub cond: HostExpr,
    pub then: HostExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Val {
        name: String,
        ty: HostType,
        init: HostExpr,
    },
    Destructure {
        names: Vec<String>,
        init: HostExpr,
    },
    Expr(HostExpr),
}

impl Stmt {
    pub fn span(&self) -> TextRange {
        match self {
            Self::Val { init, .. } | Self::Destructure { init, .. } => init.span,
            Self::Expr(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Const(Literal),
    /// A local name: lambda parameter, block value or function parameter.
    Ident(String),
    /// Read of a field or variable declaration.
    DeclRef(DeclId),
    Call {
        callee: Callee,
        #[serde(default)]
        receiver: Option<Box<HostExpr>>,
        #[serde(default)]
        args: Vec<HostExpr>,
    },
    Lambda {
        params: Vec<LambdaParam>,
        body: Box<HostExpr>,
    },
    Block {
        statements: Vec<Stmt>,
        result: Option<Box<HostExpr>>,
    },
    If {
        cond: Box<HostExpr>,
        then: Box<HostExpr>,
        otherwise: Option<Box<HostExpr>>,
    },
    When {
        branches: Vec<WhenBranch>,
        otherwise: Option<Box<HostExpr>>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<HostExpr>,
        rhs: Box<HostExpr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<HostExpr>,
    },
    Property {
        receiver: Box<HostExpr>,
        name: String,
    },
    Construct {
        class: String,
        args: Vec<(String, HostExpr)>,
    },
    /// A capture that has already been compiled and installed.
    Container(Box<CaptureContainer>),
}

impl HostExpr {
    pub fn new(kind: ExprKind, ty: HostType, span: TextRange) -> Self {
        Self { kind, ty, span }
    }

    /// Name of a `Named` call, if this is one.
    pub fn call_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Call {
                callee: Callee::Named(name),
                ..
            } => Some(name),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&CaptureContainer> {
        match &self.kind {
            ExprKind::Container(c) => Some(c),
            _ => None,
        }
    }

    /// Every declaration referenced anywhere below this node.
    pub fn decl_refs(&self, out: &mut Vec<DeclId>) {
        match &self.kind {
            ExprKind::Const(_) | ExprKind::Ident(_) | ExprKind::Container(_) => {}
            ExprKind::DeclRef(id) => out.push(*id),
            ExprKind::Call {
                callee,
                receiver,
                args,
            } => {
                if let Callee::Decl(id) = callee {
                    out.push(*id);
                }
                if let Some(r) = receiver {
                    r.decl_refs(out);
                }
                for arg in args {
                    arg.decl_refs(out);
                }
            }
            ExprKind::Lambda { body, .. } => body.decl_refs(out),
            ExprKind::Block { statements, result } => {
                for stmt in statements {
                    match stmt {
                        Stmt::Val { init, .. } | Stmt::Destructure { init, .. } => {
                            init.decl_refs(out)
                        }
                        Stmt::Expr(e) => e.decl_refs(out),
                    }
                }
                if let Some(r) = result {
                    r.decl_refs(out);
                }
            }
            ExprKind::If {
                cond,
                then,
                otherwise,
            } => {
                cond.decl_refs(out);
                then.decl_refs(out);
                if let Some(o) = otherwise {
                    o.decl_refs(out);
                }
            }
            ExprKind::When { branches, otherwise } => {
                for branch in branches {
                    branch.cond.decl_refs(out);
                    branch.then.decl_refs(out);
                }
                if let Some(o) = otherwise {
                    o.decl_refs(out);
                }
            }
            ExprKind::Binary { lhs, rhs, .. } => {
                lhs.decl_refs(out);
                rhs.decl_refs(out);
            }
            ExprKind::Unary { operand, .. } => operand.decl_refs(out),
            ExprKind::Property { receiver, .. } => receiver.decl_refs(out),
            ExprKind::Construct { args, .. } => {
                for (_, arg) in args {
                    arg.decl_refs(out);
                }
            }
        }
    }
}
