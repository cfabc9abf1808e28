//! Host tree model.
//!
//! The front-end hands the pipeline a closed, typed tree: expressions,
//! declarations and the compilation unit that groups them. The pipeline only
//! pattern-matches on this vocabulary; it never evaluates it.

mod decl;
mod expr;
mod types;
mod unit;


pub use decl::{Decl, DeclArena, DeclId, DeclKind, Origin};
pub use expr::{Callee, ExprKind, HostExpr, LambdaParam, Stmt, WhenBranch};
pub use types::HostType;
pub use unit::CompilationUnit;
