//! Structural parsers from host shapes to XR.
//!
//! Parsing is a family of methods on [`Compiler`](crate::compile::Compiler),
//! split by XR root:
//! - `expression.rs` - scalar expressions, parameters and method calls
//! - `query.rs` - table roots and query combinators
//! - `action.rs` - insert/update/delete and batch actions
//! - `select.rs` - imperative select blocks
//! - `splice.rs` - splicing other captures in
//! - `captured.rs` - captured function bodies and their call sites
//!
//! Each parser tries a fixed list of shapes in priority order; the first
//! match wins and a miss is an [`ParseError::Unrecognized`].

mod action;
mod captured;
mod error;
mod expression;
mod query;
mod scope;
mod select;
pub mod shapes;
mod splice;

#[cfg(test)]
mod parse_tests;

pub use error::{ParseError, ParseResult};
pub use scope::{Scope, ScopeVar};

pub(crate) use captured::CapturedBody;
