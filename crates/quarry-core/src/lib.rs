#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for Quarry's query algebra (XR).
//!
//! - `xr`: the four closed roots (query, expression, action, batch action)
//! - `types`: the static type lattice carried by XR nodes
//! - `bid`: bind identifiers for runtime-supplied values and fragments
//! - `codec`: the `"{Tag}-{payload}"` serialized form
//! - `visitor`: read-only and mutable traversal
//! - `dump`: single-line functional rendering

pub mod bid;
pub mod codec;
mod dump;
pub mod types;
pub mod visitor;
pub mod xr;

#[cfg(test)]
mod codec_tests;
#[cfg(test)]
mod dump_tests;
#[cfg(test)]
mod visitor_tests;

pub use bid::{Bid, BidGen};
pub use codec::{CodecError, SerializedXr};
pub use types::XrType;
pub use xr::{
    Action, Assignment, BatchAction, BinaryOp, Branch, ContainerTag, Direction, Expr, Ident,
    JoinKind, Literal, Query, Returning, SelectClause, SelectStep, SortKey, UnaryOp, Xr,
};
