//! Capture compilation driver.
//!
//! Resolves every capture of a compilation unit into a [`CaptureContainer`],
//! installing containers on declarations and sharing inline ones through the
//! cross-module store.
//!
//! # Module Organization
//!
//! - `compiler`: compiler state shared by the parsers and the chain resolver
//! - `capture`: compiling one capture entry into a container
//! - `driver`: the unit-level entry point and its result
//!
//! [`CaptureContainer`]: crate::container::CaptureContainer

mod capture;
mod compiler;
mod driver;


pub use compiler::Compiler;
pub use driver::{CompiledUnit, compile};
