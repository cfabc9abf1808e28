//! Owner-chain resolution.
//!
//! A capture is often reached indirectly: `people()` calls a function whose
//! body is `adults()`, whose body is finally `capture { .. }`. `build_from`
//! walks such indirections down to a [`Root`]; `ascend` compiles the root and
//! projects the result back up, installing the container on each declaration
//! it passes and re-pointing it at each call or read site.
//!
//! - `build.rs` - descending into declarations
//! - `ascend.rs` - projecting containers back up

mod ascend;
mod build;

#[cfg(test)]
mod chain_tests;

use quarry_core::ContainerTag;

use crate::container::CaptureContainer;
use crate::host::{DeclId, HostExpr};

pub(crate) use build::eligibility_error;

/// Where an owner chain bottoms out.
#[derive(Debug, Clone, PartialEq)]
pub enum Root {
    /// An already-compiled container without runtime dependencies.
    Uprootable(CaptureContainer),
    /// A capture entry that has not been compiled yet.
    Virgin {
        kind: ContainerTag,
        expr: HostExpr,
        /// Declaration whose body is exactly this capture.
        owner: Option<DeclId>,
    },
    /// Nothing is statically known.
    Unknown,
    /// Resolved through the cross-module store.
    FromStore(CaptureContainer),
}

/// One link of the path from a use site down to its capture.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnerChain {
    Root(Root),
    SourcedFunction {
        decl: DeclId,
        site: HostExpr,
        parent: Box<OwnerChain>,
    },
    SourcedField {
        decl: DeclId,
        site: HostExpr,
        parent: Box<OwnerChain>,
    },
    SourcedVariable {
        decl: DeclId,
        site: HostExpr,
        parent: Box<OwnerChain>,
    },
}

impl OwnerChain {
    pub fn root(&self) -> &Root {
        match self {
            Self::Root(root) => root,
            Self::SourcedFunction { parent, .. }
            | Self::SourcedField { parent, .. }
            | Self::SourcedVariable { parent, .. } => parent.root(),
        }
    }

    /// Number of declarations between the site and the root.
    pub fn depth(&self) -> usize {
        match self {
            Self::Root(_) => 0,
            Self::SourcedFunction { parent, .. }
            | Self::SourcedField { parent, .. }
            | Self::SourcedVariable { parent, .. } => 1 + parent.depth(),
        }
    }
}

/// Result of projecting a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// An Uprootable container, re-pointed at the site.
    Resolved(CaptureContainer),
    /// A Pluckable container. Installed where it was compiled, never propagated.
    Pluckable(CaptureContainer),
    NoResult,
}

impl Projection {
    pub fn container(&self) -> Option<&CaptureContainer> {
        match self {
            Self::Resolved(c) | Self::Pluckable(c) => Some(c),
            Self::NoResult => None,
        }
    }

    pub fn into_container(self) -> Option<CaptureContainer> {
        match self {
            Self::Resolved(c) | Self::Pluckable(c) => Some(c),
            Self::NoResult => None,
        }
    }
}
