//! Bind identifiers.
//!
//! A `Bid` tags one runtime-supplied value (a parameter) or one runtime-only
//! sub-fragment inside compiled XR. Identifiers are unique within one
//! compilation: the scope is derived from the compilation unit, the sequence
//! number from a per-compilation counter.

use serde::{Deserialize, Serialize};

/// Bind identifier. Ordered by `(scope, seq)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Bid {
    scope: u32,
    seq: u32,
}

impl Bid {
    pub fn new(scope: u32, seq: u32) -> Self {
        Self { scope, seq }
    }

    #[inline]
    pub fn scope(self) -> u32 {
        self.scope
    }

    #[inline]
    pub fn seq(self) -> u32 {
        self.seq
    }
}

impl std::fmt::Display for Bid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}-{}", self.scope, self.seq)
    }
}

/// Allocates fresh bind identifiers for one compilation.
#[derive(Debug, Clone)]
pub struct BidGen {
    scope: u32,
    next: u32,
}

impl BidGen {
    /// Create a generator whose scope is the CRC32 of the unit name.
    pub fn for_unit(unit: &str) -> Self {
        Self {
            scope: crc32fast::hash(unit.as_bytes()),
            next: 0,
        }
    }

    pub fn scope(&self) -> u32 {
        self.scope
    }

    /// Allocate the next identifier. Sequence numbers never repeat.
    pub fn fresh(&mut self) -> Bid {
        let bid = Bid::new(self.scope, self.next);
        self.next += 1;
        bid
    }

    /// Number of identifiers handed out so far.
    pub fn issued(&self) -> u32 {
        self.next
    }
}
