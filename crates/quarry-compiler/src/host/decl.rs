//! Declarations and the per-compilation declaration arena.

use rowan::TextRange;
use serde::{Deserialize, Serialize};

use super::{HostExpr, HostType, LambdaParam};

/// Index of a declaration in its compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclId(u32);

impl DeclId {
    #[inline]
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for DeclId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "decl#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclKind {
    /// An extension receiver, if any, is listed first as a parameter named `this`.
    Function { params: Vec<LambdaParam> },
    Field,
    Variable { mutable: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Origin {
    #[default]
    Local,
    /// Declared in a separately compiled unit; only the signature is visible.
    Foreign,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub name: String,
    pub qualified_path: String,
    pub kind: DeclKind,
    /// Return type for functions, value type otherwise.
    pub ty: HostType,
    /// Single-expression body or initializer. Multi-statement bodies are absent.
    #[serde(default)]
    pub body: Option<HostExpr>,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default)]
    pub inline: bool,
    #[serde(default)]
    pub captured_function: bool,
    #[serde(default)]
    pub span: TextRange,
}

impl Decl {
    pub fn params(&self) -> &[LambdaParam] {
        match &self.kind {
            DeclKind::Function { params } => params,
            _ => &[],
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, DeclKind::Function { .. })
    }

    pub fn is_foreign(&self) -> bool {
        self.origin == Origin::Foreign
    }
}

#[derive(Debug, Clone)]
struct Slot {
    decl: Decl,
    resolved: bool,
}

/// Every declaration of one compilation, keyed by [`DeclId`].
///
/// A slot's body may be overwritten with a compiled container exactly once;
/// the `resolved` flag turns later overwrites into no-ops.
#[derive(Debug, Clone, Default)]
pub struct DeclArena {
    slots: Vec<Slot>,
}

impl DeclArena {
    pub fn new(decls: Vec<Decl>) -> Self {
        Self {
            slots: decls
                .into_iter()
                .map(|decl| Slot {
                    decl,
                    resolved: false,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: DeclId) -> bool {
        id.index() < self.slots.len()
    }

    pub fn get(&self, id: DeclId) -> Option<&Decl> {
        self.slots.get(id.index()).map(|s| &s.decl)
    }

    pub fn is_resolved(&self, id: DeclId) -> bool {
        self.slots.get(id.index()).is_some_and(|s| s.resolved)
    }

    /// Replace a declaration's body and mark it resolved.
    ///
    /// Returns `false` (and leaves the body untouched) if it was already resolved.
    pub fn overwrite_body(&mut self, id: DeclId, body: HostExpr) -> bool {
        let Some(slot) = self.slots.get_mut(id.index()) else {
            return false;
        };
        if slot.resolved {
            return false;
        }
        slot.decl.body = Some(body);
        slot.resolved = true;
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Decl)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| (DeclId::new(i as u32), &s.decl))
    }

    pub fn ids(&self) -> impl Iterator<Item = DeclId> + use<> {
        (0..self.slots.len() as u32).map(DeclId::new)
    }
}

impl std::ops::Index<DeclId> for DeclArena {
    type Output = Decl;

    fn index(&self, id: DeclId) -> &Decl {
        &self.slots[id.index()].decl
    }
}
