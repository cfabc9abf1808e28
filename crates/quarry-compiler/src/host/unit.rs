use serde::{Deserialize, Serialize};

use super::{Decl, DeclId, HostExpr};
use crate::{Error, Result};

/// A front-end dump: every declaration of one compilation plus the
/// top-level capture sites that live outside declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub name: String,
    /// Source text, used to render diagnostics with snippets.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub decls: Vec<Decl>,
    #[serde(default)]
    pub sites: Vec<HostExpr>,
}

impl CompilationUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            decls: Vec::new(),
            sites: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidUnit(e.to_string()))
    }

    /// Add a declaration and return its id.
    pub fn declare(&mut self, decl: Decl) -> DeclId {
        let id = DeclId::new(self.decls.len() as u32);
        self.decls.push(decl);
        id
    }

    pub fn add_site(&mut self, site: HostExpr) {
        self.sites.push(site);
    }

    /// Check that every referenced declaration exists.
    pub fn validate(&self) -> Result<()> {
        let mut refs = Vec::new();
        for decl in &self.decls {
            if let Some(body) = &decl.body {
                body.decl_refs(&mut refs);
            }
        }
        for site in &self.sites {
            site.decl_refs(&mut refs);
        }

        match refs.into_iter().find(|id| id.index() >= self.decls.len()) {
            Some(id) => Err(Error::InvalidUnit(format!(
                "unit `{}` references undeclared {id}",
                self.name
            ))),
            None => Ok(()),
        }
    }
}
