use quarry_core::Ident;

/// Identifiers visible to the capture being parsed.
///
/// Maps a host name to the XR identifier it stands for. Inner bindings
/// shadow outer ones.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: Vec<ScopeVar>,
}

#[derive(Debug, Clone)]
pub struct ScopeVar {
    pub name: String,
    pub ident: Ident,
    /// Bound to a whole query rather than to a row or value.
    pub query: bool,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of this scope with one more binding.
    pub fn with(&self, name: &str, ident: Ident) -> Self {
        let mut scope = self.clone();
        scope.bind(name, ident);
        scope
    }

    pub fn bind(&mut self, name: &str, ident: Ident) {
        self.vars.push(ScopeVar {
            name: name.to_string(),
            ident,
            query: false,
        });
    }

    pub fn bind_query(&mut self, name: &str, ident: Ident) {
        self.vars.push(ScopeVar {
            name: name.to_string(),
            ident,
            query: true,
        });
    }

    pub fn lookup(&self, name: &str) -> Option<&ScopeVar> {
        self.vars.iter().rev().find(|v| v.name == name)
    }
}
