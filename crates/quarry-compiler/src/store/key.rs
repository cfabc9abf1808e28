use crate::host::Decl;

/// Store key of a declaration: `qualified.path(Sig1,Sig2)`.
///
/// The return type is not part of the key, so overloads that differ only in
/// parameter types get distinct entries.
pub fn store_key(decl: &Decl) -> String {
    let signatures: Vec<String> = decl.params().iter().map(|p| p.ty.signature()).collect();
    format!("{}({})", decl.qualified_path, signatures.join(","))
}
