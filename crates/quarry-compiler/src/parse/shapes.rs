//! Structural matchers over the host tree.
//!
//! Each matcher recognizes one host shape and hands back its parts; none of
//! them allocate or report. Parsers try them in priority order.

use quarry_core::ContainerTag;

use crate::dynamics::ParamKind;
use crate::host::{Callee, DeclArena, DeclId, ExprKind, HostExpr, LambdaParam};

/// Which capture entry point opened a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// `capture { .. }`, kind taken from the static type.
    Capture,
    /// `capture.select { .. }`
    Select,
    /// `capture.expression { .. }`
    Expression,
    /// `capture.batch(data) { row -> .. }`
    Batch,
}

#[derive(Debug, Clone, Copy)]
pub struct Entry<'e> {
    pub kind: EntryKind,
    pub params: &'e [LambdaParam],
    pub body: &'e HostExpr,
    /// Batch data, only for [`EntryKind::Batch`].
    pub data: Option<&'e HostExpr>,
}

/// Match a capture entry call.
pub fn capture_entry(expr: &HostExpr) -> Option<Entry<'_>> {
    let (receiver, args) = named_call_parts(expr)?;
    if receiver.is_some() {
        return None;
    }
    let kind = match expr.call_name()? {
        "capture" => EntryKind::Capture,
        "capture.select" => EntryKind::Select,
        "capture.expression" => EntryKind::Expression,
        "capture.batch" => EntryKind::Batch,
        _ => return None,
    };
    let (data, block) = match (kind, args) {
        (EntryKind::Batch, [data, block]) => (Some(data), block),
        (EntryKind::Batch, _) => return None,
        (_, [block]) => (None, block),
        _ => return None,
    };
    let (params, body) = lambda(block)?;
    Some(Entry {
        kind,
        params,
        body,
        data,
    })
}

pub fn lambda(expr: &HostExpr) -> Option<(&[LambdaParam], &HostExpr)> {
    match &expr.kind {
        ExprKind::Lambda { params, body } => Some((params, body)),
        _ => None,
    }
}

/// A lambda with exactly one parameter.
pub fn lambda1(expr: &HostExpr) -> Option<(&LambdaParam, &HostExpr)> {
    match lambda(expr)? {
        ([param], body) => Some((param, body)),
        _ => None,
    }
}

fn named_call_parts(expr: &HostExpr) -> Option<(Option<&HostExpr>, &[HostExpr])> {
    match &expr.kind {
        ExprKind::Call {
            callee: Callee::Named(_),
            receiver,
            args,
        } => Some((receiver.as_deref(), args)),
        _ => None,
    }
}

/// `name(args)` with no receiver.
pub fn free_call<'e>(expr: &'e HostExpr, name: &str) -> Option<&'e [HostExpr]> {
    match named_call_parts(expr)? {
        (None, args) if expr.call_name() == Some(name) => Some(args),
        _ => None,
    }
}

/// `receiver.name(args)`
pub fn method_call(expr: &HostExpr) -> Option<(&str, &HostExpr, &[HostExpr])> {
    match named_call_parts(expr)? {
        (Some(receiver), args) => Some((expr.call_name()?, receiver, args)),
        (None, _) => None,
    }
}

/// `x.use` / `x.value` on a capture-typed receiver.
pub fn splice_target(expr: &HostExpr) -> Option<&HostExpr> {
    match &expr.kind {
        ExprKind::Property { receiver, name }
            if (name == "use" || name == "value") && receiver.ty.capture_kind().is_some() =>
        {
            Some(receiver)
        }
        _ => None,
    }
}

/// A host expression that evaluates to a capture without being spliced
/// explicitly: a reference, a call or a planted container.
pub fn capture_reference(expr: &HostExpr, kind: ContainerTag) -> bool {
    if expr.ty.capture_kind() != Some(kind) {
        return false;
    }
    matches!(
        expr.kind,
        ExprKind::Ident(_)
            | ExprKind::DeclRef(_)
            | ExprKind::Property { .. }
            | ExprKind::Container(_)
            | ExprKind::Call {
                callee: Callee::Decl(_),
                ..
            }
    ) || capture_entry(expr).is_some()
}

/// `param(value)`, `paramCustom(value, serializer)` and the rest of the family.
pub fn param_call(expr: &HostExpr) -> Option<(ParamKind, &HostExpr, Option<&HostExpr>)> {
    let (receiver, args) = named_call_parts(expr)?;
    if receiver.is_some() {
        return None;
    }
    let kind = ParamKind::from_call_name(expr.call_name()?)?;
    match args {
        [value] => Some((kind, value, None)),
        [value, serializer] => Some((kind, value, Some(serializer))),
        _ => None,
    }
}

/// A call to a declaration marked as a captured function.
pub fn captured_call(expr: &HostExpr, arena: &DeclArena) -> Option<DeclId> {
    match &expr.kind {
        ExprKind::Call {
            callee: Callee::Decl(id),
            ..
        } if arena.get(*id).is_some_and(|d| d.captured_function) => Some(*id),
        _ => None,
    }
}

pub fn is_bool(expr: &HostExpr, value: bool) -> bool {
    matches!(expr.kind, ExprKind::Const(quarry_core::Literal::Bool(b)) if b == value)
}

/// Short human description of a host node, for diagnostics.
pub fn describe(expr: &HostExpr, arena: &DeclArena) -> String {
    match &expr.kind {
        ExprKind::Const(_) => "constant".into(),
        ExprKind::Ident(name) => format!("identifier `{name}`"),
        ExprKind::DeclRef(id) | ExprKind::Call {
            callee: Callee::Decl(id),
            ..
        } => match arena.get(*id) {
            Some(decl) => format!("reference to `{}`", decl.name),
            None => format!("reference to {id}"),
        },
        ExprKind::Call {
            callee: Callee::Named(name),
            ..
        } => format!("call `{name}`"),
        ExprKind::Lambda { .. } => "lambda".into(),
        ExprKind::Block { .. } => "block".into(),
        ExprKind::If { .. } => "`if` expression".into(),
        ExprKind::When { .. } => "`when` expression".into(),
        ExprKind::Binary { op, .. } => format!("operator `{}`", op.symbol()),
        ExprKind::Unary { op, .. } => format!("operator `{}`", op.symbol()),
        ExprKind::Property { name, .. } => format!("property `{name}`"),
        ExprKind::Construct { class, .. } => format!("constructor `{class}`"),
        ExprKind::Container(c) => format!("compiled {} capture", c.kind),
    }
}
