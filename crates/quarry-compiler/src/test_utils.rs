//! Test utilities: host tree builders and compile helpers.

use std::path::Path;
use std::time::Duration;

use quarry_core::{BinaryOp, Literal, UnaryOp, Xr};
use rowan::{TextRange, TextSize};

use crate::compile::{CompiledUnit, compile};
use crate::config::{Config, StoreConfig};
use crate::host::{
    Callee, CompilationUnit, Decl, DeclId, DeclKind, ExprKind, HostExpr, HostType, LambdaParam,
    Origin, Stmt,
};

pub fn span(start: u32, end: u32) -> TextRange {
    TextRange::new(TextSize::from(start), TextSize::from(end))
}

pub trait At {
    fn at(self, start: u32, end: u32) -> Self;
}

impl At for HostExpr {
    fn at(mut self, start: u32, end: u32) -> Self {
        self.span = span(start, end);
        self
    }
}

fn expr(kind: ExprKind, ty: HostType) -> HostExpr {
    HostExpr::new(kind, ty, TextRange::default())
}

// ============================================================================
// Types
// ============================================================================

pub fn person_ty() -> HostType {
    HostType::class(
        "Person",
        vec![
            ("id".into(), HostType::Int),
            ("name".into(), HostType::String),
            ("age".into(), HostType::Int),
        ],
    )
}

pub fn address_ty() -> HostType {
    HostType::class(
        "Address",
        vec![
            ("ownerId".into(), HostType::Int),
            ("street".into(), HostType::String),
        ],
    )
}

// ============================================================================
// Expressions
// ============================================================================

pub fn int(value: i64) -> HostExpr {
    expr(ExprKind::Const(Literal::Int(value)), HostType::Int)
}

pub fn string(value: &str) -> HostExpr {
    expr(ExprKind::Const(Literal::String(value.into())), HostType::String)
}

pub fn boolean(value: bool) -> HostExpr {
    expr(ExprKind::Const(Literal::Bool(value)), HostType::Boolean)
}

pub fn null(ty: HostType) -> HostExpr {
    expr(
        ExprKind::Const(Literal::Null),
        HostType::Nullable(Box::new(ty)),
    )
}

pub fn ident(name: &str, ty: HostType) -> HostExpr {
    expr(ExprKind::Ident(name.into()), ty)
}

pub fn decl_ref(id: DeclId, ty: HostType) -> HostExpr {
    expr(ExprKind::DeclRef(id), ty)
}

pub fn prop(receiver: HostExpr, name: &str, ty: HostType) -> HostExpr {
    expr(
        ExprKind::Property {
            receiver: Box::new(receiver),
            name: name.into(),
        },
        ty,
    )
}

pub fn bin(lhs: HostExpr, op: BinaryOp, rhs: HostExpr) -> HostExpr {
    let ty = if op.is_predicate() {
        HostType::Boolean
    } else {
        lhs.ty.clone()
    };
    expr(
        ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        ty,
    )
}

pub fn not(operand: HostExpr) -> HostExpr {
    expr(
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        },
        HostType::Boolean,
    )
}

pub fn if_else(cond: HostExpr, then: HostExpr, otherwise: HostExpr) -> HostExpr {
    let ty = then.ty.clone();
    expr(
        ExprKind::If {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Some(Box::new(otherwise)),
        },
        ty,
    )
}

/// `name(args)`
pub fn call(name: &str, args: Vec<HostExpr>, ty: HostType) -> HostExpr {
    expr(
        ExprKind::Call {
            callee: Callee::Named(name.into()),
            receiver: None,
            args,
        },
        ty,
    )
}

/// `receiver.name(args)`
pub fn method(receiver: HostExpr, name: &str, args: Vec<HostExpr>, ty: HostType) -> HostExpr {
    expr(
        ExprKind::Call {
            callee: Callee::Named(name.into()),
            receiver: Some(Box::new(receiver)),
            args,
        },
        ty,
    )
}

/// A call to a declared function.
pub fn call_decl(id: DeclId, args: Vec<HostExpr>, ty: HostType) -> HostExpr {
    expr(
        ExprKind::Call {
            callee: Callee::Decl(id),
            receiver: None,
            args,
        },
        ty,
    )
}

pub fn lambda(params: &[(&str, HostType)], body: HostExpr) -> HostExpr {
    let params: Vec<LambdaParam> = params
        .iter()
        .map(|(name, ty)| LambdaParam::new(*name, ty.clone()))
        .collect();
    let ty = HostType::Function {
        params: params.iter().map(|p| p.ty.clone()).collect(),
        ret: Box::new(body.ty.clone()),
    };
    expr(
        ExprKind::Lambda {
            params,
            body: Box::new(body),
        },
        ty,
    )
}

pub fn block(statements: Vec<Stmt>, result: Option<HostExpr>) -> HostExpr {
    let ty = result.as_ref().map_or(HostType::Unit, |r| r.ty.clone());
    expr(
        ExprKind::Block {
            statements,
            result: result.map(Box::new),
        },
        ty,
    )
}

pub fn val(name: &str, init: HostExpr) -> Stmt {
    Stmt::Val {
        name: name.into(),
        ty: init.ty.clone(),
        init,
    }
}

pub fn construct(class: &str, args: Vec<(&str, HostExpr)>) -> HostExpr {
    let fields = args
        .iter()
        .map(|(n, e)| (n.to_string(), e.ty.clone()))
        .collect();
    expr(
        ExprKind::Construct {
            class: class.into(),
            args: args.into_iter().map(|(n, e)| (n.to_string(), e)).collect(),
        },
        HostType::class(class, fields),
    )
}

// ============================================================================
// Capture vocabulary
// ============================================================================

/// `Table<row>()`
pub fn table(row: HostType) -> HostExpr {
    call("Table", vec![], HostType::query(row))
}

pub fn param(value: HostExpr) -> HostExpr {
    let ty = value.ty.clone();
    call("param", vec![value], ty)
}

/// `head.filter { name -> body }`
pub fn filter(head: HostExpr, name: &str, body: HostExpr) -> HostExpr {
    let row = match &head.ty {
        HostType::Query(row) => (**row).clone(),
        other => other.clone(),
    };
    let ty = head.ty.clone();
    method(head, "filter", vec![lambda(&[(name, row)], body)], ty)
}

/// `capture { body }` typed like `body`.
pub fn capture(body: HostExpr) -> HostExpr {
    let ty = body.ty.clone();
    call("capture", vec![lambda(&[], body)], ty)
}

/// `capture.expression { body }`
pub fn capture_expr(body: HostExpr) -> HostExpr {
    let ty = HostType::expression(body.ty.clone());
    call("capture.expression", vec![lambda(&[], body)], ty)
}

/// `capture.select { body }`
pub fn capture_select(body: HostExpr) -> HostExpr {
    let ty = HostType::query(body.ty.clone());
    call("capture.select", vec![lambda(&[], body)], ty)
}

/// `target.use`
pub fn use_(target: HostExpr) -> HostExpr {
    let ty = match &target.ty {
        HostType::Expression(value) => (**value).clone(),
        other => other.clone(),
    };
    prop(target, "use", ty)
}

// ============================================================================
// Declarations
// ============================================================================

pub fn function(name: &str, params: &[(&str, HostType)], ty: HostType, body: HostExpr) -> Decl {
    let params: Vec<LambdaParam> = params
        .iter()
        .map(|(n, t)| LambdaParam::new(*n, t.clone()))
        .collect();
    Decl {
        name: name.into(),
        qualified_path: format!("app.{name}"),
        kind: DeclKind::Function { params },
        ty,
        body: Some(body),
        origin: Origin::Local,
        inline: false,
        captured_function: false,
        span: TextRange::default(),
    }
}

pub fn field(name: &str, ty: HostType, body: HostExpr) -> Decl {
    Decl {
        kind: DeclKind::Field,
        ..function(name, &[], ty, body)
    }
}

pub fn variable(name: &str, ty: HostType, body: HostExpr, mutable: bool) -> Decl {
    Decl {
        kind: DeclKind::Variable { mutable },
        ..function(name, &[], ty, body)
    }
}

/// The same declaration as seen from another unit: foreign and bodyless.
pub fn foreign(decl: &Decl) -> Decl {
    Decl {
        body: None,
        origin: Origin::Foreign,
        ..decl.clone()
    }
}

// ============================================================================
// Compiling
// ============================================================================

/// Configuration with the cross-module store disabled.
pub fn no_store() -> Config {
    Config::new().store(StoreConfig::new().enabled(false))
}

/// Configuration with a store rooted at `dir`.
pub fn store_at(dir: &Path, source_set: &str) -> Config {
    Config::new().store(
        StoreConfig::new()
            .root(dir)
            .source_set(source_set)
            .lock_timeout(Duration::from_millis(200)),
    )
}

/// Compile a unit holding only `sites`, without a store.
pub fn compile_sites(sites: Vec<HostExpr>) -> CompiledUnit {
    let mut unit = CompilationUnit::new("test");
    for site in sites {
        unit.add_site(site);
    }
    compile(&unit, &no_store()).expect("compilation should not fail")
}

/// Decoded XR of site `index`.
pub fn site_xr(compiled: &CompiledUnit, index: usize) -> Xr {
    compiled.sites[index]
        .as_ref()
        .expect("site should compile")
        .decode()
        .expect("container should decode")
}

/// Decoded XR of the container installed on `id`.
pub fn decl_xr(compiled: &CompiledUnit, id: DeclId) -> Xr {
    compiled
        .container(id)
        .expect("declaration should have a container")
        .decode()
        .expect("container should decode")
}
