use quarry_core::{BinaryOp, Expr, Literal, Xr};

use super::{OwnerChain, Projection, Root};
use crate::compile::{Compiler, compile};
use crate::container::{CaptureContainer, ParamsModel, RuntimesModel};
use crate::dynamics::DynamicsAccum;
use crate::host::{CompilationUnit, DeclArena, DeclId, HostExpr, HostType};
use crate::store::CrossModuleStore;
use crate::test_utils::*;
use crate::{Error, StoreConfig};

fn people_ty() -> HostType {
    HostType::query(person_ty())
}

fn adults_of(head: HostExpr) -> HostExpr {
    filter(
        head,
        "p",
        bin(
            prop(ident("p", person_ty()), "age", HostType::Int),
            BinaryOp::Gt,
            int(18),
        ),
    )
}

#[test]
fn field_chain_splices_uprootable_base() {
    let mut unit = CompilationUnit::new("test");
    let base = unit.declare(field("base", people_ty(), capture(table(person_ty()))));
    let adults = unit.declare(field(
        "adults",
        people_ty(),
        capture(adults_of(decl_ref(base, people_ty()))),
    ));
    unit.add_site(decl_ref(adults, people_ty()));

    let compiled = compile(&unit, &no_store()).unwrap();

    assert!(compiled.diagnostics.is_empty());
    insta::assert_snapshot!(decl_xr(&compiled, adults), @"Filter(Entity(Person), p, BinaryOp(Property(p, age), >, 18))");
    let site = compiled.sites[0].as_ref().unwrap();
    assert!(site.is_uprootable());
    assert_eq!(
        site.params,
        ParamsModel::Instance(Box::new(decl_ref(adults, people_ty())))
    );
}

#[test]
fn projection_is_byte_identical() {
    let mut unit = CompilationUnit::new("test");
    let base = unit.declare(function(
        "people",
        &[],
        people_ty(),
        capture(adults_of(table(person_ty()))),
    ));
    let alias = unit.declare(field("alias", people_ty(), call_decl(base, vec![], people_ty())));
    unit.add_site(decl_ref(alias, people_ty()));
    unit.add_site(call_decl(base, vec![], people_ty()));

    let first = compile(&unit, &no_store()).unwrap();
    let second = compile(&unit, &no_store()).unwrap();

    let installed = &first.container(base).unwrap().xr;
    assert_eq!(&first.container(alias).unwrap().xr, installed);
    assert_eq!(&first.sites[0].as_ref().unwrap().xr, installed);
    assert_eq!(&first.sites[1].as_ref().unwrap().xr, installed);
    assert_eq!(&second.sites[0].as_ref().unwrap().xr, installed);
}

#[test]
fn mutually_referential_fields_terminate() {
    let mut unit = CompilationUnit::new("test");
    let a = DeclId::new(0);
    let b = DeclId::new(1);
    unit.declare(field("a", people_ty(), decl_ref(b, people_ty())));
    unit.declare(field("b", people_ty(), decl_ref(a, people_ty())));
    unit.add_site(decl_ref(a, people_ty()));

    let compiled = compile(&unit, &no_store()).unwrap();

    assert!(compiled.sites[0].is_none());
    assert!(compiled.diagnostics.is_empty());
    assert!(compiled.container(a).is_none());
}

#[test]
fn self_referential_capture_becomes_runtime_fragment() {
    let mut unit = CompilationUnit::new("test");
    let id = DeclId::new(0);
    unit.declare(field(
        "loop",
        people_ty(),
        capture(adults_of(decl_ref(id, people_ty()))),
    ));

    let compiled = compile(&unit, &no_store()).unwrap();

    let container = compiled.container(id).unwrap();
    assert!(container.is_pluckable());
    insta::assert_snapshot!(decl_xr(&compiled, id), @"Filter(Tag(#0), p, BinaryOp(Property(p, age), >, 18))");
}

#[test]
fn mutable_variable_is_opaque() {
    let mut unit = CompilationUnit::new("test");
    let v = unit.declare(variable("v", people_ty(), capture(table(person_ty())), true));
    unit.add_site(capture(adults_of(decl_ref(v, people_ty()))));

    let compiled = compile(&unit, &no_store()).unwrap();

    insta::assert_snapshot!(site_xr(&compiled, 0), @"Filter(Tag(#0), p, BinaryOp(Property(p, age), >, 18))");
    assert!(compiled.sites[0].as_ref().unwrap().is_pluckable());
}

#[test]
fn pluckable_is_installed_but_not_propagated() {
    let mut unit = CompilationUnit::new("test");
    let int_expr = HostType::expression(HostType::Int);
    let frag = unit.declare(field(
        "frag",
        int_expr.clone(),
        capture_expr(use_(ident("outer", int_expr.clone()))),
    ));
    let via = unit.declare(field("via", int_expr.clone(), decl_ref(frag, int_expr.clone())));
    unit.add_site(capture_expr(bin(
        use_(decl_ref(frag, int_expr.clone())),
        BinaryOp::Plus,
        int(1),
    )));

    let compiled = compile(&unit, &no_store()).unwrap();

    assert!(compiled.container(frag).unwrap().is_pluckable());
    assert!(compiled.container(via).is_none());

    insta::assert_snapshot!(site_xr(&compiled, 0), @"BinaryOp(Tag(#0), +, 1)");
    let site = compiled.sites[0].as_ref().unwrap();
    assert_eq!(
        site.runtimes,
        Some(RuntimesModel::Listed {
            own: Vec::new(),
            inherited: vec![decl_ref(frag, int_expr)],
        })
    );
}

#[test]
fn chain_depth_counts_declarations() {
    let decls = vec![
        function("root", &[], people_ty(), capture(table(person_ty()))),
        field("mid", people_ty(), call_decl(DeclId::new(0), vec![], people_ty())),
    ];
    let mut store = CrossModuleStore::new(StoreConfig::new().enabled(false));
    let mut compiler = Compiler::new("test", DeclArena::new(decls), &mut store);

    let chain = compiler
        .build_from(&decl_ref(DeclId::new(1), people_ty()))
        .unwrap();

    assert_eq!(chain.depth(), 2);
    assert!(matches!(chain.root(), Root::Virgin { owner: Some(id), .. } if *id == DeclId::new(0)));
    assert!(matches!(chain, OwnerChain::SourcedField { .. }));

    let projection = compiler.ascend(chain).unwrap();
    assert!(matches!(projection, Projection::Resolved(_)));
    assert!(compiler.arena().is_resolved(DeclId::new(0)));
    assert!(compiler.arena().is_resolved(DeclId::new(1)));
}

#[test]
fn install_happens_once() {
    let decls = vec![field("one", HostType::expression(HostType::Int), int(0))];
    let mut store = CrossModuleStore::new(StoreConfig::new().enabled(false));
    let mut compiler = Compiler::new("test", DeclArena::new(decls), &mut store);
    let id = DeclId::new(0);
    let plant = |value| {
        CaptureContainer::plant(
            &Xr::Expr(Expr::literal(Literal::Int(value))),
            DynamicsAccum::new(),
        )
    };

    compiler.install(id, &plant(1)).unwrap();
    compiler.install(id, &plant(2)).unwrap();

    let installed = compiler.arena()[id].body.as_ref().unwrap().as_container().unwrap();
    assert_eq!(installed, &plant(1));
}

#[test]
fn foreign_reference_requires_enabled_store() {
    let mut unit = CompilationUnit::new("test");
    let people = unit.declare(foreign(&function(
        "people",
        &[],
        people_ty(),
        capture(table(person_ty())),
    )));
    unit.add_site(call_decl(people, vec![], people_ty()));

    let err = compile(&unit, &no_store()).unwrap_err();

    assert!(matches!(err, Error::CrossModuleEligibility { .. }));
    insta::assert_snapshot!(err, @"`app.people` cannot share its capture across modules: enable cross-module captures");
}

#[test]
fn foreign_reference_requires_inline() {
    let dir = tempfile::tempdir().unwrap();
    let mut unit = CompilationUnit::new("test");
    let people = unit.declare(foreign(&function(
        "people",
        &[],
        people_ty(),
        capture(table(person_ty())),
    )));
    unit.add_site(call_decl(people, vec![], people_ty()));

    let err = compile(&unit, &store_at(dir.path(), "main")).unwrap_err();

    insta::assert_snapshot!(err, @"`app.people` cannot share its capture across modules: declare it `inline`");
    assert!(!dir.path().join("main.lock").exists());
}
