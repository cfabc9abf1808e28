use quarry_core::{BinaryOp, ContainerTag};

use crate::container::ParamsModel;
use crate::diagnostics::{DiagnosticKind, DiagnosticMessage};
use crate::dynamics::ParamKind;
use crate::host::{HostType, Stmt};
use crate::test_utils::*;

fn single_diagnostic(compiled: &crate::CompiledUnit) -> &DiagnosticMessage {
    assert_eq!(compiled.diagnostics.len(), 1, "{:?}", compiled.diagnostics);
    compiled.diagnostics.iter().next().unwrap()
}

fn own_params(compiled: &crate::CompiledUnit, site: usize) -> Vec<ParamKind> {
    match &compiled.sites[site].as_ref().unwrap().params {
        ParamsModel::Listed { own, .. } => own.iter().map(|p| p.kind).collect(),
        ParamsModel::Instance(_) => panic!("expected listed params"),
    }
}

fn p() -> crate::host::HostExpr {
    ident("p", person_ty())
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn filter_with_param() {
    let site = capture(filter(
        table(person_ty()),
        "p",
        bin(
            prop(p(), "name", HostType::String),
            BinaryOp::Eq,
            param(ident("n", HostType::String)),
        ),
    ));

    let compiled = compile_sites(vec![site]);

    assert!(compiled.diagnostics.is_empty());
    insta::assert_snapshot!(site_xr(&compiled, 0), @"Filter(Entity(Person), p, BinaryOp(Property(p, name), ==, Param(#0)))");
    assert!(compiled.sites[0].as_ref().unwrap().is_uprootable());
    assert_eq!(own_params(&compiled, 0), vec![ParamKind::ScalarStatic]);
}

#[test]
fn chained_operators() {
    let people = filter(
        table(person_ty()),
        "p",
        bin(prop(p(), "age", HostType::Int), BinaryOp::Gte, int(18)),
    );
    let query_ty = people.ty.clone();
    let sorted = method(
        people,
        "sortedByDescending",
        vec![lambda(&[("q", person_ty())], prop(ident("q", person_ty()), "age", HostType::Int))],
        query_ty.clone(),
    );
    let site = capture(method(sorted, "take", vec![int(10)], query_ty));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(site_xr(&compiled, 0), @"Take(SortBy(Filter(Entity(Person), p, BinaryOp(Property(p, age), >=, 18)), q, [Property(q, age) Desc]), 10)");
}

#[test]
fn table_of_non_entity_is_unrecognized() {
    let compiled = compile_sites(vec![capture(table(HostType::Int).at(3, 9))]);

    let diagnostic = single_diagnostic(&compiled);
    assert_eq!(diagnostic.kind(), DiagnosticKind::UnrecognizedShape);
    assert_eq!(diagnostic.range(), span(3, 9));
    insta::assert_snapshot!(diagnostic.message(), @"unrecognized `Table` of non-entity type `Int`");
    assert!(compiled.sites[0].is_none());
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn if_else_false_is_conjunction() {
    let site = capture_expr(if_else(
        bin(param(ident("a", HostType::Int)), BinaryOp::Gt, int(0)),
        bin(param(ident("b", HostType::Int)), BinaryOp::Lt, int(5)),
        boolean(false),
    ));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(site_xr(&compiled, 0), @"BinaryOp(BinaryOp(Param(#0), >, 0), &&, BinaryOp(Param(#1), <, 5))");
}

#[test]
fn if_true_else_is_disjunction() {
    let site = capture_expr(if_else(
        bin(param(ident("a", HostType::Int)), BinaryOp::Gt, int(0)),
        boolean(true),
        bin(param(ident("b", HostType::Int)), BinaryOp::Lt, int(5)),
    ));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(site_xr(&compiled, 0), @"BinaryOp(BinaryOp(Param(#0), >, 0), ||, BinaryOp(Param(#1), <, 5))");
}

#[test]
fn general_if_is_when() {
    let site = capture_expr(if_else(
        bin(param(ident("a", HostType::Int)), BinaryOp::Gt, int(0)),
        string("positive"),
        string("other"),
    ));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(site_xr(&compiled, 0), @r#"When([BinaryOp(Param(#0), >, 0) -> "positive"], else="other")"#);
}

#[test]
fn blocks_bind_values() {
    let site = capture_expr(block(
        vec![val("x", param(ident("n", HostType::Int)))],
        Some(bin(ident("x", HostType::Int), BinaryOp::Mul, int(2))),
    ));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(site_xr(&compiled, 0), @"Block([x = Param(#0)], BinaryOp(x, *, 2))");
}

#[test]
fn whitelisted_methods() {
    let site = capture_expr(method(
        param(ident("s", HostType::String)),
        "uppercase",
        vec![],
        HostType::String,
    ));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(site_xr(&compiled, 0), @"MethodCall(Param(#0), uppercase, [])");
}

#[test]
fn list_params() {
    let ids = HostType::List(Box::new(HostType::Int));
    let site = capture_expr(call("params", vec![ident("ids", ids.clone())], ids));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(site_xr(&compiled, 0), @"Param(#0)");
    assert_eq!(own_params(&compiled, 0), vec![ParamKind::ListStatic]);
}

#[test]
fn host_value_in_capture() {
    let site = capture_expr(bin(
        ident("limit", HostType::Int).at(10, 15),
        BinaryOp::Gt,
        int(1),
    ));

    let compiled = compile_sites(vec![site]);

    let diagnostic = single_diagnostic(&compiled);
    assert_eq!(diagnostic.kind(), DiagnosticKind::HostValueInCapture);
    assert_eq!(diagnostic.range(), span(10, 15));
    insta::assert_snapshot!(diagnostic.message(), @"`limit` is not available inside the capture");
    assert!(compiled.sites[0].is_none());
}

#[test]
fn non_primitive_param() {
    let site = capture_expr(param(ident("who", person_ty()).at(4, 7)));

    let compiled = compile_sites(vec![site]);

    let diagnostic = single_diagnostic(&compiled);
    assert_eq!(diagnostic.kind(), DiagnosticKind::NonPrimitiveParam);
    assert_eq!(diagnostic.range(), span(4, 7));
    insta::assert_snapshot!(diagnostic.message(), @"`param` requires a primitive value: got `Person`");
}

#[test]
fn custom_param_needs_serializer() {
    let site = capture_expr(call(
        "paramCustom",
        vec![ident("who", person_ty())],
        person_ty(),
    ));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(single_diagnostic(&compiled).message(), @"unrecognized `paramCustom` without a serializer");
}

#[test]
fn custom_param_with_serializer() {
    let site = capture_expr(call(
        "paramCustom",
        vec![ident("who", person_ty()), ident("serializer", HostType::Unknown)],
        person_ty(),
    ));

    let compiled = compile_sites(vec![site]);

    assert!(compiled.diagnostics.is_empty());
    assert_eq!(own_params(&compiled, 0), vec![ParamKind::ScalarCustom]);
}

#[test]
fn unknown_call_is_unrecognized() {
    let site = capture_expr(call("println", vec![], HostType::Unit));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(single_diagnostic(&compiled).message(), @"unrecognized call `println` in expression position");
}

#[test]
fn runtime_splice_becomes_tag() {
    let fragment = ident("bonus", HostType::expression(HostType::Int));
    let site = capture_expr(bin(use_(fragment), BinaryOp::Plus, int(1)));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(site_xr(&compiled, 0), @"BinaryOp(Tag(#0), +, 1)");
    assert!(compiled.sites[0].as_ref().unwrap().is_pluckable());
}

// ============================================================================
// Actions
// ============================================================================

fn person_action() -> HostType {
    HostType::action(person_ty(), HostType::Unit)
}

fn set_name(alias: &str, value: crate::host::HostExpr) -> crate::host::HostExpr {
    call(
        "set",
        vec![method(
            prop(ident(alias, person_ty()), "name", HostType::String),
            "to",
            vec![value],
            HostType::Unit,
        )],
        HostType::Unit,
    )
}

#[test]
fn insert_with_returning() {
    let insert = call(
        "insert",
        vec![lambda(&[("p", person_ty())], set_name("p", string("Ann")))],
        person_action(),
    );
    let site = capture(method(
        insert,
        "returning",
        vec![lambda(&[("r", person_ty())], prop(ident("r", person_ty()), "id", HostType::Int))],
        person_action(),
    ));

    let compiled = compile_sites(vec![site]);

    assert_eq!(compiled.sites[0].as_ref().unwrap().kind, ContainerTag::Action);
    insta::assert_snapshot!(site_xr(&compiled, 0), @r#"Insert(Entity(Person), p, [Property(p, name) := "Ann"], returning=p -> Property(p, id))"#);
}

#[test]
fn update_with_filter() {
    let update = call(
        "update",
        vec![lambda(
            &[("p", person_ty())],
            set_name("p", param(ident("name", HostType::String))),
        )],
        person_action(),
    );
    let site = capture(method(
        update,
        "filter",
        vec![lambda(
            &[("q", person_ty())],
            bin(
                prop(ident("q", person_ty()), "id", HostType::Int),
                BinaryOp::Eq,
                param(ident("id", HostType::Int)),
            ),
        )],
        person_action(),
    ));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(site_xr(&compiled, 0), @"Update(Entity(Person), p, [Property(p, name) := Param(#0)], where=BinaryOp(Property(p, id), ==, Param(#1)))");
}

#[test]
fn delete_binds_default_alias() {
    let delete = call("delete", vec![], person_action());
    let site = capture(method(
        delete,
        "where",
        vec![lambda(
            &[("p", person_ty())],
            bin(prop(p(), "age", HostType::Int), BinaryOp::Lt, int(18)),
        )],
        person_action(),
    ));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(site_xr(&compiled, 0), @"Delete(Entity(Person), x, where=BinaryOp(Property(x, age), <, 18))");
}

#[test]
fn second_filter_is_rejected() {
    let delete = call("delete", vec![], person_action());
    let predicate = || {
        lambda(
            &[("p", person_ty())],
            bin(prop(p(), "age", HostType::Int), BinaryOp::Lt, int(18)),
        )
    };
    let once = method(delete, "filter", vec![predicate()], person_action());
    let site = capture(method(once, "filter", vec![predicate()], person_action()).at(0, 40));

    let compiled = compile_sites(vec![site]);

    insta::assert_snapshot!(single_diagnostic(&compiled).message(), @"unrecognized second `filter` on the same action");
}

#[test]
fn batch_insert() {
    let rows = HostType::List(Box::new(person_ty()));
    let data = ident("people", rows.clone());
    let insert = call(
        "insert",
        vec![lambda(
            &[("p", person_ty())],
            set_name("p", prop(ident("row", person_ty()), "name", HostType::String)),
        )],
        person_action(),
    );
    let batch_ty = HostType::ActionBatch {
        batch: Box::new(rows),
        input: Box::new(person_ty()),
        output: Box::new(HostType::Unit),
    };
    let site = call(
        "capture.batch",
        vec![data.clone(), lambda(&[("row", person_ty())], insert)],
        batch_ty,
    );

    let compiled = compile_sites(vec![site]);

    let container = compiled.sites[0].as_ref().unwrap();
    assert_eq!(container.kind, ContainerTag::ActionBatch);
    assert_eq!(container.batch_source.as_deref(), Some(&data));
    insta::assert_snapshot!(site_xr(&compiled, 0), @"Batch(row, Insert(Entity(Person), p, [Property(p, name) := Property(row, name)]))");
}

// ============================================================================
// Select blocks
// ============================================================================

fn from_people() -> Stmt {
    val("p", call("from", vec![table(person_ty())], person_ty()).at(0, 10))
}

fn where_adult() -> Stmt {
    Stmt::Expr(
        call(
            "where",
            vec![bin(prop(p(), "age", HostType::Int), BinaryOp::Gt, int(18))],
            HostType::Unit,
        )
        .at(20, 30),
    )
}

#[test]
fn select_with_join_where_and_sort() {
    let a = || ident("a", address_ty());
    let join = call(
        "join",
        vec![
            table(address_ty()),
            lambda(
                &[("a", address_ty())],
                bin(
                    prop(a(), "ownerId", HostType::Int),
                    BinaryOp::Eq,
                    prop(p(), "id", HostType::Int),
                ),
            ),
        ],
        address_ty(),
    );
    let sort = Stmt::Expr(call(
        "sortBy",
        vec![call(
            "desc",
            vec![prop(p(), "name", HostType::String)],
            HostType::String,
        )],
        HostType::Unit,
    ));
    let body = block(
        vec![from_people(), val("a", join.at(10, 20)), where_adult(), sort],
        Some(prop(a(), "street", HostType::String)),
    );

    let compiled = compile_sites(vec![capture_select(body)]);

    assert!(compiled.diagnostics.is_empty());
    insta::assert_snapshot!(site_xr(&compiled, 0), @"Select([From(p, Entity(Person)), Join(a, Inner, Entity(Address), BinaryOp(Property(a, ownerId), ==, Property(p, id)))], where=BinaryOp(Property(p, age), >, 18), sortBy=[Property(p, name) Desc], result=Property(a, street))");
}

#[test]
fn select_group_by_several_keys() {
    let group = Stmt::Expr(call(
        "groupBy",
        vec![
            prop(p(), "name", HostType::String),
            prop(p(), "age", HostType::Int),
        ],
        HostType::Unit,
    ));
    let body = block(
        vec![from_people(), group],
        Some(prop(p(), "name", HostType::String)),
    );

    let compiled = compile_sites(vec![capture_select(body)]);

    insta::assert_snapshot!(site_xr(&compiled, 0), @"Select([From(p, Entity(Person))], groupBy=Product(Tuple, _1=Property(p, name), _2=Property(p, age)), result=Property(p, name))");
}

#[test]
fn select_clause_out_of_order() {
    let body = block(
        vec![where_adult(), from_people()],
        Some(p()),
    );

    let compiled = compile_sites(vec![capture_select(body)]);

    let diagnostic = single_diagnostic(&compiled);
    assert_eq!(diagnostic.kind(), DiagnosticKind::ClauseOutOfOrder);
    assert_eq!(diagnostic.range(), span(0, 10));
    insta::assert_snapshot!(diagnostic.message(), @"`from` cannot follow a `where`, `groupBy` or `sortBy`");
    assert!(compiled.sites[0].is_none());
}

#[test]
fn select_duplicate_modifier() {
    let mut second = where_adult();
    if let Stmt::Expr(e) = &mut second {
        e.span = span(40, 50);
    }
    let body = block(vec![from_people(), where_adult(), second], Some(p()));

    let compiled = compile_sites(vec![capture_select(body)]);

    let diagnostic = single_diagnostic(&compiled);
    assert_eq!(diagnostic.kind(), DiagnosticKind::DuplicateModifier);
    assert_eq!(diagnostic.range(), span(40, 50));
    insta::assert_snapshot!(diagnostic.message(), @"`where` is already used in this select");
}

#[test]
fn select_without_result() {
    let body = block(vec![from_people()], None).at(0, 12);

    let compiled = compile_sites(vec![capture_select(body)]);

    let diagnostic = single_diagnostic(&compiled);
    assert_eq!(diagnostic.kind(), DiagnosticKind::MissingSelectResult);
    assert_eq!(diagnostic.range(), span(0, 12));
}
