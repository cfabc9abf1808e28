use crate::{
    Action, Assignment, BatchAction, Bid, BinaryOp, Direction, Expr, Ident, JoinKind, Literal,
    Query, SelectClause, SelectStep, SortKey, Xr, XrType,
};

fn person() -> XrType {
    XrType::product(
        "Person",
        vec![("name".into(), XrType::Value), ("age".into(), XrType::Value)],
    )
}

fn p() -> Expr {
    Expr::ident("p", person())
}

#[test]
fn filter_with_param() {
    let query = Query::Filter {
        head: Box::new(Query::entity("Person", person())),
        id: Ident::new("p", person()),
        body: Box::new(Expr::binary(
            Expr::property(p(), "name"),
            BinaryOp::Eq,
            Expr::Param {
                bid: Bid::new(7, 0),
                ty: XrType::Value,
            },
        )),
    };

    insta::assert_snapshot!(query, @"Filter(Entity(Person), p, BinaryOp(Property(p, name), ==, Param(#0)))");
}

#[test]
fn select_clause() {
    let address = XrType::product("Address", vec![("owner".into(), XrType::Value)]);
    let clause = SelectClause {
        steps: vec![
            SelectStep::From {
                id: Ident::new("p", person()),
                source: Query::entity("Person", person()),
            },
            SelectStep::Join {
                id: Ident::new("a", address.clone()),
                kind: JoinKind::Left,
                source: Query::entity("Address", address.clone()),
                on: Expr::binary(
                    Expr::property(Expr::ident("a", address), "owner"),
                    BinaryOp::Eq,
                    Expr::property(p(), "name"),
                ),
            },
        ],
        filter: Some(Expr::binary(
            Expr::property(p(), "age"),
            BinaryOp::Gt,
            Expr::literal(Literal::Int(18)),
        )),
        group_by: None,
        sort_by: Some(vec![SortKey {
            expr: Expr::property(p(), "name"),
            direction: Direction::Desc,
        }]),
        result: p(),
    };

    insta::assert_snapshot!(
        Query::Select(Box::new(clause)),
        @"Select([From(p, Entity(Person)), Join(a, Left, Entity(Address), BinaryOp(Property(a, owner), ==, Property(p, name)))], where=BinaryOp(Property(p, age), >, 18), sortBy=[Property(p, name) Desc], result=p)"
    );
}

#[test]
fn batch_insert() {
    let batch = BatchAction {
        alias: Ident::new("row", person()),
        action: Action::Insert {
            target: Box::new(Query::entity("Person", person())),
            alias: Ident::new("x", person()),
            assignments: vec![Assignment {
                property: Expr::property(Expr::ident("x", person()), "name"),
                value: Expr::property(Expr::ident("row", person()), "name"),
            }],
            returning: None,
        },
    };

    insta::assert_snapshot!(
        Xr::Batch(batch),
        @"Batch(row, Insert(Entity(Person), x, [Property(x, name) := Property(row, name)]))"
    );
}

#[test]
fn literals() {
    let product = Expr::Product {
        name: "Row".into(),
        fields: vec![
            ("s".into(), Expr::literal(Literal::String("Joe".into()))),
            ("d".into(), Expr::literal(Literal::Double(1.5))),
            ("b".into(), Expr::literal(Literal::Bool(true))),
            ("n".into(), Expr::literal(Literal::Null)),
        ],
    };

    insta::assert_snapshot!(product, @r#"Product(Row, s="Joe", d=1.5, b=true, n=null)"#);
}

#[test]
fn bids_in_traversal_order() {
    let xr = Xr::Expr(Expr::binary(
        Expr::Tag {
            bid: Bid::new(1, 4),
            ty: XrType::Value,
        },
        BinaryOp::Plus,
        Expr::Param {
            bid: Bid::new(1, 2),
            ty: XrType::Value,
        },
    ));

    let seqs: Vec<u32> = xr.bids().into_iter().map(Bid::seq).collect();

    assert_eq!(seqs, [4, 2]);
    assert!(xr.has_runtime_tags());
}

#[test]
fn params_alone_are_not_runtime_tags() {
    let xr = Xr::Expr(Expr::Param {
        bid: Bid::new(1, 0),
        ty: XrType::Value,
    });

    assert!(!xr.has_runtime_tags());
}

#[test]
fn subquery_wraps_and_unwraps() {
    let query = Query::entity("Person", person());

    let expr = Xr::Query(query.clone()).into_expr().unwrap();
    let back = Xr::Expr(expr).into_query().unwrap();

    assert_eq!(back, query);
}
