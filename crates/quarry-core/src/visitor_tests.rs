use crate::visitor::{Visitor, walk_query, walk_xr};
use crate::{BinaryOp, Bid, Expr, Ident, Literal, Query, XrType, Xr};

fn param(seq: u32) -> Expr {
    Expr::Param {
        bid: Bid::new(1, seq),
        ty: XrType::Value,
    }
}

fn tag(seq: u32) -> Expr {
    Expr::Tag {
        bid: Bid::new(1, seq),
        ty: XrType::Value,
    }
}

fn people() -> Query {
    Query::entity("Person", XrType::Generic)
}

fn filtered(body: Expr) -> Query {
    Query::Filter {
        head: Box::new(people()),
        id: Ident::new("p", XrType::Generic),
        body: Box::new(body),
    }
}

#[test]
fn bids_in_traversal_order() {
    let xr = Xr::Query(Query::Union {
        left: Box::new(filtered(Expr::binary(param(0), BinaryOp::Eq, tag(1)))),
        right: Box::new(Query::Tag {
            bid: Bid::new(1, 2),
            ty: XrType::Generic,
        }),
        all: false,
    });

    let seqs: Vec<u32> = xr.bids().into_iter().map(Bid::seq).collect();
    assert_eq!(seqs, vec![0, 1, 2]);
    assert!(xr.has_runtime_tags());
}

#[test]
fn params_alone_are_not_runtime_tags() {
    let xr = Xr::Query(filtered(Expr::binary(
        param(0),
        BinaryOp::Lt,
        Expr::literal(Literal::Int(3)),
    )));

    assert_eq!(xr.bids().len(), 1);
    assert!(!xr.has_runtime_tags());
}

#[test]
fn no_bids_in_constant_xr() {
    let xr = Xr::Expr(Expr::literal(Literal::Bool(true)));
    assert!(xr.bids().is_empty());
    assert!(!xr.has_runtime_tags());
}

#[test]
fn custom_visitor_can_stop_descending() {
    #[derive(Default)]
    struct Entities {
        seen: Vec<String>,
        skip_union_right: bool,
    }

    impl Visitor for Entities {
        fn visit_query(&mut self, query: &Query) {
            match query {
                Query::Entity { name, .. } => self.seen.push(name.clone()),
                Query::Union { left, .. } if self.skip_union_right => {
                    self.visit_query(left);
                    return;
                }
                _ => {}
            }
            walk_query(self, query);
        }
    }

    let xr = Xr::Query(Query::Union {
        left: Box::new(people()),
        right: Box::new(Query::entity("Address", XrType::Generic)),
        all: true,
    });

    let mut all = Entities::default();
    walk_xr(&mut all, &xr);
    assert_eq!(all.seen, vec!["Person", "Address"]);

    let mut left_only = Entities {
        skip_union_right: true,
        ..Default::default()
    };
    walk_xr(&mut left_only, &xr);
    assert_eq!(left_only.seen, vec!["Person"]);
}

#[test]
fn map_bids_follows_traversal_order() {
    let mut xr = Xr::Query(Query::Union {
        left: Box::new(filtered(Expr::binary(param(7), BinaryOp::Eq, tag(3)))),
        right: Box::new(Query::Tag {
            bid: Bid::new(1, 5),
            ty: XrType::Generic,
        }),
        all: true,
    });

    let mut next = 10;
    xr.map_bids(|bid| {
        next += 1;
        Bid::new(bid.scope(), next)
    });

    let seqs: Vec<u32> = xr.bids().into_iter().map(Bid::seq).collect();
    assert_eq!(seqs, vec![11, 12, 13]);
    assert!(xr.has_runtime_tags());
}

#[test]
fn map_bids_leaves_plain_trees_alone() {
    let mut xr = Xr::Query(filtered(Expr::binary(
        Expr::Ident(Ident::new("p", XrType::Generic)),
        BinaryOp::Eq,
        Expr::Const {
            value: Literal::Int(1),
            ty: XrType::Value,
        },
    )));
    let before = xr.clone();

    xr.map_bids(|_| unreachable!("no bind identifiers"));
    assert_eq!(xr, before);
}
