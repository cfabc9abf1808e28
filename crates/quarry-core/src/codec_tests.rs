use crate::{
    BinaryOp, CodecError, ContainerTag, Expr, Literal, Query, SerializedXr, Xr, XrType,
};

fn adults() -> Xr {
    let person = XrType::product("Person", vec![("age".into(), XrType::Value)]);
    let p = Expr::ident("p", person.clone());
    Xr::Query(Query::Filter {
        head: Box::new(Query::entity("Person", person.clone())),
        id: crate::Ident::new("p", person),
        body: Box::new(Expr::binary(
            Expr::property(p, "age"),
            BinaryOp::Gt,
            Expr::literal(Literal::Int(18)),
        )),
    })
}

#[test]
fn encode_prefixes_tag() {
    let serialized = SerializedXr::encode(&adults());

    assert!(serialized.as_str().starts_with("Query-{"));
    assert_eq!(serialized.tag().unwrap(), ContainerTag::Query);
}

#[test]
fn decode_restores_tree() {
    let xr = adults();

    let decoded = SerializedXr::encode(&xr).decode().unwrap();

    assert_eq!(decoded, xr);
}

#[test]
fn encoding_is_deterministic() {
    assert_eq!(SerializedXr::encode(&adults()), SerializedXr::encode(&adults()));
}

#[test]
fn missing_separator() {
    let err = SerializedXr::from_raw("Query").decode().unwrap_err();

    assert!(matches!(err, CodecError::MissingSeparator));
}

#[test]
fn unknown_tag() {
    let err = SerializedXr::from_raw("Table-{}").decode().unwrap_err();

    insta::assert_snapshot!(err, @"unknown container tag `Table`");
}

#[test]
fn tag_payload_mismatch() {
    let query = SerializedXr::encode(&adults());
    let forged = SerializedXr::from_raw(format!("Action-{}", query.payload().unwrap()));

    let err = forged.decode().unwrap_err();

    assert!(matches!(
        err,
        CodecError::Payload {
            tag: ContainerTag::Action,
            ..
        }
    ));
}

#[test]
fn payload_may_contain_dashes() {
    let xr = Xr::Expr(Expr::literal(Literal::String("a-b-c".into())));

    let serialized = SerializedXr::encode(&xr);

    assert_eq!(serialized.decode().unwrap(), xr);
}
