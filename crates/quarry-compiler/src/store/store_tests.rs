use std::fs;
use std::time::Duration;

use quarry_core::{ContainerTag, Expr, Literal, SerializedXr, Xr};

use super::namespace::{Namespace, decode, encode};
use super::{CrossModuleStore, Lookup, StoreError, store_key};
use crate::config::StoreConfig;
use crate::host::{Decl, HostType};
use crate::test_utils::{function, int, person_ty};

fn inline_fn(name: &str, params: &[(&str, HostType)]) -> Decl {
    Decl {
        inline: true,
        ..function(name, params, HostType::expression(HostType::Int), int(0))
    }
}

fn config(dir: &std::path::Path, source_set: &str) -> StoreConfig {
    StoreConfig::new()
        .root(dir)
        .source_set(source_set)
        .lock_timeout(Duration::from_millis(100))
}

fn one() -> SerializedXr {
    SerializedXr::encode(&Xr::Expr(Expr::literal(Literal::Int(1))))
}

#[test]
fn keys_include_parameter_signatures() {
    let decl = inline_fn("adults", &[("min", HostType::Int), ("p", person_ty())]);
    insta::assert_snapshot!(store_key(&decl), @"app.adults(Int,Person)");
}

#[test]
fn overloads_get_distinct_keys() {
    let by_int = inline_fn("pick", &[("x", HostType::Int)]);
    let by_string = inline_fn("pick", &[("x", HostType::String)]);
    assert_ne!(store_key(&by_int), store_key(&by_string));
}

#[test]
fn put_then_get_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let decl = inline_fn("one", &[]);

    let mut store = CrossModuleStore::new(config(dir.path(), "main"));
    assert!(!store.is_open());
    store.put_stored(&decl, ContainerTag::Expr, &one()).unwrap();
    assert!(store.is_open());
    store.close().unwrap();
    assert!(!store.is_open());
    assert!(dir.path().join("main.xrs").exists());
    assert!(!dir.path().join("main.lock").exists());

    let mut store = CrossModuleStore::new(config(dir.path(), "main"));
    let found = store.get_stored(&decl, ContainerTag::Expr).unwrap();
    assert_eq!(found, Lookup::Found(one()));
    store.close().unwrap();
}

#[test]
fn dependencies_are_searched_after_primary() {
    let dir = tempfile::tempdir().unwrap();
    let decl = inline_fn("one", &[]);

    let mut library = CrossModuleStore::new(config(dir.path(), "lib"));
    library.put_stored(&decl, ContainerTag::Expr, &one()).unwrap();
    library.close().unwrap();

    let mut app = CrossModuleStore::new(config(dir.path(), "app").dependency("lib"));
    assert_eq!(
        app.get_stored(&decl, ContainerTag::Expr).unwrap(),
        Lookup::Found(one())
    );
    let other = inline_fn("two", &[]);
    assert_eq!(
        app.get_stored(&other, ContainerTag::Expr).unwrap(),
        Lookup::Missing
    );
    app.close().unwrap();
}

#[test]
fn kind_mismatch_leaves_entry_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let decl = inline_fn("one", &[]);

    let mut store = CrossModuleStore::new(config(dir.path(), "main"));
    store.put_stored(&decl, ContainerTag::Expr, &one()).unwrap();

    assert_eq!(
        store.get_stored(&decl, ContainerTag::Query).unwrap(),
        Lookup::KindMismatch {
            found: ContainerTag::Expr
        }
    );
    assert_eq!(
        store.get_stored(&decl, ContainerTag::Expr).unwrap(),
        Lookup::Found(one())
    );
    store.close().unwrap();
}

#[test]
fn disabled_store_never_touches_disk() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("store");
    let decl = inline_fn("one", &[]);

    let mut store = CrossModuleStore::new(config(&root, "main").enabled(false));
    store.put_stored(&decl, ContainerTag::Expr, &one()).unwrap();
    assert_eq!(
        store.get_stored(&decl, ContainerTag::Expr).unwrap(),
        Lookup::Missing
    );
    assert!(!store.is_eligible(&decl));
    store.close().unwrap();

    assert!(!root.exists());
}

#[test]
fn held_lock_times_out() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.lock"), "0\n").unwrap();
    let decl = inline_fn("one", &[]);

    let mut store = CrossModuleStore::new(config(dir.path(), "main"));
    let err = store.get_stored(&decl, ContainerTag::Expr).unwrap_err();

    assert!(matches!(err, StoreError::LockTimeout { .. }));
    assert!(!store.is_open());
}

#[test]
fn corrupt_namespace_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("main.xrs"), b"not a namespace").unwrap();
    let decl = inline_fn("one", &[]);

    let mut store = CrossModuleStore::new(config(dir.path(), "main"));
    let err = store.get_stored(&decl, ContainerTag::Expr).unwrap_err();

    insta::assert_snapshot!(err.to_string(), @"corrupt store namespace `main`: file too small: 15 bytes");
    // The lock taken while loading is released again.
    assert!(!dir.path().join("main.lock").exists());
}

#[test]
fn checksum_is_verified() {
    let mut maps = super::namespace::Maps::new();
    maps.entry("captures".into())
        .or_default()
        .insert("k".into(), "v".into());
    let mut bytes = encode(&maps);
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;

    let err = decode("main", &bytes).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"corrupt store namespace `main`: checksum mismatch");
}

#[test]
fn namespace_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut namespace = Namespace::open(dir.path(), "main", false).unwrap();
    namespace.put("captures", "k".into(), "v".into());
    assert!(namespace.is_dirty());
    namespace.flush().unwrap();

    let mapped = Namespace::open(dir.path(), "main", true).unwrap();
    assert_eq!(mapped.get("captures", "k"), Some("v"));
    assert!(!mapped.is_dirty());
}

#[test]
fn scoped_closes_on_error() {
    let dir = tempfile::tempdir().unwrap();
    let decl = inline_fn("one", &[]);

    let result: crate::Result<()> = CrossModuleStore::scoped(config(dir.path(), "main"), |store| {
        store.put_stored(&decl, ContainerTag::Expr, &one())?;
        Err(crate::Error::InvalidUnit("stop".into()))
    });

    assert!(matches!(result, Err(crate::Error::InvalidUnit(_))));
    assert!(!dir.path().join("main.lock").exists());
    // Closing flushes what was written before the error.
    assert!(dir.path().join("main.xrs").exists());
}
