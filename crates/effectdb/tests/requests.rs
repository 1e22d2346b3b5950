use effectdb::{
    ErrorKind, ErrorOrigin,
    core::db::EffectRow,
    error::QueryErrorKind,
    prelude::*,
};

fn key(ledger: i32, tx: i32, op: i32) -> i64 {
    OperationKey::new(ledger, tx, op)
        .expect("key should build")
        .to_i64()
}

fn store() -> MemoryStore {
    let mut store = MemoryStore::new();
    let account = store.insert_account("GACCOUNT");
    store.insert_ledger(7).expect("ledger should insert");

    for op in 1..=3 {
        for order in 1..=2 {
            store.insert_effect(EffectRow {
                operation_id: key(7, 1, op),
                order,
                account_id: account,
                effect_type: EffectType::AccountDebited,
                details: None,
            });
        }
    }

    store
}

#[test]
fn configured_separator_drives_request_paging() {
    let config = Config::from_toml_str("[paging]\ndefault_limit = 4\nseparator = \":\"\n")
        .expect("config should load");
    let session = DbSession::new(store().snapshot()).with_config(config.paging);
    let ctx = ExecContext::new();

    let page = session
        .page_query(None, None, None)
        .expect("defaults should validate");
    let first = session
        .load_effects(&ctx, &page, |query| query.for_account("GACCOUNT"))
        .expect("first page should load");
    assert_eq!(first.len(), 4);

    let last = first.last().expect("page should not be empty");
    let cursor = session.paging_token(last);
    assert_eq!(cursor, format!("{}:2", key(7, 1, 2)));

    let page = session
        .page_query(Some(&cursor), Some("asc"), None)
        .expect("issued token should be accepted back");
    let second = session
        .load_effects(&ctx, &page, |query| query.for_ledger(7))
        .expect("second page should load");

    assert_eq!(second.len(), 2);
    assert_eq!(second[0].operation_id, key(7, 1, 3));
}

#[test]
fn rejected_requests_surface_public_error_kinds() {
    let session = DbSession::new(store().snapshot());
    let ctx = ExecContext::new();

    let err: Error = session
        .page_query(None, None, Some(1_000))
        .expect_err("oversized limit should fail")
        .into();
    assert_eq!(err.kind, ErrorKind::Query(QueryErrorKind::InvalidLimit));

    let page = PageQuery::new("", "desc", 5);
    let err: Error = session
        .load_effects(&ctx, &page, |query| query.for_transaction("missing"))
        .expect_err("missing transaction should fail")
        .into();
    assert_eq!(err.kind, ErrorKind::Query(QueryErrorKind::NotFound));
    assert_eq!(err.origin, ErrorOrigin::Lookup);
    assert_eq!(err.message, "transaction 'missing' not found");
}

#[test]
fn version_is_exported() {
    assert!(!effectdb::VERSION.is_empty());
}
