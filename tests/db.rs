//! This module tests the database itself: migrations, basic CRUD, and the
//! cascade rules between entities.

mod common;

use std::str::FromStr as _;
use std::{env::temp_dir, time::Duration};

use camino::Utf8PathBuf;
use pricedrop::{
    error::PricedropError,
    models::{item::Item, price::PriceEntryForm, price::PriceHistory, store::Store, tag::Tag},
};
use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteConnectOptions, Sqlite};
use uuid::Uuid;

/// Ensures that migrations don't error, even when running them twice.
#[tokio::test]
async fn migrations() {
    common::setup();

    let folder = Utf8PathBuf::try_from(temp_dir())
        .unwrap()
        .join(Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&folder)
        .await
        .expect("create migrations temp dir");

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{folder}/migrations.sqlite"))
        .expect("database opts str")
        .create_if_missing(true);

    let pool = sqlx::Pool::<Sqlite>::connect_lazy_with(options);

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    // run them again!
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations twice");

    // make a quick query to ensure things work
    //
    // (pool is lazy)
    let mut conn = pool.acquire().await.expect("make db conn");
    sqlx::query("SELECT * FROM item")
        .execute(&mut *conn)
        .await
        .expect("running select");
}

/// Tags attach, detach, and never take their items with them.
#[tokio::test]
async fn tag_attach_detach() {
    common::setup();
    let m = common::marker();

    let mut item = Item::new(&format!("Test Product {m}"), Some("a test product".into()));
    item.insert().await.expect("insert item");

    let tag = Tag::create(&format!("Electronics {m}"))
        .await
        .expect("create tag");

    item.add_tag(&tag).await.expect("attach");
    // attaching twice is a no-op, not an error
    item.add_tag(&tag).await.expect("attach again");

    let tags = item.tags().await.expect("list tags");
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, format!("Electronics {m}"));

    // deleting the tag detaches it; the item survives
    tag.delete().await.expect("delete tag");
    assert!(item.tags().await.expect("list tags").is_empty());
    assert!(Item::get(item.id).await.expect("get item").is_some());
}

/// `updated_at` moves on every mutation; `created_at` never does.
#[tokio::test]
async fn item_timestamps_refresh_on_mutation() {
    common::setup();
    let m = common::marker();

    let mut item = Item::new(&format!("Aging Product {m}"), None);
    item.insert().await.expect("insert item");
    let created = item.created_at;
    let initial_update = item.updated_at;

    std::thread::sleep(Duration::from_millis(5));
    item.description = Some("now with a description".into());
    item.update().await.expect("update item");

    assert_eq!(item.created_at, created);
    assert!(item.updated_at > initial_update, "field update bumps it");

    // tag attach counts as a mutation too
    let before_tagging = item.updated_at;
    std::thread::sleep(Duration::from_millis(5));

    let tag = Tag::create(&format!("Fresh {m}")).await.expect("tag");
    item.add_tag(&tag).await.expect("attach");
    assert!(item.updated_at > before_tagging);
}

/// Deleting a store takes its price entries down with it.
#[tokio::test]
async fn deleting_a_store_drops_its_entries() {
    common::setup();
    let m = common::marker();

    let item = Item::new(&format!("Cascading Product {m}"), None);
    item.insert().await.expect("insert item");

    let store = Store::create(&format!("Doomed Store {m}"), None)
        .await
        .expect("create store");

    PriceHistory::submit(item.id, PriceEntryForm::new(store.id, Decimal::new(9999, 2)))
        .await
        .expect("submit entry");
    assert_eq!(item.price_entries().await.expect("entries").len(), 1);

    store.delete().await.expect("delete store");

    assert!(
        item.price_entries().await.expect("entries").is_empty(),
        "entries cascade"
    );
    assert!(Item::get(item.id).await.expect("get").is_some(), "item stays");
}

/// Deleting an item takes its price entries along.
#[tokio::test]
async fn deleting_an_item_drops_its_entries() {
    common::setup();
    let m = common::marker();

    let item = Item::new(&format!("Short-lived Product {m}"), None);
    item.insert().await.expect("insert item");
    let item_id = item.id;

    let store = Store::create(&format!("Lasting Store {m}"), None)
        .await
        .expect("create store");

    PriceHistory::submit(item_id, PriceEntryForm::new(store.id, Decimal::new(500, 2)))
        .await
        .expect("submit entry");

    item.delete().await.expect("delete item");

    assert!(Item::get(item_id).await.expect("get").is_none());
    assert!(
        PriceHistory::for_item(item_id).await.expect("entries").is_empty(),
        "entries cascade with the item"
    );
    assert!(
        Store::get(store.id).await.expect("get store").is_some(),
        "the store is untouched"
    );
}

/// Duplicate tag and store names come back as conflicts, not plain
/// database errors.
#[tokio::test]
async fn duplicate_names_conflict() {
    common::setup();
    let m = common::marker();

    let name = format!("Unique Tag {m}");
    Tag::create(&name).await.expect("first tag");
    let err = Tag::create(&name).await.expect_err("second tag");
    assert!(matches!(err, PricedropError::Conflict(_)), "got: {err:?}");

    let store_name = format!("Unique Store {m}");
    Store::create(&store_name, None).await.expect("first store");
    let err = Store::create(&store_name, Some("https://example.com".into()))
        .await
        .expect_err("second store");
    assert!(matches!(err, PricedropError::Conflict(_)), "got: {err:?}");
}
