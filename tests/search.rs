//! Tests the search modifiers against a real database.
//!
//! Every test seeds its own items, scoped by a unique marker in their
//! names, so the shared test database never bleeds between tests.

mod common;

use pricedrop::{
    models::{
        item::Item,
        price::{PriceEntryForm, PriceHistory},
        store::Store,
        tag::Tag,
    },
    search::{
        self,
        details::{Comparison, PriceDetail, TagDetail},
        modifiers::ItemModifier,
        sort::{FinishedQuery, SortOrder, SortType},
    },
};
use rust_decimal::Decimal;

#[tokio::test]
async fn name_search_is_a_substring_match() {
    common::setup();
    let m = common::marker();

    for name in ["Apple iPhone", "Samsung Galaxy"] {
        Item::new(&format!("{name} {m}"), None)
            .insert()
            .await
            .expect("insert");
    }

    let hits = search::find_items(vec![ItemModifier::Name(format!("iPhone {m}"))])
        .await
        .expect("search");

    assert_eq!(hits.len(), 1);
    assert!(hits[0].name.contains("iPhone"));

    // the bare marker matches both, ordered by name
    let hits = search::find_items(vec![ItemModifier::Name(m.clone())])
        .await
        .expect("search");
    assert_eq!(hits.len(), 2);
    assert!(hits[0].name.starts_with("Apple"));
    assert!(hits[1].name.starts_with("Samsung"));
}

#[tokio::test]
async fn tag_search_matches_exactly_and_case_insensitively() {
    common::setup();
    let m = common::marker();

    let mut tagged = Item::new(&format!("Tagged Product {m}"), None);
    tagged.insert().await.expect("insert");
    let untagged = Item::new(&format!("Plain Product {m}"), None);
    untagged.insert().await.expect("insert");

    let tag = Tag::create(&format!("Smartphones {m}"))
        .await
        .expect("create tag");
    tagged.add_tag(&tag).await.expect("attach");

    // matching is case-insensitive on the full name
    let hits = search::find_items(vec![
        ItemModifier::Name(m.clone()),
        ItemModifier::Tag(TagDetail::Named(format!("SMARTPHONES {m}"))),
    ])
    .await
    .expect("search");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, tagged.id);

    // a name fragment isn't an exact tag name
    let hits = search::find_items(vec![
        ItemModifier::Name(m.clone()),
        ItemModifier::Tag(TagDetail::Named("Smartphones".to_string())),
    ])
    .await
    .expect("search");

    assert!(hits.is_empty(), "fragments shouldn't match");
}

#[tokio::test]
async fn every_tag_modifier_must_hold() {
    common::setup();
    let m = common::marker();

    let mut both = Item::new(&format!("Doubly Tagged {m}"), None);
    both.insert().await.expect("insert");
    let mut one = Item::new(&format!("Singly Tagged {m}"), None);
    one.insert().await.expect("insert");

    let first = Tag::create(&format!("First {m}")).await.expect("tag");
    let second = Tag::create(&format!("Second {m}")).await.expect("tag");

    both.add_tag(&first).await.expect("attach");
    both.add_tag(&second).await.expect("attach");
    one.add_tag(&first).await.expect("attach");

    let hits = search::find_items(vec![
        ItemModifier::Name(m.clone()),
        ItemModifier::Tag(TagDetail::Named(format!("First {m}"))),
        ItemModifier::Tag(TagDetail::Named(format!("Second {m}"))),
    ])
    .await
    .expect("search");

    assert_eq!(hits.len(), 1, "only the doubly-tagged item has both");
    assert_eq!(hits[0].id, both.id);
}

#[tokio::test]
async fn tag_counts_narrow_the_catalog() {
    common::setup();
    let m = common::marker();

    let untagged = Item::new(&format!("Untagged Product {m}"), None);
    untagged.insert().await.expect("insert");

    let mut tagged = Item::new(&format!("Tagged-up Product {m}"), None);
    tagged.insert().await.expect("insert");
    for n in 0..3 {
        let tag = Tag::create(&format!("Counted {n} {m}")).await.expect("tag");
        tagged.add_tag(&tag).await.expect("attach");
    }

    let hits = search::find_items(vec![
        ItemModifier::Name(m.clone()),
        ItemModifier::Tag(TagDetail::Count(0, Comparison::Equal)),
    ])
    .await
    .expect("search untagged");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, untagged.id);

    let hits = search::find_items(vec![
        ItemModifier::Name(m.clone()),
        ItemModifier::Tag(TagDetail::Count(3, Comparison::Equal)),
    ])
    .await
    .expect("search three tags");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, tagged.id);

    let hits = search::find_items(vec![
        ItemModifier::Name(m.clone()),
        ItemModifier::Tag(TagDetail::Count(1, Comparison::GreaterOrEqual)),
    ])
    .await
    .expect("search at least one");
    assert_eq!(hits.len(), 1, "untagged items have no join rows");
}

#[tokio::test]
async fn on_sale_finds_items_with_sale_entries() {
    common::setup();
    let m = common::marker();

    let full_price = Item::new(&format!("Full Price Product {m}"), None);
    full_price.insert().await.expect("insert");
    let discounted = Item::new(&format!("Discounted Product {m}"), None);
    discounted.insert().await.expect("insert");

    let store = Store::create(&format!("Search Store {m}"), None)
        .await
        .expect("store");

    PriceHistory::submit(
        full_price.id,
        PriceEntryForm::new(store.id, Decimal::new(9999, 2)),
    )
    .await
    .expect("full price entry");

    let mut sale = PriceEntryForm::new(store.id, Decimal::new(7999, 2));
    sale.on_sale = true;
    sale.pre_sale_price = Some(Decimal::new(9999, 2));
    PriceHistory::submit(discounted.id, sale)
        .await
        .expect("sale entry");

    let hits = search::find_items(vec![
        ItemModifier::Name(m.clone()),
        ItemModifier::Price(PriceDetail::OnSale),
    ])
    .await
    .expect("search");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, discounted.id);

    // both items show up when filtering by store instead
    let hits = search::find_items(vec![
        ItemModifier::Name(m.clone()),
        ItemModifier::Price(PriceDetail::AtStore(store.id)),
    ])
    .await
    .expect("search by store");
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn results_can_be_resorted_in_memory() {
    common::setup();
    let m = common::marker();

    for name in ["Cherries", "Apricots", "Bananas"] {
        Item::new(&format!("{name} {m}"), None)
            .insert()
            .await
            .expect("insert");
    }

    let hits = search::find_items(vec![ItemModifier::Name(m.clone())])
        .await
        .expect("search");

    let mut query = FinishedQuery::new(hits);
    query.sort(SortType::Name, SortOrder::Descending);

    let names: Vec<&str> = query
        .items()
        .iter()
        .map(|i| i.name.split_whitespace().next().unwrap())
        .collect();
    assert_eq!(names, ["Cherries", "Bananas", "Apricots"]);
}
