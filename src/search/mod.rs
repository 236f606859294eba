//! Search utilities for the item catalog.
//!
//! A search is a list of [`modifiers::ItemModifier`]s, ANDed together and
//! compiled to SQL by [`query`]. Results come back ordered by item name;
//! [`sort`] can re-order them in memory afterwards.

use sea_query::{Asterisk, Cond, Order, Query, SqliteQueryBuilder};
use sea_query_binder::SqlxBinder as _;

use crate::{
    database,
    error::{DatabaseError, PricedropError},
    models::item::Item,
};

use self::modifiers::{ItemModifier, ToQuery as _};

pub mod details;
pub mod modifiers;
pub mod query;
pub mod sort;

/// Runs a search: every modifier must hold, results ordered by name.
///
/// An empty modifier list returns the whole catalog.
pub async fn find_items(modifiers: Vec<ItemModifier>) -> Result<Vec<Item>, PricedropError> {
    let mut cond = Cond::all();
    for modifier in modifiers {
        cond = cond.add(modifier.to_query());
    }

    let (select, values) = Query::select()
        .column(Asterisk)
        .from(query::Item::Table)
        .cond_where(cond)
        .order_by(query::Item::Name, Order::Asc)
        .build_sqlx(SqliteQueryBuilder);

    let mut conn = database::acquire().await?;

    let items = sqlx::query_as_with::<_, Item, _>(&select, values)
        .fetch_all(&mut *conn)
        .await
        .map_err(DatabaseError::QueryFailed)?;

    Ok(items)
}
