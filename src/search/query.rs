use sea_query::*;

use super::details::{Comparison, DateDetail, PriceDetail, TagDetail};
use super::modifiers::{DateTimeModifier, ItemModifier, ToQuery};

/// the item table
#[derive(Iden)]
pub enum Item {
    Table,
    Id,
    Name,
    Description,
    ImagePath,
    CreatedAt,
    UpdatedAt,
}

/// the tag table
#[derive(Iden)]
pub enum Tag {
    Table,
    Id,
    Name,
}

/// the item/tag join table
#[derive(Iden)]
pub enum ItemTag {
    Table,
    ItemId,
    TagId,
}

/// the price history table
#[derive(Iden)]
pub enum PriceHistory {
    Table,
    Id,
    ItemId,
    StoreId,
    Price,
    Currency,
    DateRecorded,
    OnSale,
    PreSalePrice,
    ProductUrl,
}

impl ToQuery for ItemModifier {
    #[tracing::instrument]
    fn to_query(self) -> SimpleExpr {
        match self {
            ItemModifier::Name(q) => {
                tracing::debug!("Checking for name fragment: `{q}`");
                Expr::col(Item::Name).like(format!("%{q}%"))
            }

            ItemModifier::Tag(tag_detail) => match tag_detail {
                TagDetail::Named(name) => {
                    tracing::debug!("Looking for items tagged `{name}`");

                    // LIKE would also work, but an exact lowered match keeps
                    // "TV" from matching "TV Stand"
                    let sub = Query::select()
                        .column(ItemTag::ItemId)
                        .from(ItemTag::Table)
                        .inner_join(
                            Tag::Table,
                            Expr::col((Tag::Table, Tag::Id)).equals((ItemTag::Table, ItemTag::TagId)),
                        )
                        .and_where(
                            Expr::expr(Func::lower(Expr::col((Tag::Table, Tag::Name))))
                                .eq(name.to_lowercase()),
                        )
                        .take();

                    Expr::col((Item::Table, Item::Id)).in_subquery(sub)
                }

                TagDetail::Count(ct, cmp) => {
                    tracing::debug!("Looking for items with {cmp:?} {ct} tags!");

                    // untagged items have no join rows at all, so "exactly
                    // zero" needs its own shape
                    if ct == 0 && cmp == Comparison::Equal {
                        let tagged = Query::select()
                            .column(ItemTag::ItemId)
                            .from(ItemTag::Table)
                            .take();

                        return Expr::col((Item::Table, Item::Id)).not_in_subquery(tagged);
                    }

                    let count = Expr::expr(Func::count(Expr::col((ItemTag::Table, ItemTag::TagId))));
                    let having = match cmp {
                        Comparison::Less => count.lt(ct),
                        Comparison::LessOrEqual => count.lte(ct),
                        Comparison::Equal => count.eq(ct),
                        Comparison::GreaterOrEqual => count.gte(ct),
                        Comparison::Greater => count.gt(ct),
                    };

                    let sub = Query::select()
                        .column(ItemTag::ItemId)
                        .from(ItemTag::Table)
                        .group_by_col(ItemTag::ItemId)
                        .and_having(having)
                        .take();

                    Expr::col((Item::Table, Item::Id)).in_subquery(sub)
                }
            },

            ItemModifier::DateTime(dt_modifier) => {
                let get_col_from_detail = |dd: DateDetail| {
                    tracing::debug!("Given date detail: {dd:?}");
                    match dd {
                        DateDetail::Created(date_time) => (Expr::col(Item::CreatedAt), date_time),
                        DateDetail::Updated(date_time) => (Expr::col(Item::UpdatedAt), date_time),
                    }
                };

                match dt_modifier {
                    DateTimeModifier::Before(dd) => {
                        let (col, time) = get_col_from_detail(dd);
                        col.lt(Value::ChronoDateTimeUtc(Some(Box::new(time))))
                    }

                    DateTimeModifier::After(dd) => {
                        let (col, time) = get_col_from_detail(dd);
                        col.gt(Value::ChronoDateTimeUtc(Some(Box::new(time))))
                    }
                }
            }

            ItemModifier::Price(price_detail) => match price_detail {
                PriceDetail::AtStore(store_id) => {
                    tracing::debug!("Looking for items priced at store `{store_id}`");

                    let sub = Query::select()
                        .column(PriceHistory::ItemId)
                        .from(PriceHistory::Table)
                        .and_where(Expr::col(PriceHistory::StoreId).eq(store_id))
                        .take();

                    Expr::col((Item::Table, Item::Id)).in_subquery(sub)
                }

                PriceDetail::OnSale => {
                    let sub = Query::select()
                        .column(PriceHistory::ItemId)
                        .from(PriceHistory::Table)
                        .and_where(Expr::col(PriceHistory::OnSale).eq(true))
                        .take();

                    Expr::col((Item::Table, Item::Id)).in_subquery(sub)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use sea_query::{Asterisk, Cond, Query, SqliteQueryBuilder};
    use sea_query_binder::{SqlxBinder as _, SqlxValues};

    use crate::search::{
        details::{Comparison, DateDetail, PriceDetail, TagDetail},
        modifiers::{DateTimeModifier, ItemModifier, ToQuery as _},
        query::Item,
    };

    fn render(modifier: ItemModifier) -> (String, SqlxValues) {
        Query::select()
            .column(Asterisk)
            .from(Item::Table)
            .cond_where(Cond::all().add(modifier.to_query()))
            .build_sqlx(SqliteQueryBuilder)
    }

    #[test]
    fn name_modifier_is_a_like() {
        let (select, values) = render(ItemModifier::Name("phone".into()));

        assert_eq!(r#"SELECT * FROM "item" WHERE "name" LIKE ?"#, select);
        assert_eq!(
            values.0 .0.first().unwrap(),
            &sea_query::Value::String(Some(Box::new("%phone%".into())))
        );
    }

    #[test]
    fn date_modifiers_compare_the_right_columns() {
        let (select, _) = render(ItemModifier::DateTime(DateTimeModifier::Before(
            DateDetail::Created(DateTime::from_timestamp_nanos(1_700_000_000_000_000_000)),
        )));
        assert_eq!(r#"SELECT * FROM "item" WHERE "created_at" < ?"#, select);

        let (select, _) = render(ItemModifier::DateTime(DateTimeModifier::After(
            DateDetail::Updated(DateTime::from_timestamp_nanos(0)),
        )));
        assert_eq!(r#"SELECT * FROM "item" WHERE "updated_at" > ?"#, select);
    }

    #[test]
    fn on_sale_checks_the_price_history() {
        let (select, values) = render(ItemModifier::Price(PriceDetail::OnSale));

        assert_eq!(
            r#"SELECT * FROM "item" WHERE "item"."id" IN (SELECT "item_id" FROM "price_history" WHERE "on_sale" = ?)"#,
            select
        );
        assert_eq!(
            values.0 .0.first().unwrap(),
            &sea_query::Value::Bool(Some(true))
        );
    }

    #[test]
    fn zero_tag_count_means_untagged() {
        let (select, _) = render(ItemModifier::Tag(TagDetail::Count(0, Comparison::Equal)));

        assert_eq!(
            r#"SELECT * FROM "item" WHERE "item"."id" NOT IN (SELECT "item_id" FROM "item_tag")"#,
            select
        );
    }
}
