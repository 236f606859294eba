use sea_query::SimpleExpr;

use super::details::{DateDetail, PriceDetail, TagDetail};

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum DateTimeModifier {
    Before(DateDetail),
    After(DateDetail),
}

/// An item modifier directly narrows the catalog based on item data.
///
/// Multiple modifiers in one search AND together (matching the UI, where
/// every extra filter narrows the result list).
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum ItemModifier {
    /// Substring match on the item name, case-insensitive.
    Name(String),
    Tag(TagDetail),
    DateTime(DateTimeModifier),
    Price(PriceDetail),
}

/// A modifier must become a query to be used.
///
/// All modifiers must implement this trait!
pub trait ToQuery {
    /// Converts the modifier into a query for use in querying the database.
    ///
    /// This assumes that each modifier can become a query clause.
    fn to_query(self) -> SimpleExpr;
}
