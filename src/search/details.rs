//! A detail is something that will be searched on.
//!
//! For example, in a search for "tag:Smartphones", "Smartphones" is the
//! detail.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// created/updated timestamps of an item
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum DateDetail {
    Created(DateTime<Utc>),
    Updated(DateTime<Utc>),
}

/// - has a specific tag
/// - how many tags
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum TagDetail {
    /// Exact tag name, matched case-insensitively.
    Named(String),

    /// The number of tags on an item.
    Count(u8, Comparison),
}

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum Comparison {
    Less,
    LessOrEqual,
    Equal,
    GreaterOrEqual,
    Greater,
}

/// narrowing by an item's price history
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum PriceDetail {
    /// Items with at least one entry recorded at this store.
    AtStore(Uuid),

    /// Items with at least one sale-priced entry.
    OnSale,
}
