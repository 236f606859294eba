//! Helps to sort item search results.

use crate::models::item::Item;

/// Different sorts users can apply to a search.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortType {
    Name,
    DateCreated,
    DateUpdated,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortOrder {
    /// Lowest value first.
    Ascending,
    /// Highest value first.
    Descending,
}

/// A query that has been executed and can now be sorted based on user input.
pub struct FinishedQuery(Vec<Item>);

impl FinishedQuery {
    pub fn new(items: Vec<Item>) -> Self {
        Self(items)
    }

    pub fn items(&self) -> &[Item] {
        &self.0
    }

    pub fn into_items(self) -> Vec<Item> {
        self.0
    }

    pub fn sort(&mut self, ty: SortType, order: SortOrder) {
        let v = &mut self.0;

        match ty {
            SortType::Name => v.sort_by(|a, b| a.name.cmp(&b.name)),
            SortType::DateCreated => v.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortType::DateUpdated => v.sort_by(|a, b| a.updated_at.cmp(&b.updated_at)),
        }

        if let SortOrder::Descending = order {
            v.reverse();
        }
    }
}
