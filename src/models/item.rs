//! Items are the products being tracked.

use chrono::{DateTime, Utc};
use sqlx::{query::Query, sqlite::SqliteArguments, Sqlite};
use uuid::Uuid;

use crate::{
    database::{self, InsertIntoTable, ITEM_TABLE},
    error::{DatabaseError, PricedropError},
};

use super::{
    attributes::specification::ItemSpecification,
    price::PriceHistory,
    tag::Tag,
};

/// A tracked product.
///
/// Owns its price entries and specifications (both go away with it).
/// Timestamps are server-assigned; `updated_at` is refreshed on every
/// mutation, including tag attach/detach.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: Uuid,

    pub name: String,
    pub description: Option<String>,

    /// Where the item's image lives on disk, if one was uploaded.
    ///
    /// Just a path. Image handling belongs to the app, not this crate.
    pub image_path: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// A fresh, unsaved item. Call [`Item::insert`] to persist it.
    pub fn new(name: &str, description: Option<String>) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description,
            image_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn insert(&self) -> Result<(), PricedropError> {
        let mut conn = database::acquire().await?;

        self.make_insertion_query()
            .execute(&mut *conn)
            .await
            .map_err(|e| database::classify_insert_error(ITEM_TABLE, e))?;

        Ok(())
    }

    pub async fn get(id: Uuid) -> Result<Option<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let item = sqlx::query_as::<_, Item>("SELECT * FROM item WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(item)
    }

    /// Writes the item's editable fields back, bumping `updated_at`.
    #[tracing::instrument(skip(self), fields(id = %self.id))]
    pub async fn update(&mut self) -> Result<(), PricedropError> {
        self.updated_at = Utc::now();

        let mut conn = database::acquire().await?;

        sqlx::query(
            "UPDATE item SET name = $1, description = $2, image_path = $3, updated_at = $4
             WHERE id = $5",
        )
        .bind(&self.name)
        .bind(&self.description)
        .bind(&self.image_path)
        .bind(self.updated_at)
        .bind(self.id)
        .execute(&mut *conn)
        .await
        .map_err(DatabaseError::QueryFailed)?;

        Ok(())
    }

    /// Removes the item and, by cascade, its price entries, specifications,
    /// and tag links.
    pub async fn delete(self) -> Result<(), PricedropError> {
        let mut conn = database::acquire().await?;

        sqlx::query("DELETE FROM item WHERE id = $1")
            .bind(self.id)
            .execute(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(())
    }

    /// Attaches a tag. Attaching the same tag twice is a no-op.
    pub async fn add_tag(&mut self, tag: &Tag) -> Result<(), PricedropError> {
        let mut conn = database::acquire().await?;

        sqlx::query(
            "INSERT INTO item_tag (item_id, tag_id) VALUES ($1, $2)
             ON CONFLICT (item_id, tag_id) DO NOTHING",
        )
        .bind(self.id)
        .bind(tag.id)
        .execute(&mut *conn)
        .await
        .map_err(DatabaseError::QueryFailed)?;

        drop(conn);
        self.touch().await
    }

    pub async fn remove_tag(&mut self, tag: &Tag) -> Result<(), PricedropError> {
        let mut conn = database::acquire().await?;

        sqlx::query("DELETE FROM item_tag WHERE item_id = $1 AND tag_id = $2")
            .bind(self.id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        drop(conn);
        self.touch().await
    }

    /// The item's tags, ordered by name.
    pub async fn tags(&self) -> Result<Vec<Tag>, PricedropError> {
        let mut conn = database::acquire().await?;

        let tags = sqlx::query_as::<_, Tag>(
            "SELECT t.* FROM tag t
             JOIN item_tag it ON it.tag_id = t.id
             WHERE it.item_id = $1
             ORDER BY t.name",
        )
        .bind(self.id)
        .fetch_all(&mut *conn)
        .await
        .map_err(DatabaseError::QueryFailed)?;

        Ok(tags)
    }

    /// This item's price observations, newest first.
    pub async fn price_entries(&self) -> Result<Vec<PriceHistory>, PricedropError> {
        PriceHistory::for_item(self.id).await
    }

    /// This item's specifications in display order.
    pub async fn specifications(&self) -> Result<Vec<ItemSpecification>, PricedropError> {
        ItemSpecification::for_item(self.id).await
    }

    /// Bumps `updated_at`, in memory and in the database.
    async fn touch(&mut self) -> Result<(), PricedropError> {
        self.updated_at = Utc::now();

        let mut conn = database::acquire().await?;

        sqlx::query("UPDATE item SET updated_at = $1 WHERE id = $2")
            .bind(self.updated_at)
            .bind(self.id)
            .execute(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(())
    }
}

impl InsertIntoTable for Item {
    fn make_insertion_query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        sqlx::query(
            "INSERT INTO item (id, name, description, image_path, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.description)
        .bind(&self.image_path)
        .bind(self.created_at)
        .bind(self.updated_at)
    }
}
