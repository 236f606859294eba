//! Tags label items for filtering and display.

use sqlx::{query::Query, sqlite::SqliteArguments, Sqlite};
use uuid::Uuid;

use crate::{
    database::{self, InsertIntoTable, TAG_TABLE},
    error::{DatabaseError, PricedropError},
};

/// A label users attach to items ("Electronics", "Groceries", ...).
///
/// Names are unique. A tag has no lifecycle of its own: deleting one
/// detaches it from every item without touching the items.
#[derive(Clone, Debug, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

impl Tag {
    /// Creates and persists a tag.
    ///
    /// A duplicate name comes back as a conflict error.
    pub async fn create(name: &str) -> Result<Self, PricedropError> {
        let tag = Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };

        let mut conn = database::acquire().await?;
        tag.make_insertion_query()
            .execute(&mut *conn)
            .await
            .map_err(|e| database::classify_insert_error(TAG_TABLE, e))?;

        Ok(tag)
    }

    pub async fn get(id: Uuid) -> Result<Option<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tag WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(tag)
    }

    pub async fn get_by_name(name: &str) -> Result<Option<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tag WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(tag)
    }

    /// Every tag, ordered by name.
    pub async fn all() -> Result<Vec<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let tags = sqlx::query_as::<_, Tag>("SELECT * FROM tag ORDER BY name")
            .fetch_all(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(tags)
    }

    /// Removes the tag, detaching it from all items (the items stay).
    pub async fn delete(self) -> Result<(), PricedropError> {
        let mut conn = database::acquire().await?;

        sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(self.id)
            .execute(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(())
    }
}

impl InsertIntoTable for Tag {
    fn make_insertion_query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        sqlx::query("INSERT INTO tag (id, name) VALUES ($1, $2)")
            .bind(self.id)
            .bind(&self.name)
    }
}
