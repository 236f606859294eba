//! Stores are the sellers that price observations point at.

use sqlx::{query::Query, sqlite::SqliteArguments, Sqlite};
use uuid::Uuid;

use crate::{
    database::{self, InsertIntoTable, STORE_TABLE},
    error::{DatabaseError, PricedropError},
};

/// A named seller.
///
/// Deleting a store takes its price entries with it.
#[derive(Clone, Debug, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub website_url: Option<String>,
}

impl Store {
    /// Creates and persists a store.
    ///
    /// A duplicate name comes back as a conflict error.
    pub async fn create(name: &str, website_url: Option<String>) -> Result<Self, PricedropError> {
        let store = Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            website_url,
        };

        let mut conn = database::acquire().await?;
        store
            .make_insertion_query()
            .execute(&mut *conn)
            .await
            .map_err(|e| database::classify_insert_error(STORE_TABLE, e))?;

        Ok(store)
    }

    pub async fn get(id: Uuid) -> Result<Option<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let store = sqlx::query_as::<_, Store>("SELECT * FROM store WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(store)
    }

    /// Every store, ordered by name (how pickers list them).
    pub async fn all() -> Result<Vec<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let stores = sqlx::query_as::<_, Store>("SELECT * FROM store ORDER BY name")
            .fetch_all(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(stores)
    }

    /// Removes the store and, by cascade, every price entry recorded at it.
    pub async fn delete(self) -> Result<(), PricedropError> {
        let mut conn = database::acquire().await?;

        sqlx::query("DELETE FROM store WHERE id = $1")
            .bind(self.id)
            .execute(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(())
    }
}

impl InsertIntoTable for Store {
    fn make_insertion_query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        sqlx::query("INSERT INTO store (id, name, website_url) VALUES ($1, $2, $3)")
            .bind(self.id)
            .bind(&self.name)
            .bind(&self.website_url)
    }
}
