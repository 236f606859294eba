//! The typed specification system.
//!
//! Admins define attributes ("Fat", "Width", "Wireless?") in named groups,
//! each declaring the type its values should have. Items then carry one
//! [`specification::ItemSpecification`] per attribute. The schema never
//! changes; only these rows do.

use core::fmt::{self, Display, Formatter};

use sqlx::{query::Query, sqlite::SqliteArguments, Sqlite};
use uuid::Uuid;

use crate::{
    database::{self, InsertIntoTable, ATTRIBUTE_DEFINITION_TABLE, ATTRIBUTE_GROUP_TABLE},
    error::{DatabaseError, PricedropError},
};

pub mod slug;
pub mod specification;

/// The type an attribute's values are interpreted as.
///
/// This is what decides a specification's effective value, not whichever
/// slots happen to be filled in.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    serde::Serialize,
    serde::Deserialize,
    sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Text,
    Number,
    Boolean,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named bucket of related attributes ("Nutritional Information",
/// "Physical Dimensions"). Purely for display grouping and ordering.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct AttributeGroup {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub display_order: i64,
}

impl AttributeGroup {
    /// Creates and persists a group.
    ///
    /// A duplicate name comes back as a conflict error.
    pub async fn create(
        name: &str,
        description: Option<String>,
        display_order: i64,
    ) -> Result<Self, PricedropError> {
        let group = Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description,
            display_order,
        };

        let mut conn = database::acquire().await?;
        group
            .make_insertion_query()
            .execute(&mut *conn)
            .await
            .map_err(|e| database::classify_insert_error(ATTRIBUTE_GROUP_TABLE, e))?;

        Ok(group)
    }

    pub async fn get(id: Uuid) -> Result<Option<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let group = sqlx::query_as::<_, AttributeGroup>("SELECT * FROM attribute_group WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(group)
    }

    /// Every group in display order.
    pub async fn all() -> Result<Vec<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let groups = sqlx::query_as::<_, AttributeGroup>(
            "SELECT * FROM attribute_group ORDER BY display_order, name",
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(DatabaseError::QueryFailed)?;

        Ok(groups)
    }

    /// Removes the group and, by cascade, its attribute definitions (and
    /// their item specifications).
    pub async fn delete(self) -> Result<(), PricedropError> {
        let mut conn = database::acquire().await?;

        sqlx::query("DELETE FROM attribute_group WHERE id = $1")
            .bind(self.id)
            .execute(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(())
    }
}

impl InsertIntoTable for AttributeGroup {
    fn make_insertion_query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        sqlx::query(
            "INSERT INTO attribute_group (id, name, description, display_order)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.description)
        .bind(self.display_order)
    }
}

/// One schema field items can be specified against.
///
/// Names are unique within a group; slugs are unique everywhere. A slug
/// left empty at creation is derived from `"{group name}-{name}"`; an
/// explicitly set slug is never overwritten afterwards.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct AttributeDefinition {
    pub id: Uuid,
    pub group_id: Uuid,

    pub name: String,

    /// Machine-readable handle, for programmatic access.
    pub slug: String,

    /// Unit of measurement ("g", "cm", "GHz"), appended when displaying.
    pub unit: Option<String>,

    pub value_type: ValueType,
    pub description: Option<String>,
    pub display_order: i64,
}

impl AttributeDefinition {
    /// A fresh, unsaved definition with no slug. [`Self::create`] derives
    /// one on the way into the database.
    pub fn new(group: &AttributeGroup, name: &str, value_type: ValueType) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id: group.id,
            name: name.to_string(),
            slug: String::new(),
            unit: None,
            value_type,
            description: None,
            display_order: 0,
        }
    }

    /// Persists the definition, deriving a slug first if none was set.
    ///
    /// A losing race on the slug's uniqueness (or a duplicate name within
    /// the group) comes back as a conflict error; callers retrying should
    /// clear the slug so it gets regenerated.
    #[tracing::instrument(skip(self), fields(name = %self.name))]
    pub async fn create(&mut self) -> Result<(), PricedropError> {
        self.ensure_slug().await?;

        let mut conn = database::acquire().await?;
        self.make_insertion_query()
            .execute(&mut *conn)
            .await
            .map_err(|e| database::classify_insert_error(ATTRIBUTE_DEFINITION_TABLE, e))?;

        Ok(())
    }

    /// Writes the definition's fields back.
    ///
    /// The slug is only derived when it's still empty. An existing slug is
    /// kept exactly as-is, no matter what else changed.
    pub async fn save(&mut self) -> Result<(), PricedropError> {
        self.ensure_slug().await?;

        let mut conn = database::acquire().await?;

        sqlx::query(
            "UPDATE attribute_definition
             SET group_id = $1, name = $2, slug = $3, unit = $4, value_type = $5,
                 description = $6, display_order = $7
             WHERE id = $8",
        )
        .bind(self.group_id)
        .bind(&self.name)
        .bind(&self.slug)
        .bind(&self.unit)
        .bind(self.value_type)
        .bind(&self.description)
        .bind(self.display_order)
        .bind(self.id)
        .execute(&mut *conn)
        .await
        .map_err(|e| database::classify_insert_error(ATTRIBUTE_DEFINITION_TABLE, e))?;

        Ok(())
    }

    pub async fn get(id: Uuid) -> Result<Option<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let attribute =
            sqlx::query_as::<_, AttributeDefinition>("SELECT * FROM attribute_definition WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(DatabaseError::QueryFailed)?;

        Ok(attribute)
    }

    pub async fn get_by_slug(slug: &str) -> Result<Option<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let attribute = sqlx::query_as::<_, AttributeDefinition>(
            "SELECT * FROM attribute_definition WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DatabaseError::QueryFailed)?;

        Ok(attribute)
    }

    /// A group's definitions in display order.
    pub async fn for_group(group_id: Uuid) -> Result<Vec<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let attributes = sqlx::query_as::<_, AttributeDefinition>(
            "SELECT * FROM attribute_definition WHERE group_id = $1
             ORDER BY display_order, name",
        )
        .bind(group_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(DatabaseError::QueryFailed)?;

        Ok(attributes)
    }

    /// Removes the definition and, by cascade, its item specifications.
    pub async fn delete(self) -> Result<(), PricedropError> {
        let mut conn = database::acquire().await?;

        sqlx::query("DELETE FROM attribute_definition WHERE id = $1")
            .bind(self.id)
            .execute(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?;

        Ok(())
    }

    /// Derives a slug from the group name and attribute name, suffixing
    /// until free. Does nothing when a slug is already set.
    async fn ensure_slug(&mut self) -> Result<(), PricedropError> {
        if !self.slug.is_empty() {
            return Ok(());
        }

        let mut conn = database::acquire().await?;

        let group_name: String = sqlx::query_scalar("SELECT name FROM attribute_group WHERE id = $1")
            .bind(self.group_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(DatabaseError::QueryFailed)?
            .ok_or(PricedropError::NotFound {
                entity: "attribute group",
                id: self.group_id,
            })?;

        let base = slug::slugify(&format!("{group_name}-{}", self.name));

        // one probe for everything the suffix search could collide with.
        // the unique constraint on `slug` catches writers that race us
        // between this read and the insert.
        let taken: Vec<String> = sqlx::query_scalar(
            "SELECT slug FROM attribute_definition
             WHERE (slug = $1 OR slug LIKE $2) AND id <> $3",
        )
        .bind(&base)
        .bind(format!("{base}-%"))
        .bind(self.id)
        .fetch_all(&mut *conn)
        .await
        .map_err(DatabaseError::QueryFailed)?;

        self.slug = slug::next_free_slug(&base, &taken.into_iter().collect())?;
        tracing::debug!("Derived slug `{}` for attribute `{}`.", self.slug, self.name);

        Ok(())
    }
}

impl InsertIntoTable for AttributeDefinition {
    fn make_insertion_query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        sqlx::query(
            "INSERT INTO attribute_definition
             (id, group_id, name, slug, unit, value_type, description, display_order)
             VALUES
             ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(self.id)
        .bind(self.group_id)
        .bind(&self.name)
        .bind(&self.slug)
        .bind(&self.unit)
        .bind(self.value_type)
        .bind(&self.description)
        .bind(self.display_order)
    }
}
