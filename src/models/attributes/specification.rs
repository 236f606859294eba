//! Per-item attribute values and the coercion rules that fill them.
//!
//! A specification stores three raw slots (text, numeric, boolean), but
//! only the slot matching its attribute's declared type means anything.
//! The text slot always keeps what was actually submitted, even for
//! number/boolean attributes. It's the audit trail.

use std::str::FromStr as _;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{query::Query, sqlite::SqliteArguments, sqlite::SqliteRow, FromRow, Row as _, Sqlite};
use uuid::Uuid;

use crate::{
    database::{self, InsertIntoTable, ITEM_SPECIFICATION_TABLE},
    error::{DatabaseError, PricedropError},
    models::item::Item,
};

use super::{AttributeDefinition, ValueType};

/// Text that reads as "true" for boolean attributes, after trim+lowercase.
const TRUTHY: [&str; 4] = ["true", "yes", "1", "on"];
const FALSY: [&str; 4] = ["false", "no", "0", "off"];

/// Decimal places kept in the numeric slot.
pub const NUMERIC_SCALE: u32 = 5;

/// The value of one attribute for one item. Unique per (item, attribute).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ItemSpecification {
    pub id: Uuid,
    pub item_id: Uuid,
    pub attribute_id: Uuid,

    /// What was submitted, verbatim.
    pub value_text: Option<String>,

    /// Filled when the attribute is number-typed and the text parsed.
    pub value_numeric: Option<Decimal>,

    /// Tri-state: `None` is "unknown", which is not the same as `false`.
    pub value_boolean: Option<bool>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A specification's value as directed by its attribute's declared type.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub enum EffectiveValue {
    Text(String),
    Number(Decimal),
    Boolean(Option<bool>),
}

impl ItemSpecification {
    /// A fresh, unsaved specification with empty slots.
    pub fn new(item_id: Uuid, attribute_id: Uuid) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            item_id,
            attribute_id,
            value_text: None,
            value_numeric: None,
            value_boolean: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Takes a raw text submission and fills the slot `value_type` declares.
    ///
    /// The text slot always keeps `raw` verbatim. For number attributes, a
    /// parse failure leaves the numeric slot exactly as it was, with no error
    /// and no clearing. Callers must not assume the typed slot is set just
    /// because text was.
    pub fn apply_raw_value(&mut self, value_type: ValueType, raw: impl Into<String>) {
        let raw = raw.into();

        match value_type {
            ValueType::Number => {
                if let Some(parsed) = parse_decimal(raw.trim()) {
                    self.value_numeric = Some(parsed.round_dp(NUMERIC_SCALE));
                }
            }
            ValueType::Boolean => {
                let t = raw.trim().to_lowercase();
                self.value_boolean = if TRUTHY.contains(&t.as_str()) {
                    Some(true)
                } else if FALSY.contains(&t.as_str()) {
                    Some(false)
                } else {
                    // unknown, which is not false
                    None
                };
            }
            ValueType::Text => {}
        }

        self.value_text = Some(raw);
    }

    /// The value this specification holds, as its attribute's type directs.
    ///
    /// Number attributes fall back to the text slot when nothing numeric is
    /// set (the submission may never have parsed). Boolean attributes
    /// return their tri-state slot verbatim, with no fallback.
    pub fn effective_value(&self, value_type: ValueType) -> Option<EffectiveValue> {
        match value_type {
            ValueType::Number => match self.value_numeric {
                Some(n) => Some(EffectiveValue::Number(n)),
                None => self.value_text.clone().map(EffectiveValue::Text),
            },
            ValueType::Boolean => Some(EffectiveValue::Boolean(self.value_boolean)),
            ValueType::Text => self.value_text.clone().map(EffectiveValue::Text),
        }
    }

    /// A display string for UI tables: "Yes"/"No"/"N/A" for booleans,
    /// "N/A" for empty values, and the attribute's unit suffixed onto
    /// everything else.
    pub fn display(&self, attribute: &AttributeDefinition) -> String {
        match self.effective_value(attribute.value_type) {
            Some(EffectiveValue::Boolean(Some(true))) => "Yes".to_string(),
            Some(EffectiveValue::Boolean(Some(false))) => "No".to_string(),
            Some(EffectiveValue::Boolean(None)) | None => "N/A".to_string(),
            Some(EffectiveValue::Number(n)) => with_unit(render_number(n), attribute),
            Some(EffectiveValue::Text(t)) => with_unit(t, attribute),
        }
    }

    /// Sets the value of `attribute_id` on `item_id` from a raw submission,
    /// creating or updating the (item, attribute) row.
    ///
    /// Returns the persisted row; check its slots rather than assuming the
    /// coercion succeeded. A losing insert race on the (item, attribute)
    /// uniqueness comes back as a conflict error.
    #[tracing::instrument]
    pub async fn set_value(
        item_id: Uuid,
        attribute_id: Uuid,
        raw_text: &str,
    ) -> Result<Self, PricedropError> {
        let attribute =
            AttributeDefinition::get(attribute_id)
                .await?
                .ok_or(PricedropError::NotFound {
                    entity: "attribute definition",
                    id: attribute_id,
                })?;
        Item::get(item_id).await?.ok_or(PricedropError::NotFound {
            entity: "item",
            id: item_id,
        })?;

        let mut conn = database::acquire().await?;

        let existing = sqlx::query_as::<_, ItemSpecification>(
            "SELECT * FROM item_specification WHERE item_id = $1 AND attribute_id = $2",
        )
        .bind(item_id)
        .bind(attribute_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DatabaseError::QueryFailed)?;

        match existing {
            Some(mut spec) => {
                spec.apply_raw_value(attribute.value_type, raw_text);
                spec.updated_at = Utc::now();

                sqlx::query(
                    "UPDATE item_specification
                     SET value_text = $1, value_numeric = $2, value_boolean = $3, updated_at = $4
                     WHERE id = $5",
                )
                .bind(&spec.value_text)
                .bind(spec.value_numeric.map(|d| d.to_string()))
                .bind(spec.value_boolean)
                .bind(spec.updated_at)
                .bind(spec.id)
                .execute(&mut *conn)
                .await
                .map_err(DatabaseError::QueryFailed)?;

                Ok(spec)
            }
            None => {
                let mut spec = ItemSpecification::new(item_id, attribute_id);
                spec.apply_raw_value(attribute.value_type, raw_text);

                spec.make_insertion_query()
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| database::classify_insert_error(ITEM_SPECIFICATION_TABLE, e))?;

                Ok(spec)
            }
        }
    }

    /// An item's specifications in display order: group order first, then
    /// attribute order, then attribute name.
    pub async fn for_item(item_id: Uuid) -> Result<Vec<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let specs = sqlx::query_as::<_, ItemSpecification>(
            "SELECT s.* FROM item_specification s
             JOIN attribute_definition a ON a.id = s.attribute_id
             JOIN attribute_group g ON g.id = a.group_id
             WHERE s.item_id = $1
             ORDER BY g.display_order, a.display_order, a.name",
        )
        .bind(item_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(DatabaseError::QueryFailed)?;

        Ok(specs)
    }
}

/// Parses a decimal out of trimmed text, accepting scientific notation.
fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Integral values render with no fractional part; everything else drops
/// its trailing zeros.
fn render_number(n: Decimal) -> String {
    if n.is_integer() {
        n.trunc().to_string()
    } else {
        n.normalize().to_string()
    }
}

fn with_unit(value: String, attribute: &AttributeDefinition) -> String {
    match &attribute.unit {
        Some(unit) => format!("{value} {unit}"),
        None => value,
    }
}

impl FromRow<'_, SqliteRow> for ItemSpecification {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            attribute_id: row.try_get("attribute_id")?,
            value_text: row.try_get("value_text")?,
            value_numeric: database::optional_decimal_column(row, "value_numeric")?,
            value_boolean: row.try_get("value_boolean")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl InsertIntoTable for ItemSpecification {
    fn make_insertion_query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        sqlx::query(
            "INSERT INTO item_specification
             (id, item_id, attribute_id, value_text, value_numeric, value_boolean, created_at, updated_at)
             VALUES
             ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(self.id)
        .bind(self.item_id)
        .bind(self.attribute_id)
        .bind(&self.value_text)
        .bind(self.value_numeric.map(|d| d.to_string()))
        .bind(self.value_boolean)
        .bind(self.created_at)
        .bind(self.updated_at)
    }
}
