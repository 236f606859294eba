//! Price observations and the rules for recording them.
//!
//! The one real invariant in here: a "sale" price only counts as a sale
//! when the submitter also supplies the original price, and that original
//! price is strictly higher. Everything else is bookkeeping.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{query::Query, sqlite::SqliteArguments, sqlite::SqliteRow, FromRow, Row as _, Sqlite};
use uuid::Uuid;

use crate::{
    config::Config,
    database::{self, InsertIntoTable, PRICE_HISTORY_TABLE},
    error::{DatabaseError, PricedropError, ValidationErrors},
};

use super::{item::Item, store::Store};

/// One timestamped price observation for an item at a store.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PriceHistory {
    pub id: Uuid,
    pub item_id: Uuid,
    pub store_id: Uuid,

    /// The price paid (the sale price, when `on_sale` is set).
    pub price: Decimal,
    pub currency: String,
    pub date_recorded: DateTime<Utc>,

    pub on_sale: bool,

    /// The original price, present exactly when `on_sale` is set.
    pub pre_sale_price: Option<Decimal>,

    pub product_url: Option<String>,
}

/// A price submission before validation.
///
/// `currency` and `date_recorded` may be left out; submission fills them
/// from the config default and the current time.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceEntryForm {
    pub store_id: Uuid,
    pub price: Decimal,
    pub currency: Option<String>,
    pub date_recorded: Option<DateTime<Utc>>,
    pub on_sale: bool,
    pub pre_sale_price: Option<Decimal>,
    pub product_url: Option<String>,
}

impl PriceEntryForm {
    pub fn new(store_id: Uuid, price: Decimal) -> Self {
        Self {
            store_id,
            price,
            currency: None,
            date_recorded: None,
            on_sale: false,
            pre_sale_price: None,
            product_url: None,
        }
    }

    /// Checks the sale-price rules, normalizing as it goes.
    ///
    /// - `on_sale` without an original price: rejected.
    /// - `on_sale` with an original price at or below the sale price:
    ///   rejected.
    /// - not `on_sale`: any submitted original price is dropped, silently.
    ///
    /// Errors land on the field that broke the rule, and the whole form is
    /// rejected as a unit.
    pub fn validated(mut self) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.on_sale {
            match self.pre_sale_price {
                None => errors.add(
                    "pre_sale_price",
                    "original price is required when the entry is marked as a sale.",
                ),
                Some(pre_sale) if pre_sale <= self.price => errors.add(
                    "pre_sale_price",
                    "original price must be greater than the sale price.",
                ),
                Some(_) => {}
            }
        } else {
            self.pre_sale_price = None;
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(errors)
        }
    }
}

/// Form prefill taken from an item's most recent purchase.
///
/// Both fields always come from the same entry, so the suggested URL can
/// never point at a different store than the suggested store.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct PurchaseDefaults {
    pub store_id: Option<Uuid>,
    pub product_url: Option<String>,
}

/// Computes prefill defaults from an item's price history.
///
/// Pure: picks the most recently recorded entry and takes both the store
/// and the product URL from it. No entries, no defaults.
pub fn defaults_from_history(entries: &[PriceHistory]) -> PurchaseDefaults {
    let Some(last) = entries.iter().max_by_key(|e| e.date_recorded) else {
        return PurchaseDefaults::default();
    };

    PurchaseDefaults {
        store_id: Some(last.store_id),
        product_url: last.product_url.clone(),
    }
}

impl PriceHistory {
    /// Validates and records one price observation.
    ///
    /// Nothing is persisted when validation fails. A missing item or store
    /// is a not-found error, not a validation error.
    #[tracing::instrument(skip(form))]
    pub async fn submit(item_id: Uuid, form: PriceEntryForm) -> Result<Self, PricedropError> {
        let form = form.validated()?;

        let item = Item::get(item_id).await?.ok_or(PricedropError::NotFound {
            entity: "item",
            id: item_id,
        })?;
        let store = Store::get(form.store_id)
            .await?
            .ok_or(PricedropError::NotFound {
                entity: "store",
                id: form.store_id,
            })?;

        let entry = Self {
            id: Uuid::new_v4(),
            item_id: item.id,
            store_id: store.id,
            price: form.price,
            currency: match form.currency {
                Some(currency) => currency,
                None => Config::default_currency().await,
            },
            date_recorded: form.date_recorded.unwrap_or_else(Utc::now),
            on_sale: form.on_sale,
            pre_sale_price: form.pre_sale_price,
            product_url: form.product_url,
        };

        let mut conn = database::acquire().await?;
        entry
            .make_insertion_query()
            .execute(&mut *conn)
            .await
            .map_err(|e| database::classify_insert_error(PRICE_HISTORY_TABLE, e))?;

        tracing::debug!("Recorded a price for item `{}`.", entry.item_id);
        Ok(entry)
    }

    /// An item's observations, newest first.
    pub async fn for_item(item_id: Uuid) -> Result<Vec<Self>, PricedropError> {
        let mut conn = database::acquire().await?;

        let entries = sqlx::query_as::<_, PriceHistory>(
            "SELECT * FROM price_history WHERE item_id = $1 ORDER BY date_recorded DESC",
        )
        .bind(item_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(DatabaseError::QueryFailed)?;

        Ok(entries)
    }

    /// Prefill defaults for a new entry on this item.
    ///
    /// Read-only; the UI calls this to pre-populate the form before the
    /// user touches it.
    pub async fn last_purchase_defaults(item_id: Uuid) -> Result<PurchaseDefaults, PricedropError> {
        let mut conn = database::acquire().await?;

        let last = sqlx::query_as::<_, PriceHistory>(
            "SELECT * FROM price_history WHERE item_id = $1
             ORDER BY date_recorded DESC LIMIT 1",
        )
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DatabaseError::QueryFailed)?;

        Ok(defaults_from_history(last.as_slice()))
    }
}

impl FromRow<'_, SqliteRow> for PriceHistory {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            store_id: row.try_get("store_id")?,
            price: database::decimal_column(row, "price")?,
            currency: row.try_get("currency")?,
            date_recorded: row.try_get("date_recorded")?,
            on_sale: row.try_get("on_sale")?,
            pre_sale_price: database::optional_decimal_column(row, "pre_sale_price")?,
            product_url: row.try_get("product_url")?,
        })
    }
}

impl InsertIntoTable for PriceHistory {
    fn make_insertion_query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>> {
        sqlx::query(
            "INSERT INTO price_history
             (id, item_id, store_id, price, currency, date_recorded, on_sale, pre_sale_price, product_url)
             VALUES
             ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(self.id)
        .bind(self.item_id)
        .bind(self.store_id)
        .bind(self.price.to_string())
        .bind(&self.currency)
        .bind(self.date_recorded)
        .bind(self.on_sale)
        .bind(self.pre_sale_price.map(|d| d.to_string()))
        .bind(&self.product_url)
    }
}
