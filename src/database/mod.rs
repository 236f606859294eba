//! Helps to connect to the database.

use std::str::FromStr as _;
use std::sync::{LazyLock, OnceLock};

use camino::Utf8PathBuf;
use rust_decimal::Decimal;
use sqlx::{
    pool::PoolConnection,
    query::Query,
    sqlite::{SqliteArguments, SqliteConnectOptions, SqliteRow},
    Pool, Row as _, Sqlite,
};
use tokio::sync::OnceCell;

use crate::error::{ConflictError, DatabaseError, PricedropError};

pub const TAG_TABLE: &str = "tag";
pub const STORE_TABLE: &str = "store";
pub const ITEM_TABLE: &str = "item";
pub const ITEM_TAG_TABLE: &str = "item_tag";
pub const PRICE_HISTORY_TABLE: &str = "price_history";
pub const ATTRIBUTE_GROUP_TABLE: &str = "attribute_group";
pub const ATTRIBUTE_DEFINITION_TABLE: &str = "attribute_definition";
pub const ITEM_SPECIFICATION_TABLE: &str = "item_specification";

pub const PRICEDROP_DB_FILE: &str = "pricedrop.sqlite";

/// Where the database file lives.
///
/// Set this before anything touches [`DATABASE`] (tests point it at a temp
/// folder). When unset, the file lands in the working directory.
pub static DB_FOLDER_PATH: OnceLock<Utf8PathBuf> = OnceLock::new();

pub static DATABASE: LazyLock<Pool<Sqlite>> = LazyLock::new(|| {
    let folder = DB_FOLDER_PATH.get_or_init(|| Utf8PathBuf::from("."));

    if let Err(e) = std::fs::create_dir_all(folder) {
        tracing::warn!("Couldn't create the database folder at `{folder}`. err: {e}");
    }

    let options = SqliteConnectOptions::new()
        .filename(folder.join(PRICEDROP_DB_FILE).as_std_path())
        .create_if_missing(true)
        // cascade rules don't fire without this pragma
        .foreign_keys(true);

    sqlx::Pool::<Sqlite>::connect_lazy_with(options)
});

static MIGRATIONS_RAN: OnceCell<()> = OnceCell::const_new();

/// Grabs a pooled connection, running pending migrations first.
///
/// All database access in the crate goes through here, so callers never
/// see a schemaless database.
pub async fn acquire() -> Result<PoolConnection<Sqlite>, DatabaseError> {
    MIGRATIONS_RAN
        .get_or_try_init(|| async {
            sqlx::migrate!("./migrations")
                .run(&*DATABASE)
                .await
                .inspect_err(|e| tracing::error!("Failed to migrate the database! err: {e}"))
        })
        .await?;

    DATABASE
        .acquire()
        .await
        .inspect_err(|e| tracing::error!("Failed to get database connection! err: {e}"))
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))
}

/// A model that knows how to write itself into its table.
pub trait InsertIntoTable {
    /// Creates the query that will insert this value into its table.
    fn make_insertion_query(&self) -> Query<'_, Sqlite, SqliteArguments<'_>>;
}

/// Sorts an insertion failure into "you raced a uniqueness rule" vs.
/// "the database broke".
///
/// Uniqueness violations (duplicate slug, duplicate `(item, attribute)`
/// pair, and so on) come back as [`ConflictError`] so callers can retry;
/// anything else is a plain database error.
pub(crate) fn classify_insert_error(table: &'static str, e: sqlx::Error) -> PricedropError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return ConflictError::UniqueViolation {
                table,
                detail: db_err.message().to_string(),
            }
            .into();
        }
    }

    DatabaseError::QueryFailed(e).into()
}

/// Decodes a TEXT-stored decimal column.
///
/// sqlite has no decimal affinity (and sqlx's sqlite driver no `Decimal`
/// support), so money and numeric slots round-trip through strings.
pub(crate) fn decimal_column(row: &SqliteRow, column: &'static str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.into(),
        source: Box::new(e),
    })
}

pub(crate) fn optional_decimal_column(
    row: &SqliteRow,
    column: &'static str,
) -> Result<Option<Decimal>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;

    raw.map(|s| {
        Decimal::from_str(&s).map_err(|e| sqlx::Error::ColumnDecode {
            index: column.into(),
            source: Box::new(e),
        })
    })
    .transpose()
}
