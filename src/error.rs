use core::error::Error;
use core::fmt::{self, Display, Formatter};

use pisserror::Error;
use uuid::Uuid;

/// Top-level error for the library.
#[derive(Debug, Error)]
pub enum PricedropError {
    #[error("The database has encountered an error. See: `{_0}`")]
    Database(#[from] DatabaseError),

    #[error("The submission was rejected. See: `{_0}`")]
    Validation(#[from] ValidationErrors),

    #[error("The write conflicts with an existing record. See: `{_0}`")]
    Conflict(#[from] ConflictError),

    #[error("No {entity} with id `{id}` exists.")]
    NotFound { entity: &'static str, id: Uuid },
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to the database. See: `{_0}`")]
    ConnectionError(String),

    #[error("Failed to complete database query. See: `{_0}`")]
    QueryFailed(sqlx::Error),

    #[error("Failed to run database migrations. See: `{_0}`")]
    MigrationFailed(#[from] sqlx::migrate::MigrateError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// during fs read from disk
    #[error("Failed to read config file. See: `{_0}`")]
    ReadFailed(#[from] tokio::io::Error),

    /// parsing
    #[error("Failed to parse config file. See: `{_0}`")]
    ParseFailed(#[from] toml::de::Error),

    /// when we read from disk, the paths should be equal
    #[error("The config file on disk points at a different data directory.")]
    PathMismatch,
}

/// A write that lost to a uniqueness rule in the storage layer.
///
/// Distinct from [`ValidationErrors`]: the submission itself was fine, but
/// an equivalent record already exists. Callers retrying a slug write
/// should regenerate the slug first.
#[derive(Debug, Error)]
pub enum ConflictError {
    #[error("A record in `{table}` already uses that unique value. See: `{detail}`")]
    UniqueViolation { table: &'static str, detail: String },

    #[error("Gave up finding a free slug for `{base}` after too many suffixes.")]
    SlugAttemptsExhausted { base: String },
}

/// One rule violation, attached to the field that broke it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every field-scoped failure from one submission.
///
/// The whole submission is rejected as a unit; nothing is persisted when
/// this comes back.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// True when `field` has at least one error attached.
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl core::error::Error for ValidationErrors {}
