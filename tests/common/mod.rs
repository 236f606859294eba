//! The parent of the other tests.
//!
//! Mostly to import the setup below.

use std::env::temp_dir;

use camino::Utf8PathBuf;
use pricedrop::database;
use uuid::Uuid;

/// call this at the top of any new test func! :)
///
/// The first test in a binary claims a fresh temp folder for the database;
/// the rest share it. Tests run concurrently against that one pool, so
/// only ever assert on rows your own test created.
#[allow(dead_code, reason = "it's used in the other tests")]
pub fn setup() {
    // start logging. only the first caller actually installs it
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let db_temp_dir = Utf8PathBuf::try_from(temp_dir())
        .unwrap()
        .join(Uuid::new_v4().to_string())
        .join("_pricedrop_db");

    std::fs::create_dir_all(&db_temp_dir).expect("create db temp dir");

    // losing this race is fine; it means another test already picked the
    // folder for this binary
    let _ = database::DB_FOLDER_PATH.set(db_temp_dir);
}

/// A short unique marker for scoping names to one test.
#[allow(dead_code, reason = "it's used in the other tests")]
pub fn marker() -> String {
    Uuid::new_v4().simple().to_string()
}
