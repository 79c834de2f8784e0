//! # hush-db
//!
//! SQLite persistence for surveys, responses and the token ledger.
//!
//! ## Schema
//!
//! - WAL mode, foreign keys enforced
//! - All timestamps are Unix epoch seconds (u64)
//! - Schema version stored in `PRAGMA user_version`
//! - `responses` and `used_tokens` share no foreign key and no join column
//!   other than the survey id; both are `WITHOUT ROWID`

pub mod migrations;
pub mod queries;
pub mod schema;
pub mod store;

use std::path::Path;

use rusqlite::Connection;

pub use store::SqliteStore;

/// Highest schema version this build understands.
pub const SCHEMA_VERSION: u32 = 1;

const PRAGMAS: &str = "\
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;
    PRAGMA busy_timeout = 5000;
    PRAGMA synchronous = NORMAL;";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("schema upgrade failed: {0}")]
    Migration(String),

    #[error("could not encode column: {0}")]
    Serialization(String),

    #[error("unreadable row: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open the database file at `path`, creating and upgrading it as needed.
pub fn open(path: &Path) -> Result<Connection> {
    prepare(Connection::open(path)?)
}

/// Private in-memory database with the full schema. Used by tests and
/// by the integration harness.
pub fn open_memory() -> Result<Connection> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<Connection> {
    conn.execute_batch(PRAGMAS)?;
    migrations::run(&conn)?;
    Ok(conn)
}
