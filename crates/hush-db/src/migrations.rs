//! Forward-only schema upgrades.
//!
//! `PRAGMA user_version` records the last applied step. Each step runs in
//! its own transaction together with the version bump.

use rusqlite::Connection;

use crate::{schema, DbError, Result, SCHEMA_VERSION};

/// Ordered upgrade steps; entry `i` brings the schema to version `i + 1`.
const STEPS: &[&str] = &[schema::SCHEMA_V1];

fn user_version(conn: &Connection) -> Result<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Bring `conn` up to [`SCHEMA_VERSION`].
pub fn run(conn: &Connection) -> Result<()> {
    let found = user_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "database is at v{found}, this build only knows up to v{SCHEMA_VERSION}"
        )));
    }

    for version in (found + 1)..=SCHEMA_VERSION {
        let sql = STEPS
            .get(version as usize - 1)
            .ok_or_else(|| DbError::Migration(format!("no upgrade step for v{version}")))?;
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
        tracing::info!(version, "schema upgraded");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch("PRAGMA foreign_keys = ON;").expect("pragma");
        conn
    }

    fn columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare");
        stmt.query_map([], |row| row.get::<_, String>(1))
            .expect("query")
            .collect::<std::result::Result<Vec<_>, _>>()
            .expect("collect")
    }

    fn foreign_tables(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA foreign_key_list({table})"))
            .expect("prepare");
        stmt.query_map([], |row| row.get::<_, String>(2))
            .expect("query")
            .collect::<std::result::Result<Vec<_>, _>>()
            .expect("collect")
    }

    #[test]
    fn test_upgrade_from_empty_then_noop() {
        let conn = fresh();
        run(&conn).expect("upgrade");
        assert_eq!(user_version(&conn).expect("version"), SCHEMA_VERSION);
        run(&conn).expect("already current");
        assert_eq!(STEPS.len(), SCHEMA_VERSION as usize);
    }

    #[test]
    fn test_newer_version_rejected() {
        let conn = fresh();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .expect("set version");
        assert!(matches!(run(&conn), Err(DbError::Migration(_))));
    }

    #[test]
    fn test_tables_created() {
        let conn = fresh();
        run(&conn).expect("migrate");

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .expect("prepare");
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .expect("query")
            .collect::<std::result::Result<_, _>>()
            .expect("collect");
        assert_eq!(tables, vec!["questions", "responses", "surveys", "used_tokens"]);
    }

    #[test]
    fn test_response_and_ledger_columns_are_minimal() {
        let conn = fresh();
        run(&conn).expect("migrate");

        assert_eq!(
            columns(&conn, "responses"),
            vec!["id", "survey_id", "answers", "submitted_at"]
        );
        assert_eq!(columns(&conn, "used_tokens"), vec!["token_hash", "survey_id"]);
    }

    #[test]
    fn test_no_link_between_responses_and_ledger() {
        let conn = fresh();
        run(&conn).expect("migrate");

        assert!(!foreign_tables(&conn, "responses").contains(&"used_tokens".to_string()));
        assert!(foreign_tables(&conn, "used_tokens").is_empty());
    }

    #[test]
    fn test_no_rowid_on_anonymous_tables() {
        let conn = fresh();
        run(&conn).expect("migrate");

        assert!(conn.prepare("SELECT rowid FROM responses").is_err());
        assert!(conn.prepare("SELECT rowid FROM used_tokens").is_err());
    }
}
