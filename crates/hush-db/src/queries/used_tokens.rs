//! Token ledger query functions.
//!
//! Nothing here reads or writes `responses`.

use rusqlite::Connection;

use hush_crypto::token::TokenHash;
use hush_ledger::ConsumeOutcome;
use hush_types::SurveyId;

use crate::Result;

/// Redeem a token hash. One statement: the primary key is the check.
pub fn consume(conn: &Connection, hash: &TokenHash, survey_id: SurveyId) -> Result<ConsumeOutcome> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO used_tokens (token_hash, survey_id) VALUES (?1, ?2)",
        rusqlite::params![hash.as_str(), survey_id.as_bytes().as_slice()],
    )?;
    Ok(if inserted == 1 {
        ConsumeOutcome::Consumed
    } else {
        ConsumeOutcome::AlreadyUsed
    })
}

/// Whether a token hash has been redeemed for this survey.
pub fn is_used(conn: &Connection, hash: &TokenHash, survey_id: SurveyId) -> Result<bool> {
    let found: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM used_tokens WHERE token_hash = ?1 AND survey_id = ?2)",
        rusqlite::params![hash.as_str(), survey_id.as_bytes().as_slice()],
        |row| row.get(0),
    )?;
    Ok(found == 1)
}
