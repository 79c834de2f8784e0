//! Anonymous response query functions.
//!
//! Nothing here reads or writes `used_tokens`.

use std::collections::BTreeMap;

use rusqlite::Connection;

use hush_types::{QuestionId, ResponseId, SurveyId, SurveyResponse};

use super::id_bytes;
use crate::{DbError, Result};

/// Insert a response.
pub fn insert(conn: &Connection, response: &SurveyResponse) -> Result<()> {
    let answers = serde_json::to_string(&response.answers)
        .map_err(|e| DbError::Serialization(e.to_string()))?;
    conn.execute(
        "INSERT INTO responses (id, survey_id, answers, submitted_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            response.id.as_bytes().as_slice(),
            response.survey_id.as_bytes().as_slice(),
            answers,
            response.submitted_at as i64,
        ],
    )?;
    Ok(())
}

/// Count responses for a survey.
pub fn count(conn: &Connection, survey_id: SurveyId) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM responses WHERE survey_id = ?1",
        [survey_id.as_bytes().as_slice()],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// All responses for a survey, read inside one transaction.
///
/// Ordered by the random response id, which carries no arrival information.
pub fn snapshot(conn: &Connection, survey_id: SurveyId) -> Result<Vec<SurveyResponse>> {
    let tx = conn.unchecked_transaction()?;
    let rows = {
        let mut stmt = tx.prepare(
            "SELECT id, answers, submitted_at FROM responses
             WHERE survey_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([survey_id.as_bytes().as_slice()], |row| {
                Ok((
                    row.get::<_, Vec<u8>>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)? as u64,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows
    };
    tx.commit()?;

    rows.into_iter()
        .map(|(id, answers, submitted_at)| {
            let answers: BTreeMap<QuestionId, String> = serde_json::from_str(&answers)
                .map_err(|e| DbError::Serialization(e.to_string()))?;
            Ok(SurveyResponse {
                id: ResponseId::from_bytes(id_bytes(id)?),
                survey_id,
                answers,
                submitted_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::surveys;

    fn seeded() -> (Connection, SurveyId, QuestionId) {
        let conn = crate::open_memory().expect("open test db");
        let survey = surveys::tests::sample_survey();
        surveys::insert(&conn, &survey).expect("insert survey");
        (conn, survey.id, survey.questions[0].id)
    }

    #[test]
    fn test_insert_count_snapshot() {
        let (conn, survey_id, q) = seeded();
        assert_eq!(count(&conn, survey_id).expect("count"), 0);

        for text in ["alpha", "beta", "gamma"] {
            let response =
                SurveyResponse::new(survey_id, BTreeMap::from([(q, text.to_string())]), 1_000);
            insert(&conn, &response).expect("insert");
        }

        assert_eq!(count(&conn, survey_id).expect("count"), 3);
        let all = snapshot(&conn, survey_id).expect("snapshot");
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|r| r.survey_id == survey_id));
        let mut texts: Vec<&str> = all.iter().filter_map(|r| r.answer(q)).collect();
        texts.sort_unstable();
        assert_eq!(texts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_snapshot_is_ordered_by_random_id() {
        let (conn, survey_id, q) = seeded();
        for i in 0..10 {
            let response =
                SurveyResponse::new(survey_id, BTreeMap::from([(q, i.to_string())]), 1_000);
            insert(&conn, &response).expect("insert");
        }
        let all = snapshot(&conn, survey_id).expect("snapshot");
        let ids: Vec<ResponseId> = all.iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_unknown_survey_rejected() {
        let (conn, _, q) = seeded();
        let response = SurveyResponse::new(
            SurveyId::generate(),
            BTreeMap::from([(q, "x".to_string())]),
            1_000,
        );
        assert!(insert(&conn, &response).is_err());
    }

    #[test]
    fn test_scoped_by_survey() {
        let (conn, survey_id, q) = seeded();
        let other = surveys::tests::sample_survey();
        surveys::insert(&conn, &other).expect("insert other");

        insert(
            &conn,
            &SurveyResponse::new(other.id, BTreeMap::from([(q, "x".into())]), 1),
        )
        .expect("insert");
        assert_eq!(count(&conn, survey_id).expect("count"), 0);
        assert!(snapshot(&conn, survey_id).expect("snapshot").is_empty());
    }
}
